//! Pulse-driven output pins.
//!
//! The board routes two single-bit output CSRs to the power and reset
//! switches of the device it supervises. Switch actions are edge patterns:
//! a short pulse turns the supervised device on or reboots it, a long hold
//! forces it off.

use std::time::Duration;

use crate::bus::RegisterBus;
use crate::error::Result;

/// CSR name of the power switch pin.
pub const POWER_SWITCH: &str = "gpio0_out";
/// CSR name of the reset switch pin.
pub const RESET_SWITCH: &str = "gpio1_out";

/// Pulse length that powers the supervised device on.
pub const POWER_ON_PULSE: Duration = Duration::from_millis(500);
/// Hold length that forces the supervised device off.
pub const POWER_OFF_HOLD: Duration = Duration::from_secs(6);
/// Pulse length that reboots the supervised device.
pub const RESET_PULSE: Duration = Duration::from_millis(500);

/// A single-bit output CSR.
pub struct OutputPin<B> {
    bus: B,
    reg: String,
}

impl<B: RegisterBus> OutputPin<B> {
    /// Bind a pin to its CSR name.
    pub fn new(bus: B, reg: impl Into<String>) -> Self {
        Self {
            bus,
            reg: reg.into(),
        }
    }

    /// Drive the pin high.
    pub fn set_high(&mut self) -> Result<()> {
        self.bus.write(&self.reg, 1)
    }

    /// Drive the pin low.
    pub fn set_low(&mut self) -> Result<()> {
        self.bus.write(&self.reg, 0)
    }

    /// Drive the pin high for `hold`, then low again.
    pub fn pulse(&mut self, hold: Duration) -> Result<()> {
        log::debug!("pulse {} for {:?}", self.reg, hold);
        self.set_high()?;
        std::thread::sleep(hold);
        self.set_low()
    }
}
