//! The user LED bank.

use std::time::Duration;

use crate::bus::RegisterBus;
use crate::error::Result;

/// CSR name of the LED bank output.
pub const LED_OUT: &str = "led_out";

/// Toggle period used by the blink demo.
pub const BLINK_PERIOD: Duration = Duration::from_millis(200);

/// The LED bank behind a single output CSR.
pub struct Leds<B> {
    bus: B,
}

impl<B: RegisterBus> Leds<B> {
    /// Bind the LED bank driver to the bus.
    pub fn new(bus: B) -> Self {
        Self { bus }
    }

    /// Invert the whole bank.
    pub fn toggle(&mut self) -> Result<()> {
        let value = self.bus.read(LED_OUT)?;
        self.bus.write(LED_OUT, !value & 0xFFFF_FFFF)
    }

    /// Toggle the bank `count` times, waiting `period` between toggles.
    pub fn blink(&mut self, count: u32, period: Duration) -> Result<()> {
        for _ in 0..count {
            self.toggle()?;
            std::thread::sleep(period);
        }
        Ok(())
    }
}
