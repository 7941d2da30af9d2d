//! PWM servo channels.
//!
//! Each channel is a CSR triple (`servo{n}_enable`, `servo{n}_width`,
//! `servo{n}_period`) driven with a standard RC servo frame: 20 ms period,
//! 1 ms to 2 ms pulse width across the travel range.

use crate::bus::RegisterBus;
use crate::error::Result;

/// PWM frame length in milliseconds.
pub const FRAME_MS: u64 = 20;

/// One servo channel.
pub struct Servo<B> {
    bus: B,
    enable: String,
    width: String,
    period: String,
    period_ticks: u64,
}

impl<B: RegisterBus> Servo<B> {
    /// Bind channel `index`, with the PWM counters running at `sys_clk_hz`.
    pub fn new(bus: B, index: u8, sys_clk_hz: u32) -> Self {
        Self {
            bus,
            enable: format!("servo{index}_enable"),
            width: format!("servo{index}_width"),
            period: format!("servo{index}_period"),
            period_ticks: u64::from(sys_clk_hz) * FRAME_MS / 1000,
        }
    }

    /// Program the frame period. Call once before enabling the channel.
    pub fn configure(&mut self) -> Result<()> {
        self.bus.write(&self.period, self.period_ticks)
    }

    /// Move to `percent` of the travel range (clamped to 100), i.e. a
    /// pulse of 1 ms + percent/100 ms.
    pub fn set_position(&mut self, percent: u8) -> Result<()> {
        let percent = u64::from(percent.min(100));
        let width = self.period_ticks * (100 + percent) / 2000;
        log::debug!("{} <- {} ticks", self.width, width);
        self.bus.write(&self.width, width)
    }

    /// Start driving the output.
    pub fn enable(&mut self) -> Result<()> {
        self.bus.write(&self.enable, 1)
    }

    /// Stop driving the output.
    pub fn disable(&mut self) -> Result<()> {
        self.bus.write(&self.enable, 0)
    }
}
