//! Board configuration file
//!
//! Parameters the gateware fixes at build time, in TOML:
//!
//! ```toml
//! sys_clk_hz = 50000000
//! spi_timeout_ms = 1000
//! ```

use serde::Deserialize;
use std::path::Path;

/// Board parameters used by the CLI.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    /// System clock frequency the PWM counters run at.
    pub sys_clk_hz: u32,
    /// Deadline for a single SPI transfer.
    pub spi_timeout_ms: u64,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            sys_clk_hz: 50_000_000,
            spi_timeout_ms: 1_000,
        }
    }
}

impl BoardConfig {
    /// Load the configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let text = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }
}
