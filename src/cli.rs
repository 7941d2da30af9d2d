//! CLI argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

fn parse_hex(s: &str) -> Result<u64, String> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16).map_err(|e| format!("invalid hex value: {}", e))
    } else {
        s.parse::<u64>().map_err(|e| format!("invalid number: {}", e))
    }
}

/// Parse a string as a hex or decimal u32
pub fn parse_hex_u32(s: &str) -> Result<u32, String> {
    u32::try_from(parse_hex(s)?).map_err(|_| "value does not fit in 32 bits".to_string())
}

/// Parse a string as a hex or decimal u16
pub fn parse_hex_u16(s: &str) -> Result<u16, String> {
    u16::try_from(parse_hex(s)?).map_err(|_| "value does not fit in 16 bits".to_string())
}

/// Parse a string as a hex or decimal u8
pub fn parse_hex_u8(s: &str) -> Result<u8, String> {
    u8::try_from(parse_hex(s)?).map_err(|_| "value does not fit in 8 bits".to_string())
}

#[derive(Parser)]
#[command(name = "litectl")]
#[command(author, version, about = "Remote control for LiteX-style FPGA boards", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Register bus backend [available: sim]
    #[arg(short, long, global = true, default_value = "sim")]
    pub bus: String,

    /// Board configuration file (TOML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the SPI transfer deadline in milliseconds
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the flash JEDEC id
    Id,

    /// Print and decode the flash status register
    Status,

    /// Read flash contents
    Read {
        /// Start address
        #[arg(value_parser = parse_hex_u32)]
        addr: u32,

        /// Number of bytes
        #[arg(value_parser = parse_hex_u32, default_value = "16")]
        len: u32,

        /// Write the bytes to a file instead of hex-dumping them
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Program bytes into flash
    Write {
        /// Start address
        #[arg(value_parser = parse_hex_u32)]
        addr: u32,

        /// Data as a hex string, e.g. deadbeef
        data: String,
    },

    /// Erase the sector containing an address, or the whole device
    Erase {
        /// Address inside the sector to erase
        #[arg(value_parser = parse_hex_u32, required_unless_present = "bulk")]
        addr: Option<u32>,

        /// Erase the entire device
        #[arg(long)]
        bulk: bool,
    },

    /// Sector lock bytes
    #[command(subcommand)]
    Lock(LockCommands),

    /// Non-volatile configuration register
    #[command(subcommand)]
    Nvcr(NvcrCommands),

    /// Blink the user LEDs
    Blink {
        /// Number of toggles
        #[arg(long, default_value = "16")]
        count: u32,
    },

    /// Power switch control
    #[command(subcommand)]
    Power(PowerCommands),

    /// Pulse the reset switch
    Reboot,

    /// Drive a servo channel
    Servo {
        /// Channel index
        index: u8,

        /// Position in percent (0-100)
        #[arg(long, conflicts_with = "off")]
        position: Option<u8>,

        /// Disable the channel
        #[arg(long)]
        off: bool,
    },
}

#[derive(Subcommand)]
pub enum LockCommands {
    /// Read the lock byte of the sector containing an address
    Read {
        /// Address inside the sector
        #[arg(value_parser = parse_hex_u32)]
        addr: u32,
    },
    /// Write the lock byte of the sector containing an address
    Write {
        /// Address inside the sector
        #[arg(value_parser = parse_hex_u32)]
        addr: u32,

        /// Lock byte value
        #[arg(value_parser = parse_hex_u8)]
        value: u8,
    },
}

#[derive(Subcommand)]
pub enum NvcrCommands {
    /// Read the 16-bit register
    Read,
    /// Write the 16-bit register
    Write {
        /// Register value
        #[arg(value_parser = parse_hex_u16)]
        value: u16,
    },
}

#[derive(Subcommand)]
pub enum PowerCommands {
    /// Pulse the power switch to turn the supervised device on
    On,
    /// Hold the power switch to force the supervised device off
    Off,
}
