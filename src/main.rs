//! litectl - remote control for LiteX-style FPGA boards
//!
//! Talks to the board's config/status registers over a pluggable
//! [`RegisterBus`] backend and exposes the on-board peripherals as
//! subcommands: the SPI flash behind the gateware's transaction registers,
//! the power/reset switches, the LED bank and the servo channels.
//!
//! The only built-in backend is `sim`, the in-memory board emulation from
//! `litectl-sim`; real transports (etherbone, serial bridges) implement
//! the `RegisterBus` trait out of tree and slot in the same way.

mod cli;
mod commands;
mod config;

use clap::Parser;
use cli::{Cli, Commands, LockCommands, NvcrCommands, PowerCommands};
use config::BoardConfig;
use litectl_core::flash::SpiFlash;
use litectl_core::RegisterBus;
use std::time::Duration;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logger, with -v/-vv raising the default filter
    let default_filter = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let config = match &cli.config {
        Some(path) => BoardConfig::load(path)?,
        None => BoardConfig::default(),
    };
    let timeout = Duration::from_millis(cli.timeout_ms.unwrap_or(config.spi_timeout_ms));

    let bus = open_bus(&cli.bus)?;

    match cli.command {
        Commands::Id => commands::run_id(&mut SpiFlash::new(bus).with_timeout(timeout)),
        Commands::Status => commands::run_status(&mut SpiFlash::new(bus).with_timeout(timeout)),
        Commands::Read { addr, len, output } => commands::run_read(
            &mut SpiFlash::new(bus).with_timeout(timeout),
            addr,
            len,
            output.as_deref(),
        ),
        Commands::Write { addr, data } => {
            commands::run_write(&mut SpiFlash::new(bus).with_timeout(timeout), addr, &data)
        }
        Commands::Erase { addr, bulk } => {
            commands::run_erase(&mut SpiFlash::new(bus).with_timeout(timeout), addr, bulk)
        }
        Commands::Lock(subcmd) => match subcmd {
            LockCommands::Read { addr } => {
                commands::run_lock_read(&mut SpiFlash::new(bus).with_timeout(timeout), addr)
            }
            LockCommands::Write { addr, value } => commands::run_lock_write(
                &mut SpiFlash::new(bus).with_timeout(timeout),
                addr,
                value,
            ),
        },
        Commands::Nvcr(subcmd) => match subcmd {
            NvcrCommands::Read => {
                commands::run_nvcr_read(&mut SpiFlash::new(bus).with_timeout(timeout))
            }
            NvcrCommands::Write { value } => {
                commands::run_nvcr_write(&mut SpiFlash::new(bus).with_timeout(timeout), value)
            }
        },
        Commands::Blink { count } => commands::run_blink(bus, count),
        Commands::Power(subcmd) => match subcmd {
            PowerCommands::On => commands::run_power_on(bus),
            PowerCommands::Off => commands::run_power_off(bus),
        },
        Commands::Reboot => commands::run_reboot(bus),
        Commands::Servo {
            index,
            position,
            off,
        } => commands::run_servo(bus, index, position, off, config.sys_clk_hz),
    }
}

/// Open the register bus backend selected on the command line.
fn open_bus(name: &str) -> Result<Box<dyn RegisterBus + Send>, Box<dyn std::error::Error>> {
    match name {
        "sim" => {
            log::info!("using the in-memory board simulation");
            Ok(Box::new(litectl_sim::SimBus::default()))
        }
        other => Err(format!(
            "unknown bus `{}` (available: sim; real transports implement the RegisterBus trait)",
            other
        )
        .into()),
    }
}
