//! litectl-core - drivers for remotely controlled FPGA boards
//!
//! This crate drives the peripherals of a small FPGA SoC through its
//! config/status registers (CSRs), reached over whatever remote link the
//! board exposes. The transport is injected as a [`RegisterBus`]
//! implementation with its session already open; the drivers never manage
//! the session themselves.
//!
//! The main driver is [`flash::SpiFlash`], which turns the gateware's
//! single-transaction SPI master into the command set of the on-board
//! serial NOR flash. The [`board`] module carries the smaller peripheral
//! drivers (output pins, LEDs, servos).
//!
//! # Example
//!
//! ```ignore
//! use litectl_core::{flash::SpiFlash, RegisterBus};
//!
//! fn identify<B: RegisterBus>(bus: B) {
//!     let mut flash = SpiFlash::new(bus);
//!     match flash.read_id() {
//!         Ok(id) => println!("JEDEC id: {:06x}", id),
//!         Err(e) => println!("id read failed: {}", e),
//!     }
//! }
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod board;
pub mod bus;
pub mod error;
pub mod flash;
pub mod spi;

pub use bus::RegisterBus;
pub use error::{Error, Result};
