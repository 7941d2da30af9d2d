//! SPI flash opcodes used by the board's serial NOR flash.
//!
//! Micron N25Q-style command set. These values are a fixed wire-level
//! contract with the device and are never constructed dynamically.

use bitflags::bitflags;

// ============================================================================
// Identification
// ============================================================================

/// Read JEDEC ID (manufacturer + device ID)
pub const RDID: u8 = 0x9F;

// ============================================================================
// Write control
// ============================================================================

/// Write Enable - required before any program/erase/register write
pub const WREN: u8 = 0x06;
/// Write Disable - clears the WEL bit in the status register
pub const WRDI: u8 = 0x04;

// ============================================================================
// Read / program
// ============================================================================

/// Read Data
pub const READ: u8 = 0x03;
/// Page Program
pub const PP: u8 = 0x02;

// ============================================================================
// Erase
// ============================================================================

/// Sector Erase (64 KiB sectors on this part)
pub const SE: u8 = 0xD8;
/// Bulk Erase (entire chip)
pub const BE: u8 = 0xC7;

// ============================================================================
// Status register
// ============================================================================

/// Read Status Register
pub const RDSR: u8 = 0x05;
/// Write Status Register
pub const WRSR: u8 = 0x01;

// ============================================================================
// Non-volatile configuration register
// ============================================================================

/// Read Non-Volatile Configuration Register (16-bit)
pub const RDNVCR: u8 = 0xB5;
/// Write Non-Volatile Configuration Register (16-bit)
pub const WRNVCR: u8 = 0xB1;

bitflags! {
    /// Status register bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct StatusFlags: u8 {
        /// Write In Progress - a program/erase cycle is running
        const WIP  = 1 << 0;
        /// Write Enable Latch - set by WREN, cleared by WRDI and after
        /// every program/erase/register-write cycle
        const WEL  = 1 << 1;
        /// Block Protect bit 0
        const BP0  = 1 << 2;
        /// Block Protect bit 1
        const BP1  = 1 << 3;
        /// Block Protect bit 2
        const BP2  = 1 << 4;
        /// Top/Bottom protection select
        const TB   = 1 << 5;
        /// Block Protect bit 3
        const BP3  = 1 << 6;
        /// Status Register Write Disable
        const SRWD = 1 << 7;
    }
}
