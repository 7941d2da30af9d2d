//! SPI flash driver for the board's memory-mapped SPI controller.
//!
//! The gateware exposes a single-transaction SPI master as four CSRs: an
//! outbound shift register, a control register (transfer length + start
//! flag), a status register (done flag) and an inbound shift register.
//! [`SpiFlash`] turns that register set into the flash command set of the
//! on-board serial NOR device.
//!
//! The driver is stateless between calls: it holds nothing but the bus
//! handle and the transfer deadline, and never caches register values.
//! Raw operations do not sequence write-enable for the caller; the
//! hardware's command semantics are stateless and so are these methods.
//! [`SpiFlash::program`] is the composed correct-usage helper.

use std::time::{Duration, Instant};

use crate::bus::RegisterBus;
use crate::error::{Error, Result};
use crate::spi::{opcodes, SpiCommand, ADDR_MASK, XFER_BITS};

/// CSR names of the SPI flash controller, as emitted in the board's CSR map.
pub mod csr {
    /// Outbound shift register. The top `bit_length` bits are clocked out.
    pub const SPI_MOSI: &str = "spiflash_spi_mosi";
    /// Control register: transfer length field plus the start flag.
    pub const SPI_CONTROL: &str = "spiflash_spi_control";
    /// Status register: bit 0 is the done flag.
    pub const SPI_STATUS: &str = "spiflash_spi_status";
    /// Inbound shift register. The device response sits in the low bits.
    pub const SPI_MISO: &str = "spiflash_spi_miso";
}

/// Start flag in the control register.
pub const CTRL_START: u64 = 1 << 0;
/// Bit position of the transfer length field in the control register.
pub const CTRL_LENGTH_SHIFT: u32 = 8;
/// Done flag in the status register.
pub const STATUS_DONE: u64 = 1 << 0;

/// Default deadline for a single SPI transfer.
pub const DEFAULT_XFER_TIMEOUT: Duration = Duration::from_secs(1);

/// Poll interval / deadline for a byte program cycle.
pub const PROGRAM_POLL: Duration = Duration::from_micros(100);
/// Deadline for a byte program cycle.
pub const PROGRAM_TIMEOUT: Duration = Duration::from_millis(50);
/// Poll interval for a sector or bulk erase cycle.
pub const ERASE_POLL: Duration = Duration::from_millis(100);
/// Deadline for a sector erase cycle (the datasheet maximum is 3 s).
pub const ERASE_TIMEOUT: Duration = Duration::from_secs(4);
/// Deadline for a bulk erase cycle.
pub const BULK_ERASE_TIMEOUT: Duration = Duration::from_secs(250);

/// Driver for the SPI flash behind the board's transaction registers.
///
/// Every method takes `&mut self`, which statically serializes the
/// write-control-poll-read sequence: the hardware has a single outstanding
/// transaction slot. To share one driver across threads, put it behind a
/// `Mutex`.
pub struct SpiFlash<B> {
    bus: B,
    timeout: Duration,
}

impl<B: RegisterBus> SpiFlash<B> {
    /// Wrap an already-open register bus with the default transfer deadline.
    pub fn new(bus: B) -> Self {
        Self {
            bus,
            timeout: DEFAULT_XFER_TIMEOUT,
        }
    }

    /// Set the deadline for a single transfer's done-flag poll loop.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Give the bus handle back to the caller.
    pub fn into_bus(self) -> B {
        self.bus
    }

    /// Issue one SPI transfer of `bit_length` bits and return the captured
    /// response word.
    ///
    /// Exactly one hardware transaction per call, no buffering: the command
    /// word goes to the outbound register, the control write starts the
    /// transfer, and the status register is polled for the done flag until
    /// the configured deadline. Each poll is a full bus round trip, so no
    /// extra delay is inserted between polls.
    pub fn transfer(&mut self, bit_length: u8, mosi: u64) -> Result<u64> {
        if bit_length == 0 || bit_length > XFER_BITS {
            return Err(Error::InvalidArgument(
                "transfer length must be between 1 and 40 bits",
            ));
        }
        if mosi >> XFER_BITS != 0 {
            return Err(Error::InvalidArgument(
                "command word exceeds the shift register width",
            ));
        }

        log::trace!("spi xfer: {} bits, mosi {:#012x}", bit_length, mosi);
        self.bus.write(csr::SPI_MOSI, mosi)?;
        self.bus.write(
            csr::SPI_CONTROL,
            (u64::from(bit_length) << CTRL_LENGTH_SHIFT) | CTRL_START,
        )?;

        let deadline = Instant::now() + self.timeout;
        while self.bus.read(csr::SPI_STATUS)? & STATUS_DONE == 0 {
            if Instant::now() >= deadline {
                return Err(Error::DeviceTimeout(self.timeout));
            }
        }

        let miso = self.bus.read(csr::SPI_MISO)?;
        log::trace!("spi xfer: miso {:#012x}", miso);
        Ok(miso)
    }

    fn execute(&mut self, cmd: SpiCommand) -> Result<u64> {
        if let Some(addr) = cmd.address {
            if addr > ADDR_MASK {
                return Err(Error::InvalidArgument("address exceeds 24 bits"));
            }
        }
        let (word, bits) = cmd.encode();
        self.transfer(bits, word)
    }

    // ------------------------------------------------------------------
    // Operation catalogue
    // ------------------------------------------------------------------

    /// Read the 24-bit JEDEC id (manufacturer + device).
    pub fn read_id(&mut self) -> Result<u32> {
        let id = self.execute(SpiCommand::read_reg(opcodes::RDID, 24))?;
        Ok((id & u64::from(ADDR_MASK)) as u32)
    }

    /// Set the write-enable latch. Required before any mutating command.
    pub fn write_enable(&mut self) -> Result<()> {
        self.execute(SpiCommand::simple(opcodes::WREN)).map(drop)
    }

    /// Clear the write-enable latch.
    pub fn write_disable(&mut self) -> Result<()> {
        self.execute(SpiCommand::simple(opcodes::WRDI)).map(drop)
    }

    /// Read the status register.
    pub fn read_status(&mut self) -> Result<u8> {
        let status = self.execute(SpiCommand::read_reg(opcodes::RDSR, 8))?;
        Ok(status as u8)
    }

    /// Write the status register.
    pub fn write_status(&mut self, value: u8) -> Result<()> {
        self.execute(SpiCommand::write_reg(opcodes::WRSR, value))
            .map(drop)
    }

    /// Erase the sector containing `addr`.
    pub fn erase_sector(&mut self, addr: u32) -> Result<()> {
        log::debug!("erase sector at {:#08x}", addr);
        self.execute(SpiCommand::erase(opcodes::SE, addr)).map(drop)
    }

    /// Erase the entire device.
    pub fn erase_bulk(&mut self) -> Result<()> {
        log::debug!("bulk erase");
        self.execute(SpiCommand::simple(opcodes::BE)).map(drop)
    }

    /// Read the lock byte of the sector containing `addr`.
    pub fn read_sector_lock(&mut self, addr: u32) -> Result<u8> {
        let lock = self.execute(SpiCommand::read_at(opcodes::RDSR, addr))?;
        Ok(lock as u8)
    }

    /// Write the lock byte of the sector containing `addr`.
    pub fn write_sector_lock(&mut self, addr: u32, byte: u8) -> Result<()> {
        self.execute(SpiCommand::write_at(opcodes::WRSR, addr, byte))
            .map(drop)
    }

    /// Read one byte of flash.
    pub fn read_byte(&mut self, addr: u32) -> Result<u8> {
        let byte = self.execute(SpiCommand::read_at(opcodes::READ, addr))?;
        Ok(byte as u8)
    }

    /// Program one byte of flash. Programming only clears bits; the byte
    /// must be in an erased location to take the full value.
    pub fn write_byte(&mut self, addr: u32, byte: u8) -> Result<()> {
        self.execute(SpiCommand::write_at(opcodes::PP, addr, byte))
            .map(drop)
    }

    /// Read the 16-bit non-volatile configuration register.
    pub fn read_nvcr(&mut self) -> Result<u16> {
        let nvcr = self.execute(SpiCommand::read_reg(opcodes::RDNVCR, 16))?;
        Ok(nvcr as u16)
    }

    /// Write the 16-bit non-volatile configuration register.
    pub fn write_nvcr(&mut self, value: u16) -> Result<()> {
        self.execute(SpiCommand::write_reg16(opcodes::WRNVCR, value))
            .map(drop)
    }

    // ------------------------------------------------------------------
    // Compositions
    // ------------------------------------------------------------------

    /// Poll the status register until the write-in-progress bit clears.
    ///
    /// Fails with [`Error::DeviceTimeout`] once `timeout` elapses. A zero
    /// `poll_interval` polls back-to-back.
    pub fn wait_idle(&mut self, poll_interval: Duration, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        loop {
            if self.read_status()? & opcodes::StatusFlags::WIP.bits() == 0 {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(Error::DeviceTimeout(timeout));
            }
            if !poll_interval.is_zero() {
                std::thread::sleep(poll_interval);
            }
        }
    }

    /// Fill `buf` from flash starting at `addr`, one byte per transaction.
    pub fn read_into(&mut self, addr: u32, buf: &mut [u8]) -> Result<()> {
        check_range(addr, buf.len())?;
        for (i, byte) in buf.iter_mut().enumerate() {
            *byte = self.read_byte(addr + i as u32)?;
        }
        Ok(())
    }

    /// Program `data` starting at `addr`, with the correct-usage sequence
    /// for every byte: write-enable, program, wait for the cycle to finish.
    pub fn program(&mut self, addr: u32, data: &[u8]) -> Result<()> {
        check_range(addr, data.len())?;
        log::debug!("program {} bytes at {:#08x}", data.len(), addr);
        for (i, &byte) in data.iter().enumerate() {
            self.write_enable()?;
            self.write_byte(addr + i as u32, byte)?;
            self.wait_idle(PROGRAM_POLL, PROGRAM_TIMEOUT)?;
        }
        Ok(())
    }
}

fn check_range(addr: u32, len: usize) -> Result<()> {
    if u64::from(addr) + len as u64 > u64::from(ADDR_MASK) + 1 {
        return Err(Error::InvalidArgument(
            "range exceeds the 24-bit address space",
        ));
    }
    Ok(())
}
