//! litectl-sim - in-memory board emulation for testing
//!
//! [`SimBus`] implements [`RegisterBus`] over an in-memory register file,
//! with a behavioural model of the SPI flash controller and the serial NOR
//! device behind it. It exists so the drivers (and the CLI) can run
//! without hardware.
//!
//! The flash model mirrors the physical part where the drivers can tell
//! the difference: programming only clears bits, erase sets a whole sector
//! to 0xFF, and every mutating command consumes the write-enable latch.
//! A mutation without the latch is silently ignored, as on the real device.

use std::collections::HashMap;

use litectl_core::board::{gpio, led};
use litectl_core::error::{Error, Result};
use litectl_core::flash::{csr, CTRL_LENGTH_SHIFT, CTRL_START, STATUS_DONE};
use litectl_core::spi::opcodes::{self, StatusFlags};
use litectl_core::spi::ADDR_MASK;
use litectl_core::RegisterBus;

/// Configuration of the emulated flash device.
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// 24-bit JEDEC id returned by read-id.
    pub jedec_id: u32,
    /// Array size in bytes.
    pub size: usize,
    /// Erase sector size in bytes.
    pub sector_size: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            jedec_id: 0x20BA18, // Micron N25Q128A
            size: 16 * 1024 * 1024,
            sector_size: 64 * 1024,
        }
    }
}

/// Simulated register bus: the SPI flash controller CSRs plus the plain
/// board registers (LEDs, GPIOs, servo channels).
pub struct SimBus {
    config: SimConfig,
    data: Vec<u8>,
    status: u8,
    nvcr: u16,
    locks: HashMap<u32, u8>,
    write_enabled: bool,
    mosi: u64,
    miso: u64,
    done: bool,
    stuck: bool,
    regs: HashMap<String, u64>,
}

impl Default for SimBus {
    fn default() -> Self {
        Self::new(SimConfig::default())
    }
}

impl SimBus {
    /// Create a simulated board with the given flash configuration.
    pub fn new(config: SimConfig) -> Self {
        let mut regs = HashMap::new();
        regs.insert(led::LED_OUT.to_string(), 0);
        regs.insert(gpio::POWER_SWITCH.to_string(), 0);
        regs.insert(gpio::RESET_SWITCH.to_string(), 0);
        for n in 0..4 {
            regs.insert(format!("servo{n}_enable"), 0);
            regs.insert(format!("servo{n}_width"), 0);
            regs.insert(format!("servo{n}_period"), 0);
        }
        let data = vec![0xFF; config.size];
        Self {
            config,
            data,
            status: 0,
            nvcr: 0xFFFF,
            locks: HashMap::new(),
            write_enabled: false,
            mosi: 0,
            miso: 0,
            done: false,
            stuck: false,
            regs,
        }
    }

    /// When stuck, started transfers never raise the done flag.
    pub fn set_stuck(&mut self, stuck: bool) {
        self.stuck = stuck;
    }

    /// The emulated flash array.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Mutable access to the emulated flash array.
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Peek at a plain board register.
    pub fn reg(&self, name: &str) -> Option<u64> {
        self.regs.get(name).copied()
    }

    fn sector(&self, addr: u32) -> u32 {
        addr / self.config.sector_size as u32
    }

    /// Consume the write-enable latch; reports whether the mutation may
    /// proceed.
    fn take_write_enable(&mut self) -> bool {
        if self.write_enabled {
            self.write_enabled = false;
            true
        } else {
            log::debug!("mutating command without write-enable ignored");
            false
        }
    }

    fn execute(&mut self, bits: u8, word: u64) {
        let opcode = (word >> 32) as u8;
        let addr = ((word >> 8) & u64::from(ADDR_MASK)) as u32;
        self.miso = 0;
        match (opcode, bits) {
            (opcodes::RDID, _) => {
                self.miso = u64::from(self.config.jedec_id & ADDR_MASK);
            }
            (opcodes::WREN, _) => self.write_enabled = true,
            (opcodes::WRDI, _) => self.write_enabled = false,
            (opcodes::RDSR, 16) => {
                let wel = if self.write_enabled {
                    StatusFlags::WEL.bits()
                } else {
                    0
                };
                self.miso = u64::from(self.status | wel);
            }
            (opcodes::RDSR, 40) => {
                let sector = self.sector(addr);
                self.miso = u64::from(self.locks.get(&sector).copied().unwrap_or(0));
            }
            (opcodes::WRSR, 16) => {
                let value = ((word >> 24) & 0xFF) as u8;
                if self.take_write_enable() {
                    self.status = value;
                }
            }
            (opcodes::WRSR, 40) => {
                let value = (word & 0xFF) as u8;
                if self.take_write_enable() {
                    let sector = self.sector(addr);
                    self.locks.insert(sector, value);
                }
            }
            (opcodes::READ, 40) => {
                self.miso = u64::from(self.data.get(addr as usize).copied().unwrap_or(0xFF));
            }
            (opcodes::PP, 40) => {
                let value = (word & 0xFF) as u8;
                if self.take_write_enable() {
                    if let Some(byte) = self.data.get_mut(addr as usize) {
                        // Programming only moves bits 1 -> 0.
                        *byte &= value;
                    }
                }
            }
            (opcodes::SE, 32) => {
                if self.take_write_enable() {
                    let start = self.sector(addr) as usize * self.config.sector_size;
                    let len = self.data.len();
                    let end = (start + self.config.sector_size).min(len);
                    for byte in &mut self.data[start.min(len)..end] {
                        *byte = 0xFF;
                    }
                }
            }
            (opcodes::BE, 8) => {
                if self.take_write_enable() {
                    self.data.fill(0xFF);
                }
            }
            (opcodes::RDNVCR, 24) => self.miso = u64::from(self.nvcr),
            (opcodes::WRNVCR, 24) => {
                let value = ((word >> 16) & 0xFFFF) as u16;
                if self.take_write_enable() {
                    self.nvcr = value;
                }
            }
            _ => {
                log::warn!("unhandled SPI command {:#04x} ({} bits)", opcode, bits);
            }
        }
    }
}

impl RegisterBus for SimBus {
    fn read(&mut self, reg: &str) -> Result<u64> {
        match reg {
            csr::SPI_STATUS => Ok(if self.done { STATUS_DONE } else { 0 }),
            csr::SPI_MISO => Ok(self.miso),
            csr::SPI_MOSI => Ok(self.mosi),
            csr::SPI_CONTROL => Ok(0),
            _ => self
                .regs
                .get(reg)
                .copied()
                .ok_or_else(|| Error::UnknownRegister(reg.into())),
        }
    }

    fn write(&mut self, reg: &str, value: u64) -> Result<()> {
        match reg {
            csr::SPI_MOSI => {
                self.mosi = value;
                Ok(())
            }
            csr::SPI_CONTROL => {
                if value & CTRL_START != 0 {
                    self.done = false;
                    if !self.stuck {
                        let bits = ((value >> CTRL_LENGTH_SHIFT) & 0xFF) as u8;
                        let word = self.mosi;
                        self.execute(bits, word);
                        self.done = true;
                    }
                }
                Ok(())
            }
            // Read-only controller registers: writes land nowhere.
            csr::SPI_STATUS | csr::SPI_MISO => Ok(()),
            _ => {
                if self.regs.contains_key(reg) {
                    self.regs.insert(reg.to_string(), value);
                    Ok(())
                } else {
                    Err(Error::UnknownRegister(reg.into()))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use litectl_core::board::{Leds, OutputPin, Servo};
    use litectl_core::flash::SpiFlash;
    use std::time::Duration;

    fn flash() -> SpiFlash<SimBus> {
        SpiFlash::new(SimBus::default())
    }

    #[test]
    fn test_read_id_returns_programmed_id() {
        let mut flash = SpiFlash::new(SimBus::new(SimConfig {
            jedec_id: 0x001040,
            ..SimConfig::default()
        }));
        assert_eq!(flash.read_id().unwrap(), 0x001040);
    }

    #[test]
    fn test_status_round_trip() {
        let mut flash = flash();
        flash.write_enable().unwrap();
        flash.write_status(0x5C).unwrap();
        assert_eq!(flash.read_status().unwrap(), 0x5C);
    }

    #[test]
    fn test_write_enable_latch_visible_in_status() {
        let mut flash = flash();
        assert_eq!(
            flash.read_status().unwrap() & StatusFlags::WEL.bits(),
            0
        );
        flash.write_enable().unwrap();
        assert_ne!(
            flash.read_status().unwrap() & StatusFlags::WEL.bits(),
            0
        );
        flash.write_disable().unwrap();
        assert_eq!(
            flash.read_status().unwrap() & StatusFlags::WEL.bits(),
            0
        );
    }

    #[test]
    fn test_sector_lock_round_trip() {
        let mut flash = flash();
        flash.write_enable().unwrap();
        flash.write_sector_lock(0x000000, 0xFF).unwrap();
        assert_eq!(flash.read_sector_lock(0x000000).unwrap(), 0xFF);
        // A different sector keeps its own lock byte.
        assert_eq!(flash.read_sector_lock(0x10000).unwrap(), 0x00);
    }

    #[test]
    fn test_nvcr_round_trip_keeps_all_sixteen_bits() {
        let mut flash = flash();
        assert_eq!(flash.read_nvcr().unwrap(), 0xFFFF);
        flash.write_enable().unwrap();
        flash.write_nvcr(0xAFF0).unwrap();
        assert_eq!(flash.read_nvcr().unwrap(), 0xAFF0);
    }

    #[test]
    fn test_byte_round_trip_at_boundary_addresses() {
        let mut flash = flash();
        for addr in [0x000000, 0xFFFFFF] {
            flash.write_enable().unwrap();
            flash.write_byte(addr, 0x42).unwrap();
            assert_eq!(flash.read_byte(addr).unwrap(), 0x42);
        }
    }

    #[test]
    fn test_mutations_without_write_enable_are_ignored() {
        // Sequencing is the caller's responsibility: the device drops
        // mutating commands that arrive without the latch set.
        let mut flash = flash();
        flash.write_byte(0x10, 0x00).unwrap();
        assert_eq!(flash.read_byte(0x10).unwrap(), 0xFF);
        flash.write_status(0x5C).unwrap();
        assert_eq!(flash.read_status().unwrap(), 0x00);
        flash.write_nvcr(0x1234).unwrap();
        assert_eq!(flash.read_nvcr().unwrap(), 0xFFFF);
    }

    #[test]
    fn test_latch_is_consumed_by_each_mutation() {
        let mut flash = flash();
        flash.write_enable().unwrap();
        flash.write_byte(0x10, 0x00).unwrap();
        // The latch was consumed; a second program without WREN is dropped.
        flash.write_byte(0x11, 0x00).unwrap();
        assert_eq!(flash.read_byte(0x10).unwrap(), 0x00);
        assert_eq!(flash.read_byte(0x11).unwrap(), 0xFF);
    }

    #[test]
    fn test_programming_only_clears_bits() {
        let mut flash = flash();
        flash.write_enable().unwrap();
        flash.write_byte(0x20, 0x0F).unwrap();
        flash.write_enable().unwrap();
        flash.write_byte(0x20, 0xF0).unwrap();
        assert_eq!(flash.read_byte(0x20).unwrap(), 0x00);
    }

    #[test]
    fn test_sector_erase_restores_erased_state() {
        let mut flash = flash();
        flash.program(0x001000, &[0x12, 0x34]).unwrap();
        assert_eq!(flash.read_byte(0x001000).unwrap(), 0x12);

        flash.write_enable().unwrap();
        flash.erase_sector(0x001000).unwrap();
        assert_eq!(flash.read_byte(0x001000).unwrap(), 0xFF);
        assert_eq!(flash.read_byte(0x001001).unwrap(), 0xFF);
    }

    #[test]
    fn test_bulk_erase_clears_whole_array() {
        let mut flash = flash();
        flash.program(0x000000, &[0x00]).unwrap();
        flash.program(0xFFFFFF, &[0x00]).unwrap();
        flash.write_enable().unwrap();
        flash.erase_bulk().unwrap();
        let bus = flash.into_bus();
        assert!(bus.data().iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn test_program_and_read_into() {
        let mut flash = flash();
        let data = [0xDE, 0xAD, 0xBE, 0xEF];
        flash.program(0x0100, &data).unwrap();
        let mut buf = [0u8; 4];
        flash.read_into(0x0100, &mut buf).unwrap();
        assert_eq!(buf, data);
    }

    #[test]
    fn test_stuck_device_times_out_within_deadline() {
        let mut bus = SimBus::default();
        bus.set_stuck(true);
        let timeout = Duration::from_millis(10);
        let mut flash = SpiFlash::new(bus).with_timeout(timeout);
        let started = std::time::Instant::now();
        assert!(matches!(
            flash.read_id(),
            Err(Error::DeviceTimeout(t)) if t == timeout
        ));
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_unknown_opcode_answers_zero() {
        let mut flash = flash();
        let response = flash.transfer(8, 0xABu64 << 32).unwrap();
        assert_eq!(response, 0);
    }

    #[test]
    fn test_unknown_register_is_reported() {
        let mut bus = SimBus::default();
        assert!(matches!(
            bus.read("spiflash_spi_mois"),
            Err(Error::UnknownRegister(_))
        ));
        assert!(matches!(
            bus.write("no_such_reg", 1),
            Err(Error::UnknownRegister(_))
        ));
    }

    #[test]
    fn test_gpio_pulse_leaves_pin_low() {
        let mut bus = SimBus::default();
        let mut pin = OutputPin::new(&mut bus, gpio::POWER_SWITCH);
        pin.pulse(Duration::from_micros(1)).unwrap();
        drop(pin);
        assert_eq!(bus.reg(gpio::POWER_SWITCH), Some(0));
    }

    #[test]
    fn test_led_toggle_round_trip() {
        let mut bus = SimBus::default();
        let mut leds = Leds::new(&mut bus);
        leds.toggle().unwrap();
        drop(leds);
        assert_eq!(bus.reg(led::LED_OUT), Some(0xFFFF_FFFF));
    }

    #[test]
    fn test_servo_setup_against_sim() {
        let mut bus = SimBus::default();
        let mut servo = Servo::new(&mut bus, 1, 50_000_000);
        servo.configure().unwrap();
        servo.set_position(0).unwrap();
        servo.enable().unwrap();
        drop(servo);
        assert_eq!(bus.reg("servo1_period"), Some(1_000_000));
        // 0 % is the 1 ms end of the travel.
        assert_eq!(bus.reg("servo1_width"), Some(50_000));
        assert_eq!(bus.reg("servo1_enable"), Some(1));
    }
}
