//! Command implementations

use std::path::Path;

use indicatif::ProgressBar;
use litectl_core::board::{gpio, led, Leds, OutputPin, Servo};
use litectl_core::flash::{self, SpiFlash};
use litectl_core::spi::opcodes::StatusFlags;
use litectl_core::RegisterBus;

type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Show a progress bar only for reads long enough to take a while: the
/// bus moves one byte per transaction.
const PROGRESS_THRESHOLD: u32 = 256;

/// Parse a plain hex string ("deadbeef") into bytes.
pub fn parse_hex_bytes(s: &str) -> Result<Vec<u8>, String> {
    if !s.is_ascii() || s.len() % 2 != 0 {
        return Err("hex data must be an even number of hex digits".to_string());
    }
    (0..s.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&s[i..i + 2], 16).map_err(|e| format!("invalid hex data: {}", e))
        })
        .collect()
}

pub fn run_id<B: RegisterBus>(flash: &mut SpiFlash<B>) -> CmdResult {
    let id = flash.read_id()?;
    println!("JEDEC id: 0x{:06x}", id);
    Ok(())
}

pub fn run_status<B: RegisterBus>(flash: &mut SpiFlash<B>) -> CmdResult {
    let status = flash.read_status()?;
    let flags = StatusFlags::from_bits_retain(status);
    println!("status: 0x{:02x} ({:?})", status, flags);
    Ok(())
}

pub fn run_read<B: RegisterBus>(
    flash: &mut SpiFlash<B>,
    addr: u32,
    len: u32,
    output: Option<&Path>,
) -> CmdResult {
    let mut buf = vec![0u8; len as usize];
    let pb = if len >= PROGRESS_THRESHOLD {
        ProgressBar::new(u64::from(len))
    } else {
        ProgressBar::hidden()
    };
    for (i, byte) in buf.iter_mut().enumerate() {
        *byte = flash.read_byte(addr + i as u32)?;
        pb.inc(1);
    }
    pb.finish_and_clear();

    match output {
        Some(path) => {
            std::fs::write(path, &buf)?;
            println!("{} bytes written to {}", buf.len(), path.display());
        }
        None => {
            for (i, chunk) in buf.chunks(16).enumerate() {
                let line: Vec<String> = chunk.iter().map(|b| format!("{:02x}", b)).collect();
                println!("{:08x}: {}", addr as usize + i * 16, line.join(" "));
            }
        }
    }
    Ok(())
}

pub fn run_write<B: RegisterBus>(flash: &mut SpiFlash<B>, addr: u32, data: &str) -> CmdResult {
    let bytes = parse_hex_bytes(data)?;
    flash.program(addr, &bytes)?;
    println!("{} bytes programmed at 0x{:06x}", bytes.len(), addr);
    Ok(())
}

pub fn run_erase<B: RegisterBus>(
    flash: &mut SpiFlash<B>,
    addr: Option<u32>,
    bulk: bool,
) -> CmdResult {
    if bulk {
        flash.write_enable()?;
        flash.erase_bulk()?;
        flash.wait_idle(flash::ERASE_POLL, flash::BULK_ERASE_TIMEOUT)?;
        println!("device erased");
        return Ok(());
    }
    match addr {
        Some(addr) => {
            flash.write_enable()?;
            flash.erase_sector(addr)?;
            flash.wait_idle(flash::ERASE_POLL, flash::ERASE_TIMEOUT)?;
            println!("sector at 0x{:06x} erased", addr);
            Ok(())
        }
        None => Err("erase needs an address or --bulk".into()),
    }
}

pub fn run_lock_read<B: RegisterBus>(flash: &mut SpiFlash<B>, addr: u32) -> CmdResult {
    println!("lock: 0x{:02x}", flash.read_sector_lock(addr)?);
    Ok(())
}

pub fn run_lock_write<B: RegisterBus>(flash: &mut SpiFlash<B>, addr: u32, value: u8) -> CmdResult {
    flash.write_enable()?;
    flash.write_sector_lock(addr, value)?;
    println!("lock byte for sector at 0x{:06x} set to 0x{:02x}", addr, value);
    Ok(())
}

pub fn run_nvcr_read<B: RegisterBus>(flash: &mut SpiFlash<B>) -> CmdResult {
    println!("nvcr: 0x{:04x}", flash.read_nvcr()?);
    Ok(())
}

pub fn run_nvcr_write<B: RegisterBus>(flash: &mut SpiFlash<B>, value: u16) -> CmdResult {
    flash.write_enable()?;
    flash.write_nvcr(value)?;
    println!("nvcr set to 0x{:04x}", value);
    Ok(())
}

pub fn run_blink<B: RegisterBus>(bus: B, count: u32) -> CmdResult {
    println!("Blinking LEDs...");
    Leds::new(bus).blink(count, led::BLINK_PERIOD)?;
    Ok(())
}

pub fn run_power_on<B: RegisterBus>(bus: B) -> CmdResult {
    println!("Power on...");
    OutputPin::new(bus, gpio::POWER_SWITCH).pulse(gpio::POWER_ON_PULSE)?;
    Ok(())
}

pub fn run_power_off<B: RegisterBus>(bus: B) -> CmdResult {
    println!("Power off...");
    OutputPin::new(bus, gpio::POWER_SWITCH).pulse(gpio::POWER_OFF_HOLD)?;
    Ok(())
}

pub fn run_reboot<B: RegisterBus>(bus: B) -> CmdResult {
    println!("Reboot...");
    OutputPin::new(bus, gpio::RESET_SWITCH).pulse(gpio::RESET_PULSE)?;
    Ok(())
}

pub fn run_servo<B: RegisterBus>(
    bus: B,
    index: u8,
    position: Option<u8>,
    off: bool,
    sys_clk_hz: u32,
) -> CmdResult {
    let mut servo = Servo::new(bus, index, sys_clk_hz);
    if off {
        servo.disable()?;
        println!("servo {} disabled", index);
    } else {
        let position = position.unwrap_or(50);
        servo.configure()?;
        servo.set_position(position)?;
        servo.enable()?;
        println!("servo {} at {} %", index, position);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_bytes() {
        assert_eq!(parse_hex_bytes("deadbeef").unwrap(), vec![0xDE, 0xAD, 0xBE, 0xEF]);
        assert!(parse_hex_bytes("abc").is_err());
        assert!(parse_hex_bytes("zz").is_err());
    }
}
