//! Drivers for the non-flash board peripherals: output pins, the LED bank
//! and the PWM servo channels. All of them are thin layers over
//! [`RegisterBus`](crate::bus::RegisterBus) CSRs and hold no state of
//! their own.

pub mod gpio;
pub mod led;
pub mod servo;

pub use gpio::OutputPin;
pub use led::Leds;
pub use servo::Servo;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::RegisterBus;
    use crate::error::{Error, Result};
    use std::collections::HashMap;
    use std::time::Duration;

    /// Register file that keeps current values and the full write log.
    #[derive(Default)]
    struct RecordBus {
        values: HashMap<String, u64>,
        log: Vec<(String, u64)>,
    }

    impl RegisterBus for RecordBus {
        fn read(&mut self, reg: &str) -> Result<u64> {
            self.values
                .get(reg)
                .copied()
                .ok_or_else(|| Error::UnknownRegister(reg.into()))
        }

        fn write(&mut self, reg: &str, value: u64) -> Result<()> {
            self.values.insert(reg.to_string(), value);
            self.log.push((reg.to_string(), value));
            Ok(())
        }
    }

    #[test]
    fn test_pulse_is_rising_then_falling_edge() {
        let mut bus = RecordBus::default();
        let mut pin = OutputPin::new(&mut bus, gpio::POWER_SWITCH);
        pin.pulse(Duration::from_micros(1)).unwrap();
        drop(pin);
        assert_eq!(
            bus.log,
            vec![
                (gpio::POWER_SWITCH.to_string(), 1),
                (gpio::POWER_SWITCH.to_string(), 0),
            ]
        );
    }

    #[test]
    fn test_reset_switch_uses_its_own_register() {
        let mut bus = RecordBus::default();
        let mut pin = OutputPin::new(&mut bus, gpio::RESET_SWITCH);
        pin.set_high().unwrap();
        pin.set_low().unwrap();
        drop(pin);
        assert!(bus.log.iter().all(|(reg, _)| reg == gpio::RESET_SWITCH));
    }

    #[test]
    fn test_led_toggle_writes_complement() {
        let mut bus = RecordBus::default();
        bus.values.insert(led::LED_OUT.to_string(), 0x0F);
        let mut leds = Leds::new(&mut bus);
        leds.toggle().unwrap();
        drop(leds);
        assert_eq!(bus.values[led::LED_OUT], !0x0Fu64 & 0xFFFF_FFFF);
    }

    #[test]
    fn test_blink_toggles_count_times() {
        let mut bus = RecordBus::default();
        bus.values.insert(led::LED_OUT.to_string(), 0);
        let mut leds = Leds::new(&mut bus);
        leds.blink(4, Duration::from_micros(1)).unwrap();
        drop(leds);
        assert_eq!(bus.log.len(), 4);
        // Even toggle count returns the bank to its initial value.
        assert_eq!(bus.values[led::LED_OUT], 0);
    }

    #[test]
    fn test_servo_width_for_midpoint_position() {
        let mut bus = RecordBus::default();
        let mut servo = Servo::new(&mut bus, 0, 50_000_000);
        servo.configure().unwrap();
        servo.set_position(50).unwrap();
        servo.enable().unwrap();
        drop(servo);
        // 20 ms frame at 50 MHz is 1_000_000 ticks; 50 % maps to 1.5 ms.
        assert_eq!(bus.values["servo0_period"], 1_000_000);
        assert_eq!(bus.values["servo0_width"], 75_000);
        assert_eq!(bus.values["servo0_enable"], 1);
    }

    #[test]
    fn test_servo_position_is_clamped() {
        let mut bus = RecordBus::default();
        let mut servo = Servo::new(&mut bus, 2, 50_000_000);
        servo.set_position(250).unwrap();
        drop(servo);
        // Clamped to 100 % = 2 ms pulse.
        assert_eq!(bus.values["servo2_width"], 100_000);
    }
}
