//! Single-LED driver with tracked on/off state.

use embedded_hal::digital::OutputPin;
use embassy_time::Duration;

/// Onboard LED (GPIO2) blink half-period.
pub const ONBOARD_BLINK: Duration = Duration::from_millis(1000);
/// External LED (GPIO4) blink half-period.
pub const EXTERNAL_BLINK: Duration = Duration::from_millis(500);
/// Toggle task period.
pub const TOGGLE_PERIOD: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedState {
    Off,
    On,
}

impl LedState {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Off => "LED is off...",
            Self::On => "LED is on!",
        }
    }
}

/// An LED on an output pin. Active high.
pub struct Led<P> {
    pin: P,
    state: LedState,
}

impl<P: OutputPin> Led<P> {
    /// Take the pin, drive it low and start in [`LedState::Off`].
    pub fn new(mut pin: P) -> Result<Self, P::Error> {
        pin.set_low()?;
        Ok(Self {
            pin,
            state: LedState::Off,
        })
    }

    pub fn on(&mut self) -> Result<(), P::Error> {
        self.pin.set_high()?;
        self.state = LedState::On;
        Ok(())
    }

    pub fn off(&mut self) -> Result<(), P::Error> {
        self.pin.set_low()?;
        self.state = LedState::Off;
        Ok(())
    }

    /// Flip the LED and return the new state.
    pub fn toggle(&mut self) -> Result<LedState, P::Error> {
        match self.state {
            LedState::Off => self.on()?,
            LedState::On => self.off()?,
        }
        Ok(self.state)
    }

    /// Drive the LED to match `on`.
    pub fn set(&mut self, on: bool) -> Result<(), P::Error> {
        if on { self.on() } else { self.off() }
    }

    pub fn state(&self) -> LedState {
        self.state
    }

    pub fn is_on(&self) -> bool {
        self.state == LedState::On
    }

    pub fn release(self) -> P {
        self.pin
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakePin, pin_log};

    #[test]
    fn new_led_starts_off_and_low() {
        let log = pin_log();
        let led = Led::new(FakePin::new(15, &log)).unwrap();
        assert_eq!(led.state(), LedState::Off);
        assert_eq!(*log.borrow(), [(15, false)]);
    }

    #[test]
    fn toggle_alternates_state_and_level() {
        let log = pin_log();
        let mut led = Led::new(FakePin::new(2, &log)).unwrap();

        assert_eq!(led.toggle().unwrap(), LedState::On);
        assert_eq!(led.toggle().unwrap(), LedState::Off);
        assert_eq!(led.toggle().unwrap(), LedState::On);
        assert!(led.is_on());

        let levels: Vec<bool> = log.borrow().iter().map(|(_, l)| *l).collect();
        assert_eq!(levels, [false, true, false, true]);
    }

    #[test]
    fn state_labels_match_console_output() {
        assert_eq!(LedState::On.label(), "LED is on!");
        assert_eq!(LedState::Off.label(), "LED is off...");
    }
}
