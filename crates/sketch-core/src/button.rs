//! Push-button input with pull polarity and a time-based debouncer.

use embedded_hal::digital::InputPin;
use embassy_time::Duration;

/// Settle time before sampling the button in the polling demo.
pub const DEBOUNCE_DELAY: Duration = Duration::from_millis(10);
/// Interval between button samples in the polling demo.
pub const POLL_PERIOD: Duration = Duration::from_millis(100);

const DEFAULT_DEBOUNCE_MS: u64 = 10;

/// Internal pull resistor the button is wired against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pull {
    Up,
    Down,
}

/// Interrupt edge that corresponds to a press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptEdge {
    Falling,
    Rising,
}

impl InterruptEdge {
    /// Edge seen when the button is let go again.
    pub const fn opposite(self) -> Self {
        match self {
            Self::Falling => Self::Rising,
            Self::Rising => Self::Falling,
        }
    }
}

pub struct Button<P> {
    pin: P,
    pull: Pull,
}

impl<P: InputPin> Button<P> {
    pub fn new(pin: P, pull: Pull) -> Self {
        Self { pin, pull }
    }

    /// Raw pin level: `0` low, `1` high.
    pub fn read_level(&mut self) -> Result<u8, P::Error> {
        Ok(self.pin.is_high()? as u8)
    }

    /// A pull-up button reads low when pressed, a pull-down one reads high.
    pub fn is_pressed(&mut self) -> Result<bool, P::Error> {
        match self.pull {
            Pull::Up => self.pin.is_low(),
            Pull::Down => self.pin.is_high(),
        }
    }

    /// The underlying pin, for waiting on edges.
    pub fn pin_mut(&mut self) -> &mut P {
        &mut self.pin
    }

    /// Edge to arm for interrupt-driven use.
    pub fn interrupt_edge(&self) -> InterruptEdge {
        match self.pull {
            Pull::Up => InterruptEdge::Falling,
            Pull::Down => InterruptEdge::Rising,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Pressed,
    Released,
}

/// Reports a press or release once the raw sample has held steady for the
/// debounce window. Timestamps are milliseconds from any monotonic source.
pub struct Debouncer {
    window_ms: u64,
    stable: bool,
    candidate: bool,
    candidate_since: u64,
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE_MS)
    }
}

impl Debouncer {
    pub const fn new(window_ms: u64) -> Self {
        Self {
            window_ms,
            stable: false,
            candidate: false,
            candidate_since: 0,
        }
    }

    pub fn update(&mut self, pressed: bool, now_ms: u64) -> Option<Edge> {
        if pressed != self.candidate {
            self.candidate = pressed;
            self.candidate_since = now_ms;
        }

        let settled = now_ms.saturating_sub(self.candidate_since) >= self.window_ms;
        if settled && self.candidate != self.stable {
            self.stable = self.candidate;
            return Some(if self.stable {
                Edge::Pressed
            } else {
                Edge::Released
            });
        }
        None
    }

    pub fn is_pressed(&self) -> bool {
        self.stable
    }

    pub fn is_debouncing(&self) -> bool {
        self.candidate != self.stable
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakePin;

    #[test]
    fn pull_up_button_is_pressed_when_low() {
        let (pin, level) = FakePin::input(true);
        let mut button = Button::new(pin, Pull::Up);
        assert!(!button.is_pressed().unwrap());
        assert_eq!(button.read_level().unwrap(), 1);

        *level.borrow_mut() = false;
        assert!(button.is_pressed().unwrap());
        assert_eq!(button.read_level().unwrap(), 0);
    }

    #[test]
    fn pull_down_button_is_pressed_when_high() {
        let (pin, level) = FakePin::input(false);
        let mut button = Button::new(pin, Pull::Down);
        assert!(!button.is_pressed().unwrap());
        *level.borrow_mut() = true;
        assert!(button.is_pressed().unwrap());
    }

    #[test]
    fn interrupt_edge_follows_pull() {
        let (up, _) = FakePin::input(true);
        let (down, _) = FakePin::input(false);
        assert_eq!(
            Button::new(up, Pull::Up).interrupt_edge(),
            InterruptEdge::Falling
        );
        assert_eq!(
            Button::new(down, Pull::Down).interrupt_edge(),
            InterruptEdge::Rising
        );
        assert_eq!(InterruptEdge::Falling.opposite(), InterruptEdge::Rising);
    }

    #[test]
    fn debouncer_ignores_bounces_shorter_than_window() {
        let mut d = Debouncer::new(10);
        assert_eq!(d.update(true, 0), None);
        assert_eq!(d.update(false, 3), None);
        assert_eq!(d.update(true, 5), None);
        assert!(d.is_debouncing());
        assert_eq!(d.update(true, 14), None);
        assert_eq!(d.update(true, 15), Some(Edge::Pressed));
        assert!(d.is_pressed());
    }

    #[test]
    fn debouncer_reports_release_once() {
        let mut d = Debouncer::new(10);
        d.update(true, 0);
        assert_eq!(d.update(true, 10), Some(Edge::Pressed));
        assert_eq!(d.update(true, 20), None);
        assert_eq!(d.update(false, 30), None);
        assert_eq!(d.update(false, 40), Some(Edge::Released));
        assert_eq!(d.update(false, 50), None);
    }
}
