//! Periodic timer periods, in microseconds like the ESP timer API.

use embassy_time::Duration;

pub const HALF_SECOND: u64 = 500_000;
pub const ONE_SECOND: u64 = 1_000_000;
pub const FIVE_SECOND: u64 = 5_000_000;
pub const THIRTY_SECOND: u64 = 30_000_000;
pub const ONE_MINUTE: u64 = 60_000_000;
pub const FIVE_MINUTE: u64 = 300_000_000;
pub const TEN_MINUTE: u64 = 600_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerPeriod {
    HalfSecond,
    OneSecond,
    FiveSeconds,
    ThirtySeconds,
    OneMinute,
    FiveMinutes,
    TenMinutes,
}

impl TimerPeriod {
    pub const fn micros(self) -> u64 {
        match self {
            Self::HalfSecond => HALF_SECOND,
            Self::OneSecond => ONE_SECOND,
            Self::FiveSeconds => FIVE_SECOND,
            Self::ThirtySeconds => THIRTY_SECOND,
            Self::OneMinute => ONE_MINUTE,
            Self::FiveMinutes => FIVE_MINUTE,
            Self::TenMinutes => TEN_MINUTE,
        }
    }

    pub const fn duration(self) -> Duration {
        Duration::from_micros(self.micros())
    }
}
