//! Task timing and bus settings for the demo board.
//!
//! A `BoardConfig` can be stored as a postcard blob (e.g. `BOARD.CFG` on the
//! SD card) to override the defaults. Pin assignments are not part of the
//! record: the firmware binds concrete GPIO peripherals at compile time.

use embassy_time::Duration;
use serde::{Deserialize, Serialize};
use thiserror_no_std::Error;

use crate::battery::BatteryConfig;
use crate::button::POLL_PERIOD;
use crate::led::{EXTERNAL_BLINK, ONBOARD_BLINK, TOGGLE_PERIOD};
use crate::timer::TimerPeriod;

/// Largest encoded `BoardConfig`.
pub const MAX_ENCODED_SIZE: usize = 64;

/// Task periods in milliseconds.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Periods {
    pub onboard_blink_ms: u32,
    pub external_blink_ms: u32,
    pub toggle_ms: u32,
    pub button_poll_ms: u32,
    pub lcd_refresh_ms: u32,
    pub bmp180_ms: u32,
    pub ds3231_ms: u32,
    pub battery_ms: u32,
}

fn millis(d: Duration) -> u32 {
    u32::try_from(d.as_millis()).unwrap_or(u32::MAX)
}

impl Default for Periods {
    fn default() -> Self {
        Self {
            onboard_blink_ms: millis(ONBOARD_BLINK),
            external_blink_ms: millis(EXTERNAL_BLINK),
            toggle_ms: millis(TOGGLE_PERIOD),
            button_poll_ms: millis(POLL_PERIOD),
            lcd_refresh_ms: 1000,
            bmp180_ms: 500,
            ds3231_ms: 1000,
            battery_ms: millis(TimerPeriod::FiveSeconds.duration()),
        }
    }
}

impl Periods {
    pub fn onboard_blink(&self) -> Duration {
        Duration::from_millis(self.onboard_blink_ms.into())
    }

    pub fn external_blink(&self) -> Duration {
        Duration::from_millis(self.external_blink_ms.into())
    }

    pub fn toggle(&self) -> Duration {
        Duration::from_millis(self.toggle_ms.into())
    }

    pub fn button_poll(&self) -> Duration {
        Duration::from_millis(self.button_poll_ms.into())
    }

    pub fn lcd_refresh(&self) -> Duration {
        Duration::from_millis(self.lcd_refresh_ms.into())
    }

    pub fn bmp180(&self) -> Duration {
        Duration::from_millis(self.bmp180_ms.into())
    }

    pub fn ds3231(&self) -> Duration {
        Duration::from_millis(self.ds3231_ms.into())
    }

    /// Interval of the periodic timer that drives battery measurements.
    pub fn battery(&self) -> Duration {
        Duration::from_millis(self.battery_ms.into())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardConfig {
    pub periods: Periods,
    pub battery: BatteryConfig,
    /// I2C clock, kHz.
    pub i2c_khz: u32,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("config buffer too small")]
    BufferTooSmall,
    #[error("config blob is corrupt")]
    Corrupt,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            periods: Periods::default(),
            battery: BatteryConfig::default(),
            i2c_khz: 100,
        }
    }
}

impl BoardConfig {
    pub fn to_bytes<'b>(&self, buf: &'b mut [u8]) -> Result<&'b mut [u8], ConfigError> {
        postcard::to_slice(self, buf).map_err(|_| ConfigError::BufferTooSmall)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ConfigError> {
        postcard::from_bytes(bytes).map_err(|_| ConfigError::Corrupt)
    }
}
