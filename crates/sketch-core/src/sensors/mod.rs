//! I2C sensor drivers and the events their polling tasks publish.

#[cfg(feature = "sensor-bmp180")]
pub mod bmp180;
mod datetime;
#[cfg(feature = "sensor-ds3231")]
pub mod ds3231;

pub use datetime::{DateTime, Weekday};

use serde::{Deserialize, Serialize};
use thiserror_no_std::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    #[error("{sensor} initialization failed: {details}")]
    InitializationFailed {
        sensor: &'static str,
        details: &'static str,
    },
    #[error("{sensor} read failed ({operation}): {details}")]
    ReadFailed {
        sensor: &'static str,
        operation: &'static str,
        details: &'static str,
    },
    #[error("{sensor} write failed ({operation})")]
    WriteFailed {
        sensor: &'static str,
        operation: &'static str,
    },
    #[error("{sensor} returned invalid data: {details}")]
    InvalidData {
        sensor: &'static str,
        details: &'static str,
    },
    #[error("invalid argument: {details}")]
    InvalidArgument { details: &'static str },
}

/// Trait for sensors that produce typed readings.
pub trait Sensor {
    type Reading;

    fn read(&mut self) -> impl Future<Output = Result<Self::Reading, SensorError>>;
}

/// Barometer sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PressureReading {
    /// Tenths of a degree Celsius.
    pub temperature_decicelsius: i32,
    pub pressure_pa: u32,
}

impl PressureReading {
    pub fn temperature_celsius(&self) -> f32 {
        self.temperature_decicelsius as f32 / 10.0
    }
}

/// Message carried on the sensor queues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorEvent {
    Pressure(PressureReading),
    Clock(DateTime),
}

impl SensorEvent {
    pub const fn source(&self) -> &'static str {
        match self {
            Self::Pressure(_) => "BMP180",
            Self::Clock(_) => "DS3231",
        }
    }
}
