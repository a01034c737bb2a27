//! Battery level through a resistor divider on an ADC1 channel.
//!
//! The cell is measured through R2 = 100k over R3 = 10k, so the ADC sees
//! one eleventh of the cell voltage. A GPIO enables the divider only while
//! measuring.

use embedded_hal::digital::OutputPin;
use log::error;
use serde::{Deserialize, Serialize};
use thiserror_no_std::Error;

/// Divider high side, kOhm.
const R2: i32 = 100;
/// Divider low side, kOhm.
const R3: i32 = 10;

/// Empty cell, mV.
pub const V_MIN_MV: i32 = 3300;
/// Full cell, mV.
pub const V_MAX_MV: i32 = 4200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Attenuation {
    Db0,
    Db2_5,
    Db6,
    Db11,
}

impl Attenuation {
    /// Full-scale input voltage for this attenuation, mV.
    pub const fn full_scale_mv(self) -> i32 {
        match self {
            Self::Db0 => 800,
            Self::Db2_5 => 1100,
            Self::Db6 => 1350,
            Self::Db11 => 2600,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Width {
    Bits9,
    Bits10,
    Bits11,
    Bits12,
}

impl Width {
    /// Number of codes the converter produces.
    pub const fn resolution(self) -> i32 {
        match self {
            Self::Bits9 => 512,
            Self::Bits10 => 1024,
            Self::Bits11 => 2048,
            Self::Bits12 => 4096,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatteryConfig {
    /// ADC1 channel number.
    pub adc_channel: u8,
    pub width: Width,
    pub attenuation: Attenuation,
    /// GPIO that switches the divider on.
    pub enable_pin: u8,
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self {
            adc_channel: 7,
            width: Width::Bits12,
            attenuation: Attenuation::Db2_5,
            enable_pin: 26,
        }
    }
}

impl BatteryConfig {
    /// Cell voltage after the divider, mV.
    pub const fn divided_mv(vin_mv: i32) -> i32 {
        (vin_mv * R3) / (R2 + R3)
    }

    /// ADC code expected for `mv` at the ADC pin.
    pub const fn mv_to_raw(&self, mv: i32) -> i32 {
        (mv * self.width.resolution()) / self.attenuation.full_scale_mv()
    }

    /// ADC code to voltage at the ADC pin, mV.
    pub const fn raw_to_mv(&self, raw: i32) -> i32 {
        (raw * self.attenuation.full_scale_mv()) / self.width.resolution()
    }

    /// Charge estimate for a raw reading, clamped to 0..=100.
    pub fn percentage(&self, raw: i32) -> u8 {
        let empty = self.mv_to_raw(Self::divided_mv(V_MIN_MV));
        let full = self.mv_to_raw(Self::divided_mv(V_MAX_MV));
        let percent = 100 * (raw - empty) / (full - empty);
        percent.clamp(0, 100) as u8
    }
}

/// One-shot raw ADC conversion on a configured channel.
pub trait RawAdc {
    type Error: core::fmt::Debug;

    fn read_raw(&mut self) -> Result<u16, Self::Error>;
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatteryError {
    #[error("battery enable pin write failed")]
    EnablePin,
    #[error("battery ADC conversion failed")]
    Adc,
}

pub struct Battery<A, P> {
    config: BatteryConfig,
    adc: A,
    enable: P,
    value: u16,
}

impl<A, P> Battery<A, P>
where
    A: RawAdc,
    P: OutputPin,
{
    /// The divider starts switched off.
    pub fn new(config: BatteryConfig, adc: A, mut enable: P) -> Result<Self, BatteryError> {
        enable.set_low().map_err(log_pin_error)?;
        Ok(Self {
            config,
            adc,
            enable,
            value: 0,
        })
    }

    pub fn enable(&mut self) -> Result<(), BatteryError> {
        self.enable.set_high().map_err(log_pin_error)
    }

    pub fn disable(&mut self) -> Result<(), BatteryError> {
        self.enable.set_low().map_err(log_pin_error)
    }

    /// Convert once and remember the raw value.
    pub fn read(&mut self) -> Result<u16, BatteryError> {
        self.value = self.adc.read_raw().map_err(|e| {
            error!("Battery ADC read failed: {:?}", e);
            BatteryError::Adc
        })?;
        Ok(self.value)
    }

    /// Switch the divider on, convert, and switch it off again.
    pub fn measure(&mut self) -> Result<u8, BatteryError> {
        self.enable()?;
        let read = self.read();
        self.disable()?;
        read?;
        Ok(self.percentage())
    }

    /// Charge estimate for the last raw value.
    pub fn percentage(&self) -> u8 {
        self.config.percentage(i32::from(self.value))
    }

    pub fn value(&self) -> u16 {
        self.value
    }

    /// Cell voltage of the last raw value, mV.
    pub fn cell_mv(&self) -> i32 {
        self.config.raw_to_mv(i32::from(self.value)) * (R2 + R3) / R3
    }

    pub fn config(&self) -> &BatteryConfig {
        &self.config
    }
}

fn log_pin_error<E: core::fmt::Debug>(e: E) -> BatteryError {
    error!("Battery enable pin failed: {:?}", e);
    BatteryError::EnablePin
}
