//! Maxim DS3231 real-time clock.
//!
//! Time is kept in BCD registers 0x00..0x06. The driver always writes in 24
//! hour mode but decodes either mode, since the clock may have been set by
//! other firmware.

use embedded_hal_async::i2c::I2c;
use log::{error, warn};

use super::{DateTime, Sensor, SensorError, Weekday};

pub const ADDRESS: u8 = 0x68;

const REG_TIME: u8 = 0x00;
const REG_STATUS: u8 = 0x0F;
const REG_TEMPERATURE: u8 = 0x11;

const HOUR_12H: u8 = 0x40;
const HOUR_PM: u8 = 0x20;
const MONTH_CENTURY: u8 = 0x80;
const STATUS_OSF: u8 = 0x80;

const SENSOR: &str = "DS3231";

pub const fn bcd_to_bin(bcd: u8) -> u8 {
    (bcd >> 4) * 10 + (bcd & 0x0F)
}

/// `bin` must be below 100.
pub const fn bin_to_bcd(bin: u8) -> u8 {
    ((bin / 10) << 4) | (bin % 10)
}

/// Decode the hours register in either 12 or 24 hour mode.
pub const fn decode_hours(reg: u8) -> u8 {
    if reg & HOUR_12H != 0 {
        let hour = bcd_to_bin(reg & 0x1F);
        let pm = reg & HOUR_PM != 0;
        match (hour, pm) {
            (12, false) => 0,
            (12, true) => 12,
            (h, true) => h + 12,
            (h, false) => h,
        }
    } else {
        bcd_to_bin(reg & 0x3F)
    }
}

/// Decode the seven time registers.
pub fn decode_datetime(regs: &[u8; 7]) -> Result<DateTime, SensorError> {
    let seconds = bcd_to_bin(regs[0] & 0x7F);
    let minutes = bcd_to_bin(regs[1] & 0x7F);
    let hours = decode_hours(regs[2]);
    let day = bcd_to_bin(regs[4] & 0x3F);
    let month = bcd_to_bin(regs[5] & 0x1F);
    let century = if regs[5] & MONTH_CENTURY != 0 { 100 } else { 0 };
    let year = 2000 + century + u16::from(bcd_to_bin(regs[6]));

    DateTime::validate(year, month, day, hours, minutes, seconds).map_err(|e| {
        warn!("DS3231 registers {:02X?} do not hold a valid time", regs);
        match e {
            SensorError::InvalidArgument { details } => SensorError::InvalidData {
                sensor: SENSOR,
                details,
            },
            other => other,
        }
    })?;

    let weekday = Weekday::from_number(regs[3] & 0x07)
        .unwrap_or_else(|| Weekday::for_date(year, month, day));
    Ok(DateTime {
        year,
        month,
        day,
        weekday,
        hours,
        minutes,
        seconds,
    })
}

/// Encode a time into the seven time registers, 24 hour mode.
pub fn encode_datetime(dt: &DateTime) -> Result<[u8; 7], SensorError> {
    DateTime::validate(dt.year, dt.month, dt.day, dt.hours, dt.minutes, dt.seconds)?;
    let offset = dt.year - 2000;
    let century = if offset >= 100 { MONTH_CENTURY } else { 0 };
    Ok([
        bin_to_bcd(dt.seconds),
        bin_to_bcd(dt.minutes),
        bin_to_bcd(dt.hours),
        dt.weekday.number(),
        bin_to_bcd(dt.day),
        bin_to_bcd(dt.month) | century,
        bin_to_bcd((offset % 100) as u8),
    ])
}

/// Temperature registers to quarter degrees Celsius.
pub const fn decode_temperature(msb: u8, lsb: u8) -> i16 {
    ((msb as i8 as i16) << 2) | (lsb >> 6) as i16
}

pub struct Ds3231<I> {
    i2c: I,
}

impl<I: I2c> Ds3231<I> {
    pub fn new(i2c: I) -> Self {
        Self { i2c }
    }

    pub fn release(self) -> I {
        self.i2c
    }

    pub async fn datetime(&mut self) -> Result<DateTime, SensorError> {
        let mut regs = [0u8; 7];
        self.read_registers(REG_TIME, &mut regs, "read time").await?;
        decode_datetime(&regs)
    }

    pub async fn set_datetime(&mut self, dt: &DateTime) -> Result<(), SensorError> {
        let regs = encode_datetime(dt)?;
        let mut frame = [0u8; 8];
        frame[0] = REG_TIME;
        frame[1..].copy_from_slice(&regs);
        self.i2c.write(ADDRESS, &frame).await.map_err(|e| {
            error!("DS3231 set time failed: {:?}", e);
            SensorError::WriteFailed {
                sensor: SENSOR,
                operation: "set time",
            }
        })
    }

    /// Die temperature in degrees Celsius, 0.25 C resolution.
    pub async fn temperature(&mut self) -> Result<f32, SensorError> {
        let mut raw = [0u8; 2];
        self.read_registers(REG_TEMPERATURE, &mut raw, "read temperature")
            .await?;
        Ok(f32::from(decode_temperature(raw[0], raw[1])) * 0.25)
    }

    /// True when the oscillator stopped since the flag was last cleared,
    /// meaning the time registers cannot be trusted.
    pub async fn oscillator_stopped(&mut self) -> Result<bool, SensorError> {
        Ok(self.status().await? & STATUS_OSF != 0)
    }

    pub async fn clear_oscillator_stopped(&mut self) -> Result<(), SensorError> {
        let status = self.status().await?;
        self.i2c
            .write(ADDRESS, &[REG_STATUS, status & !STATUS_OSF])
            .await
            .map_err(|e| {
                error!("DS3231 clear OSF failed: {:?}", e);
                SensorError::WriteFailed {
                    sensor: SENSOR,
                    operation: "clear oscillator stop flag",
                }
            })
    }

    async fn status(&mut self) -> Result<u8, SensorError> {
        let mut status = [0u8; 1];
        self.read_registers(REG_STATUS, &mut status, "read status")
            .await?;
        Ok(status[0])
    }

    async fn read_registers(
        &mut self,
        reg: u8,
        buf: &mut [u8],
        operation: &'static str,
    ) -> Result<(), SensorError> {
        self.i2c.write_read(ADDRESS, &[reg], buf).await.map_err(|e| {
            error!("DS3231 {} failed: {:?}", operation, e);
            SensorError::ReadFailed {
                sensor: SENSOR,
                operation,
                details: "I2C communication error",
            }
        })
    }
}

impl<I: I2c> Sensor for Ds3231<I> {
    type Reading = DateTime;

    async fn read(&mut self) -> Result<DateTime, SensorError> {
        self.datetime().await
    }
}
