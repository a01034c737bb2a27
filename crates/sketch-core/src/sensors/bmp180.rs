//! Bosch BMP180 barometric pressure and temperature sensor.
//!
//! The device exposes uncompensated readings plus an 11 word factory
//! calibration table. Compensation is the integer algorithm from the
//! datasheet, kept as a pure function so it can be checked on the host.

use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::I2c;
use log::{debug, error, info};

use super::{PressureReading, Sensor, SensorError};

pub const ADDRESS: u8 = 0x77;

const REG_CALIBRATION: u8 = 0xAA;
const REG_CHIP_ID: u8 = 0xD0;
const REG_SOFT_RESET: u8 = 0xE0;
const REG_CONTROL: u8 = 0xF4;
const REG_DATA: u8 = 0xF6;

const CHIP_ID: u8 = 0x55;
const SOFT_RESET: u8 = 0xB6;
const CMD_TEMPERATURE: u8 = 0x2E;
const CMD_PRESSURE: u8 = 0x34;

const TEMPERATURE_WAIT_US: u32 = 4500;

const SENSOR: &str = "BMP180";

/// Pressure oversampling setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    UltraLowPower,
    #[default]
    Standard,
    HighResolution,
    UltraHighResolution,
}

impl Mode {
    pub const fn oversampling(self) -> u8 {
        match self {
            Self::UltraLowPower => 0,
            Self::Standard => 1,
            Self::HighResolution => 2,
            Self::UltraHighResolution => 3,
        }
    }

    /// Maximum conversion time.
    pub const fn conversion_us(self) -> u32 {
        match self {
            Self::UltraLowPower => 4500,
            Self::Standard => 7500,
            Self::HighResolution => 13500,
            Self::UltraHighResolution => 25500,
        }
    }
}

/// Factory calibration coefficients, register order 0xAA..0xBF.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Calibration {
    pub ac1: i16,
    pub ac2: i16,
    pub ac3: i16,
    pub ac4: u16,
    pub ac5: u16,
    pub ac6: u16,
    pub b1: i16,
    pub b2: i16,
    pub mb: i16,
    pub mc: i16,
    pub md: i16,
}

impl Calibration {
    /// Parse the 22 byte EEPROM dump. A word of 0x0000 or 0xFFFF means the
    /// EEPROM read back blank or the bus is stuck.
    pub fn from_bytes(raw: &[u8; 22]) -> Result<Self, SensorError> {
        let mut words = [0u16; 11];
        for (word, pair) in words.iter_mut().zip(raw.chunks_exact(2)) {
            *word = u16::from_be_bytes([pair[0], pair[1]]);
            if *word == 0x0000 || *word == 0xFFFF {
                return Err(SensorError::InvalidData {
                    sensor: SENSOR,
                    details: "calibration word is blank",
                });
            }
        }
        let [ac1, ac2, ac3, ac4, ac5, ac6, b1, b2, mb, mc, md] = words;
        Ok(Self {
            ac1: ac1 as i16,
            ac2: ac2 as i16,
            ac3: ac3 as i16,
            ac4,
            ac5,
            ac6,
            b1: b1 as i16,
            b2: b2 as i16,
            mb: mb as i16,
            mc: mc as i16,
            md: md as i16,
        })
    }

    /// Compensate raw temperature `ut` and raw pressure `up` sampled with
    /// oversampling `oss`. Temperature is in 0.1 C, pressure in Pa.
    pub fn compensate(&self, ut: i32, up: i32, oss: u8) -> Result<PressureReading, SensorError> {
        let oss = oss.min(3);
        let ac1 = i64::from(self.ac1);
        let ac2 = i64::from(self.ac2);
        let ac3 = i64::from(self.ac3);
        let b1 = i64::from(self.b1);
        let b2 = i64::from(self.b2);

        let x1 = ((i64::from(ut) - i64::from(self.ac6)) * i64::from(self.ac5)) >> 15;
        let divisor = x1 + i64::from(self.md);
        if divisor == 0 {
            return Err(invalid("temperature divisor is zero"));
        }
        let x2 = (i64::from(self.mc) << 11) / divisor;
        let b5 = x1 + x2;
        let temperature = (b5 + 8) >> 4;

        let b6 = b5 - 4000;
        let x1 = (b2 * ((b6 * b6) >> 12)) >> 11;
        let x2 = (ac2 * b6) >> 11;
        let x3 = x1 + x2;
        let b3 = (((ac1 * 4 + x3) << oss) + 2) / 4;

        let x1 = (ac3 * b6) >> 13;
        let x2 = (b1 * ((b6 * b6) >> 12)) >> 16;
        let x3 = ((x1 + x2) + 2) >> 2;
        // B4 and B7 are unsigned 32-bit in the reference algorithm
        let b4 = u32::from(self.ac4).wrapping_mul((x3 + 32768) as u32) >> 15;
        if b4 == 0 {
            return Err(invalid("pressure divisor is zero"));
        }
        let b7 = (up as u32)
            .wrapping_sub(b3 as u32)
            .wrapping_mul(50000 >> oss);
        let p = if b7 < 0x8000_0000 {
            (b7 * 2) / b4
        } else {
            (b7 / b4) * 2
        };

        let p = i64::from(p);
        let x1 = (p >> 8) * (p >> 8);
        let x1 = (x1 * 3038) >> 16;
        let x2 = (-7357 * p) >> 16;
        let pressure = p + ((x1 + x2 + 3791) >> 4);

        if !(0..=i64::from(u32::MAX)).contains(&pressure) {
            return Err(invalid("pressure out of range"));
        }
        Ok(PressureReading {
            temperature_decicelsius: temperature as i32,
            pressure_pa: pressure as u32,
        })
    }
}

fn invalid(details: &'static str) -> SensorError {
    SensorError::InvalidData {
        sensor: SENSOR,
        details,
    }
}

/// Raw pressure register triple to UP for the given oversampling.
pub const fn raw_pressure(msb: u8, lsb: u8, xlsb: u8, oss: u8) -> i32 {
    (((msb as i32) << 16) | ((lsb as i32) << 8) | xlsb as i32) >> (8 - oss)
}

pub struct Bmp180<I, D> {
    i2c: I,
    delay: D,
    mode: Mode,
    calibration: Option<Calibration>,
}

impl<I, D> Bmp180<I, D>
where
    I: I2c,
    D: DelayNs,
{
    pub fn new(i2c: I, delay: D, mode: Mode) -> Self {
        Self {
            i2c,
            delay,
            mode,
            calibration: None,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    pub fn calibration(&self) -> Option<&Calibration> {
        self.calibration.as_ref()
    }

    /// Check the chip id and load the calibration table.
    pub async fn init(&mut self) -> Result<(), SensorError> {
        let mut id = [0u8; 1];
        self.read_registers(REG_CHIP_ID, &mut id, "read chip id")
            .await
            .map_err(|_| SensorError::InitializationFailed {
                sensor: SENSOR,
                details: "no response at 0x77",
            })?;
        if id[0] != CHIP_ID {
            error!("BMP180 chip id 0x{:02X}, expected 0x{:02X}", id[0], CHIP_ID);
            return Err(SensorError::InitializationFailed {
                sensor: SENSOR,
                details: "unexpected chip id",
            });
        }

        let mut raw = [0u8; 22];
        self.read_registers(REG_CALIBRATION, &mut raw, "read calibration")
            .await?;
        let calibration = Calibration::from_bytes(&raw)?;
        debug!("BMP180 calibration: {:?}", calibration);
        self.calibration = Some(calibration);
        info!("BMP180 ready");
        Ok(())
    }

    pub async fn soft_reset(&mut self) -> Result<(), SensorError> {
        self.write_register(REG_SOFT_RESET, SOFT_RESET, "soft reset")
            .await?;
        self.calibration = None;
        self.delay.delay_ms(10).await;
        Ok(())
    }

    pub async fn read_raw_temperature(&mut self) -> Result<i32, SensorError> {
        self.write_register(REG_CONTROL, CMD_TEMPERATURE, "start temperature")
            .await?;
        self.delay.delay_us(TEMPERATURE_WAIT_US).await;
        let mut data = [0u8; 2];
        self.read_registers(REG_DATA, &mut data, "read temperature")
            .await?;
        Ok(i32::from(u16::from_be_bytes(data)))
    }

    pub async fn read_raw_pressure(&mut self) -> Result<i32, SensorError> {
        let oss = self.mode.oversampling();
        self.write_register(REG_CONTROL, CMD_PRESSURE | (oss << 6), "start pressure")
            .await?;
        self.delay.delay_us(self.mode.conversion_us()).await;
        let mut data = [0u8; 3];
        self.read_registers(REG_DATA, &mut data, "read pressure")
            .await?;
        Ok(raw_pressure(data[0], data[1], data[2], oss))
    }

    /// One temperature and one pressure conversion, compensated.
    pub async fn measure(&mut self) -> Result<PressureReading, SensorError> {
        if self.calibration.is_none() {
            self.init().await?;
        }
        let ut = self.read_raw_temperature().await?;
        let up = self.read_raw_pressure().await?;
        let calibration = self.calibration.ok_or(SensorError::InitializationFailed {
            sensor: SENSOR,
            details: "calibration not loaded",
        })?;
        calibration.compensate(ut, up, self.mode.oversampling())
    }

    async fn write_register(
        &mut self,
        reg: u8,
        value: u8,
        operation: &'static str,
    ) -> Result<(), SensorError> {
        self.i2c.write(ADDRESS, &[reg, value]).await.map_err(|e| {
            error!("BMP180 {} failed: {:?}", operation, e);
            SensorError::WriteFailed {
                sensor: SENSOR,
                operation,
            }
        })
    }

    async fn read_registers(
        &mut self,
        reg: u8,
        buf: &mut [u8],
        operation: &'static str,
    ) -> Result<(), SensorError> {
        self.i2c.write_read(ADDRESS, &[reg], buf).await.map_err(|e| {
            error!("BMP180 {} failed: {:?}", operation, e);
            SensorError::ReadFailed {
                sensor: SENSOR,
                operation,
                details: "I2C communication error",
            }
        })
    }
}

impl<I, D> Sensor for Bmp180<I, D>
where
    I: I2c,
    D: DelayNs,
{
    type Reading = PressureReading;

    async fn read(&mut self) -> Result<PressureReading, SensorError> {
        self.measure().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeDelay, FakeI2c};
    use embassy_futures::block_on;

    fn datasheet() -> Calibration {
        Calibration {
            ac1: 408,
            ac2: -72,
            ac3: -14383,
            ac4: 32741,
            ac5: 32757,
            ac6: 23153,
            b1: 6190,
            b2: 4,
            mb: -32768,
            mc: -8711,
            md: 2868,
        }
    }

    fn calibration_bytes(cal: &Calibration) -> [u8; 22] {
        let words = [
            cal.ac1 as u16,
            cal.ac2 as u16,
            cal.ac3 as u16,
            cal.ac4,
            cal.ac5,
            cal.ac6,
            cal.b1 as u16,
            cal.b2 as u16,
            cal.mb as u16,
            cal.mc as u16,
            cal.md as u16,
        ];
        let mut out = [0u8; 22];
        for (chunk, word) in out.chunks_exact_mut(2).zip(words) {
            chunk.copy_from_slice(&word.to_be_bytes());
        }
        out
    }

    fn device() -> FakeI2c {
        let mut i2c = FakeI2c::new(ADDRESS);
        i2c.set_regs(REG_CHIP_ID, &[CHIP_ID]);
        i2c.set_regs(REG_CALIBRATION, &calibration_bytes(&datasheet()));
        i2c.set_regs(REG_DATA, &[0x6C, 0xFA, 0x00]);
        i2c
    }

    #[test]
    fn datasheet_example_compensates() {
        let reading = datasheet().compensate(27898, 23843, 0).unwrap();
        assert_eq!(reading.temperature_decicelsius, 150);
        assert_eq!(reading.pressure_pa, 69964);
        assert!((reading.temperature_celsius() - 15.0).abs() < f32::EPSILON);
    }

    #[test]
    fn cold_sample_with_oversampling() {
        let reading = datasheet().compensate(25000, 40000, 1).unwrap();
        assert_eq!(reading.temperature_decicelsius, -121);
        assert_eq!(reading.pressure_pa, 54939);
    }

    #[test]
    fn calibration_parses_big_endian_words() {
        let cal = Calibration::from_bytes(&calibration_bytes(&datasheet())).unwrap();
        assert_eq!(cal, datasheet());
    }

    #[test]
    fn blank_calibration_is_rejected() {
        let mut raw = calibration_bytes(&datasheet());
        raw[6] = 0xFF;
        raw[7] = 0xFF;
        assert!(matches!(
            Calibration::from_bytes(&raw),
            Err(SensorError::InvalidData { .. })
        ));
    }

    #[test]
    fn raw_pressure_drops_unused_bits() {
        assert_eq!(raw_pressure(0x6C, 0xFA, 0x00, 0), 27898);
        assert_eq!(raw_pressure(0x6C, 0xFA, 0x00, 1), 55796);
        assert_eq!(raw_pressure(0xFF, 0xFF, 0xFF, 3), 0x7FFFF);
    }

    #[test]
    fn measure_runs_both_conversions() {
        let mut bmp = Bmp180::new(device(), FakeDelay::default(), Mode::Standard);
        let reading = block_on(bmp.measure()).unwrap();
        assert_eq!(reading.temperature_decicelsius, 150);
        assert_eq!(reading.pressure_pa, 82078);

        let Bmp180 { i2c, delay, .. } = bmp;
        assert!(i2c.writes.contains(&vec![REG_CONTROL, CMD_TEMPERATURE]));
        assert!(i2c.writes.contains(&vec![REG_CONTROL, 0x74]));
        assert_eq!(delay.total_ns, (4500 + 7500) * 1000);
    }

    #[test]
    fn ultra_low_power_uses_plain_command() {
        let mut bmp = Bmp180::new(device(), FakeDelay::default(), Mode::UltraLowPower);
        let reading = block_on(bmp.read()).unwrap();
        assert_eq!(reading.pressure_pa, 82080);
        assert!(bmp.i2c.writes.contains(&vec![REG_CONTROL, CMD_PRESSURE]));
    }

    #[test]
    fn wrong_chip_id_fails_init() {
        let mut i2c = device();
        i2c.set_regs(REG_CHIP_ID, &[0x58]);
        let mut bmp = Bmp180::new(i2c, FakeDelay::default(), Mode::Standard);
        assert!(matches!(
            block_on(bmp.init()),
            Err(SensorError::InitializationFailed { .. })
        ));
    }

    #[test]
    fn bus_error_is_reported() {
        let mut i2c = device();
        i2c.fail = true;
        let mut bmp = Bmp180::new(i2c, FakeDelay::default(), Mode::Standard);
        assert!(block_on(bmp.read()).is_err());
    }
}
