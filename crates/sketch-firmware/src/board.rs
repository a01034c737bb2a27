//! Bring-up of the ESP32 DevKit peripherals used by the demos.
//!
//! esp-hal hands out GPIOs as distinct types, so the functions here take the
//! concrete peripherals of the demo wiring: LEDs on 2, 4, 15 and 25, the
//! button on 23, I2C on 21/22 and the SD card on SPI2 (19, 23, 18, CS 13).

use embedded_hal_bus::spi::ExclusiveDevice;
use embedded_sdmmc::SdCard;
use esp_hal::analog::adc::{Adc, AdcConfig, AdcPin, Attenuation as AdcAttenuation};
use esp_hal::clock::CpuClock;
use esp_hal::delay::Delay;
use esp_hal::gpio::{Level, Output, OutputConfig};
use esp_hal::i2c::master::{Config as I2cConfig, I2c};
use esp_hal::peripherals::{
    ADC1, GPIO13, GPIO18, GPIO19, GPIO21, GPIO22, GPIO23, GPIO35, I2C0, Peripherals, SPI2, TIMG0,
};
use esp_hal::spi::master::{Config as SpiConfig, Spi};
use esp_hal::time::Rate;
use esp_hal::timer::timg::TimerGroup;
use esp_hal::{Async, Blocking};
use log::{error, info, warn};
use sketch_core::async_i2c_bus::{I2cBus, SharedI2c};
use sketch_core::battery::{Attenuation, BatteryConfig, RawAdc, Width};
use static_cell::StaticCell;
use thiserror_no_std::Error;

/// SPI clock while the card is being identified.
pub const SD_INIT_FREQ_KHZ: u32 = 400;

pub type I2cDriver = I2c<'static, Async>;
pub type SharedBus = SharedI2c<'static, I2cDriver>;

pub type SdSpiDevice = ExclusiveDevice<Spi<'static, Blocking>, Output<'static>, Delay>;
pub type Card = SdCard<SdSpiDevice, Delay>;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardError {
    #[error("I2C configuration rejected")]
    I2cConfig,
    #[error("SPI configuration rejected")]
    SpiConfig,
    #[error("SD card chip select unavailable")]
    SdChipSelect,
    #[error("SD card did not respond")]
    SdCard,
}

/// Logger, clocks and heap. Call once at the top of `main`.
pub fn init() -> Peripherals {
    esp_println::logger::init_logger_from_env();

    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(config);

    esp_alloc::heap_allocator!(size: 64 * 1024);

    peripherals
}

/// Start the embassy time driver on TIMG0.
pub fn start_scheduler(timg0: TIMG0<'static>) {
    let timg0 = TimerGroup::new(timg0);
    esp_rtos::start(timg0.timer0);
    info!("Embassy initialized!");
}

/// I2C0 on SDA 21 / SCL 22, shared through a static async mutex.
///
/// The returned bus lives for the rest of the program; hand out
/// [`SharedI2c`] handles for each device on it.
pub fn init_i2c_bus(
    i2c0: I2C0<'static>,
    sda: GPIO21<'static>,
    scl: GPIO22<'static>,
    khz: u32,
) -> Result<&'static I2cBus<I2cDriver>, BoardError> {
    static I2C0_BUS: StaticCell<I2cBus<I2cDriver>> = StaticCell::new();

    let i2c = I2c::new(i2c0, I2cConfig::default().with_frequency(Rate::from_khz(khz)))
        .map_err(|e| {
            error!("I2C config failed: {:?}", e);
            BoardError::I2cConfig
        })?
        .with_sda(sda)
        .with_scl(scl)
        .into_async();

    info!("I2C bus ready at {} kHz", khz);
    Ok(I2C0_BUS.init(I2cBus::new(i2c)))
}

/// SD card on SPI2 (MISO 19, MOSI 23, CLK 18, CS 13).
///
/// Probes the card before returning it and reports its size in bytes.
pub fn init_sd_card(
    spi2: SPI2<'static>,
    miso: GPIO19<'static>,
    mosi: GPIO23<'static>,
    clk: GPIO18<'static>,
    cs: GPIO13<'static>,
) -> Result<(Card, u64), BoardError> {
    let spi_config = SpiConfig::default().with_frequency(Rate::from_khz(SD_INIT_FREQ_KHZ));
    let spi_bus = Spi::new(spi2, spi_config)
        .map_err(|e| {
            error!("SPI config failed: {:?}", e);
            BoardError::SpiConfig
        })?
        .with_sck(clk)
        .with_mosi(mosi)
        .with_miso(miso);

    let cs = Output::new(cs, Level::High, OutputConfig::default());
    let spi_device =
        ExclusiveDevice::new(spi_bus, cs, Delay::new()).map_err(|_| BoardError::SdChipSelect)?;

    let card = SdCard::new(spi_device, Delay::new());

    // Probing runs the card init sequence (CMD0, CMD8, ACMD41)
    let bytes = card.num_bytes().map_err(|e| {
        error!("SD card size query failed: {:?}", e);
        BoardError::SdCard
    })?;
    info!("SD card: {} bytes ({} MB)", bytes, bytes / 1024 / 1024);

    Ok((card, bytes))
}

/// Battery divider tap on ADC1 channel 7 (GPIO35).
pub struct AdcReader {
    adc: Adc<'static, ADC1<'static>, Blocking>,
    pin: AdcPin<GPIO35<'static>, ADC1<'static>>,
}

impl AdcReader {
    pub fn new(adc1: ADC1<'static>, pin: GPIO35<'static>, config: &BatteryConfig) -> Self {
        if config.adc_channel != 7 {
            warn!(
                "ADC1 channel {} requested, GPIO35 is channel 7",
                config.adc_channel
            );
        }
        if config.width != Width::Bits12 {
            warn!("ADC runs at its default 12-bit width, not {:?}", config.width);
        }

        let mut adc_config = AdcConfig::new();
        let pin = adc_config.enable_pin(pin, attenuation(config.attenuation));
        let adc = Adc::new(adc1, adc_config);
        Self { adc, pin }
    }
}

impl RawAdc for AdcReader {
    type Error = ();

    fn read_raw(&mut self) -> Result<u16, ()> {
        nb::block!(self.adc.read_oneshot(&mut self.pin))
    }
}

fn attenuation(attenuation: Attenuation) -> AdcAttenuation {
    match attenuation {
        Attenuation::Db0 => AdcAttenuation::_0dB,
        Attenuation::Db2_5 => AdcAttenuation::_2p5dB,
        Attenuation::Db6 => AdcAttenuation::_6dB,
        Attenuation::Db11 => AdcAttenuation::_11dB,
    }
}

/// A device handle on the shared bus.
pub fn shared(bus: &'static I2cBus<I2cDriver>) -> SharedBus {
    SharedI2c::new(bus)
}
