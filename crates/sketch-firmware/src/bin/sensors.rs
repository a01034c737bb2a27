//! BMP180 and DS3231 producers feeding the OLED status page through the
//! sensor queues. Samples are logged to the SD card when one is inserted.

#![no_std]
#![no_main]
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]

use embassy_executor::Spawner;
use embassy_time::{Delay, Duration, Timer};
use esp_backtrace as _;
use esp_hal::gpio::{Level, Output, OutputConfig};
use log::{error, info, warn};
use sketch_core::battery::Battery;
use sketch_core::config::BoardConfig;
use sketch_core::sensors::bmp180::{Bmp180, Mode};
use sketch_core::sensors::ds3231::Ds3231;
use sketch_core::ssd1306::Ssd1306;
use sketch_core::storage::{RtcTimeSource, SdCardStorage};
use sketch_firmware::board::{self, AdcReader};
use sketch_firmware::tasks::{
    LAST_KNOWN_TIME, Storage, battery_task, clock_producer_task, load_board_config,
    periodic_timer_task, pressure_producer_task, sensor_display_task,
};

esp_bootloader_esp_idf::esp_app_desc!();

#[esp_rtos::main]
async fn main(spawner: Spawner) -> ! {
    let peripherals = board::init();
    board::start_scheduler(peripherals.TIMG0);

    let storage: Option<Storage> = match board::init_sd_card(
        peripherals.SPI2,
        peripherals.GPIO19,
        peripherals.GPIO23,
        peripherals.GPIO18,
        peripherals.GPIO13,
    ) {
        Ok((card, _)) => Some(SdCardStorage::new(
            card,
            RtcTimeSource::new(&LAST_KNOWN_TIME),
        )),
        Err(e) => {
            warn!("Running without SD logging: {}", e);
            None
        }
    };
    let config = match &storage {
        Some(storage) => load_board_config(storage),
        None => BoardConfig::default(),
    };

    let enable = Output::new(peripherals.GPIO26, Level::Low, OutputConfig::default());
    let adc = AdcReader::new(peripherals.ADC1, peripherals.GPIO35, &config.battery);
    match Battery::new(config.battery, adc, enable) {
        Ok(battery) => {
            spawner.spawn(battery_task(battery)).ok();
            spawner
                .spawn(periodic_timer_task(config.periods.battery()))
                .ok();
        }
        Err(e) => error!("Battery task not started: {}", e),
    }

    let bus = match board::init_i2c_bus(
        peripherals.I2C0,
        peripherals.GPIO21,
        peripherals.GPIO22,
        config.i2c_khz,
    ) {
        Ok(bus) => bus,
        Err(e) => {
            error!("No I2C bus, sensors not started: {}", e);
            loop {
                Timer::after(Duration::from_secs(60)).await;
            }
        }
    };

    let pressure = Bmp180::new(board::shared(bus), Delay, Mode::Standard);
    let clock = Ds3231::new(board::shared(bus));
    let oled = Ssd1306::new(board::shared(bus));

    spawner.spawn(sensor_display_task(oled, storage)).ok();
    spawner
        .spawn(pressure_producer_task(
            pressure,
            config.periods.bmp180(),
        ))
        .ok();
    spawner
        .spawn(clock_producer_task(
            clock,
            config.periods.ds3231(),
        ))
        .ok();
    info!("Sensor tasks running");

    loop {
        Timer::after(Duration::from_secs(60)).await;
    }
}
