//! Battery percentage on every periodic timer notification.

#![no_std]
#![no_main]
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]

use embassy_executor::Spawner;
use embassy_time::{Duration, Timer};
use esp_backtrace as _;
use esp_hal::gpio::{Level, Output, OutputConfig};
use log::error;
use sketch_core::battery::Battery;
use sketch_core::config::BoardConfig;
use sketch_firmware::board::{self, AdcReader};
use sketch_firmware::tasks::{battery_task, periodic_timer_task};

esp_bootloader_esp_idf::esp_app_desc!();

#[esp_rtos::main]
async fn main(spawner: Spawner) -> ! {
    let peripherals = board::init();
    board::start_scheduler(peripherals.TIMG0);

    let config = BoardConfig::default();
    let enable = Output::new(peripherals.GPIO26, Level::Low, OutputConfig::default());
    let adc = AdcReader::new(peripherals.ADC1, peripherals.GPIO35, &config.battery);

    match Battery::new(config.battery, adc, enable) {
        Ok(battery) => {
            spawner.spawn(battery_task(battery)).ok();
            spawner
                .spawn(periodic_timer_task(config.periods.battery()))
                .ok();
        }
        Err(e) => error!("Battery init failed: {}", e),
    }

    loop {
        Timer::after(Duration::from_secs(60)).await;
    }
}
