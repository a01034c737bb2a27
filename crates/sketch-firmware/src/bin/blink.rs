//! Two LEDs blinking at independent periods.

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
use sketch_core::config::BoardConfig;
use sketch_core::led::Led;
use sketch_firmware::board;
use sketch_firmware::tasks::blink_task;

esp_bootloader_esp_idf::esp_app_desc!();

#[esp_rtos::main]
async fn main(spawner: Spawner) -> ! {
    let peripherals = board::init();
    board::start_scheduler(peripherals.TIMG0);
    let periods = BoardConfig::default().periods;

    let Ok(onboard) = Led::new(Output::new(peripherals.GPIO2, Level::Low, OutputConfig::default()));
    let Ok(external) = Led::new(Output::new(peripherals.GPIO4, Level::Low, OutputConfig::default()));

    spawner.spawn(blink_task(onboard, periods.onboard_blink(), None)).ok();
    spawner.spawn(blink_task(external, periods.external_blink(), None)).ok();

    loop {
        Timer::after(Duration::from_secs(60)).await;
    }
}
