//! SSD1306 demo: shapes, text, bitmaps, scrolling and inversion.

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
use log::error;
use sketch_core::config::BoardConfig;
use sketch_core::ssd1306::Ssd1306;
use sketch_firmware::board;
use sketch_firmware::tasks::oled_demo_task;

esp_bootloader_esp_idf::esp_app_desc!();

#[esp_rtos::main]
async fn main(spawner: Spawner) -> ! {
    let peripherals = board::init();
    board::start_scheduler(peripherals.TIMG0);
    let config = BoardConfig::default();

    match board::init_i2c_bus(
        peripherals.I2C0,
        peripherals.GPIO21,
        peripherals.GPIO22,
        config.i2c_khz,
    ) {
        Ok(bus) => {
            spawner
                .spawn(oled_demo_task(Ssd1306::new(board::shared(bus))))
                .ok();
        }
        Err(e) => error!("OLED demo not started: {}", e),
    }

    loop {
        Timer::after(Duration::from_secs(60)).await;
    }
}
