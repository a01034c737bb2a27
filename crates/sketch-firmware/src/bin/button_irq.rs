//! Button edge wakes a task that toggles an LED.

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
use esp_hal::gpio::{Input, InputConfig, Level, Output, OutputConfig, Pull as GpioPull};
use log::info;
use sketch_core::button::{Button, Pull};
use sketch_core::led::Led;
use sketch_firmware::board;
use sketch_firmware::tasks::{button_edge_task, notified_led_task};

esp_bootloader_esp_idf::esp_app_desc!();

#[esp_rtos::main]
async fn main(spawner: Spawner) -> ! {
    let peripherals = board::init();
    board::start_scheduler(peripherals.TIMG0);

    let input = Input::new(
        peripherals.GPIO23,
        InputConfig::default().with_pull(GpioPull::Up),
    );
    let button = Button::new(input, Pull::Up);
    info!("Waiting for {:?} edges on GPIO23", button.interrupt_edge());

    let Ok(led) = Led::new(Output::new(
        peripherals.GPIO25,
        Level::Low,
        OutputConfig::default(),
    ));

    spawner.spawn(notified_led_task(led)).ok();
    spawner.spawn(button_edge_task(button)).ok();

    loop {
        Timer::after(Duration::from_secs(60)).await;
    }
}
