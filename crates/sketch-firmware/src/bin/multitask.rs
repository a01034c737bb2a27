//! Blinking LEDs, a toggling LED, the button-driven LED, the LCD counter and
//! the BMP180 printout, all running side by side.

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
use esp_hal::gpio::{Input, InputConfig, Level, Output, OutputConfig, Pull as GpioPull};
use log::error;
use sketch_core::button::{Button, Pull};
use sketch_core::config::BoardConfig;
use sketch_core::lcd::CharLcd;
use sketch_core::led::Led;
use sketch_core::sensors::bmp180::{Bmp180, Mode};
use sketch_firmware::board;
use sketch_firmware::tasks::{
    blink_task, bmp180_print_task, button_led_task, lcd_counter_task, toggle_task,
};

esp_bootloader_esp_idf::esp_app_desc!();

fn output(pin: impl esp_hal::gpio::OutputPin + 'static) -> Output<'static> {
    Output::new(pin, Level::Low, OutputConfig::default())
}

#[esp_rtos::main]
async fn main(spawner: Spawner) -> ! {
    let peripherals = board::init();
    board::start_scheduler(peripherals.TIMG0);
    let config = BoardConfig::default();

    let Ok(onboard) = Led::new(output(peripherals.GPIO2));
    let Ok(external) = Led::new(output(peripherals.GPIO4));
    spawner.spawn(blink_task(onboard, config.periods.onboard_blink(), Some("Task 1"))).ok();
    spawner.spawn(blink_task(external, config.periods.external_blink(), Some("Task 2"))).ok();

    let Ok(toggled) = Led::new(output(peripherals.GPIO15));
    spawner
        .spawn(toggle_task(toggled, config.periods.toggle()))
        .ok();

    let button = Input::new(
        peripherals.GPIO23,
        InputConfig::default().with_pull(GpioPull::Up),
    );
    let Ok(button_led) = Led::new(output(peripherals.GPIO25));
    spawner
        .spawn(button_led_task(
            Button::new(button, Pull::Up),
            button_led,
            config.periods.button_poll(),
        ))
        .ok();

    let lcd = CharLcd::new(
        [
            output(peripherals.GPIO19),
            output(peripherals.GPIO18),
            output(peripherals.GPIO17),
            output(peripherals.GPIO16),
        ],
        output(peripherals.GPIO27),
        output(peripherals.GPIO26),
        Delay,
    );
    spawner
        .spawn(lcd_counter_task(lcd, config.periods.lcd_refresh()))
        .ok();

    match board::init_i2c_bus(
        peripherals.I2C0,
        peripherals.GPIO21,
        peripherals.GPIO22,
        config.i2c_khz,
    ) {
        Ok(bus) => {
            let sensor = Bmp180::new(board::shared(bus), Delay, Mode::Standard);
            spawner
                .spawn(bmp180_print_task(sensor, config.periods.bmp180()))
                .ok();
        }
        Err(e) => error!("BMP180 task not started: {}", e),
    }

    loop {
        Timer::after(Duration::from_secs(60)).await;
    }
}
