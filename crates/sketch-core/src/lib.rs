//! Hardware-independent core library for esp32-sketches
//!
//! This crate holds every driver and utility used by the demo firmware:
//! LEDs, buttons, the HD44780 character LCD, the SSD1306 OLED framebuffer and
//! rasterizer, the BMP180 and DS3231 I2C devices, the battery ADC reader,
//! SD card storage and the queues/notifications the demo tasks use.
//!
//! Drivers are written against `embedded-hal` / `embedded-hal-async` traits
//! so they build on the ESP32 target and on desktop hosts (for the simulator
//! and tests).

#![cfg_attr(not(test), no_std)]

pub mod app_state;
pub mod async_i2c_bus;
pub mod battery;
pub mod button;
pub mod config;
pub mod lcd;
pub mod led;
pub mod screens;
pub mod sensors;
pub mod ssd1306;
pub mod storage;
pub mod timer;

#[cfg(test)]
mod test_support;
