//! ESP32 firmware support for the esp32-sketches demos
//!
//! Board bring-up and the embassy tasks the binaries under `src/bin` spawn.
//! Everything hardware-independent lives in `sketch_core`.

#![no_std]

pub mod board;
pub mod tasks;
