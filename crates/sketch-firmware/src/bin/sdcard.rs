//! SD card file demo: write, rename and read back a greeting, then dump the
//! sensor log if there is one.

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
use log::{error, info, warn};
use sketch_core::storage::{MOUNT_POINT, RtcTimeSource, SENSOR_LOG_FILE, SdCardStorage};
use sketch_firmware::board;
use sketch_firmware::tasks::{LAST_KNOWN_TIME, Storage, load_board_config};

esp_bootloader_esp_idf::esp_app_desc!();

#[esp_rtos::main]
async fn main(_spawner: Spawner) -> ! {
    let peripherals = board::init();
    board::start_scheduler(peripherals.TIMG0);

    info!("Initializing SD card");
    match board::init_sd_card(
        peripherals.SPI2,
        peripherals.GPIO19,
        peripherals.GPIO23,
        peripherals.GPIO18,
        peripherals.GPIO13,
    ) {
        Ok((card, bytes)) => {
            let storage: Storage = SdCardStorage::new(card, RtcTimeSource::new(&LAST_KNOWN_TIME));
            info!("Filesystem mounted at {}", MOUNT_POINT);

            match storage.run_file_demo(bytes) {
                Ok(_) => info!("File demo done"),
                Err(e) => error!("File demo failed: {:?}", e),
            }

            let config = load_board_config(&storage);
            info!("Battery check every {} ms", config.periods.battery_ms);

            dump_sensor_log(&storage);
        }
        Err(e) => error!("SD card unavailable: {}", e),
    }

    loop {
        Timer::after(Duration::from_secs(60)).await;
    }
}

fn dump_sensor_log(storage: &Storage) {
    let result = storage.for_each_record(|record| {
        let reading = record.reading();
        match record.time {
            Some(time) => info!(
                "{}  {:.1} C  {} Pa",
                time,
                reading.temperature_celsius(),
                reading.pressure_pa
            ),
            None => info!(
                "----  {:.1} C  {} Pa",
                reading.temperature_celsius(),
                reading.pressure_pa
            ),
        }
    });
    match result {
        Ok(count) => info!("{} records in {}", count, SENSOR_LOG_FILE),
        Err(e) => warn!("No sensor log to show: {:?}", e),
    }
}
