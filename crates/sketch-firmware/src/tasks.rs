//! Embassy tasks the demo binaries spawn.

use embassy_futures::select::{Either3, select3};
use embassy_time::{Delay, Duration, Instant, Ticker, Timer};
use esp_hal::gpio::{Input, Output};
use log::{debug, error, info, warn};
use sketch_core::app_state::{
    BATTERY_LEVEL, BUTTON_NOTIFY, CLOCK_QUEUE, PRESSURE_QUEUE, TIMER_NOTIFY, notify,
    publish_timeout, try_publish,
};
use sketch_core::battery::Battery;
use sketch_core::button::{Button, DEBOUNCE_DELAY, Debouncer, Edge, InterruptEdge};
use sketch_core::config::{BoardConfig, MAX_ENCODED_SIZE};
use sketch_core::lcd::{CharLcd, LcdError};
use sketch_core::led::Led;
use sketch_core::screens::{DemoScene, SensorSnapshot, draw_sensor_screen};
#[cfg(feature = "sensor-bmp180")]
use sketch_core::sensors::bmp180::Bmp180;
#[cfg(feature = "sensor-ds3231")]
use sketch_core::sensors::ds3231::Ds3231;
use sketch_core::sensors::SensorEvent;
use sketch_core::ssd1306::{DisplayError, FrameBuffer, PAGES, Ssd1306};
use sketch_core::storage::{
    CONFIG_FILE, LastKnownTime, RtcTimeSource, SdCardStorage, SensorRecord, StorageError,
};

use crate::board::{AdcReader, Card, SharedBus};

pub type OledDisplay = Ssd1306<SharedBus>;
#[cfg(feature = "sensor-bmp180")]
pub type PressureSensor = Bmp180<SharedBus, Delay>;
#[cfg(feature = "sensor-ds3231")]
pub type RealTimeClock = Ds3231<SharedBus>;
pub type ParallelLcd = CharLcd<Output<'static>, Delay>;
pub type BatteryMonitor = Battery<AdcReader, Output<'static>>;
pub type Storage = SdCardStorage<Card, RtcTimeSource<'static>>;

/// Wall-clock time for FAT timestamps, fed by the DS3231 task.
pub static LAST_KNOWN_TIME: LastKnownTime = LastKnownTime::new();

/// How long the clock producer waits for queue space.
const CLOCK_SEND_TIMEOUT: Duration = Duration::from_millis(100);

const SCENE_HOLD: Duration = Duration::from_secs(2);
const SCROLL_HOLD: Duration = Duration::from_secs(2);
const BLANK_HOLD: Duration = Duration::from_millis(500);

/// Off for `period`, on for `period`, then print `name` if there is one.
#[embassy_executor::task(pool_size = 2)]
pub async fn blink_task(mut led: Led<Output<'static>>, period: Duration, name: Option<&'static str>) {
    loop {
        let Ok(()) = led.off();
        Timer::after(period).await;
        let Ok(()) = led.on();
        Timer::after(period).await;
        if let Some(name) = name {
            info!("{}", name);
        }
    }
}

#[embassy_executor::task]
pub async fn toggle_task(mut led: Led<Output<'static>>, period: Duration) {
    loop {
        let Ok(state) = led.toggle();
        info!("{}", state.label());
        Timer::after(period).await;
    }
}

/// LED follows the button, sampled every poll period.
#[embassy_executor::task]
pub async fn button_led_task(
    mut button: Button<Input<'static>>,
    mut led: Led<Output<'static>>,
    poll: Duration,
) {
    loop {
        Timer::after(DEBOUNCE_DELAY).await;
        let Ok(pressed) = button.is_pressed();
        let Ok(()) = led.set(pressed);
        Timer::after(poll).await;
    }
}

/// Raises [`BUTTON_NOTIFY`] once per debounced press.
#[embassy_executor::task]
pub async fn button_edge_task(mut button: Button<Input<'static>>) {
    let press = button.interrupt_edge();
    let mut debouncer = Debouncer::default();

    loop {
        wait_for_edge(button.pin_mut(), press).await;
        if settle(&mut button, &mut debouncer).await == Some(Edge::Pressed) {
            debug!("Button pressed");
            notify(&BUTTON_NOTIFY);
        }
        if debouncer.is_pressed() {
            wait_for_edge(button.pin_mut(), press.opposite()).await;
            settle(&mut button, &mut debouncer).await;
        }
    }
}

async fn wait_for_edge(pin: &mut Input<'static>, edge: InterruptEdge) {
    match edge {
        InterruptEdge::Falling => pin.wait_for_falling_edge().await,
        InterruptEdge::Rising => pin.wait_for_rising_edge().await,
    }
}

/// Sample now and again after the debounce window.
async fn settle(button: &mut Button<Input<'static>>, debouncer: &mut Debouncer) -> Option<Edge> {
    let Ok(pressed) = button.is_pressed();
    debouncer.update(pressed, Instant::now().as_millis());
    Timer::after(DEBOUNCE_DELAY).await;
    let Ok(pressed) = button.is_pressed();
    debouncer.update(pressed, Instant::now().as_millis())
}

/// Toggles the LED on every button notification.
#[embassy_executor::task]
pub async fn notified_led_task(mut led: Led<Output<'static>>) {
    loop {
        BUTTON_NOTIFY.wait().await;
        let Ok(state) = led.toggle();
        info!("{}", state.label());
    }
}

#[embassy_executor::task]
pub async fn lcd_counter_task(mut lcd: ParallelLcd, period: Duration) {
    if let Err(e) = lcd.init().await {
        error!("LCD init failed: {}", e);
        return;
    }
    if let Err(e) = lcd.set_text("Custom ESP LCD", 0, 0).await {
        warn!("LCD title failed: {}", e);
    }

    let mut count: i32 = 0;
    loop {
        if let Err(e) = show_count(&mut lcd, count).await {
            warn!("LCD update failed: {}", e);
        }
        count = count.wrapping_add(1);
        Timer::after(period).await;
    }
}

async fn show_count(lcd: &mut ParallelLcd, count: i32) -> Result<(), LcdError> {
    lcd.set_text("Count: ", 0, 1).await?;
    lcd.set_int(count, 8, 1).await
}

/// Print a BMP180 measurement every `period`.
#[cfg(feature = "sensor-bmp180")]
#[embassy_executor::task]
pub async fn bmp180_print_task(mut sensor: PressureSensor, period: Duration) {
    loop {
        match sensor.measure().await {
            Ok(reading) => info!(
                "Temperature: {:.2} degrees Celsius; Pressure: {} Pa",
                reading.temperature_celsius(),
                reading.pressure_pa
            ),
            Err(e) => error!("Could not measure: {:?}", e),
        }
        Timer::after(period).await;
    }
}

/// Publish BMP180 readings, dropping them when the queue is full.
#[cfg(feature = "sensor-bmp180")]
#[embassy_executor::task]
pub async fn pressure_producer_task(mut sensor: PressureSensor, period: Duration) {
    let mut ticker = Ticker::every(period);
    loop {
        match sensor.measure().await {
            Ok(reading) => {
                // a full queue is already logged and counted
                let _ = try_publish(&PRESSURE_QUEUE, SensorEvent::Pressure(reading));
            }
            Err(e) => error!("Could not measure: {:?}", e),
        }
        ticker.next().await;
    }
}

/// Publish DS3231 time and keep [`LAST_KNOWN_TIME`] current.
#[cfg(feature = "sensor-ds3231")]
#[embassy_executor::task]
pub async fn clock_producer_task(mut rtc: RealTimeClock, period: Duration) {
    match rtc.oscillator_stopped().await {
        Ok(true) => {
            warn!("DS3231 oscillator was stopped, time may be wrong");
            if let Err(e) = rtc.clear_oscillator_stopped().await {
                error!("Could not clear oscillator flag: {:?}", e);
            }
        }
        Ok(false) => {}
        Err(e) => error!("Could not read DS3231 status: {:?}", e),
    }
    if let Ok(celsius) = rtc.temperature().await {
        info!("DS3231 die temperature: {:.2} C", celsius);
    }

    let mut ticker = Ticker::every(period);
    loop {
        match rtc.datetime().await {
            Ok(now) => {
                LAST_KNOWN_TIME.update(&now);
                let _ = publish_timeout(
                    &CLOCK_QUEUE,
                    SensorEvent::Clock(now),
                    Timer::after(CLOCK_SEND_TIMEOUT),
                )
                .await;
            }
            Err(e) => error!("Could not read clock: {:?}", e),
        }
        ticker.next().await;
    }
}

/// Drain the sensor queues onto the OLED and append pressure samples to the
/// SD log when a card is present.
#[embassy_executor::task]
pub async fn sensor_display_task(mut oled: OledDisplay, storage: Option<Storage>) {
    let mut frame = FrameBuffer::new();
    if let Err(e) = oled.init(&mut frame).await {
        error!("OLED init failed: {}", e);
        return;
    }

    let mut snapshot = SensorSnapshot::default();
    loop {
        match select3(
            PRESSURE_QUEUE.receive(),
            CLOCK_QUEUE.receive(),
            BATTERY_LEVEL.wait(),
        )
        .await
        {
            Either3::First(event) => {
                if let (SensorEvent::Pressure(reading), Some(storage)) = (event, &storage) {
                    let record =
                        SensorRecord::new(snapshot.clock, reading, snapshot.battery_percent);
                    if let Err(e) = storage.append_record(&record) {
                        warn!("Could not log sample: {:?}", e);
                    }
                }
                snapshot.apply(event);
            }
            Either3::Second(event) => snapshot.apply(event),
            Either3::Third(percent) => snapshot.battery_percent = Some(percent),
        }

        draw_sensor_screen(&mut frame, &snapshot);
        if let Err(e) = oled.update_screen(&frame).await {
            warn!("OLED update failed: {}", e);
        }
    }
}

/// Raise [`TIMER_NOTIFY`] every `period`.
#[embassy_executor::task]
pub async fn periodic_timer_task(period: Duration) {
    let mut ticker = Ticker::every(period);
    loop {
        ticker.next().await;
        notify(&TIMER_NOTIFY);
    }
}

/// Measure the battery on every timer notification.
#[embassy_executor::task]
pub async fn battery_task(mut battery: BatteryMonitor) {
    loop {
        TIMER_NOTIFY.wait().await;
        match battery.measure() {
            Ok(percent) => {
                info!(
                    "Battery: {}% ({} mV, raw {})",
                    percent,
                    battery.cell_mv(),
                    battery.value()
                );
                BATTERY_LEVEL.signal(percent);
            }
            Err(e) => error!("Battery measurement failed: {}", e),
        }
    }
}

/// Cycle through the demo scenes, scrolling the text scene and inverting
/// the bitmap one.
#[embassy_executor::task]
pub async fn oled_demo_task(mut oled: OledDisplay) {
    let mut frame = FrameBuffer::new();
    if let Err(e) = oled.init(&mut frame).await {
        error!("OLED init failed: {}", e);
        return;
    }

    let mut scene = DemoScene::Shapes;
    let mut inverted = false;
    loop {
        scene.draw(&mut frame);
        if let Err(e) = show_scene(&mut oled, &mut frame, scene).await {
            warn!("OLED demo step failed: {}", e);
        }

        scene = scene.next();
        if scene == DemoScene::Shapes {
            inverted = !inverted;
            if let Err(e) = blank_and_invert(&mut oled, inverted).await {
                warn!("OLED power cycle failed: {}", e);
            }
        }
    }
}

async fn show_scene(
    oled: &mut OledDisplay,
    frame: &mut FrameBuffer,
    scene: DemoScene,
) -> Result<(), DisplayError> {
    oled.update_screen(frame).await?;
    Timer::after(SCENE_HOLD).await;

    match scene {
        DemoScene::Text => {
            let last = PAGES - 1;
            oled.scroll_right(0, last).await?;
            Timer::after(SCROLL_HOLD).await;
            oled.scroll_left(0, last).await?;
            Timer::after(SCROLL_HOLD).await;
            oled.scroll_diag_right(0, last).await?;
            Timer::after(SCROLL_HOLD).await;
            oled.scroll_diag_left(0, last).await?;
            Timer::after(SCROLL_HOLD).await;
            oled.stop_scroll().await?;
            // GDDRAM is stale after scrolling
            oled.update_screen(frame).await?;
        }
        DemoScene::Bitmap => {
            frame.toggle_invert();
            oled.update_screen(frame).await?;
            Timer::after(SCENE_HOLD).await;
        }
        DemoScene::Shapes | DemoScene::FilledShapes => {}
    }
    Ok(())
}

async fn blank_and_invert(oled: &mut OledDisplay, inverted: bool) -> Result<(), DisplayError> {
    oled.display_off().await?;
    Timer::after(BLANK_HOLD).await;
    oled.invert_display(inverted).await?;
    oled.display_on().await
}

/// Board configuration from `BOARD.CFG`, writing the defaults when the file
/// is missing or unreadable.
pub fn load_board_config(storage: &Storage) -> BoardConfig {
    let mut buf = [0u8; MAX_ENCODED_SIZE];
    match storage.read_file(CONFIG_FILE, &mut buf) {
        Ok(len) => match BoardConfig::from_bytes(&buf[..len]) {
            Ok(config) => {
                info!("Loaded {}", CONFIG_FILE);
                return config;
            }
            Err(e) => warn!("{}: {}", CONFIG_FILE, e),
        },
        Err(StorageError::Card(embedded_sdmmc::Error::NotFound)) => {
            info!("No {}, writing defaults", CONFIG_FILE)
        }
        Err(e) => warn!("Could not read {}: {:?}", CONFIG_FILE, e),
    }

    let config = BoardConfig::default();
    match config.to_bytes(&mut buf) {
        Ok(bytes) => {
            if let Err(e) = storage.write_file(CONFIG_FILE, bytes) {
                warn!("Could not write {}: {:?}", CONFIG_FILE, e);
            }
        }
        Err(e) => warn!("{}: {}", CONFIG_FILE, e),
    }
    config
}
