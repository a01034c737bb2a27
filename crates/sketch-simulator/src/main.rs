//! Desktop simulator for the esp32-sketches SSD1306 screens.
//!
//! Draws into the same [`FrameBuffer`] the firmware sends to the panel and
//! flushes it to an SDL2 window via `embedded-graphics-simulator`. Synthetic
//! BMP180, DS3231 and battery values drive the sensor page.
//!
//! # Key bindings
//!
//! | Key   | Action                       |
//! |-------|------------------------------|
//! | 1..4  | Demo scenes                  |
//! | 5     | Sensor status page           |
//! | Space | Next demo scene              |
//! | I     | Invert the framebuffer       |
//! | Q     | Quit                         |

use std::time::{Duration, Instant};

use chrono::{Datelike, Timelike, Utc};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics_simulator::{
    BinaryColorTheme, OutputSettingsBuilder, SimulatorDisplay, SimulatorEvent, Window,
    sdl2::Keycode,
};
use log::{error, info, warn};

use sketch_core::app_state::{CLOCK_QUEUE, PRESSURE_QUEUE, try_publish};
use sketch_core::screens::{DemoScene, SensorSnapshot, draw_sensor_screen};
use sketch_core::sensors::{DateTime, PressureReading, SensorEvent};
use sketch_core::ssd1306::{FrameBuffer, HEIGHT, WIDTH};

/// Pixel scale factor for the simulator window.
const WINDOW_SCALE: u32 = 4;

/// Target frame duration (~30 FPS).
const FRAME_DURATION: Duration = Duration::from_millis(33);

/// Interval between synthetic sensor samples.
const MOCK_SAMPLE_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Demo(DemoScene),
    Sensors,
}

/// Generates synthetic sensor readings that vary over time.
struct MockSensorGenerator {
    elapsed_secs: f64,
}

impl MockSensorGenerator {
    fn new() -> Self {
        Self { elapsed_secs: 0.0 }
    }

    fn next_pressure(&mut self, dt_secs: f64) -> PressureReading {
        self.elapsed_secs += dt_secs;
        let t = self.elapsed_secs;

        // 20 to 26 °C and a slow 1000 Pa swing around sea level
        let temperature = 23.0 + 3.0 * (t / 120.0).sin();
        let pressure = 101_325.0 + 500.0 * (t / 300.0).sin() + 20.0 * (t / 7.0).cos();

        PressureReading {
            temperature_decicelsius: (temperature * 10.0) as i32,
            pressure_pa: pressure as u32,
        }
    }

    /// Drains from full to empty over ten minutes, then starts over.
    fn battery_percent(&self) -> u8 {
        100 - ((self.elapsed_secs / 6.0) as u64 % 101) as u8
    }
}

/// Current UTC time as the RTC would report it.
fn wall_clock() -> Option<DateTime> {
    rtc_time(Utc::now())
}

fn rtc_time(now: chrono::DateTime<Utc>) -> Option<DateTime> {
    DateTime::new(
        u16::try_from(now.year()).ok()?,
        now.month() as u8,
        now.day() as u8,
        now.hour() as u8,
        now.minute() as u8,
        now.second() as u8,
    )
    .ok()
}

fn keycode_to_screen(keycode: Keycode) -> Option<Screen> {
    match keycode {
        Keycode::Num1 | Keycode::Kp1 => Some(Screen::Demo(DemoScene::Shapes)),
        Keycode::Num2 | Keycode::Kp2 => Some(Screen::Demo(DemoScene::FilledShapes)),
        Keycode::Num3 | Keycode::Kp3 => Some(Screen::Demo(DemoScene::Text)),
        Keycode::Num4 | Keycode::Kp4 => Some(Screen::Demo(DemoScene::Bitmap)),
        Keycode::Num5 | Keycode::Kp5 => Some(Screen::Sensors),
        _ => None,
    }
}

fn render(screen: Screen, frame: &mut FrameBuffer, snapshot: &SensorSnapshot) {
    match screen {
        Screen::Demo(scene) => scene.draw(frame),
        Screen::Sensors => draw_sensor_screen(frame, snapshot),
    }
}

fn main() {
    env_logger::init();
    info!("Starting esp32-sketches OLED simulator");
    info!("Display: {}×{} (scale {}×)", WIDTH, HEIGHT, WINDOW_SCALE);
    info!("Keys: 1-4=Demo scenes  5=Sensors  Space=Next  I=Invert  Q=Quit");

    let mut display = SimulatorDisplay::<BinaryColor>::new(Size::new(WIDTH as u32, HEIGHT as u32));

    let output_settings = OutputSettingsBuilder::new()
        .theme(BinaryColorTheme::OledBlue)
        .scale(WINDOW_SCALE)
        .build();
    let mut window = Window::new("SSD1306 Simulator", &output_settings);

    let mut sensor_gen = MockSensorGenerator::new();
    let mut snapshot = SensorSnapshot::default();
    let mut frame = FrameBuffer::new();
    let mut screen = Screen::Demo(DemoScene::Shapes);

    let mut last_sample = Instant::now();

    // The SDL window is lazily initialized on the first `update()` call.
    // We must call `update()` once before `events()` or it will panic.
    render(screen, &mut frame, &snapshot);
    let _ = frame.flush(&mut display);
    window.update(&display);
    let mut needs_redraw = false;

    'running: loop {
        let frame_start = Instant::now();

        for event in window.events() {
            match event {
                SimulatorEvent::Quit => break 'running,

                SimulatorEvent::KeyDown { keycode, .. } => match keycode {
                    Keycode::Q | Keycode::Escape => break 'running,
                    Keycode::Space => {
                        let next = match screen {
                            Screen::Demo(scene) => scene.next(),
                            Screen::Sensors => DemoScene::Shapes,
                        };
                        screen = Screen::Demo(next);
                        needs_redraw = true;
                    }
                    Keycode::I => {
                        frame.toggle_invert();
                        info!("Inverted: {}", frame.is_inverted());
                        let _ = frame.flush(&mut display);
                    }
                    other => {
                        if let Some(target) = keycode_to_screen(other) {
                            info!("Showing {:?}", target);
                            screen = target;
                            needs_redraw = true;
                        }
                    }
                },

                _ => {}
            }
        }

        // Same queues the firmware producers publish to
        if last_sample.elapsed() >= MOCK_SAMPLE_INTERVAL {
            let reading = sensor_gen.next_pressure(MOCK_SAMPLE_INTERVAL.as_secs_f64());
            if let Err(e) = try_publish(&PRESSURE_QUEUE, SensorEvent::Pressure(reading)) {
                warn!("{}", e);
            }
            match wall_clock() {
                Some(now) => {
                    let _ = try_publish(&CLOCK_QUEUE, SensorEvent::Clock(now));
                }
                None => error!("System clock outside the RTC range"),
            }
            snapshot.battery_percent = Some(sensor_gen.battery_percent());
            last_sample = Instant::now();
        }

        while let Ok(event) = PRESSURE_QUEUE.try_receive() {
            snapshot.apply(event);
            needs_redraw |= screen == Screen::Sensors;
        }
        while let Ok(event) = CLOCK_QUEUE.try_receive() {
            snapshot.apply(event);
            needs_redraw |= screen == Screen::Sensors;
        }

        if needs_redraw {
            render(screen, &mut frame, &snapshot);
            if let Err(e) = frame.flush(&mut display) {
                error!("Draw error: {:?}", e);
            }
            needs_redraw = false;
        }

        window.update(&display);

        let elapsed = frame_start.elapsed();
        if elapsed < FRAME_DURATION {
            std::thread::sleep(FRAME_DURATION - elapsed);
        }
    }

    info!("Simulator exiting");
}
