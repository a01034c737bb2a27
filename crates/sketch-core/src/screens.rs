//! OLED scenes shared by the firmware and the desktop simulator.

use core::fmt::Write;

use embedded_graphics::mono_font::ascii::{FONT_6X10, FONT_7X13_BOLD};
use embedded_graphics::pixelcolor::BinaryColor;

use crate::sensors::{DateTime, PressureReading, SensorEvent};
use crate::ssd1306::{FrameBuffer, HEIGHT, WIDTH};

/// 16x16 smiley, two bytes per row.
pub const SMILEY: [u8; 32] = [
    0x07, 0xE0, 0x18, 0x18, 0x20, 0x04, 0x40, 0x02, 0x4C, 0x32, 0x8C, 0x31, 0x80, 0x01, 0x80,
    0x01, 0x80, 0x01, 0x88, 0x11, 0x84, 0x21, 0x43, 0xC2, 0x40, 0x02, 0x20, 0x04, 0x18, 0x18,
    0x07, 0xE0,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemoScene {
    Shapes,
    FilledShapes,
    Text,
    Bitmap,
}

impl DemoScene {
    pub const ALL: [DemoScene; 4] = [
        DemoScene::Shapes,
        DemoScene::FilledShapes,
        DemoScene::Text,
        DemoScene::Bitmap,
    ];

    pub fn next(self) -> Self {
        match self {
            Self::Shapes => Self::FilledShapes,
            Self::FilledShapes => Self::Text,
            Self::Text => Self::Bitmap,
            Self::Bitmap => Self::Shapes,
        }
    }

    /// Clear `frame` and draw the scene.
    pub fn draw(self, frame: &mut FrameBuffer) {
        frame.clear();
        let on = BinaryColor::On;
        match self {
            Self::Shapes => {
                frame.draw_rectangle(0, 0, WIDTH - 1, HEIGHT - 1, on);
                frame.draw_line(0, 0, WIDTH - 1, HEIGHT - 1, on);
                frame.draw_line(0, HEIGHT - 1, WIDTH - 1, 0, on);
                frame.draw_circle(32, 32, 20, on);
                frame.draw_triangle((80, 50), (100, 14), (120, 50), on);
            }
            Self::FilledShapes => {
                frame.draw_filled_rectangle(4, 4, 30, 20, on);
                frame.draw_filled_circle(64, 40, 18, on);
                frame.draw_filled_triangle((94, 60), (124, 60), (109, 30), on);
            }
            Self::Text => {
                frame.goto_xy(10, 5);
                let _ = frame.puts("SSD1306", &FONT_7X13_BOLD, on);
                frame.goto_xy(10, 25);
                let _ = frame.puts("128x64 OLED", &FONT_6X10, on);
                frame.goto_xy(10, 40);
                let _ = frame.puts("ESP32 demo", &FONT_6X10, on);
            }
            Self::Bitmap => {
                for (i, x) in (8..WIDTH - 16).step_by(24).enumerate() {
                    frame.draw_bitmap(x, 8 + (i as i32 % 2) * 24, &SMILEY, 16, 16, on);
                }
            }
        }
    }
}

/// Latest values received from the sensor queues.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SensorSnapshot {
    pub pressure: Option<PressureReading>,
    pub clock: Option<DateTime>,
    pub battery_percent: Option<u8>,
}

impl SensorSnapshot {
    pub fn apply(&mut self, event: SensorEvent) {
        match event {
            SensorEvent::Pressure(reading) => self.pressure = Some(reading),
            SensorEvent::Clock(now) => self.clock = Some(now),
        }
    }
}

/// Status page: clock, temperature, pressure and battery, "--" when unknown.
pub fn draw_sensor_screen(frame: &mut FrameBuffer, snapshot: &SensorSnapshot) {
    frame.clear();
    let on = BinaryColor::On;
    let mut line: heapless::String<24> = heapless::String::new();

    frame.goto_xy(0, 0);
    match snapshot.clock {
        Some(now) => {
            let _ = write!(
                line,
                "{} {:02}:{:02}:{:02}",
                now.weekday.short_name(),
                now.hours,
                now.minutes,
                now.seconds
            );
        }
        None => {
            let _ = line.push_str("--:--:--");
        }
    }
    let _ = frame.puts(&line, &FONT_7X13_BOLD, on);
    frame.draw_line(0, 15, WIDTH - 1, 15, on);

    line.clear();
    match snapshot.pressure {
        Some(p) => {
            let _ = write!(line, "T {:.1} C", p.temperature_celsius());
        }
        None => {
            let _ = line.push_str("T -- C");
        }
    }
    frame.goto_xy(0, 20);
    let _ = frame.puts(&line, &FONT_6X10, on);

    line.clear();
    match snapshot.pressure {
        Some(p) => {
            let _ = write!(line, "P {} Pa", p.pressure_pa);
        }
        None => {
            let _ = line.push_str("P -- Pa");
        }
    }
    frame.goto_xy(0, 32);
    let _ = frame.puts(&line, &FONT_6X10, on);

    line.clear();
    match snapshot.battery_percent {
        Some(percent) => {
            let _ = write!(line, "Bat {}%", percent);
        }
        None => {
            let _ = line.push_str("Bat --%");
        }
    }
    frame.goto_xy(0, 44);
    let _ = frame.puts(&line, &FONT_6X10, on);
    if let Some(percent) = snapshot.battery_percent {
        let fill = i32::from(percent.min(100)) * 38 / 100;
        frame.draw_rectangle(84, 44, 40, 9, on);
        if fill > 0 {
            frame.draw_filled_rectangle(85, 45, fill, 7, on);
        }
    }
}
