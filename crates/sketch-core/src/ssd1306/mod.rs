//! SSD1306 128x64 monochrome OLED over I2C.
//!
//! Drawing happens in a [`FrameBuffer`]; [`Ssd1306::update_screen`] pushes
//! it to the panel one page at a time.

pub mod command;
mod framebuffer;
mod primitives;

pub use framebuffer::{BUFFER_SIZE, FrameBuffer};
pub use primitives::MidpointOctant;

use embedded_hal_async::i2c::{I2c, Operation};
use log::{error, info};
use thiserror_no_std::Error;

use command::{CONTROL_COMMAND, CONTROL_DATA, ScrollDirection};

/// 7-bit address (0x78 in 8-bit notation).
pub const ADDRESS: u8 = 0x3C;
pub const WIDTH: i32 = 128;
pub const HEIGHT: i32 = 64;
pub const PAGES: u8 = (HEIGHT / 8) as u8;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayError {
    #[error("SSD1306 command write failed")]
    Command,
    #[error("SSD1306 data write failed")]
    Data,
}

pub struct Ssd1306<I> {
    i2c: I,
    initialized: bool,
}

impl<I: I2c> Ssd1306<I> {
    pub fn new(i2c: I) -> Self {
        Self {
            i2c,
            initialized: false,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn release(self) -> I {
        self.i2c
    }

    /// Configure the panel, stop any scroll and show a blank `frame`.
    /// The frame cursor is reset to the top left corner.
    pub async fn init(&mut self, frame: &mut FrameBuffer) -> Result<(), DisplayError> {
        self.commands(&command::INIT_SEQUENCE).await?;
        self.stop_scroll().await?;
        frame.clear();
        self.update_screen(frame).await?;
        frame.goto_xy(0, 0);
        self.initialized = true;
        info!("SSD1306 ready");
        Ok(())
    }

    /// Send every page of `frame` in page addressing mode.
    pub async fn update_screen(&mut self, frame: &FrameBuffer) -> Result<(), DisplayError> {
        for (m, page) in frame.pages().enumerate() {
            self.commands(&command::page_address(m as u8)).await?;
            self.data(page).await?;
        }
        Ok(())
    }

    pub async fn scroll_right(&mut self, start_page: u8, end_page: u8) -> Result<(), DisplayError> {
        self.commands(&command::horizontal_scroll(ScrollDirection::Right, start_page, end_page))
            .await
    }

    pub async fn scroll_left(&mut self, start_page: u8, end_page: u8) -> Result<(), DisplayError> {
        self.commands(&command::horizontal_scroll(ScrollDirection::Left, start_page, end_page))
            .await
    }

    pub async fn scroll_diag_right(
        &mut self,
        start_page: u8,
        end_page: u8,
    ) -> Result<(), DisplayError> {
        self.commands(&command::diagonal_scroll(ScrollDirection::Right, start_page, end_page))
            .await
    }

    pub async fn scroll_diag_left(
        &mut self,
        start_page: u8,
        end_page: u8,
    ) -> Result<(), DisplayError> {
        self.commands(&command::diagonal_scroll(ScrollDirection::Left, start_page, end_page))
            .await
    }

    pub async fn stop_scroll(&mut self) -> Result<(), DisplayError> {
        self.commands(&[command::DEACTIVATE_SCROLL]).await
    }

    /// Hardware inversion; the frame buffer is untouched.
    pub async fn invert_display(&mut self, inverted: bool) -> Result<(), DisplayError> {
        self.commands(&[command::invert(inverted)]).await
    }

    pub async fn display_on(&mut self) -> Result<(), DisplayError> {
        self.commands(&command::POWER_ON).await
    }

    pub async fn display_off(&mut self) -> Result<(), DisplayError> {
        self.commands(&command::POWER_OFF).await
    }

    async fn commands(&mut self, bytes: &[u8]) -> Result<(), DisplayError> {
        self.transfer(CONTROL_COMMAND, bytes).await.map_err(|e| {
            error!("SSD1306 command {:02X?} failed: {:?}", bytes, e);
            DisplayError::Command
        })
    }

    async fn data(&mut self, bytes: &[u8]) -> Result<(), DisplayError> {
        self.transfer(CONTROL_DATA, bytes).await.map_err(|e| {
            error!("SSD1306 data write failed: {:?}", e);
            DisplayError::Data
        })
    }

    /// Control byte and payload in one write, without a repeated start.
    async fn transfer(&mut self, control: u8, bytes: &[u8]) -> Result<(), I::Error> {
        self.i2c
            .transaction(
                ADDRESS,
                &mut [Operation::Write(&[control]), Operation::Write(bytes)],
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeI2c;
    use embassy_futures::block_on;
    use embedded_graphics::pixelcolor::BinaryColor;

    /// Pair up the recorded control byte and payload writes.
    fn transfers(i2c: &FakeI2c) -> Vec<(u8, Vec<u8>)> {
        i2c.writes
            .chunks(2)
            .map(|pair| (pair[0][0], pair[1].clone()))
            .collect()
    }

    #[test]
    fn update_screen_frames_each_page() {
        let mut oled = Ssd1306::new(FakeI2c::new(ADDRESS));
        let mut frame = FrameBuffer::new();
        frame.draw_pixel(3, 17, BinaryColor::On);
        block_on(oled.update_screen(&frame)).unwrap();

        let sent = transfers(&oled.release());
        assert_eq!(sent.len(), 16);
        for m in 0..8u8 {
            let (control, cmd) = &sent[2 * m as usize];
            assert_eq!(*control, CONTROL_COMMAND);
            assert_eq!(cmd, &[0xB0 + m, 0x00, 0x10]);
            let (control, data) = &sent[2 * m as usize + 1];
            assert_eq!(*control, CONTROL_DATA);
            assert_eq!(data.len(), 128);
        }
        assert_eq!(sent[5].1[3], 1 << 1, "pixel (3, 17) lives in page 2, bit 1");
    }

    #[test]
    fn init_sends_configuration_then_blank_frame() {
        let mut oled = Ssd1306::new(FakeI2c::new(ADDRESS));
        let mut frame = FrameBuffer::new();
        frame.fill(BinaryColor::On);
        frame.goto_xy(40, 20);
        block_on(oled.init(&mut frame)).unwrap();

        assert!(oled.is_initialized());
        assert_eq!(frame.cursor(), (0, 0));
        let sent = transfers(&oled.release());
        assert_eq!(sent[0], (CONTROL_COMMAND, command::INIT_SEQUENCE.to_vec()));
        assert_eq!(sent[1], (CONTROL_COMMAND, vec![0x2E]));
        assert!(sent[2..].iter().filter(|t| t.0 == CONTROL_DATA).all(|t| t.1.iter().all(|&b| b == 0)));
    }

    #[test]
    fn scroll_and_power_commands() {
        let mut oled = Ssd1306::new(FakeI2c::new(ADDRESS));
        block_on(oled.scroll_right(0, 7)).unwrap();
        block_on(oled.scroll_diag_left(1, 2)).unwrap();
        block_on(oled.invert_display(true)).unwrap();
        block_on(oled.invert_display(false)).unwrap();
        block_on(oled.display_off()).unwrap();
        block_on(oled.display_on()).unwrap();

        let sent: Vec<Vec<u8>> = transfers(&oled.release()).into_iter().map(|t| t.1).collect();
        assert_eq!(sent[0], [0x26, 0x00, 0x00, 0x00, 0x07, 0x00, 0xFF, 0x2F]);
        assert_eq!(sent[1], [0xA3, 0x00, 0x40, 0x2A, 0x00, 0x01, 0x00, 0x02, 0x01, 0x2F]);
        assert_eq!(sent[2], [0xA7]);
        assert_eq!(sent[3], [0xA6]);
        assert_eq!(sent[4], [0x8D, 0x10, 0xAE]);
        assert_eq!(sent[5], [0x8D, 0x14, 0xAF]);
    }

    #[test]
    fn bus_failure_is_reported() {
        let mut i2c = FakeI2c::new(ADDRESS);
        i2c.fail = true;
        let mut oled = Ssd1306::new(i2c);
        let mut frame = FrameBuffer::new();
        assert_eq!(block_on(oled.init(&mut frame)), Err(DisplayError::Command));
        assert!(!oled.is_initialized());
    }
}
