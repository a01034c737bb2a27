//! 1 bit per pixel GDDRAM mirror for the 128x64 OLED.
//!
//! Byte `x + (y / 8) * WIDTH` holds column `x` of page `y / 8`, bit `y % 8`
//! is row `y`. The layout matches what the controller expects in page
//! addressing mode, so each page is sent as-is.

use core::convert::Infallible;

use embedded_graphics::mono_font::{MonoFont, MonoTextStyleBuilder};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use embedded_graphics::text::{Baseline, Text};

use super::{HEIGHT, WIDTH};

pub const BUFFER_SIZE: usize = WIDTH as usize * HEIGHT as usize / 8;

pub struct FrameBuffer {
    buffer: [u8; BUFFER_SIZE],
    inverted: bool,
    cursor_x: u16,
    cursor_y: u16,
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameBuffer {
    pub const fn new() -> Self {
        Self {
            buffer: [0; BUFFER_SIZE],
            inverted: false,
            cursor_x: 0,
            cursor_y: 0,
        }
    }

    /// Set every byte; not affected by the inverted flag.
    pub fn fill(&mut self, color: BinaryColor) {
        let byte = if color.is_on() { 0xFF } else { 0x00 };
        self.buffer.fill(byte);
    }

    pub fn clear(&mut self) {
        self.fill(BinaryColor::Off);
    }

    /// Out-of-panel coordinates are ignored.
    pub fn draw_pixel(&mut self, x: i32, y: i32, color: BinaryColor) {
        if !(0..WIDTH).contains(&x) || !(0..HEIGHT).contains(&y) {
            return;
        }
        let color = if self.inverted { color.invert() } else { color };
        let index = x as usize + (y as usize / 8) * WIDTH as usize;
        let mask = 1u8 << (y % 8);
        if color.is_on() {
            self.buffer[index] |= mask;
        } else {
            self.buffer[index] &= !mask;
        }
    }

    /// Stored bit at (`x`, `y`), `None` off-panel.
    pub fn pixel(&self, x: i32, y: i32) -> Option<BinaryColor> {
        if !(0..WIDTH).contains(&x) || !(0..HEIGHT).contains(&y) {
            return None;
        }
        let byte = self.buffer[x as usize + (y as usize / 8) * WIDTH as usize];
        Some(BinaryColor::from(byte & (1 << (y % 8)) != 0))
    }

    /// Invert the stored image and flip the drawing polarity.
    pub fn toggle_invert(&mut self) {
        self.inverted = !self.inverted;
        for byte in self.buffer.iter_mut() {
            *byte = !*byte;
        }
    }

    pub fn is_inverted(&self) -> bool {
        self.inverted
    }

    pub fn page(&self, m: u8) -> Option<&[u8]> {
        let start = m as usize * WIDTH as usize;
        self.buffer.get(start..start + WIDTH as usize)
    }

    pub fn pages(&self) -> impl Iterator<Item = &[u8]> {
        self.buffer.chunks_exact(WIDTH as usize)
    }

    pub fn as_bytes(&self) -> &[u8; BUFFER_SIZE] {
        &self.buffer
    }

    pub fn goto_xy(&mut self, x: u16, y: u16) {
        self.cursor_x = x;
        self.cursor_y = y;
    }

    pub fn cursor(&self) -> (u16, u16) {
        (self.cursor_x, self.cursor_y)
    }

    /// Draw one glyph at the cursor, foreground `color` on the opposite
    /// background, and advance by the glyph width. Returns `None` without
    /// drawing if the glyph would cross the right or bottom edge.
    pub fn putc(&mut self, ch: char, font: &MonoFont<'_>, color: BinaryColor) -> Option<char> {
        let glyph = font.character_size;
        if u32::from(self.cursor_x) + glyph.width >= WIDTH as u32
            || u32::from(self.cursor_y) + glyph.height >= HEIGHT as u32
        {
            return None;
        }

        let style = MonoTextStyleBuilder::new()
            .font(font)
            .text_color(color)
            .background_color(color.invert())
            .build();
        let mut utf8 = [0u8; 4];
        let origin = Point::new(i32::from(self.cursor_x), i32::from(self.cursor_y));
        // drawing into RAM cannot fail
        let _ = Text::with_baseline(ch.encode_utf8(&mut utf8), origin, style, Baseline::Top)
            .draw(self);

        self.cursor_x += glyph.width as u16;
        Some(ch)
    }

    /// Write `text` glyph by glyph. On overflow returns the first character
    /// that did not fit; the ones before it stay drawn.
    pub fn puts(&mut self, text: &str, font: &MonoFont<'_>, color: BinaryColor) -> Result<(), char> {
        for ch in text.chars() {
            self.putc(ch, font, color).ok_or(ch)?;
        }
        Ok(())
    }

    /// Copy the stored image to another display, e.g. the simulator window.
    pub fn flush<D>(&self, display: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = BinaryColor>,
    {
        let area = Rectangle::new(Point::zero(), self.size());
        let colors = (0..HEIGHT).flat_map(move |y| {
            (0..WIDTH).map(move |x| self.pixel(x, y).unwrap_or(BinaryColor::Off))
        });
        display.fill_contiguous(&area, colors)
    }
}

impl OriginDimensions for FrameBuffer {
    fn size(&self) -> Size {
        Size::new(WIDTH as u32, HEIGHT as u32)
    }
}

impl DrawTarget for FrameBuffer {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(coord, color) in pixels {
            self.draw_pixel(coord.x, coord.y, color);
        }
        Ok(())
    }
}
