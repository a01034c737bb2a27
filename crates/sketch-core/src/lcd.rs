//! HD44780-compatible character LCD on a 4-bit parallel bus.
//!
//! Only the upper data lines (D4..D7) are wired. Every byte is sent as two
//! nibbles, high nibble first, latched on the falling edge of `E`.

use core::fmt::Write;

use embedded_hal::digital::OutputPin;
use embedded_hal_async::delay::DelayNs;
use log::error;
use thiserror_no_std::Error;

/// Largest HD44780 geometry the addressing supports.
pub const MAX_COLUMNS: u8 = 20;
pub const MAX_ROWS: u8 = 4;

/// DDRAM address of the first column of each row.
const ROW_OFFSETS: [u8; 4] = [0x00, 0x40, 0x14, 0x54];

const CMD_CLEAR: u8 = 0x01;
const CMD_ENTRY_MODE: u8 = 0x06; // increment, no shift
const CMD_DISPLAY_ON: u8 = 0x0C; // display on, cursor off, blink off
const CMD_FUNCTION_SET: u8 = 0x28; // 4-bit, 2 lines, 5x8 dots
const CMD_SET_DDRAM: u8 = 0x80;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LcdError {
    #[error("LCD pin write failed")]
    Pin,
    #[error("position ({col}, {row}) is outside the display")]
    OutOfRange { col: u8, row: u8 },
}

pub struct CharLcd<P, D> {
    data: [P; 4],
    enable: P,
    register_select: P,
    delay: D,
}

impl<P, D> CharLcd<P, D>
where
    P: OutputPin,
    D: DelayNs,
{
    /// `data` is D4, D5, D6, D7 in that order.
    pub fn new(data: [P; 4], enable: P, register_select: P, delay: D) -> Self {
        Self {
            data,
            enable,
            register_select,
            delay,
        }
    }

    /// Power-on reset into 4-bit mode, then display on and cleared.
    pub async fn init(&mut self) -> Result<(), LcdError> {
        self.delay.delay_ms(50).await;
        set(&mut self.register_select, false)?;
        set(&mut self.enable, false)?;

        self.write_nibble(0x03).await?;
        self.delay.delay_us(4500).await;
        self.write_nibble(0x03).await?;
        self.delay.delay_us(4500).await;
        self.write_nibble(0x03).await?;
        self.delay.delay_us(150).await;
        self.write_nibble(0x02).await?;

        self.command(CMD_FUNCTION_SET).await?;
        self.command(CMD_DISPLAY_ON).await?;
        self.clear().await?;
        self.command(CMD_ENTRY_MODE).await
    }

    pub async fn clear(&mut self) -> Result<(), LcdError> {
        self.command(CMD_CLEAR).await
    }

    pub async fn set_cursor(&mut self, col: u8, row: u8) -> Result<(), LcdError> {
        if col >= MAX_COLUMNS || row >= MAX_ROWS {
            return Err(LcdError::OutOfRange { col, row });
        }
        self.command(CMD_SET_DDRAM | (col + ROW_OFFSETS[row as usize]))
            .await
    }

    /// Write `text` starting at (`col`, `row`). Characters past the right
    /// edge are dropped.
    pub async fn set_text(&mut self, text: &str, col: u8, row: u8) -> Result<(), LcdError> {
        self.set_cursor(col, row).await?;
        let room = (MAX_COLUMNS - col) as usize;
        for byte in text.bytes().take(room) {
            self.send(byte, true).await?;
        }
        Ok(())
    }

    /// Write `value` in decimal starting at (`col`, `row`).
    pub async fn set_int(&mut self, value: i32, col: u8, row: u8) -> Result<(), LcdError> {
        let mut digits: heapless::String<12> = heapless::String::new();
        // 12 bytes always fit an i32
        let _ = write!(digits, "{}", value);
        self.set_text(&digits, col, row).await
    }

    async fn command(&mut self, cmd: u8) -> Result<(), LcdError> {
        self.send(cmd, false).await?;
        if cmd == CMD_CLEAR {
            self.delay.delay_ms(2).await;
        }
        Ok(())
    }

    async fn send(&mut self, byte: u8, is_data: bool) -> Result<(), LcdError> {
        set(&mut self.register_select, is_data)?;
        self.write_nibble(byte >> 4).await?;
        self.write_nibble(byte & 0x0F).await
    }

    async fn write_nibble(&mut self, nibble: u8) -> Result<(), LcdError> {
        for (bit, pin) in self.data.iter_mut().enumerate() {
            set(pin, nibble & (1 << bit) != 0)?;
        }
        set(&mut self.enable, true)?;
        self.delay.delay_us(1).await;
        set(&mut self.enable, false)?;
        // most instructions need 37us to execute
        self.delay.delay_us(100).await;
        Ok(())
    }
}

fn set<P: OutputPin>(pin: &mut P, high: bool) -> Result<(), LcdError> {
    let result = if high { pin.set_high() } else { pin.set_low() };
    result.map_err(|e| {
        error!("LCD pin write failed: {:?}", e);
        LcdError::Pin
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeDelay, FakePin, PinLog, pin_log};
    use embassy_futures::block_on;
    use std::collections::HashMap;

    const DATA: [u8; 4] = [19, 18, 17, 16];
    const EN: u8 = 27;
    const RS: u8 = 26;

    fn lcd(log: &PinLog) -> CharLcd<FakePin, FakeDelay> {
        CharLcd::new(
            DATA.map(|id| FakePin::new(id, log)),
            FakePin::new(EN, log),
            FakePin::new(RS, log),
            FakeDelay::default(),
        )
    }

    /// Replay the pin log and return every latched `(rs, nibble)`.
    fn latched_nibbles(log: &PinLog) -> Vec<(bool, u8)> {
        let mut levels: HashMap<u8, bool> = HashMap::new();
        let mut out = Vec::new();
        for &(id, level) in log.borrow().iter() {
            let was_high = levels.get(&id).copied().unwrap_or(false);
            levels.insert(id, level);
            if id == EN && was_high && !level {
                let nibble = DATA
                    .iter()
                    .enumerate()
                    .map(|(bit, pin)| (levels.get(pin).copied().unwrap_or(false) as u8) << bit)
                    .sum();
                out.push((levels.get(&RS).copied().unwrap_or(false), nibble));
            }
        }
        out
    }

    fn bytes(nibbles: &[(bool, u8)]) -> Vec<(bool, u8)> {
        nibbles
            .chunks(2)
            .map(|pair| (pair[0].0, (pair[0].1 << 4) | pair[1].1))
            .collect()
    }

    #[test]
    fn init_enters_four_bit_mode_then_configures() {
        let log = pin_log();
        let mut lcd = lcd(&log);
        block_on(lcd.init()).unwrap();

        let nibbles = latched_nibbles(&log);
        let reset: Vec<u8> = nibbles[..4].iter().map(|n| n.1).collect();
        assert_eq!(reset, [0x03, 0x03, 0x03, 0x02]);

        let commands = bytes(&nibbles[4..]);
        assert_eq!(
            commands,
            [(false, 0x28), (false, 0x0C), (false, 0x01), (false, 0x06)]
        );
    }

    #[test]
    fn set_text_positions_cursor_then_writes_data() {
        let log = pin_log();
        let mut lcd = lcd(&log);
        block_on(lcd.set_text("Hi", 8, 1)).unwrap();

        let sent = bytes(&latched_nibbles(&log));
        assert_eq!(sent, [(false, 0xC8), (true, b'H'), (true, b'i')]);
    }

    #[test]
    fn lower_rows_use_twenty_column_offsets() {
        let log = pin_log();
        let mut lcd = lcd(&log);
        block_on(lcd.set_cursor(0, 2)).unwrap();
        block_on(lcd.set_cursor(3, 3)).unwrap();

        let sent = bytes(&latched_nibbles(&log));
        assert_eq!(sent, [(false, 0x94), (false, 0xD7)]);
    }

    #[test]
    fn set_int_writes_signed_decimal() {
        let log = pin_log();
        let mut lcd = lcd(&log);
        block_on(lcd.set_int(-42, 0, 0)).unwrap();

        let sent = bytes(&latched_nibbles(&log));
        assert_eq!(
            sent,
            [(false, 0x80), (true, b'-'), (true, b'4'), (true, b'2')]
        );
    }

    #[test]
    fn text_is_truncated_at_right_edge() {
        let log = pin_log();
        let mut lcd = lcd(&log);
        block_on(lcd.set_text("Count: 1234567", 10, 0)).unwrap();

        let sent = bytes(&latched_nibbles(&log));
        assert_eq!(sent.len(), 1 + 10, "cursor command plus ten addressable columns");
    }

    #[test]
    fn out_of_range_position_is_rejected() {
        let log = pin_log();
        let mut lcd = lcd(&log);
        assert_eq!(
            block_on(lcd.set_cursor(20, 0)),
            Err(LcdError::OutOfRange { col: 20, row: 0 })
        );
        assert_eq!(
            block_on(lcd.set_cursor(0, 4)),
            Err(LcdError::OutOfRange { col: 0, row: 4 })
        );
        assert!(log.borrow().is_empty());
    }
}
