//! SSD1306 command byte sequences.

use super::HEIGHT;

/// Control byte that prefixes a command stream.
pub const CONTROL_COMMAND: u8 = 0x00;
/// Control byte that prefixes GDDRAM data.
pub const CONTROL_DATA: u8 = 0x40;

pub const DISPLAY_OFF: u8 = 0xAE;
pub const DISPLAY_ON: u8 = 0xAF;
pub const NORMAL_DISPLAY: u8 = 0xA6;
pub const INVERT_DISPLAY: u8 = 0xA7;
pub const CHARGE_PUMP: u8 = 0x8D;

pub const RIGHT_HORIZONTAL_SCROLL: u8 = 0x26;
pub const LEFT_HORIZONTAL_SCROLL: u8 = 0x27;
pub const VERTICAL_AND_RIGHT_HORIZONTAL_SCROLL: u8 = 0x29;
pub const VERTICAL_AND_LEFT_HORIZONTAL_SCROLL: u8 = 0x2A;
pub const DEACTIVATE_SCROLL: u8 = 0x2E;
pub const ACTIVATE_SCROLL: u8 = 0x2F;
pub const SET_VERTICAL_SCROLL_AREA: u8 = 0xA3;

/// Power-on configuration for a 128x64 panel with the charge pump enabled.
#[rustfmt::skip]
pub const INIT_SEQUENCE: [u8; 28] = [
    DISPLAY_OFF,
    0x20, 0x10, // page addressing mode
    0xB0,       // page 0
    0xC8,       // COM scan remapped
    0x00, 0x10, // column 0
    0x40,       // start line 0
    0x81, 0xFF, // contrast
    0xA1,       // segment remap
    NORMAL_DISPLAY,
    0xA8, 0x3F, // multiplex 1/64
    0xA4,       // output follows RAM
    0xD3, 0x00, // no display offset
    0xD5, 0xF0, // clock divide
    0xD9, 0x22, // pre-charge
    0xDA, 0x12, // COM pins
    0xDB, 0x20, // VCOMH 0.77 Vcc
    CHARGE_PUMP, 0x14,
    DISPLAY_ON,
];

pub const POWER_ON: [u8; 3] = [CHARGE_PUMP, 0x14, DISPLAY_ON];
pub const POWER_OFF: [u8; 3] = [CHARGE_PUMP, 0x10, DISPLAY_OFF];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDirection {
    Right,
    Left,
}

/// Page address and column 0 for page-mode writes of page `m`.
pub const fn page_address(m: u8) -> [u8; 3] {
    [0xB0 + m, 0x00, 0x10]
}

/// Continuous horizontal scroll of pages `start..=end`, then activate.
pub const fn horizontal_scroll(direction: ScrollDirection, start: u8, end: u8) -> [u8; 8] {
    let opcode = match direction {
        ScrollDirection::Right => RIGHT_HORIZONTAL_SCROLL,
        ScrollDirection::Left => LEFT_HORIZONTAL_SCROLL,
    };
    [opcode, 0x00, start, 0x00, end, 0x00, 0xFF, ACTIVATE_SCROLL]
}

/// Vertical plus horizontal scroll over the full panel height, then activate.
pub const fn diagonal_scroll(direction: ScrollDirection, start: u8, end: u8) -> [u8; 10] {
    let opcode = match direction {
        ScrollDirection::Right => VERTICAL_AND_RIGHT_HORIZONTAL_SCROLL,
        ScrollDirection::Left => VERTICAL_AND_LEFT_HORIZONTAL_SCROLL,
    };
    [
        SET_VERTICAL_SCROLL_AREA,
        0x00,
        HEIGHT as u8,
        opcode,
        0x00,
        start,
        0x00,
        end,
        0x01,
        ACTIVATE_SCROLL,
    ]
}

pub const fn invert(inverted: bool) -> u8 {
    if inverted { INVERT_DISPLAY } else { NORMAL_DISPLAY }
}
