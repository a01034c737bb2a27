use core::fmt;

use serde::{Deserialize, Serialize};

use super::SensorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Weekday {
    Monday = 1,
    Tuesday = 2,
    Wednesday = 3,
    Thursday = 4,
    Friday = 5,
    Saturday = 6,
    Sunday = 7,
}

impl Weekday {
    /// 1 = Monday ... 7 = Sunday.
    pub const fn from_number(n: u8) -> Option<Self> {
        Some(match n {
            1 => Self::Monday,
            2 => Self::Tuesday,
            3 => Self::Wednesday,
            4 => Self::Thursday,
            5 => Self::Friday,
            6 => Self::Saturday,
            7 => Self::Sunday,
            _ => return None,
        })
    }

    pub const fn number(self) -> u8 {
        self as u8
    }

    pub const fn short_name(self) -> &'static str {
        match self {
            Self::Monday => "Mon",
            Self::Tuesday => "Tue",
            Self::Wednesday => "Wed",
            Self::Thursday => "Thu",
            Self::Friday => "Fri",
            Self::Saturday => "Sat",
            Self::Sunday => "Sun",
        }
    }

    /// Day of the week for a Gregorian date (Sakamoto's method).
    pub const fn for_date(year: u16, month: u8, day: u8) -> Self {
        const T: [u16; 12] = [0, 3, 2, 5, 0, 3, 5, 1, 4, 6, 2, 4];
        let y = if month < 3 { year - 1 } else { year };
        let sunday_based =
            (y + y / 4 - y / 100 + y / 400 + T[(month - 1) as usize] + day as u16) % 7;
        match sunday_based {
            0 => Self::Sunday,
            1 => Self::Monday,
            2 => Self::Tuesday,
            3 => Self::Wednesday,
            4 => Self::Thursday,
            5 => Self::Friday,
            _ => Self::Saturday,
        }
    }
}

/// Wall-clock time as kept by the RTC, valid for years 2000..=2199.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub weekday: Weekday,
    pub hours: u8,
    pub minutes: u8,
    pub seconds: u8,
}

pub const fn is_leap_year(year: u16) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

pub const fn days_in_month(year: u16, month: u8) -> u8 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 0,
    }
}

impl DateTime {
    /// Validated constructor; the weekday is derived from the date.
    pub fn new(
        year: u16,
        month: u8,
        day: u8,
        hours: u8,
        minutes: u8,
        seconds: u8,
    ) -> Result<Self, SensorError> {
        Self::validate(year, month, day, hours, minutes, seconds)?;
        Ok(Self {
            year,
            month,
            day,
            weekday: Weekday::for_date(year, month, day),
            hours,
            minutes,
            seconds,
        })
    }

    pub(crate) fn validate(
        year: u16,
        month: u8,
        day: u8,
        hours: u8,
        minutes: u8,
        seconds: u8,
    ) -> Result<(), SensorError> {
        let details = if !(2000..=2199).contains(&year) {
            "year outside 2000..=2199"
        } else if !(1..=12).contains(&month) {
            "month outside 1..=12"
        } else if day == 0 || day > days_in_month(year, month) {
            "day outside month"
        } else if hours > 23 {
            "hours outside 0..=23"
        } else if minutes > 59 {
            "minutes outside 0..=59"
        } else if seconds > 59 {
            "seconds outside 0..=59"
        } else {
            return Ok(());
        };
        Err(SensorError::InvalidArgument { details })
    }
}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hours, self.minutes, self.seconds
        )
    }
}
