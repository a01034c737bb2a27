//! FAT timestamps from the last DS3231 reading.

use core::cell::Cell;

use critical_section::Mutex;
use embedded_sdmmc::{TimeSource, Timestamp};

use crate::sensors::DateTime;

/// 2000-01-01 00:00:00, used until the RTC has been read.
const EPOCH: Timestamp = Timestamp {
    year_since_1970: 30,
    zero_indexed_month: 0,
    zero_indexed_day: 0,
    hours: 0,
    minutes: 0,
    seconds: 0,
};

pub fn timestamp(dt: &DateTime) -> Timestamp {
    Timestamp {
        // FAT dates end in 2107
        year_since_1970: (dt.year.clamp(1970, 2107) - 1970) as u8,
        zero_indexed_month: dt.month.saturating_sub(1),
        zero_indexed_day: dt.day.saturating_sub(1),
        hours: dt.hours,
        minutes: dt.minutes,
        seconds: dt.seconds,
    }
}

/// Latest wall-clock time, written by the clock task and read by the SD
/// card layer from any context.
pub struct LastKnownTime {
    inner: Mutex<Cell<Timestamp>>,
}

impl Default for LastKnownTime {
    fn default() -> Self {
        Self::new()
    }
}

impl LastKnownTime {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(Cell::new(EPOCH)),
        }
    }

    pub fn update(&self, dt: &DateTime) {
        let ts = timestamp(dt);
        critical_section::with(|cs| self.inner.borrow(cs).set(ts));
    }

    pub fn get(&self) -> Timestamp {
        critical_section::with(|cs| self.inner.borrow(cs).get())
    }
}

/// `TimeSource` handle backed by a shared [`LastKnownTime`].
#[derive(Clone, Copy)]
pub struct RtcTimeSource<'a> {
    time: &'a LastKnownTime,
}

impl<'a> RtcTimeSource<'a> {
    pub const fn new(time: &'a LastKnownTime) -> Self {
        Self { time }
    }
}

impl TimeSource for RtcTimeSource<'_> {
    fn get_timestamp(&self) -> Timestamp {
        self.time.get()
    }
}
