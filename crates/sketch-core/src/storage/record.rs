//! Logged sensor samples.
//!
//! Each record is postcard encoded and COBS framed, so frames are separated
//! by a single zero byte and a torn write only loses the last frame.

use log::warn;
use serde::{Deserialize, Serialize};
use thiserror_no_std::Error;

use crate::sensors::{DateTime, PressureReading};

/// Upper bound of one framed record, delimiter included.
pub const MAX_RECORD_SIZE: usize = 32;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorRecord {
    /// RTC time of the sample, if the clock was readable.
    pub time: Option<DateTime>,
    pub temperature_decicelsius: i32,
    pub pressure_pa: u32,
    pub battery_percent: Option<u8>,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordError {
    #[error("record does not fit the buffer")]
    BufferTooSmall,
    #[error("corrupt record frame")]
    Corrupt,
}

impl SensorRecord {
    pub fn new(
        time: Option<DateTime>,
        reading: PressureReading,
        battery_percent: Option<u8>,
    ) -> Self {
        Self {
            time,
            temperature_decicelsius: reading.temperature_decicelsius,
            pressure_pa: reading.pressure_pa,
            battery_percent,
        }
    }

    /// Encode into `buf`, returning the frame including its zero delimiter.
    pub fn encode<'b>(&self, buf: &'b mut [u8]) -> Result<&'b mut [u8], RecordError> {
        postcard::to_slice_cobs(self, buf).map_err(|_| RecordError::BufferTooSmall)
    }

    /// Decode one frame in place. The delimiter may be present or not.
    pub fn decode(frame: &mut [u8]) -> Result<Self, RecordError> {
        postcard::from_bytes_cobs(frame).map_err(|_| RecordError::Corrupt)
    }

    pub fn reading(&self) -> PressureReading {
        PressureReading {
            temperature_decicelsius: self.temperature_decicelsius,
            pressure_pa: self.pressure_pa,
        }
    }
}

/// Decode every complete frame of a log, skipping corrupt ones. Returns the
/// number of records handed to `sink`.
pub fn decode_log(bytes: &mut [u8], mut sink: impl FnMut(SensorRecord)) -> usize {
    let mut count = 0;
    for frame in bytes.split_mut(|&b| b == 0) {
        if frame.is_empty() {
            continue;
        }
        match SensorRecord::decode(frame) {
            Ok(record) => {
                sink(record);
                count += 1;
            }
            Err(_) => warn!("skipping corrupt log frame of {} bytes", frame.len()),
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(pa: u32) -> SensorRecord {
        SensorRecord::new(
            Some(DateTime::new(2199, 12, 31, 23, 59, 59).unwrap()),
            PressureReading {
                temperature_decicelsius: -400,
                pressure_pa: pa,
            },
            Some(100),
        )
    }

    #[test]
    fn frame_is_zero_terminated_and_bounded() {
        let mut buf = [0xAAu8; MAX_RECORD_SIZE];
        let frame = sample(u32::MAX).encode(&mut buf).unwrap();
        assert!(frame.len() <= MAX_RECORD_SIZE);
        assert_eq!(frame.last(), Some(&0));
        assert!(!frame[..frame.len() - 1].contains(&0));
    }

    #[test]
    fn log_with_several_frames_decodes_in_order() {
        let mut log = Vec::new();
        for pa in [100_000, 101_325, 0] {
            let mut buf = [0u8; MAX_RECORD_SIZE];
            log.extend_from_slice(sample(pa).encode(&mut buf).unwrap());
        }
        let mut seen = Vec::new();
        assert_eq!(decode_log(&mut log, |r| seen.push(r.pressure_pa)), 3);
        assert_eq!(seen, [100_000, 101_325, 0]);
    }

    #[test]
    fn torn_tail_is_skipped() {
        let mut log = Vec::new();
        let mut buf = [0u8; MAX_RECORD_SIZE];
        log.extend_from_slice(sample(1).encode(&mut buf).unwrap());
        let second = sample(2).encode(&mut buf).unwrap();
        log.extend_from_slice(&second[..3]);
        let mut seen = Vec::new();
        assert_eq!(decode_log(&mut log, |r| seen.push(r)), 1);
        assert_eq!(seen[0], sample(1));
    }

    #[test]
    fn record_without_clock_or_battery() {
        let record = SensorRecord::new(None, PressureReading::default(), None);
        let mut buf = [0u8; MAX_RECORD_SIZE];
        let frame = record.encode(&mut buf).unwrap();
        assert_eq!(SensorRecord::decode(frame).unwrap(), record);
    }
}
