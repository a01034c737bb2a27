//! SD card file storage and the sensor log format.

pub mod record;
pub mod sd_card;
pub mod time_source;

pub use record::{MAX_RECORD_SIZE, RecordError, SensorRecord};
pub use sd_card::{SdCardStorage, StorageError};
pub use time_source::{LastKnownTime, RtcTimeSource};

/// FAT mount label the demos log against.
pub const MOUNT_POINT: &str = "/sdcard";

pub const HELLO_FILE: &str = "HELLO.TXT";
pub const FOO_FILE: &str = "FOO.TXT";
pub const SENSOR_LOG_FILE: &str = "SENSORS.LOG";
pub const CONFIG_FILE: &str = "BOARD.CFG";
