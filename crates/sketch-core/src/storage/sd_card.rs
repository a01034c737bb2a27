use core::fmt::{Debug, Write};

use embedded_sdmmc::{
    BlockDevice, Directory, Error as SdError, Mode, TimeSource, VolumeIdx, VolumeManager,
};
use log::{info, warn};
use thiserror_no_std::Error;

use super::record::{MAX_RECORD_SIZE, RecordError, SensorRecord, decode_log};
use super::{FOO_FILE, HELLO_FILE, MOUNT_POINT, SENSOR_LOG_FILE};

const MAX_DIRS: usize = 4;
const MAX_FILES: usize = 4;
const MAX_VOLUMES: usize = 1;

/// Bytes read from the sensor log per call.
const LOG_CHUNK: usize = 256;

type Root<'v, D, T> = Directory<'v, D, T, MAX_DIRS, MAX_FILES, MAX_VOLUMES>;

#[derive(Error, Debug)]
pub enum StorageError<E: Debug> {
    #[error("SD card error: {0:?}")]
    Card(SdError<E>),
    #[error("sensor record: {0}")]
    Record(RecordError),
    #[error("file does not fit the read buffer")]
    BufferTooSmall,
}

impl<E: Debug> From<SdError<E>> for StorageError<E> {
    fn from(e: SdError<E>) -> Self {
        Self::Card(e)
    }
}

/// File access on the first FAT volume of the card.
///
/// Like the rest of the SD stack these calls block; the demos run them from
/// a task that owns the card.
pub struct SdCardStorage<D, T>
where
    D: BlockDevice,
    T: TimeSource,
{
    volume_mgr: VolumeManager<D, T, MAX_DIRS, MAX_FILES, MAX_VOLUMES>,
}

impl<D, T> SdCardStorage<D, T>
where
    D: BlockDevice,
    T: TimeSource,
{
    pub fn new(device: D, time_source: T) -> Self {
        Self {
            volume_mgr: VolumeManager::new(device, time_source),
        }
    }

    /// Create or truncate `name` and write `data`.
    pub fn write_file(&self, name: &str, data: &[u8]) -> Result<(), StorageError<D::Error>> {
        self.with_root(|root| {
            let file = root.open_file_in_dir(name, Mode::ReadWriteCreateOrTruncate)?;
            file.write(data)?;
            file.close()
        })?;
        Ok(())
    }

    pub fn append_file(&self, name: &str, data: &[u8]) -> Result<(), StorageError<D::Error>> {
        self.with_root(|root| {
            let file = root.open_file_in_dir(name, Mode::ReadWriteCreateOrAppend)?;
            file.write(data)?;
            file.close()
        })?;
        Ok(())
    }

    /// Read the whole of `name` into `buf`, returning the byte count.
    pub fn read_file(&self, name: &str, buf: &mut [u8]) -> Result<usize, StorageError<D::Error>> {
        let (total, complete) = self.with_root(|root| {
            let file = root.open_file_in_dir(name, Mode::ReadOnly)?;
            let mut total = 0;
            while !file.is_eof() && total < buf.len() {
                let n = file.read(&mut buf[total..])?;
                if n == 0 {
                    break;
                }
                total += n;
            }
            let complete = file.is_eof();
            file.close()?;
            Ok((total, complete))
        })?;
        if !complete {
            return Err(StorageError::BufferTooSmall);
        }
        Ok(total)
    }

    /// Returns `false` if there was nothing to delete.
    pub fn delete_file(&self, name: &str) -> Result<bool, StorageError<D::Error>> {
        let deleted = self.with_root(|root| match root.delete_file_in_dir(name) {
            Ok(()) => Ok(true),
            Err(SdError::NotFound) => Ok(false),
            Err(e) => Err(e),
        })?;
        Ok(deleted)
    }

    pub fn file_size(&self, name: &str) -> Result<u32, StorageError<D::Error>> {
        let size = self.with_root(|root| {
            let file = root.open_file_in_dir(name, Mode::ReadOnly)?;
            let size = file.length();
            file.close()?;
            Ok(size)
        })?;
        Ok(size)
    }

    /// FAT has no rename through this API, so copy then delete the source.
    pub fn rename_file(&self, from: &str, to: &str) -> Result<(), StorageError<D::Error>> {
        self.with_root(|root| {
            let src = root.open_file_in_dir(from, Mode::ReadOnly)?;
            let dst = root.open_file_in_dir(to, Mode::ReadWriteCreateOrTruncate)?;
            let mut chunk = [0u8; 64];
            while !src.is_eof() {
                let n = src.read(&mut chunk)?;
                if n == 0 {
                    break;
                }
                dst.write(&chunk[..n])?;
            }
            dst.close()?;
            src.close()?;
            root.delete_file_in_dir(from)
        })?;
        Ok(())
    }

    /// Append one framed record to the sensor log.
    pub fn append_record(&self, record: &SensorRecord) -> Result<(), StorageError<D::Error>> {
        let mut buf = [0u8; MAX_RECORD_SIZE];
        let frame = record.encode(&mut buf).map_err(StorageError::Record)?;
        self.append_file(SENSOR_LOG_FILE, frame)
    }

    /// Decode the sensor log a chunk at a time, handing each record to
    /// `sink`. A frame split across chunks is carried over to the next
    /// read, so the log may be any length. Returns the record count.
    pub fn for_each_record(
        &self,
        mut sink: impl FnMut(SensorRecord),
    ) -> Result<usize, StorageError<D::Error>> {
        let count = self.with_root(|root| {
            let file = root.open_file_in_dir(SENSOR_LOG_FILE, Mode::ReadOnly)?;
            let mut buf = [0u8; LOG_CHUNK + MAX_RECORD_SIZE];
            let mut carried = 0;
            let mut count = 0;
            loop {
                let n = file.read(&mut buf[carried..carried + LOG_CHUNK])?;
                if n == 0 {
                    break;
                }
                let filled = carried + n;
                carried = match buf[..filled].iter().rposition(|&b| b == 0) {
                    Some(end) => {
                        count += decode_log(&mut buf[..=end], &mut sink);
                        buf.copy_within(end + 1..filled, 0);
                        filled - end - 1
                    }
                    None => filled,
                };
                if carried > MAX_RECORD_SIZE {
                    warn!("dropping {} bytes without a frame delimiter", carried);
                    carried = 0;
                }
            }
            if carried > 0 {
                warn!("{} ends in a torn frame of {} bytes", SENSOR_LOG_FILE, carried);
            }
            file.close()?;
            Ok(count)
        })?;
        Ok(count)
    }

    /// Write a greeting, move it over `FOO.TXT` and read it back.
    /// Returns the first line that was read.
    pub fn run_file_demo(
        &self,
        card_bytes: u64,
    ) -> Result<heapless::String<64>, StorageError<D::Error>> {
        info!("Opening file {}/{}", MOUNT_POINT, HELLO_FILE);
        self.write_file(HELLO_FILE, greeting(card_bytes).as_bytes())?;
        info!("File written");

        if self.delete_file(FOO_FILE)? {
            info!("Deleted stale {}", FOO_FILE);
        }

        info!("Renaming file {} to {}", HELLO_FILE, FOO_FILE);
        self.rename_file(HELLO_FILE, FOO_FILE)?;

        let mut buf = [0u8; 64];
        let n = self.read_file(FOO_FILE, &mut buf)?;
        let text = core::str::from_utf8(&buf[..n]).unwrap_or_else(|e| {
            warn!("{} is not UTF-8: {:?}", FOO_FILE, e);
            ""
        });
        let mut line = heapless::String::new();
        // buffer and line have the same capacity
        let _ = line.push_str(first_line(text));
        info!("Read from file: '{}'", line);
        Ok(line)
    }

    fn with_root<R, F>(&self, f: F) -> Result<R, SdError<D::Error>>
    where
        F: FnOnce(&Root<'_, D, T>) -> Result<R, SdError<D::Error>>,
    {
        let volume = self.volume_mgr.open_volume(VolumeIdx(0))?;
        let root = volume.open_root_dir()?;
        let result = f(&root);
        let closed = root.close().and_then(|()| volume.close());
        let value = result?;
        closed.map(|()| value)
    }
}

/// Contents of `HELLO.TXT` for a card of `card_bytes`.
pub fn greeting(card_bytes: u64) -> heapless::String<32> {
    let mut text = heapless::String::new();
    // at most 14 digits plus 10 bytes
    let _ = writeln!(text, "Hello {}MB!", card_bytes / (1024 * 1024));
    text
}

/// Text up to the first newline.
pub fn first_line(text: &str) -> &str {
    text.split('\n').next().unwrap_or("")
}
