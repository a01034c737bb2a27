//! Fake pins, delays and I2C buses for driver tests.

use core::convert::Infallible;
use std::cell::RefCell;
use std::rc::Rc;
use std::vec::Vec;

use embedded_hal::digital::{ErrorType as PinErrorType, InputPin, OutputPin};
use embedded_hal::i2c::ErrorKind;
use embedded_hal_async::i2c::{ErrorType as I2cErrorType, I2c, Operation};
use embedded_sdmmc::{Block, BlockCount, BlockDevice, BlockIdx, TimeSource, Timestamp};

/// Shared record of every level change, in order, as `(pin id, level)`.
pub type PinLog = Rc<RefCell<Vec<(u8, bool)>>>;

pub fn pin_log() -> PinLog {
    Rc::new(RefCell::new(Vec::new()))
}

/// Output/input pin that appends every write to a shared log.
pub struct FakePin {
    pub id: u8,
    pub level: Rc<RefCell<bool>>,
    log: PinLog,
}

impl FakePin {
    pub fn new(id: u8, log: &PinLog) -> Self {
        Self {
            id,
            level: Rc::new(RefCell::new(false)),
            log: log.clone(),
        }
    }

    /// Input-only pin whose level is driven through the returned handle.
    pub fn input(initial: bool) -> (Self, Rc<RefCell<bool>>) {
        let level = Rc::new(RefCell::new(initial));
        let pin = Self {
            id: 0,
            level: level.clone(),
            log: pin_log(),
        };
        (pin, level)
    }
}

impl PinErrorType for FakePin {
    type Error = Infallible;
}

impl OutputPin for FakePin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        *self.level.borrow_mut() = false;
        self.log.borrow_mut().push((self.id, false));
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        *self.level.borrow_mut() = true;
        self.log.borrow_mut().push((self.id, true));
        Ok(())
    }
}

impl InputPin for FakePin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(*self.level.borrow())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!*self.level.borrow())
    }
}

/// Delay that returns immediately and sums the requested time.
#[derive(Default)]
pub struct FakeDelay {
    pub total_ns: u64,
}

impl embedded_hal_async::delay::DelayNs for FakeDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.total_ns += u64::from(ns);
    }
}

impl embedded_hal::delay::DelayNs for FakeDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += u64::from(ns);
    }
}

/// Register-file I2C device.
///
/// The first byte of a write selects the register pointer; remaining bytes
/// are stored from there. Reads return bytes from the pointer onwards.
pub struct FakeI2c {
    pub address: u8,
    pub regs: [u8; 256],
    pub writes: Vec<Vec<u8>>,
    pub fail: bool,
    pointer: u8,
}

impl FakeI2c {
    pub fn new(address: u8) -> Self {
        Self {
            address,
            regs: [0; 256],
            writes: Vec::new(),
            fail: false,
            pointer: 0,
        }
    }

    pub fn set_regs(&mut self, start: u8, bytes: &[u8]) {
        let start = start as usize;
        self.regs[start..start + bytes.len()].copy_from_slice(bytes);
    }
}

impl I2cErrorType for FakeI2c {
    type Error = ErrorKind;
}

impl I2c for FakeI2c {
    async fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        if self.fail {
            return Err(ErrorKind::Bus);
        }
        if address != self.address {
            return Err(ErrorKind::NoAcknowledge(
                embedded_hal::i2c::NoAcknowledgeSource::Address,
            ));
        }
        for op in operations.iter_mut() {
            match op {
                Operation::Write(bytes) => {
                    self.writes.push(bytes.to_vec());
                    if let Some((&reg, rest)) = bytes.split_first() {
                        self.pointer = reg;
                        for (i, b) in rest.iter().enumerate() {
                            self.regs[(reg as usize + i) & 0xFF] = *b;
                        }
                    }
                }
                Operation::Read(buf) => {
                    for (i, b) in buf.iter_mut().enumerate() {
                        *b = self.regs[(self.pointer as usize + i) & 0xFF];
                    }
                }
            }
        }
        Ok(())
    }
}

/// RAM-backed SD card holding one freshly formatted FAT16 partition.
///
/// One block per cluster and 4133 clusters, just above the FAT12 limit.
pub struct RamCard {
    blocks: RefCell<Vec<[u8; Block::LEN]>>,
}

impl RamCard {
    const PARTITION_START: u32 = 1;
    const VOLUME_BLOCKS: u16 = 4200;
    const RESERVED_BLOCKS: u16 = 1;
    const FAT_BLOCKS: u16 = 17;
    const ROOT_ENTRIES: u16 = 512;

    pub fn formatted() -> Self {
        let total = (Self::PARTITION_START + u32::from(Self::VOLUME_BLOCKS)) as usize;
        let mut blocks = vec![[0u8; Block::LEN]; total];

        // MBR with a single FAT16 partition
        let mbr = &mut blocks[0];
        mbr[446] = 0x00;
        mbr[450] = 0x06;
        mbr[454..458].copy_from_slice(&Self::PARTITION_START.to_le_bytes());
        mbr[458..462].copy_from_slice(&u32::from(Self::VOLUME_BLOCKS).to_le_bytes());
        mbr[510..512].copy_from_slice(&[0x55, 0xAA]);

        let start = Self::PARTITION_START as usize;
        let bpb = &mut blocks[start];
        bpb[0..3].copy_from_slice(&[0xEB, 0x3C, 0x90]);
        bpb[3..11].copy_from_slice(b"MSDOS5.0");
        bpb[11..13].copy_from_slice(&(Block::LEN as u16).to_le_bytes());
        bpb[13] = 1;
        bpb[14..16].copy_from_slice(&Self::RESERVED_BLOCKS.to_le_bytes());
        bpb[16] = 2;
        bpb[17..19].copy_from_slice(&Self::ROOT_ENTRIES.to_le_bytes());
        bpb[19..21].copy_from_slice(&Self::VOLUME_BLOCKS.to_le_bytes());
        bpb[21] = 0xF8;
        bpb[22..24].copy_from_slice(&Self::FAT_BLOCKS.to_le_bytes());
        bpb[24..26].copy_from_slice(&32u16.to_le_bytes());
        bpb[26..28].copy_from_slice(&2u16.to_le_bytes());
        bpb[28..32].copy_from_slice(&Self::PARTITION_START.to_le_bytes());
        bpb[36] = 0x80;
        bpb[38] = 0x29;
        bpb[39..43].copy_from_slice(&0x1234_5678u32.to_le_bytes());
        bpb[43..54].copy_from_slice(b"SKETCHES   ");
        bpb[54..62].copy_from_slice(b"FAT16   ");
        bpb[510..512].copy_from_slice(&[0x55, 0xAA]);

        // media descriptor and end-of-chain in the two reserved entries
        for fat in 0..2 {
            let first = start + usize::from(Self::RESERVED_BLOCKS + fat * Self::FAT_BLOCKS);
            blocks[first][0..4].copy_from_slice(&[0xF8, 0xFF, 0xFF, 0xFF]);
        }

        Self {
            blocks: RefCell::new(blocks),
        }
    }

    /// Card capacity in bytes, as the SD driver would report it.
    pub fn num_bytes(&self) -> u64 {
        self.blocks.borrow().len() as u64 * Block::LEN as u64
    }
}

impl BlockDevice for RamCard {
    type Error = Infallible;

    fn read(&self, blocks: &mut [Block], start_block_idx: BlockIdx) -> Result<(), Self::Error> {
        let store = self.blocks.borrow();
        let start = start_block_idx.0 as usize;
        for (block, stored) in blocks.iter_mut().zip(&store[start..]) {
            block.contents = *stored;
        }
        Ok(())
    }

    fn write(&self, blocks: &[Block], start_block_idx: BlockIdx) -> Result<(), Self::Error> {
        let mut store = self.blocks.borrow_mut();
        let start = start_block_idx.0 as usize;
        for (stored, block) in store[start..].iter_mut().zip(blocks) {
            *stored = block.contents;
        }
        Ok(())
    }

    fn num_blocks(&self) -> Result<BlockCount, Self::Error> {
        Ok(BlockCount(self.blocks.borrow().len() as u32))
    }
}

/// Clock stuck at 2024-01-01 00:00:00.
pub struct FixedClock;

impl TimeSource for FixedClock {
    fn get_timestamp(&self) -> Timestamp {
        Timestamp {
            year_since_1970: 54,
            zero_indexed_month: 0,
            zero_indexed_day: 0,
            hours: 0,
            minutes: 0,
            seconds: 0,
        }
    }
}
