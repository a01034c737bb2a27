//! Shared async I2C bus
//!
//! The OLED, BMP180 and DS3231 sit on the same I2C0 lines. Each driver owns
//! a `SharedI2c` handle; a handle holds the bus lock for one whole
//! transaction and yields to the executor while waiting for it.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex;
use embedded_hal_async::i2c::{ErrorType, I2c, Operation};

pub type I2cBus<T> = Mutex<CriticalSectionRawMutex, T>;

pub struct SharedI2c<'a, T> {
    bus: &'a I2cBus<T>,
}

impl<'a, T> SharedI2c<'a, T> {
    #[inline]
    pub const fn new(bus: &'a I2cBus<T>) -> Self {
        Self { bus }
    }
}

impl<T> Clone for SharedI2c<'_, T> {
    fn clone(&self) -> Self {
        Self { bus: self.bus }
    }
}

impl<T: ErrorType> ErrorType for SharedI2c<'_, T> {
    type Error = T::Error;
}

impl<T: I2c> I2c for SharedI2c<'_, T> {
    // read/write/write_read default to a single transaction
    #[inline]
    async fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        let mut bus = self.bus.lock().await;
        bus.transaction(address, operations).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeI2c;
    use embassy_futures::block_on;

    #[test]
    fn handles_share_one_bus() {
        let bus: I2cBus<FakeI2c> = Mutex::new(FakeI2c::new(0x3C));
        let mut first = SharedI2c::new(&bus);
        let mut second = first.clone();

        block_on(first.write(0x3C, &[0x10, 0xAB])).unwrap();
        let mut out = [0u8; 1];
        block_on(second.write_read(0x3C, &[0x10], &mut out)).unwrap();
        assert_eq!(out, [0xAB]);

        let device = block_on(bus.lock());
        assert_eq!(device.writes.len(), 2);
    }

    #[test]
    fn errors_pass_through() {
        let bus: I2cBus<FakeI2c> = Mutex::new(FakeI2c::new(0x3C));
        let mut handle = SharedI2c::new(&bus);
        assert!(block_on(handle.write(0x77, &[0])).is_err());
    }
}
