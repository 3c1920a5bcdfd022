// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-mems-sensors project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Shared bus handle
//!
//! Device drivers take their transport by value. When several sensors sit on
//! the same physical bus, each driver gets a clone of one `SharedI2CBus`; the
//! inner mutex guarantees that at most one transaction is in flight at a time.

use super::I2CBusDriver;
use anyhow::{anyhow, Result};
use std::sync::{Arc, Mutex};

/// Clonable, mutex-serialised access to one bus driver
pub struct SharedI2CBus<B> {
    inner: Arc<Mutex<B>>,
}

impl<B> Clone for SharedI2CBus<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B: I2CBusDriver> SharedI2CBus<B> {
    pub fn new(bus: B) -> Self {
        Self {
            inner: Arc::new(Mutex::new(bus)),
        }
    }

    /// Number of handles currently sharing the bus
    pub fn handle_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }
}

impl<B: I2CBusDriver> I2CBusDriver for SharedI2CBus<B> {
    fn write_read(&mut self, address: u8, write: &[u8], read: &mut [u8]) -> Result<usize> {
        let mut bus = self
            .inner
            .lock()
            .map_err(|_| anyhow!("Failed to lock I2C bus"))?;
        bus.write_read(address, write, read)
    }

    fn write(&mut self, address: u8, data: &[u8]) -> Result<usize> {
        let mut bus = self
            .inner
            .lock()
            .map_err(|_| anyhow!("Failed to lock I2C bus"))?;
        bus.write(address, data)
    }

    fn device_present(&mut self, address: u8) -> Result<bool> {
        let mut bus = self
            .inner
            .lock()
            .map_err(|_| anyhow!("Failed to lock I2C bus"))?;
        bus.device_present(address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::MockI2CDriver;
    use std::thread;

    #[test]
    fn test_handles_share_one_bus() {
        let mock = MockI2CDriver::with_preset_devices();
        let shared = SharedI2CBus::new(mock.clone());

        let workers: Vec<_> = [0x5F_u8, 0x5C, 0x1E, 0x6A]
            .into_iter()
            .map(|address| {
                let mut bus = shared.clone();
                thread::spawn(move || {
                    let mut buf = [0u8; 1];
                    for _ in 0..10 {
                        bus.write_read(address, &[0x0F], &mut buf).unwrap();
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        assert_eq!(mock.transactions().len(), 40);
        assert_eq!(shared.handle_count(), 1);
    }
}
