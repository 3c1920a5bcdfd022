// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-mems-sensors project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! I2C bus transports
//!
//! This module provides the transport abstraction consumed by the register
//! layer and its implementations:
//! - Native: Linux `/dev/i2c-*` character devices (feature `native-i2c`)
//! - Mock: in-memory register files for tests and hardware-free runs
//! - Shared: a locking handle that serialises several drivers on one bus
//!
//! Transports block until the transfer completes. No timeout or retry is
//! applied here; both are properties of the underlying adapter.

pub mod mock;
#[cfg(feature = "native-i2c")]
pub mod native;
pub mod shared;

pub use mock::{MockAddressing, MockDevice, MockFault, MockI2CDriver, MockTransaction};
#[cfg(feature = "native-i2c")]
pub use native::NativeI2CDriver;
pub use shared::SharedI2CBus;

use anyhow::{anyhow, Result};

use crate::config::{I2CBusConfig, I2CBusType};

/// Transport used by a device session
///
/// Both operations report how many bytes actually moved so that the caller
/// can tell a partial transfer from a complete one. An `Err` means the
/// adapter gave up without a byte count (NACK, arbitration loss, closed fd).
#[cfg_attr(test, mockall::automock)]
pub trait I2CBusDriver {
    /// Write `write` to `address`, then read `read.len()` bytes with a
    /// repeated start. Returns the number of bytes read.
    fn write_read(&mut self, address: u8, write: &[u8], read: &mut [u8]) -> Result<usize>;

    /// Write `data` to `address`. Returns the number of bytes written.
    fn write(&mut self, address: u8, data: &[u8]) -> Result<usize>;

    /// Check if a device acknowledges `address`
    fn device_present(&mut self, address: u8) -> Result<bool>;
}

impl<T: I2CBusDriver + ?Sized> I2CBusDriver for &mut T {
    fn write_read(&mut self, address: u8, write: &[u8], read: &mut [u8]) -> Result<usize> {
        (**self).write_read(address, write, read)
    }

    fn write(&mut self, address: u8, data: &[u8]) -> Result<usize> {
        (**self).write(address, data)
    }

    fn device_present(&mut self, address: u8) -> Result<bool> {
        (**self).device_present(address)
    }
}

impl<T: I2CBusDriver + ?Sized> I2CBusDriver for Box<T> {
    fn write_read(&mut self, address: u8, write: &[u8], read: &mut [u8]) -> Result<usize> {
        (**self).write_read(address, write, read)
    }

    fn write(&mut self, address: u8, data: &[u8]) -> Result<usize> {
        (**self).write(address, data)
    }

    fn device_present(&mut self, address: u8) -> Result<bool> {
        (**self).device_present(address)
    }
}

/// Create the bus driver selected by configuration
pub fn create_bus_driver(config: &I2CBusConfig) -> Result<Box<dyn I2CBusDriver + Send>> {
    match config.bus_type {
        #[cfg(feature = "native-i2c")]
        I2CBusType::Native => Ok(Box::new(NativeI2CDriver::new(&config.bus_id)?)),
        #[cfg(not(feature = "native-i2c"))]
        I2CBusType::Native => Err(anyhow!(
            "Native I2C bus '{}' requested but the `native-i2c` feature is disabled",
            config.bus_id
        )),
        I2CBusType::Mock => Ok(Box::new(MockI2CDriver::with_preset_devices())),
    }
}

/// Parse a bus identifier into a Linux bus number
///
/// Accepts `"I2C1"`, `"i2c-1"`, `"/dev/i2c-1"` and plain `"1"`.
pub fn parse_bus_number(bus_id: &str) -> Result<u8> {
    let trimmed = bus_id.trim();
    let digits = trimmed
        .strip_prefix("/dev/i2c-")
        .or_else(|| trimmed.strip_prefix("i2c-"))
        .or_else(|| {
            trimmed
                .get(..3)
                .filter(|prefix| prefix.eq_ignore_ascii_case("i2c"))
                .map(|_| &trimmed[3..])
        })
        .unwrap_or(trimmed);

    digits
        .parse::<u8>()
        .map_err(|_| anyhow!("Invalid I2C bus identifier '{}'", bus_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bus_number() {
        assert_eq!(parse_bus_number("I2C1").unwrap(), 1);
        assert_eq!(parse_bus_number("i2c-3").unwrap(), 3);
        assert_eq!(parse_bus_number("/dev/i2c-11").unwrap(), 11);
        assert_eq!(parse_bus_number(" 0 ").unwrap(), 0);
        assert!(parse_bus_number("spi0").is_err());
        assert!(parse_bus_number("I2C").is_err());
    }

    #[test]
    fn test_create_mock_bus() {
        let config = I2CBusConfig {
            bus_type: I2CBusType::Mock,
            bus_id: "mock".to_string(),
        };

        let mut driver = create_bus_driver(&config).unwrap();
        assert!(driver.device_present(0x5F).unwrap());
        assert!(!driver.device_present(0x10).unwrap());
    }

    fn write_through<B: I2CBusDriver>(mut bus: B) -> usize {
        bus.write(0x5C, &[0x10, 0x3A]).unwrap()
    }

    #[test]
    fn test_mut_ref_forwards() {
        let mut mock = MockI2CBusDriver::new();
        mock.expect_write()
            .withf(|address, data| *address == 0x5C && data.to_vec() == [0x10, 0x3A])
            .times(1)
            .returning(|_, data| Ok(data.len()));

        assert_eq!(write_through(&mut mock), 2);
    }
}
