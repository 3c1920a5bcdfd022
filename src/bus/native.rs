// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-mems-sensors project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Native I2C driver for Linux hosts
//!
//! This module provides a native I2C driver that communicates directly
//! with the I2C controller through /dev/i2c-* devices.

use super::{parse_bus_number, I2CBusDriver};
use anyhow::{Context, Result};
use log::{debug, info};
use rppal::i2c::I2c;

/// Native I2C driver backed by a Linux i2c-dev character device
pub struct NativeI2CDriver {
    i2c: I2c,
    bus: u8,
    selected: Option<u8>,
}

impl NativeI2CDriver {
    /// Open the bus named by `bus_id` (`"I2C1"`, `"/dev/i2c-1"`, `"1"`)
    pub fn new(bus_id: &str) -> Result<Self> {
        let bus = parse_bus_number(bus_id)?;
        let i2c = I2c::with_bus(bus).with_context(|| format!("Failed to open I2C bus {}", bus))?;
        info!("Opened native I2C bus /dev/i2c-{}", bus);
        Ok(Self {
            i2c,
            bus,
            selected: None,
        })
    }

    fn select(&mut self, address: u8) -> Result<()> {
        if self.selected != Some(address) {
            self.i2c
                .set_slave_address(u16::from(address))
                .with_context(|| {
                    format!(
                        "Failed to select address 0x{:02X} on bus {}",
                        address, self.bus
                    )
                })?;
            self.selected = Some(address);
        }
        Ok(())
    }
}

impl I2CBusDriver for NativeI2CDriver {
    fn write_read(&mut self, address: u8, write: &[u8], read: &mut [u8]) -> Result<usize> {
        self.select(address)?;
        // i2c-dev performs the combined transfer atomically or not at all
        self.i2c
            .write_read(write, read)
            .with_context(|| format!("I2C write-read at 0x{:02X} failed", address))?;
        debug!(
            "I2C read from address=0x{:02X}, write={:?}, {} bytes",
            address,
            write,
            read.len()
        );
        Ok(read.len())
    }

    fn write(&mut self, address: u8, data: &[u8]) -> Result<usize> {
        self.select(address)?;
        let written = self
            .i2c
            .write(data)
            .with_context(|| format!("I2C write at 0x{:02X} failed", address))?;
        debug!(
            "I2C write to address=0x{:02X}, data={:?}, {} bytes",
            address, data, written
        );
        Ok(written)
    }

    fn device_present(&mut self, address: u8) -> Result<bool> {
        self.select(address)?;
        let mut byte = [0u8; 1];
        Ok(matches!(self.i2c.read(&mut byte), Ok(1)))
    }
}
