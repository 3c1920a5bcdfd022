// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-mems-sensors project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Register access layer
//!
//! A [`DeviceSession`] owns the transport for one device address and turns
//! register reads and writes into bus transactions. Every transfer that does
//! not move all requested bytes becomes
//! [`SensorError::BusTransferIncomplete`]; nothing is retried.

use crate::bus::I2CBusDriver;
use crate::codec::{assemble_le, decode_signed, BitWidth};
use crate::error::{Result, SensorError};
use log::{debug, warn};

/// Address MSB that requests register auto-increment on some devices
pub const AUTO_INCREMENT_FLAG: u8 = 0x80;

/// How a device advances its register pointer during multi-byte reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressingMode {
    /// The address MSB must be set; harmless on single-byte reads so it is
    /// always asserted
    AutoIncrementFlag,
    /// The device increments on its own (IF_ADD_INC style)
    DeviceIncrement,
}

impl AddressingMode {
    /// Address byte sent before a read
    pub const fn read_pointer(self, register: u8) -> u8 {
        match self {
            AddressingMode::AutoIncrementFlag => register | AUTO_INCREMENT_FLAG,
            AddressingMode::DeviceIncrement => register,
        }
    }
}

/// Exclusive use of one device address on a bus
pub struct DeviceSession<B> {
    bus: B,
    address: u8,
    addressing: AddressingMode,
}

impl<B: I2CBusDriver> DeviceSession<B> {
    pub fn open(bus: B, address: u8, addressing: AddressingMode) -> Self {
        Self {
            bus,
            address,
            addressing,
        }
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn addressing(&self) -> AddressingMode {
        self.addressing
    }

    /// Give the transport back, ending the session
    pub fn into_bus(self) -> B {
        self.bus
    }

    fn incomplete(&self, register: u8, expected: usize, transferred: usize) -> SensorError {
        SensorError::BusTransferIncomplete {
            address: self.address,
            register,
            expected,
            transferred,
        }
    }

    /// Read `count` consecutive registers starting at `register`
    pub fn read_register(&mut self, register: u8, count: usize) -> Result<Vec<u8>> {
        let pointer = self.addressing.read_pointer(register);
        let mut buffer = vec![0u8; count];

        let transferred = match self.bus.write_read(self.address, &[pointer], &mut buffer) {
            Ok(n) => n,
            Err(e) => {
                warn!(
                    "I2C read at 0x{:02X} register 0x{:02X} failed: {:#}",
                    self.address, register, e
                );
                0
            }
        };

        if transferred != count {
            return Err(self.incomplete(register, count, transferred));
        }

        debug!(
            "Read 0x{:02X}[0x{:02X}..+{}] = {:02X?}",
            self.address, register, count, buffer
        );
        Ok(buffer)
    }

    /// Write `bytes` to consecutive registers starting at `register`
    pub fn write_register(&mut self, register: u8, bytes: &[u8]) -> Result<()> {
        let mut frame = Vec::with_capacity(bytes.len() + 1);
        frame.push(register);
        frame.extend_from_slice(bytes);

        let transferred = match self.bus.write(self.address, &frame) {
            Ok(n) => n,
            Err(e) => {
                warn!(
                    "I2C write at 0x{:02X} register 0x{:02X} failed: {:#}",
                    self.address, register, e
                );
                0
            }
        };

        if transferred != frame.len() {
            return Err(self.incomplete(register, frame.len(), transferred));
        }

        debug!(
            "Wrote 0x{:02X}[0x{:02X}] = {:02X?}",
            self.address, register, bytes
        );
        Ok(())
    }

    pub fn read_u8(&mut self, register: u8) -> Result<u8> {
        Ok(self.read_register(register, 1)?[0])
    }

    /// Read an unsigned little-endian word
    pub fn read_word(&mut self, register: u8, width: BitWidth) -> Result<u32> {
        let bytes = self.read_register(register, width.bytes())?;
        Ok(assemble_le(&bytes, width))
    }

    /// Read a two's-complement little-endian word
    pub fn read_signed(&mut self, register: u8, width: BitWidth) -> Result<i32> {
        Ok(decode_signed(self.read_word(register, width)?, width))
    }

    /// Read `count` consecutive signed words in a single transaction
    pub fn read_signed_block(
        &mut self,
        register: u8,
        width: BitWidth,
        count: usize,
    ) -> Result<Vec<i32>> {
        let bytes = self.read_register(register, width.bytes() * count)?;
        Ok(bytes
            .chunks_exact(width.bytes())
            .map(|chunk| decode_signed(assemble_le(chunk, width), width))
            .collect())
    }

    /// Read-modify-write a single register, returning the value written
    pub fn update_register(&mut self, register: u8, f: impl FnOnce(u8) -> u8) -> Result<u8> {
        let current = self.read_u8(register)?;
        let updated = f(current);
        self.write_register(register, &[updated])?;
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::MockI2CBusDriver;
    use anyhow::anyhow;

    #[test]
    fn test_flag_set_on_reads() {
        let mut bus = MockI2CBusDriver::new();
        bus.expect_write_read()
            .withf(|address, write, read| *address == 0x5F && write.to_vec() == [0xA8] && read.len() == 2)
            .times(1)
            .returning(|_, _, read| {
                read.copy_from_slice(&[0xFA, 0x00]);
                Ok(2)
            });

        let mut session = DeviceSession::open(bus, 0x5F, AddressingMode::AutoIncrementFlag);
        assert_eq!(session.read_signed(0x28, BitWidth::Bits16).unwrap(), 250);
    }

    #[test]
    fn test_plain_pointer_for_incrementing_devices() {
        let mut bus = MockI2CBusDriver::new();
        bus.expect_write_read()
            .withf(|_, write, _| write.to_vec() == [0x28])
            .times(1)
            .returning(|_, _, read| {
                read.copy_from_slice(&[0x00, 0x00, 0x80]);
                Ok(3)
            });

        let mut session = DeviceSession::open(bus, 0x5C, AddressingMode::DeviceIncrement);
        assert_eq!(
            session.read_signed(0x28, BitWidth::Bits24).unwrap(),
            -8_388_608
        );
    }

    #[test]
    fn test_partial_read_is_incomplete() {
        let mut bus = MockI2CBusDriver::new();
        bus.expect_write_read().returning(|_, _, _| Ok(1));

        let mut session = DeviceSession::open(bus, 0x6A, AddressingMode::DeviceIncrement);
        match session.read_register(0x28, 6) {
            Err(SensorError::BusTransferIncomplete {
                address,
                register,
                expected,
                transferred,
            }) => {
                assert_eq!((address, register, expected, transferred), (0x6A, 0x28, 6, 1));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_transport_error_is_incomplete() {
        let mut bus = MockI2CBusDriver::new();
        bus.expect_write()
            .returning(|_, _| Err(anyhow!("arbitration lost")));

        let mut session = DeviceSession::open(bus, 0x1E, AddressingMode::AutoIncrementFlag);
        let err = session.write_register(0x60, &[0x80]).unwrap_err();
        assert!(matches!(
            err,
            SensorError::BusTransferIncomplete {
                expected: 2,
                transferred: 0,
                ..
            }
        ));
    }

    #[test]
    fn test_write_frames_address_then_payload() {
        let mut bus = MockI2CBusDriver::new();
        bus.expect_write()
            .withf(|address, data| *address == 0x5F && data.to_vec() == [0x10, 0x1B, 0x85])
            .times(1)
            .returning(|_, data| Ok(data.len()));

        let mut session = DeviceSession::open(bus, 0x5F, AddressingMode::AutoIncrementFlag);
        session.write_register(0x10, &[0x1B, 0x85]).unwrap();
    }

    #[test]
    fn test_short_write_is_incomplete() {
        let mut bus = MockI2CBusDriver::new();
        bus.expect_write().returning(|_, _| Ok(1));

        let mut session = DeviceSession::open(bus, 0x5C, AddressingMode::DeviceIncrement);
        assert!(matches!(
            session.write_register(0x10, &[0x3A]),
            Err(SensorError::BusTransferIncomplete { transferred: 1, .. })
        ));
    }

    #[test]
    fn test_update_register_sets_bits() {
        let mut bus = MockI2CBusDriver::new();
        bus.expect_write_read().returning(|_, _, read| {
            read[0] = 0x44;
            Ok(1)
        });
        bus.expect_write()
            .withf(|_, data| data.to_vec() == [0x12, 0x45])
            .times(1)
            .returning(|_, data| Ok(data.len()));

        let mut session = DeviceSession::open(bus, 0x6A, AddressingMode::DeviceIncrement);
        assert_eq!(session.update_register(0x12, |v| v | 0x01).unwrap(), 0x45);
    }

    #[test]
    fn test_signed_block() {
        let mut bus = MockI2CBusDriver::new();
        bus.expect_write_read().returning(|_, _, read| {
            read.copy_from_slice(&[0x01, 0x00, 0xFF, 0xFF, 0x00, 0x80]);
            Ok(6)
        });

        let mut session = DeviceSession::open(bus, 0x6A, AddressingMode::DeviceIncrement);
        assert_eq!(
            session.read_signed_block(0x28, BitWidth::Bits16, 3).unwrap(),
            vec![1, -1, -32768]
        );
    }
}
