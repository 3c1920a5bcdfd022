// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-mems-sensors project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Mock I2C driver backed by in-memory register files
//!
//! Each emulated device owns a 256-byte register file and one of the two
//! addressing conventions found on the supported sensors:
//! - `AddressMsb`: multi-byte reads only advance when the address byte has
//!   its MSB set; without it every byte comes from the same register
//! - `Always`: the register pointer advances after every byte
//!
//! The driver is a cheap handle around shared state, so a test can keep a
//! clone to inspect the transaction log and register contents while a
//! device driver owns another clone. Faults can be queued per address to
//! exercise partial transfers and NACKs.

use super::I2CBusDriver;
use crate::codec::{encode_signed, split_le, BitWidth};
use crate::devices::{hts221, lis2mdl, lps22hb, lsm6dsl};
use anyhow::{anyhow, Result};
use log::debug;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

/// Register auto-increment convention of an emulated device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockAddressing {
    /// Address MSB (0x80) requests auto-increment
    AddressMsb,
    /// Register pointer always advances
    Always,
}

/// Fault consumed by the next transaction addressed to a device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockFault {
    /// Only this many bytes are read back
    ShortRead(usize),
    /// Only this many bytes (address byte included) are written
    ShortWrite(usize),
    /// The device does not acknowledge
    Nack,
}

/// One transaction seen by the mock bus
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockTransaction {
    WriteRead {
        address: u8,
        write: Vec<u8>,
        read_len: usize,
    },
    Write {
        address: u8,
        data: Vec<u8>,
    },
}

impl MockTransaction {
    /// Register pointer byte as sent on the wire
    pub fn register_byte(&self) -> Option<u8> {
        match self {
            MockTransaction::WriteRead { write, .. } => write.first().copied(),
            MockTransaction::Write { data, .. } => data.first().copied(),
        }
    }

    pub fn is_write(&self) -> bool {
        matches!(self, MockTransaction::Write { .. })
    }
}

/// Emulated I2C device
#[derive(Debug, Clone)]
pub struct MockDevice {
    addressing: MockAddressing,
    registers: [u8; 256],
}

impl MockDevice {
    /// Create a device with all registers cleared
    pub fn new(addressing: MockAddressing) -> Self {
        Self {
            addressing,
            registers: [0; 256],
        }
    }

    /// Builder-style register preset
    pub fn with_registers(mut self, start: u8, values: &[u8]) -> Self {
        self.store(start, values);
        self
    }

    /// Builder-style signed word preset, little-endian from `start`
    pub fn with_signed(self, start: u8, value: i32, width: BitWidth) -> Self {
        let bytes = split_le(encode_signed(value, width), width);
        self.with_registers(start, &bytes)
    }

    fn store(&mut self, start: u8, values: &[u8]) {
        for (offset, &value) in values.iter().enumerate() {
            self.registers[start.wrapping_add(offset as u8) as usize] = value;
        }
    }

    fn decode_pointer(&self, pointer: u8, multi_byte: bool) -> (u8, bool) {
        match self.addressing {
            MockAddressing::AddressMsb => (pointer & 0x7F, !multi_byte || pointer & 0x80 != 0),
            MockAddressing::Always => (pointer, true),
        }
    }

    /// HTS221 with calibration giving 50 %RH and 25 °C
    pub fn hts221() -> Self {
        Self::new(MockAddressing::AddressMsb)
            .with_registers(hts221::WHO_AM_I, &[hts221::DEVICE_ID])
            // H0 = 20 %RH, H1 = 80 %RH (stored doubled)
            .with_registers(hts221::H0_RH_X2, &[40, 160])
            // T0 = 20 °C, T1 = 30 °C (stored x8, no MSB extension)
            .with_registers(hts221::T0_DEGC_X8, &[160, 240])
            .with_registers(hts221::T1_T0_MSB, &[0x00])
            .with_signed(hts221::H0_T0_OUT, 1000, BitWidth::Bits16)
            .with_signed(hts221::H1_T0_OUT, 7000, BitWidth::Bits16)
            .with_signed(hts221::T0_OUT, 100, BitWidth::Bits16)
            .with_signed(hts221::T1_OUT, 400, BitWidth::Bits16)
            .with_signed(hts221::H_OUT, 4000, BitWidth::Bits16)
            .with_signed(hts221::T_OUT, 250, BitWidth::Bits16)
    }

    /// LPS22HB reading 1013.25 hPa and 23.5 °C
    pub fn lps22hb() -> Self {
        Self::new(MockAddressing::Always)
            .with_registers(lps22hb::WHO_AM_I, &[lps22hb::DEVICE_ID])
            .with_signed(lps22hb::PRESS_OUT_XL, 4_150_272, BitWidth::Bits24)
            .with_signed(lps22hb::TEMP_OUT_L, 2350, BitWidth::Bits16)
    }

    /// LIS2MDL reading (300, -150, 600) mG and 27 °C
    pub fn lis2mdl() -> Self {
        Self::new(MockAddressing::AddressMsb)
            .with_registers(lis2mdl::WHO_AM_I, &[lis2mdl::DEVICE_ID])
            .with_signed(lis2mdl::OUTX_L_REG, 200, BitWidth::Bits16)
            .with_signed(lis2mdl::OUTX_L_REG + 2, -100, BitWidth::Bits16)
            .with_signed(lis2mdl::OUTX_L_REG + 4, 400, BitWidth::Bits16)
            .with_signed(lis2mdl::TEMP_OUT_L_REG, 16, BitWidth::Bits16)
    }

    /// LSM6DSL at rest with all data-ready flags raised
    pub fn lsm6dsl() -> Self {
        Self::new(MockAddressing::Always)
            .with_registers(lsm6dsl::WHO_AM_I, &[lsm6dsl::DEVICE_ID])
            .with_registers(
                lsm6dsl::STATUS_REG,
                &[lsm6dsl::XLDA | lsm6dsl::GDA | lsm6dsl::TDA],
            )
            .with_signed(lsm6dsl::OUT_TEMP_L, 256, BitWidth::Bits16)
            .with_signed(lsm6dsl::OUTX_L_G, 100, BitWidth::Bits16)
            .with_signed(lsm6dsl::OUTX_L_G + 2, -100, BitWidth::Bits16)
            .with_signed(lsm6dsl::OUTX_L_G + 4, 0, BitWidth::Bits16)
            .with_signed(lsm6dsl::OUTX_L_XL, 0, BitWidth::Bits16)
            .with_signed(lsm6dsl::OUTX_L_XL + 2, 0, BitWidth::Bits16)
            .with_signed(lsm6dsl::OUTX_L_XL + 4, 16_393, BitWidth::Bits16)
    }
}

#[derive(Debug, Default)]
struct MockBusState {
    devices: HashMap<u8, MockDevice>,
    faults: VecDeque<(u8, MockFault)>,
    transactions: Vec<MockTransaction>,
}

impl MockBusState {
    fn take_fault(&mut self, address: u8) -> Option<MockFault> {
        let index = self.faults.iter().position(|(a, _)| *a == address)?;
        self.faults.remove(index).map(|(_, fault)| fault)
    }
}

/// Mock I2C bus with emulated devices
#[derive(Debug, Clone, Default)]
pub struct MockI2CDriver {
    state: Arc<Mutex<MockBusState>>,
}

impl MockI2CDriver {
    /// Create an empty bus
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a bus populated with the four supported sensors
    pub fn with_preset_devices() -> Self {
        let driver = Self::new();
        driver.add_device(hts221::ADDRESS, MockDevice::hts221());
        driver.add_device(lps22hb::ADDRESS, MockDevice::lps22hb());
        driver.add_device(lis2mdl::ADDRESS, MockDevice::lis2mdl());
        driver.add_device(lsm6dsl::ADDRESS, MockDevice::lsm6dsl());
        driver
    }

    fn lock(&self) -> MutexGuard<'_, MockBusState> {
        // A panicking test thread must not hide the log from the others
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Attach a device, replacing any device already at `address`
    pub fn add_device(&self, address: u8, device: MockDevice) {
        self.lock().devices.insert(address, device);
    }

    /// Overwrite registers starting at `start`
    pub fn set_registers(&self, address: u8, start: u8, values: &[u8]) {
        if let Some(device) = self.lock().devices.get_mut(&address) {
            device.store(start, values);
        }
    }

    /// Overwrite a single register
    pub fn set_register(&self, address: u8, register: u8, value: u8) {
        self.set_registers(address, register, &[value]);
    }

    /// Current value of a register
    pub fn register(&self, address: u8, register: u8) -> Option<u8> {
        self.lock()
            .devices
            .get(&address)
            .map(|device| device.registers[register as usize])
    }

    /// Queue a fault for the next transaction addressed to `address`
    pub fn inject_fault(&self, address: u8, fault: MockFault) {
        self.lock().faults.push_back((address, fault));
    }

    /// Every transaction since creation or the last clear
    pub fn transactions(&self) -> Vec<MockTransaction> {
        self.lock().transactions.clone()
    }

    pub fn clear_transactions(&self) {
        self.lock().transactions.clear();
    }
}

impl I2CBusDriver for MockI2CDriver {
    fn write_read(&mut self, address: u8, write: &[u8], read: &mut [u8]) -> Result<usize> {
        let mut state = self.lock();
        state.transactions.push(MockTransaction::WriteRead {
            address,
            write: write.to_vec(),
            read_len: read.len(),
        });

        if !state.devices.contains_key(&address) {
            return Err(anyhow!("Device not found at address 0x{:02X}", address));
        }

        let limit = match state.take_fault(address) {
            Some(MockFault::Nack) => {
                return Err(anyhow!("Device at address 0x{:02X} did not acknowledge", address))
            }
            Some(MockFault::ShortRead(n)) => n.min(read.len()),
            _ => read.len(),
        };

        let device = state
            .devices
            .get(&address)
            .ok_or_else(|| anyhow!("Device not found at address 0x{:02X}", address))?;

        let pointer = write.first().copied().unwrap_or(0);
        let (register, increment) = device.decode_pointer(pointer, read.len() > 1);
        for (offset, byte) in read.iter_mut().take(limit).enumerate() {
            let step = if increment { offset as u8 } else { 0 };
            *byte = device.registers[register.wrapping_add(step) as usize];
        }

        debug!(
            "Mock I2C read from address=0x{:02X}, register=0x{:02X}, {} of {} bytes",
            address,
            register,
            limit,
            read.len()
        );
        Ok(limit)
    }

    fn write(&mut self, address: u8, data: &[u8]) -> Result<usize> {
        let mut state = self.lock();
        state.transactions.push(MockTransaction::Write {
            address,
            data: data.to_vec(),
        });

        if !state.devices.contains_key(&address) {
            return Err(anyhow!("Device not found at address 0x{:02X}", address));
        }

        let limit = match state.take_fault(address) {
            Some(MockFault::Nack) => {
                return Err(anyhow!("Device at address 0x{:02X} did not acknowledge", address))
            }
            Some(MockFault::ShortWrite(n)) => n.min(data.len()),
            _ => data.len(),
        };

        debug!(
            "Mock I2C write to address=0x{:02X}, data={:?}",
            address, data
        );

        // A truncated write never reaches the register file
        if limit == data.len() {
            if let Some((&pointer, payload)) = data.split_first() {
                let device = state
                    .devices
                    .get_mut(&address)
                    .ok_or_else(|| anyhow!("Device not found at address 0x{:02X}", address))?;
                let (register, _) = device.decode_pointer(pointer, false);
                device.store(register, payload);
            }
        }

        Ok(limit)
    }

    fn device_present(&mut self, address: u8) -> Result<bool> {
        Ok(self.lock().devices.contains_key(&address))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_msb_addressing_controls_increment() {
        let mut bus = MockI2CDriver::new();
        bus.add_device(
            0x5F,
            MockDevice::new(MockAddressing::AddressMsb).with_registers(0x28, &[0x11, 0x22]),
        );

        let mut buf = [0u8; 2];
        assert_eq!(bus.write_read(0x5F, &[0xA8], &mut buf).unwrap(), 2);
        assert_eq!(buf, [0x11, 0x22]);

        // Without the MSB the device keeps returning the same register
        assert_eq!(bus.write_read(0x5F, &[0x28], &mut buf).unwrap(), 2);
        assert_eq!(buf, [0x11, 0x11]);
    }

    #[test]
    fn test_always_addressing_increments() {
        let mut bus = MockI2CDriver::new();
        bus.add_device(
            0x5C,
            MockDevice::new(MockAddressing::Always).with_registers(0x28, &[1, 2, 3]),
        );

        let mut buf = [0u8; 3];
        bus.write_read(0x5C, &[0x28], &mut buf).unwrap();
        assert_eq!(buf, [1, 2, 3]);
    }

    #[test]
    fn test_write_updates_consecutive_registers() {
        let mut bus = MockI2CDriver::new();
        bus.add_device(0x6A, MockDevice::new(MockAddressing::Always));

        assert_eq!(bus.write(0x6A, &[0x10, 0x60, 0x64]).unwrap(), 3);
        assert_eq!(bus.register(0x6A, 0x10), Some(0x60));
        assert_eq!(bus.register(0x6A, 0x11), Some(0x64));
    }

    #[test]
    fn test_faults_are_consumed_once() {
        let mut bus = MockI2CDriver::with_preset_devices();
        bus.inject_fault(hts221::ADDRESS, MockFault::ShortRead(1));

        let mut buf = [0u8; 2];
        assert_eq!(bus.write_read(hts221::ADDRESS, &[0xA8], &mut buf).unwrap(), 1);
        assert_eq!(bus.write_read(hts221::ADDRESS, &[0xA8], &mut buf).unwrap(), 2);

        bus.inject_fault(hts221::ADDRESS, MockFault::Nack);
        assert!(bus.write(hts221::ADDRESS, &[0x20, 0x00]).is_err());
        assert_eq!(bus.transactions().len(), 3);
    }

    #[test]
    fn test_short_write_leaves_registers_untouched() {
        let mut bus = MockI2CDriver::with_preset_devices();
        bus.inject_fault(lps22hb::ADDRESS, MockFault::ShortWrite(1));

        assert_eq!(bus.write(lps22hb::ADDRESS, &[0x10, 0x3A]).unwrap(), 1);
        assert_eq!(bus.register(lps22hb::ADDRESS, 0x10), Some(0x00));
    }

    #[test]
    fn test_missing_device_is_an_error() {
        let mut bus = MockI2CDriver::new();
        let mut buf = [0u8; 1];
        assert!(bus.write_read(0x40, &[0x00], &mut buf).is_err());
        assert!(!bus.device_present(0x40).unwrap());
    }
}
