// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-mems-sensors project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! LPS22HB barometric pressure sensor

use crate::bus::I2CBusDriver;
use crate::codec::BitWidth;
use crate::driver::{
    Channel, Conversion, DeviceKind, DeviceProfile, Identity, PowerDown, RegisterWrite,
    SensorDriver,
};
use crate::error::{Result, SensorError};
use crate::measurement::Unit;
use crate::register::AddressingMode;
use serde::{Deserialize, Serialize};

pub const ADDRESS: u8 = 0x5C;

pub const WHO_AM_I: u8 = 0x0F;
pub const DEVICE_ID: u8 = 0xB1;
pub const CTRL_REG1: u8 = 0x10;
pub const CTRL_REG2: u8 = 0x11;
pub const PRESS_OUT_XL: u8 = 0x28;
pub const TEMP_OUT_L: u8 = 0x2B;

/// 25 Hz, low-pass filter at ODR/9, block data update
pub const CTRL_REG1_ACTIVE: u8 = 0x3A;
/// FIFO disabled, register address auto-increment
pub const CTRL_REG2_ACTIVE: u8 = 0x10;

pub const PRESSURE_LSB_PER_HPA: f64 = 4096.0;
pub const TEMPERATURE_LSB_PER_DEGC: f64 = 100.0;

/// FIFO operating mode; only `Bypass` is supported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FifoMode {
    #[default]
    Bypass,
    Fifo,
    Stream,
    StreamToFifo,
    BypassToStream,
    DynamicStream,
    BypassToFifo,
}

pub const PRESSURE: Channel = Channel {
    name: "pressure",
    register: PRESS_OUT_XL,
    width: BitWidth::Bits24,
    axes: 1,
    gate: None,
    conversion: Conversion::Linear {
        counts_per_unit: PRESSURE_LSB_PER_HPA,
        offset: 0.0,
    },
    unit: Unit::Hectopascal,
};

pub const TEMPERATURE: Channel = Channel {
    name: "temperature",
    register: TEMP_OUT_L,
    width: BitWidth::Bits16,
    axes: 1,
    gate: None,
    conversion: Conversion::Linear {
        counts_per_unit: TEMPERATURE_LSB_PER_DEGC,
        offset: 0.0,
    },
    unit: Unit::DegreesCelsius,
};

static CHANNELS: [Channel; 2] = [PRESSURE, TEMPERATURE];

/// LPS22HB device description
#[derive(Debug)]
pub struct Lps22hbKind;

impl DeviceKind for Lps22hbKind {
    type Mode = FifoMode;

    const PROFILE: DeviceProfile = DeviceProfile {
        name: "LPS22HB",
        address: ADDRESS,
        addressing: AddressingMode::DeviceIncrement,
        identity: Identity {
            register: WHO_AM_I,
            expected: DEVICE_ID,
        },
        power_down: &[PowerDown::Write {
            register: CTRL_REG1,
            value: 0x00,
        }],
    };

    fn configuration(mode: &FifoMode) -> Result<Vec<RegisterWrite>> {
        match mode {
            FifoMode::Bypass => Ok(vec![
                RegisterWrite::new(CTRL_REG1, CTRL_REG1_ACTIVE),
                RegisterWrite::new(CTRL_REG2, CTRL_REG2_ACTIVE),
            ]),
            other => Err(SensorError::UnsupportedConfiguration(format!(
                "LPS22HB FIFO mode {:?} is not implemented",
                other
            ))),
        }
    }

    fn channels() -> &'static [Channel] {
        &CHANNELS
    }
}

/// LPS22HB driver
pub type Lps22hb<B> = SensorDriver<B, Lps22hbKind>;

impl<B: I2CBusDriver> SensorDriver<B, Lps22hbKind> {
    /// Pressure in hectopascal (millibar)
    pub fn pressure(&mut self) -> Result<f64> {
        self.read_scalar(&PRESSURE)
    }

    /// Temperature in degrees Celsius
    pub fn temperature(&mut self) -> Result<f64> {
        self.read_scalar(&TEMPERATURE)
    }
}
