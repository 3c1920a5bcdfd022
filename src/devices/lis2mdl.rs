// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-mems-sensors project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! LIS2MDL three-axis magnetometer

use crate::bus::I2CBusDriver;
use crate::codec::BitWidth;
use crate::driver::{
    Channel, Conversion, DeviceKind, DeviceProfile, Identity, PowerDown, RegisterWrite,
    SensorDriver,
};
use crate::error::Result;
use crate::measurement::{Unit, Vector3};
use crate::register::AddressingMode;
use serde::{Deserialize, Serialize};

pub const ADDRESS: u8 = 0x1E;

pub const WHO_AM_I: u8 = 0x4F;
pub const DEVICE_ID: u8 = 0x40;
pub const CFG_REG_A: u8 = 0x60;
pub const CFG_REG_C: u8 = 0x62;
pub const OUTX_L_REG: u8 = 0x68;
pub const TEMP_OUT_L_REG: u8 = 0x6E;

/// COMP_TEMP_EN, continuous mode
pub const CFG_REG_A_ACTIVE: u8 = 0x80;
/// MD[1:0] idle
pub const CFG_REG_A_IDLE: u8 = 0x03;
/// Block data update
pub const CFG_REG_C_BDU: u8 = 0x10;

pub const MILLIGAUSS_PER_LSB: f64 = 1.5;
pub const TEMPERATURE_LSB_PER_DEGC: f64 = 8.0;

/// Output data rate in continuous mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Lis2mdlMode {
    #[default]
    #[serde(rename = "10hz")]
    Hz10,
    #[serde(rename = "20hz")]
    Hz20,
    #[serde(rename = "50hz")]
    Hz50,
    #[serde(rename = "100hz")]
    Hz100,
}

impl Lis2mdlMode {
    /// ODR[1:0] field value
    pub const fn odr_bits(self) -> u8 {
        match self {
            Lis2mdlMode::Hz10 => 0b00,
            Lis2mdlMode::Hz20 => 0b01,
            Lis2mdlMode::Hz50 => 0b10,
            Lis2mdlMode::Hz100 => 0b11,
        }
    }
}

pub const MAGNETIC_FIELD: Channel = Channel {
    name: "magnetic_field",
    register: OUTX_L_REG,
    width: BitWidth::Bits16,
    axes: 3,
    gate: None,
    conversion: Conversion::Fixed {
        per_lsb: MILLIGAUSS_PER_LSB,
    },
    unit: Unit::Milligauss,
};

pub const TEMPERATURE: Channel = Channel {
    name: "temperature",
    register: TEMP_OUT_L_REG,
    width: BitWidth::Bits16,
    axes: 1,
    gate: None,
    conversion: Conversion::Linear {
        counts_per_unit: TEMPERATURE_LSB_PER_DEGC,
        offset: 25.0,
    },
    unit: Unit::DegreesCelsius,
};

static CHANNELS: [Channel; 2] = [MAGNETIC_FIELD, TEMPERATURE];

/// LIS2MDL device description
#[derive(Debug)]
pub struct Lis2mdlKind;

impl DeviceKind for Lis2mdlKind {
    type Mode = Lis2mdlMode;

    const PROFILE: DeviceProfile = DeviceProfile {
        name: "LIS2MDL",
        address: ADDRESS,
        addressing: AddressingMode::AutoIncrementFlag,
        identity: Identity {
            register: WHO_AM_I,
            expected: DEVICE_ID,
        },
        power_down: &[PowerDown::Write {
            register: CFG_REG_A,
            value: CFG_REG_A_IDLE,
        }],
    };

    fn configuration(mode: &Lis2mdlMode) -> Result<Vec<RegisterWrite>> {
        Ok(vec![
            RegisterWrite::new(CFG_REG_A, CFG_REG_A_ACTIVE | mode.odr_bits() << 2),
            RegisterWrite::new(CFG_REG_C, CFG_REG_C_BDU),
        ])
    }

    fn channels() -> &'static [Channel] {
        &CHANNELS
    }
}

/// LIS2MDL driver
pub type Lis2mdl<B> = SensorDriver<B, Lis2mdlKind>;

impl<B: I2CBusDriver> SensorDriver<B, Lis2mdlKind> {
    /// Magnetic field in milligauss
    pub fn magnetic_field(&mut self) -> Result<Vector3> {
        self.read_vector(&MAGNETIC_FIELD)
    }

    /// Die temperature in degrees Celsius
    pub fn temperature(&mut self) -> Result<f64> {
        self.read_scalar(&TEMPERATURE)
    }
}
