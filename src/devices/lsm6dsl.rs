// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-mems-sensors project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! LSM6DSL accelerometer and gyroscope
//!
//! Every output channel is gated by a data-ready bit of STATUS_REG. The
//! scale of the inertial channels is read back from CTRL1_XL and CTRL2_G on
//! each sample, so a full-scale change made through `write_register` is
//! picked up immediately.

use crate::bus::I2CBusDriver;
use crate::codec::BitWidth;
use crate::driver::{
    Channel, Conversion, DeviceKind, DeviceProfile, Identity, PowerDown, RegisterWrite,
    SensorDriver, StatusGate,
};
use crate::error::Result;
use crate::measurement::{Unit, Vector3};
use crate::register::AddressingMode;
use crate::sensitivity::{SensitivityEntry, SensitivityTable};
use serde::{Deserialize, Serialize};

pub const ADDRESS: u8 = 0x6A;

pub const WHO_AM_I: u8 = 0x0F;
pub const DEVICE_ID: u8 = 0x6A;
pub const CTRL1_XL: u8 = 0x10;
pub const CTRL2_G: u8 = 0x11;
pub const CTRL3_C: u8 = 0x12;
pub const STATUS_REG: u8 = 0x1E;
pub const OUT_TEMP_L: u8 = 0x20;
pub const OUTX_L_G: u8 = 0x22;
pub const OUTX_L_XL: u8 = 0x28;

// STATUS_REG bits
pub const XLDA: u8 = 0x01;
pub const GDA: u8 = 0x02;
pub const TDA: u8 = 0x04;

/// CTRL3_C software reset
pub const SW_RESET: u8 = 0x01;
/// 416 Hz high-performance ODR for both sensors
pub const ODR_416HZ: u8 = 0x60;

pub const TEMPERATURE_LSB_PER_DEGC: f64 = 256.0;

/// Accelerometer full scale, FS_XL[1:0] of CTRL1_XL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AccelFullScale {
    #[default]
    #[serde(rename = "2g")]
    G2,
    #[serde(rename = "4g")]
    G4,
    #[serde(rename = "8g")]
    G8,
    #[serde(rename = "16g")]
    G16,
}

impl AccelFullScale {
    pub const fn bits(self) -> u8 {
        match self {
            AccelFullScale::G2 => 0x00,
            AccelFullScale::G16 => 0x04,
            AccelFullScale::G4 => 0x08,
            AccelFullScale::G8 => 0x0C,
        }
    }
}

/// Gyroscope full scale, FS_G[1:0] and FS_125 of CTRL2_G
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GyroFullScale {
    #[serde(rename = "125dps")]
    Dps125,
    #[default]
    #[serde(rename = "250dps")]
    Dps250,
    #[serde(rename = "500dps")]
    Dps500,
    #[serde(rename = "1000dps")]
    Dps1000,
    #[serde(rename = "2000dps")]
    Dps2000,
}

impl GyroFullScale {
    pub const fn bits(self) -> u8 {
        match self {
            GyroFullScale::Dps125 => 0x02,
            GyroFullScale::Dps250 => 0x00,
            GyroFullScale::Dps500 => 0x04,
            GyroFullScale::Dps1000 => 0x08,
            GyroFullScale::Dps2000 => 0x0C,
        }
    }
}

/// Full-scale selection for both sensors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Lsm6dslMode {
    #[serde(default)]
    pub accel: AccelFullScale,
    #[serde(default)]
    pub gyro: GyroFullScale,
}

/// mg/LSB per FS_XL field
pub const ACCEL_SENSITIVITY: SensitivityTable = SensitivityTable {
    register: CTRL1_XL,
    entries: &[
        SensitivityEntry {
            mask: 0x0C,
            value: 0x00,
            per_lsb: 0.061,
            label: "±2 g",
        },
        SensitivityEntry {
            mask: 0x0C,
            value: 0x08,
            per_lsb: 0.122,
            label: "±4 g",
        },
        SensitivityEntry {
            mask: 0x0C,
            value: 0x0C,
            per_lsb: 0.244,
            label: "±8 g",
        },
        SensitivityEntry {
            mask: 0x0C,
            value: 0x04,
            per_lsb: 0.488,
            label: "±16 g",
        },
    ],
};

/// mdps/LSB per FS_G field; FS_125 overrides FS_G
pub const GYRO_SENSITIVITY: SensitivityTable = SensitivityTable {
    register: CTRL2_G,
    entries: &[
        SensitivityEntry {
            mask: 0x02,
            value: 0x02,
            per_lsb: 4.375,
            label: "±125 dps",
        },
        SensitivityEntry {
            mask: 0x0C,
            value: 0x00,
            per_lsb: 8.75,
            label: "±250 dps",
        },
        SensitivityEntry {
            mask: 0x0C,
            value: 0x04,
            per_lsb: 17.5,
            label: "±500 dps",
        },
        SensitivityEntry {
            mask: 0x0C,
            value: 0x08,
            per_lsb: 35.0,
            label: "±1000 dps",
        },
        SensitivityEntry {
            mask: 0x0C,
            value: 0x0C,
            per_lsb: 70.0,
            label: "±2000 dps",
        },
    ],
};

pub const ACCELERATION: Channel = Channel {
    name: "acceleration",
    register: OUTX_L_XL,
    width: BitWidth::Bits16,
    axes: 3,
    gate: Some(StatusGate {
        register: STATUS_REG,
        mask: XLDA,
    }),
    conversion: Conversion::Sensitivity(ACCEL_SENSITIVITY),
    unit: Unit::Milligravity,
};

pub const ANGULAR_RATE: Channel = Channel {
    name: "angular_rate",
    register: OUTX_L_G,
    width: BitWidth::Bits16,
    axes: 3,
    gate: Some(StatusGate {
        register: STATUS_REG,
        mask: GDA,
    }),
    conversion: Conversion::Sensitivity(GYRO_SENSITIVITY),
    unit: Unit::MillidegreesPerSecond,
};

pub const TEMPERATURE: Channel = Channel {
    name: "temperature",
    register: OUT_TEMP_L,
    width: BitWidth::Bits16,
    axes: 1,
    gate: Some(StatusGate {
        register: STATUS_REG,
        mask: TDA,
    }),
    conversion: Conversion::Linear {
        counts_per_unit: TEMPERATURE_LSB_PER_DEGC,
        offset: 25.0,
    },
    unit: Unit::DegreesCelsius,
};

static CHANNELS: [Channel; 3] = [ACCELERATION, ANGULAR_RATE, TEMPERATURE];

/// LSM6DSL device description
#[derive(Debug)]
pub struct Lsm6dslKind;

impl DeviceKind for Lsm6dslKind {
    type Mode = Lsm6dslMode;

    const PROFILE: DeviceProfile = DeviceProfile {
        name: "LSM6DSL",
        address: ADDRESS,
        addressing: AddressingMode::DeviceIncrement,
        identity: Identity {
            register: WHO_AM_I,
            expected: DEVICE_ID,
        },
        power_down: &[PowerDown::SetBits {
            register: CTRL3_C,
            mask: SW_RESET,
        }],
    };

    fn configuration(mode: &Lsm6dslMode) -> Result<Vec<RegisterWrite>> {
        Ok(vec![
            RegisterWrite::new(CTRL1_XL, ODR_416HZ | mode.accel.bits()),
            RegisterWrite::new(CTRL2_G, ODR_416HZ | mode.gyro.bits()),
        ])
    }

    fn channels() -> &'static [Channel] {
        &CHANNELS
    }
}

/// LSM6DSL driver
pub type Lsm6dsl<B> = SensorDriver<B, Lsm6dslKind>;

impl<B: I2CBusDriver> SensorDriver<B, Lsm6dslKind> {
    /// Linear acceleration in mg
    pub fn acceleration(&mut self) -> Result<Vector3> {
        self.read_vector(&ACCELERATION)
    }

    /// Angular rate in mdps
    pub fn angular_rate(&mut self) -> Result<Vector3> {
        self.read_vector(&ANGULAR_RATE)
    }

    /// Die temperature in degrees Celsius
    pub fn temperature(&mut self) -> Result<f64> {
        self.read_scalar(&TEMPERATURE)
    }
}
