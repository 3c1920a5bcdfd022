// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-mems-sensors project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! HTS221 capacitive humidity and temperature sensor
//!
//! Both channels are converted with the two-point factory calibration stored
//! in registers 0x30..0x3F. The temperature references are 10-bit values whose
//! two high bits each live in the shared T1/T0 MSB register.

use crate::bus::I2CBusDriver;
use crate::calibration::{CalibrationLayout, OutputField, ReferenceExtension, ReferenceField};
use crate::codec::BitWidth;
use crate::driver::{
    Channel, Conversion, DeviceKind, DeviceProfile, Identity, PowerDown, RegisterWrite,
    SensorDriver,
};
use crate::error::Result;
use crate::measurement::Unit;
use crate::register::AddressingMode;
use serde::{Deserialize, Serialize};

pub const ADDRESS: u8 = 0x5F;

pub const WHO_AM_I: u8 = 0x0F;
pub const DEVICE_ID: u8 = 0xBC;
pub const AV_CONF: u8 = 0x10;
pub const CTRL_REG1: u8 = 0x20;
pub const H_OUT: u8 = 0x28;
pub const T_OUT: u8 = 0x2A;

// Factory calibration
pub const H0_RH_X2: u8 = 0x30;
pub const H1_RH_X2: u8 = 0x31;
pub const T0_DEGC_X8: u8 = 0x32;
pub const T1_DEGC_X8: u8 = 0x33;
pub const T1_T0_MSB: u8 = 0x35;
pub const H0_T0_OUT: u8 = 0x36;
pub const H1_T0_OUT: u8 = 0x3A;
pub const T0_OUT: u8 = 0x3C;
pub const T1_OUT: u8 = 0x3E;

/// 16 temperature and 32 humidity internal averages
pub const AV_CONF_DEFAULT: u8 = 0x1B;
/// PD (power on) and BDU (block data update)
pub const CTRL_REG1_ACTIVE: u8 = 0x84;

/// Output data rate, ODR[1:0] of CTRL_REG1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Hts221Mode {
    #[default]
    #[serde(rename = "1hz")]
    Hz1,
    #[serde(rename = "7hz")]
    Hz7,
    #[serde(rename = "12.5hz")]
    Hz12_5,
}

impl Hts221Mode {
    pub const fn odr_bits(self) -> u8 {
        match self {
            Hts221Mode::Hz1 => 0x01,
            Hts221Mode::Hz7 => 0x02,
            Hts221Mode::Hz12_5 => 0x03,
        }
    }
}

const fn output(register: u8) -> OutputField {
    OutputField {
        register,
        width: BitWidth::Bits16,
        signed: false,
    }
}

pub const HUMIDITY_CALIBRATION: CalibrationLayout = CalibrationLayout {
    measurement: "humidity",
    references: [
        ReferenceField {
            register: H0_RH_X2,
            extension: None,
        },
        ReferenceField {
            register: H1_RH_X2,
            extension: None,
        },
    ],
    reference_scale: 2.0,
    outputs: [output(H0_T0_OUT), output(H1_T0_OUT)],
};

pub const TEMPERATURE_CALIBRATION: CalibrationLayout = CalibrationLayout {
    measurement: "temperature",
    references: [
        ReferenceField {
            register: T0_DEGC_X8,
            extension: Some(ReferenceExtension {
                register: T1_T0_MSB,
                mask: 0x03,
                shift: 8,
            }),
        },
        ReferenceField {
            register: T1_DEGC_X8,
            extension: Some(ReferenceExtension {
                register: T1_T0_MSB,
                mask: 0x0C,
                shift: 6,
            }),
        },
    ],
    reference_scale: 8.0,
    outputs: [output(T0_OUT), output(T1_OUT)],
};

pub const HUMIDITY: Channel = Channel {
    name: "humidity",
    register: H_OUT,
    width: BitWidth::Bits16,
    axes: 1,
    gate: None,
    conversion: Conversion::Calibrated(HUMIDITY_CALIBRATION),
    unit: Unit::RelativeHumidity,
};

pub const TEMPERATURE: Channel = Channel {
    name: "temperature",
    register: T_OUT,
    width: BitWidth::Bits16,
    axes: 1,
    gate: None,
    conversion: Conversion::Calibrated(TEMPERATURE_CALIBRATION),
    unit: Unit::DegreesCelsius,
};

static CHANNELS: [Channel; 2] = [HUMIDITY, TEMPERATURE];

/// HTS221 device description
#[derive(Debug)]
pub struct Hts221Kind;

impl DeviceKind for Hts221Kind {
    type Mode = Hts221Mode;

    const PROFILE: DeviceProfile = DeviceProfile {
        name: "HTS221",
        address: ADDRESS,
        addressing: AddressingMode::AutoIncrementFlag,
        identity: Identity {
            register: WHO_AM_I,
            expected: DEVICE_ID,
        },
        power_down: &[PowerDown::Write {
            register: CTRL_REG1,
            value: 0x00,
        }],
    };

    fn configuration(mode: &Hts221Mode) -> Result<Vec<RegisterWrite>> {
        Ok(vec![
            RegisterWrite::new(AV_CONF, AV_CONF_DEFAULT),
            RegisterWrite::new(CTRL_REG1, CTRL_REG1_ACTIVE | mode.odr_bits()),
        ])
    }

    fn channels() -> &'static [Channel] {
        &CHANNELS
    }
}

/// HTS221 driver
pub type Hts221<B> = SensorDriver<B, Hts221Kind>;

impl<B: I2CBusDriver> SensorDriver<B, Hts221Kind> {
    /// Relative humidity in percent
    pub fn humidity(&mut self) -> Result<f64> {
        self.read_scalar(&HUMIDITY)
    }

    /// Temperature in degrees Celsius
    pub fn temperature(&mut self) -> Result<f64> {
        self.read_scalar(&TEMPERATURE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::{MockDevice, MockI2CDriver};
    use approx::assert_relative_eq;

    fn preset() -> MockI2CDriver {
        let mock = MockI2CDriver::new();
        mock.add_device(ADDRESS, MockDevice::hts221());
        mock
    }

    #[test]
    fn test_configuration_per_rate() {
        for (mode, ctrl) in [
            (Hts221Mode::Hz1, 0x85),
            (Hts221Mode::Hz7, 0x86),
            (Hts221Mode::Hz12_5, 0x87),
        ] {
            let mock = preset();
            let sensor = Hts221::new(mock.clone(), mode).unwrap();
            assert_eq!(mock.register(ADDRESS, AV_CONF), Some(0x1B));
            assert_eq!(mock.register(ADDRESS, CTRL_REG1), Some(ctrl));
            sensor.release().unwrap();
            assert_eq!(mock.register(ADDRESS, CTRL_REG1), Some(0x00));
        }
    }

    #[test]
    fn test_preset_readings() {
        let mock = preset();
        let mut sensor = Hts221::new(mock, Hts221Mode::default()).unwrap();
        assert_relative_eq!(sensor.humidity().unwrap(), 50.0);
        assert_eq!(sensor.temperature().unwrap(), 25.0);
    }

    #[test]
    fn test_reads_assert_auto_increment_flag() {
        let mock = preset();
        let mut sensor = Hts221::new(mock.clone(), Hts221Mode::default()).unwrap();
        mock.clear_transactions();
        sensor.humidity().unwrap();

        let pointers: Vec<u8> = mock
            .transactions()
            .iter()
            .filter_map(|t| t.register_byte())
            .collect();
        assert!(pointers.iter().all(|p| p & 0x80 != 0));
        assert!(pointers.contains(&(H_OUT | 0x80)));
    }

    #[test]
    fn test_temperature_msb_extension() {
        let mock = preset();
        // T0 = 0x3_20 / 8 = 100 degC, T1 = 0x1_40 / 8 = 40 degC
        mock.set_registers(ADDRESS, T0_DEGC_X8, &[0x20, 0x40]);
        mock.set_register(ADDRESS, T1_T0_MSB, 0b0000_0111);
        let mut sensor = Hts221::new(mock, Hts221Mode::default()).unwrap();

        // Raw T_OUT 250 is midway between O0 = 100 and O1 = 400
        assert_relative_eq!(sensor.temperature().unwrap(), 70.0);
    }
}
