// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-mems-sensors project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Error types shared by the register layer and the device drivers
//!
//! Every failure is returned to the immediate caller. Nothing in this crate
//! retries a transfer or substitutes a default value for a failed conversion.

/// Result alias used throughout the driver core
pub type Result<T> = std::result::Result<T, SensorError>;

/// Errors reported by register access, conversion and device lifecycle
#[derive(thiserror::Error, Debug)]
pub enum SensorError {
    /// The transport did not move every requested byte
    #[error(
        "I2C transfer incomplete at 0x{address:02X} (register 0x{register:02X}): {transferred} of {expected} bytes"
    )]
    BusTransferIncomplete {
        address: u8,
        register: u8,
        expected: usize,
        transferred: usize,
    },

    /// Calibration constants cannot produce a finite conversion
    #[error("Invalid calibration data for {measurement}: {reason}")]
    CalibrationDataInvalid {
        measurement: &'static str,
        reason: String,
    },

    /// The requested operating mode is not implemented by the driver
    #[error("Unsupported configuration: {0}")]
    UnsupportedConfiguration(String),

    /// The status register reports no fresh sample for the channel
    #[error("No new {channel} data available")]
    SensorDataNotReady { channel: &'static str },

    /// A full-scale field holds a value with no known sensitivity
    #[error("Unrecognized sensitivity field 0x{field:02X} in register 0x{register:02X}")]
    UnrecognizedSensitivityField { register: u8, field: u8 },

    /// The identity register does not hold the expected value
    #[error("Unexpected device id: expected 0x{expected:02X}, found 0x{found:02X}")]
    UnexpectedDeviceId { expected: u8, found: u8 },

    /// The driver has already powered the device down
    #[error("Device session already released")]
    SessionReleased,

    /// The bus itself could not be opened
    #[error("I2C transport error: {0}")]
    Transport(#[source] anyhow::Error),
}

impl SensorError {
    /// `true` for the polling condition of status-gated channels
    pub fn is_not_ready(&self) -> bool {
        matches!(self, SensorError::SensorDataNotReady { .. })
    }
}
