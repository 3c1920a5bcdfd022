// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-mems-sensors project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Two-point factory calibration
//!
//! Devices such as the HTS221 store, for each measured quantity, two
//! reference values in physical units and the raw outputs the sensor
//! produced at those references. A raw sample is converted with
//!
//! ```text
//! physical = (P1 - P0) * (raw - O0) / (O1 - O0) + P0
//! ```
//!
//! Where the constants live is described by a [`CalibrationLayout`] table so
//! that the read/convert path is the same for every device.

use crate::bus::I2CBusDriver;
use crate::codec::{decode_signed, BitWidth};
use crate::error::{Result, SensorError};
use crate::register::DeviceSession;

/// One (reference, raw output) calibration point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationPoint {
    /// Reference value in physical units
    pub reference: f64,
    /// Raw sensor output recorded at the reference
    pub output: i32,
}

/// The two points of a linear calibration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationPair {
    pub low: CalibrationPoint,
    pub high: CalibrationPoint,
}

impl CalibrationPair {
    pub fn new(p0: f64, p1: f64, o0: i32, o1: i32) -> Self {
        Self {
            low: CalibrationPoint {
                reference: p0,
                output: o0,
            },
            high: CalibrationPoint {
                reference: p1,
                output: o1,
            },
        }
    }

    /// Convert a decoded raw sample into physical units
    ///
    /// Fails with `CalibrationDataInvalid` when both raw outputs are equal.
    pub fn interpolate(&self, raw: i32, measurement: &'static str) -> Result<f64> {
        let span = i64::from(self.high.output) - i64::from(self.low.output);
        if span == 0 {
            return Err(SensorError::CalibrationDataInvalid {
                measurement,
                reason: format!(
                    "raw calibration outputs are identical ({})",
                    self.low.output
                ),
            });
        }

        let offset = (i64::from(raw) - i64::from(self.low.output)) as f64;
        let value =
            (self.high.reference - self.low.reference) * offset / span as f64 + self.low.reference;

        if !value.is_finite() {
            return Err(SensorError::CalibrationDataInvalid {
                measurement,
                reason: format!("conversion of raw sample {} is not finite", raw),
            });
        }
        Ok(value)
    }
}

/// High bits merged into an 8-bit reference constant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceExtension {
    /// Register holding the extension bits
    pub register: u8,
    /// Bits of that register belonging to this constant
    pub mask: u8,
    /// Left shift placing the masked bits above the 8-bit constant
    pub shift: u8,
}

/// Location of a reference constant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceField {
    pub register: u8,
    pub extension: Option<ReferenceExtension>,
}

/// Location and encoding of a raw-output constant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputField {
    pub register: u8,
    pub width: BitWidth,
    pub signed: bool,
}

/// Where a device stores the calibration of one measured quantity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationLayout {
    /// Quantity name used in errors and logs
    pub measurement: &'static str,
    /// P0 and P1, stored as scaled counts
    pub references: [ReferenceField; 2],
    /// Counts per physical unit of the stored references
    pub reference_scale: f64,
    /// O0 and O1
    pub outputs: [OutputField; 2],
}

impl CalibrationLayout {
    /// Read both calibration points from non-volatile registers
    ///
    /// A shared extension register is read once per call.
    pub fn read<B: I2CBusDriver>(&self, session: &mut DeviceSession<B>) -> Result<CalibrationPair> {
        let mut extension_cache: Option<(u8, u8)> = None;
        let mut references = [0.0f64; 2];

        for (slot, field) in references.iter_mut().zip(self.references.iter()) {
            let mut counts = u32::from(session.read_u8(field.register)?);
            if let Some(ext) = field.extension {
                let bits = match extension_cache {
                    Some((register, value)) if register == ext.register => value,
                    _ => {
                        let value = session.read_u8(ext.register)?;
                        extension_cache = Some((ext.register, value));
                        value
                    }
                };
                counts |= u32::from(bits & ext.mask) << ext.shift;
            }
            *slot = f64::from(counts) / self.reference_scale;
        }

        let mut outputs = [0i32; 2];
        for (slot, field) in outputs.iter_mut().zip(self.outputs.iter()) {
            let word = session.read_word(field.register, field.width)?;
            *slot = if field.signed {
                decode_signed(word, field.width)
            } else {
                word as i32
            };
        }

        Ok(CalibrationPair::new(
            references[0],
            references[1],
            outputs[0],
            outputs[1],
        ))
    }
}
