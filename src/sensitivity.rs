// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-mems-sensors project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Full-scale sensitivity selection
//!
//! Inertial sensors scale raw counts by a constant that depends on the
//! full-scale field of a live control register. The table is matched in
//! order, so an entry testing a single override bit can take precedence over
//! the plain field decode that follows it.

use crate::bus::I2CBusDriver;
use crate::error::{Result, SensorError};
use crate::register::DeviceSession;

/// One recognised full-scale setting
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensitivityEntry {
    /// Bits of the control register this entry tests
    pub mask: u8,
    /// Required value of those bits
    pub value: u8,
    /// Physical units per least-significant bit
    pub per_lsb: f64,
    /// Human-readable full scale, e.g. "±2 g"
    pub label: &'static str,
}

/// Sensitivity lookup bound to one control register
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensitivityTable {
    pub register: u8,
    pub entries: &'static [SensitivityEntry],
}

impl SensitivityTable {
    /// Bits tested by any entry
    pub fn field_mask(&self) -> u8 {
        self.entries.iter().fold(0, |mask, entry| mask | entry.mask)
    }

    /// Matching entry for a control register value
    pub fn entry(&self, config: u8) -> Result<&'static SensitivityEntry> {
        self.entries
            .iter()
            .find(|entry| config & entry.mask == entry.value)
            .ok_or(SensorError::UnrecognizedSensitivityField {
                register: self.register,
                field: config & self.field_mask(),
            })
    }

    /// Units per LSB for a control register value
    pub fn select(&self, config: u8) -> Result<f64> {
        self.entry(config).map(|entry| entry.per_lsb)
    }

    /// Read the control register and select the sensitivity it implies
    pub fn read<B: I2CBusDriver>(&self, session: &mut DeviceSession<B>) -> Result<f64> {
        let config = session.read_u8(self.register)?;
        self.select(config)
    }
}
