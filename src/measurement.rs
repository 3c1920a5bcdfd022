// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-mems-sensors project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Physical measurement values

use serde::{Deserialize, Serialize};
use std::fmt;

/// Physical unit of a converted sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    /// Percent relative humidity
    RelativeHumidity,
    DegreesCelsius,
    /// Hectopascal, numerically equal to millibar
    Hectopascal,
    Milligauss,
    /// Thousandths of standard gravity
    Milligravity,
    /// Thousandths of a degree per second
    MillidegreesPerSecond,
}

impl Unit {
    pub const fn symbol(self) -> &'static str {
        match self {
            Unit::RelativeHumidity => "%RH",
            Unit::DegreesCelsius => "°C",
            Unit::Hectopascal => "hPa",
            Unit::Milligauss => "mG",
            Unit::Milligravity => "mg",
            Unit::MillidegreesPerSecond => "mdps",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Three-axis sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean norm
    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

/// A converted sample tagged with its channel and unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub channel: String,
    pub unit: Unit,
    pub values: Vec<f64>,
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.channel)?;
        for value in &self.values {
            write!(f, " {:.2}", value)?;
        }
        write!(f, " {}", self.unit)
    }
}
