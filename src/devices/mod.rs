// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-mems-sensors project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Supported sensors
//!
//! Each module holds the register map, operating modes and channel tables of
//! one device, plus typed accessors on its [`SensorDriver`](crate::driver::SensorDriver)
//! alias:
//! - HTS221: relative humidity and temperature (factory calibration)
//! - LPS22HB: barometric pressure and temperature
//! - LIS2MDL: magnetic field and temperature
//! - LSM6DSL: acceleration, angular rate and temperature (status gated)

pub mod hts221;
pub mod lis2mdl;
pub mod lps22hb;
pub mod lsm6dsl;

pub use hts221::{Hts221, Hts221Kind, Hts221Mode};
pub use lis2mdl::{Lis2mdl, Lis2mdlKind, Lis2mdlMode};
pub use lps22hb::{FifoMode, Lps22hb, Lps22hbKind};
pub use lsm6dsl::{AccelFullScale, GyroFullScale, Lsm6dsl, Lsm6dslKind, Lsm6dslMode};
