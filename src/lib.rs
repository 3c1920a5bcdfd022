// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-mems-sensors project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Rust MEMS sensors library
//!
//! Register-level drivers for I2C environmental and inertial sensors:
//! HTS221 (humidity, temperature), LPS22HB (pressure), LIS2MDL (magnetic
//! field) and LSM6DSL (acceleration, angular rate).
//!
//! All four run through one generic core:
//! - [`bus`]: transport trait with native, mock and shared implementations
//! - [`register`]: register reads and writes with partial-transfer detection
//! - [`codec`]: little-endian assembly and two's-complement decoding
//! - [`calibration`]: two-point factory calibration
//! - [`sensitivity`]: full-scale lookup from live control registers
//! - [`driver`]: device lifecycle and channel conversion
//! - [`devices`]: per-device register maps and accessors
//!
//! Transactions are blocking and the core takes no locks. Drivers sharing
//! one physical bus must not transact concurrently; hand each of them a clone
//! of [`bus::SharedI2CBus`] to serialise access.
//!
//! ```no_run
//! use rust_mems_sensors::bus::MockI2CDriver;
//! use rust_mems_sensors::devices::{Hts221, Hts221Mode};
//!
//! let bus = MockI2CDriver::with_preset_devices();
//! let mut sensor = Hts221::new(bus, Hts221Mode::default()).unwrap();
//! println!("{:.1} %RH", sensor.humidity().unwrap());
//! sensor.release().unwrap();
//! ```

pub mod bus;
pub mod calibration;
pub mod codec;
pub mod config;
pub mod devices;
pub mod driver;
pub mod error;
pub mod measurement;
pub mod monitor;
pub mod register;
pub mod sensitivity;

pub use driver::{DeviceKind, SensorDriver};
pub use error::{Result, SensorError};
pub use measurement::{Measurement, Unit, Vector3};
