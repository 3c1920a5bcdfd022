// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-mems-sensors project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Generic register-driver core
//!
//! Every supported sensor is described by data: a [`DeviceProfile`] with its
//! bus address, addressing convention, identity register and power-down
//! actions, the configuration writes produced from its operating mode, and a
//! set of [`Channel`] descriptors saying where each measurement lives and how
//! it is converted. [`SensorDriver`] runs the same read/decode/convert path
//! for all of them.
//!
//! # Lifecycle
//!
//! ```text
//! Uninitialized --new()--> Configured --read_*()--> Configured --release()/drop--> PoweredDown
//! ```
//!
//! The power-down actions run exactly once: either from [`SensorDriver::release`],
//! which reports their outcome, or from `Drop`, which logs it.
//!
//! # Concurrency
//!
//! The core takes no locks. Drivers for different addresses on the same
//! physical bus must not issue transactions concurrently; give each driver a
//! clone of a [`SharedI2CBus`](crate::bus::SharedI2CBus) to serialise them.

use crate::bus::I2CBusDriver;
use crate::calibration::CalibrationLayout;
use crate::codec::BitWidth;
use crate::error::{Result, SensorError};
use crate::measurement::{Measurement, Unit, Vector3};
use crate::register::{AddressingMode, DeviceSession};
use crate::sensitivity::SensitivityTable;
use log::{debug, info, warn};
use std::fmt;
use std::marker::PhantomData;

/// Register holding a fixed identification value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub register: u8,
    pub expected: u8,
}

/// Action performed when the session ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerDown {
    /// Write a fixed value
    Write { register: u8, value: u8 },
    /// Read-modify-write setting `mask`
    SetBits { register: u8, mask: u8 },
}

/// Static description of a device type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceProfile {
    pub name: &'static str,
    pub address: u8,
    pub addressing: AddressingMode,
    pub identity: Identity,
    pub power_down: &'static [PowerDown],
}

/// One configuration write issued at construction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterWrite {
    pub register: u8,
    pub value: u8,
}

impl RegisterWrite {
    pub const fn new(register: u8, value: u8) -> Self {
        Self { register, value }
    }
}

/// Configuration write that failed during construction
#[derive(Debug)]
pub struct ConfigurationFault {
    pub write: RegisterWrite,
    pub error: SensorError,
}

/// Status bit that must be set before a channel is read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusGate {
    pub register: u8,
    pub mask: u8,
}

/// Conversion from decoded counts to physical units
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Conversion {
    /// Two-point factory calibration read from the device
    Calibrated(CalibrationLayout),
    /// Live full-scale field lookup
    Sensitivity(SensitivityTable),
    /// Fixed multiplier
    Fixed { per_lsb: f64 },
    /// `counts / counts_per_unit + offset`
    Linear { counts_per_unit: f64, offset: f64 },
}

/// Where a measurement lives and how it is converted
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Channel {
    pub name: &'static str,
    /// First output register (LSB of the first axis)
    pub register: u8,
    pub width: BitWidth,
    /// Number of consecutive words, 1 for scalars, 3 for vectors
    pub axes: usize,
    pub gate: Option<StatusGate>,
    pub conversion: Conversion,
    pub unit: Unit,
}

/// A device type the generic core can drive
pub trait DeviceKind {
    /// Operating mode requested at construction
    type Mode: fmt::Debug + Clone;

    const PROFILE: DeviceProfile;

    /// Configuration writes for `mode`
    ///
    /// Returns `UnsupportedConfiguration` for modes the driver does not
    /// implement; no bus traffic happens in that case.
    fn configuration(mode: &Self::Mode) -> Result<Vec<RegisterWrite>>;

    /// Channels exposed by the device
    fn channels() -> &'static [Channel];
}

/// Register driver for one sensor instance
pub struct SensorDriver<B: I2CBusDriver, D: DeviceKind> {
    session: Option<DeviceSession<B>>,
    mode: D::Mode,
    faults: Vec<ConfigurationFault>,
    _kind: PhantomData<D>,
}

impl<B: I2CBusDriver, D: DeviceKind> SensorDriver<B, D> {
    /// Open a session on `bus` and configure the device for `mode`
    ///
    /// Configuration writes that fail are logged and kept in
    /// [`configuration_faults`](Self::configuration_faults); the driver is
    /// still returned. Unsupported modes fail before touching the bus.
    pub fn new(bus: B, mode: D::Mode) -> Result<Self> {
        let profile = D::PROFILE;
        let writes = D::configuration(&mode)?;
        let mut session = DeviceSession::open(bus, profile.address, profile.addressing);

        let mut faults = Vec::new();
        for write in writes {
            if let Err(error) = session.write_register(write.register, &[write.value]) {
                warn!(
                    "{}: configuration write 0x{:02X} <- 0x{:02X} failed: {}",
                    profile.name, write.register, write.value, error
                );
                faults.push(ConfigurationFault { write, error });
            }
        }

        info!(
            "{} configured at address 0x{:02X} with {:?}",
            profile.name, profile.address, mode
        );

        Ok(Self {
            session: Some(session),
            mode,
            faults,
            _kind: PhantomData,
        })
    }

    pub fn profile(&self) -> DeviceProfile {
        D::PROFILE
    }

    pub fn mode(&self) -> &D::Mode {
        &self.mode
    }

    /// Configuration writes that failed during construction
    pub fn configuration_faults(&self) -> &[ConfigurationFault] {
        &self.faults
    }

    fn session(&mut self) -> Result<&mut DeviceSession<B>> {
        self.session.as_mut().ok_or(SensorError::SessionReleased)
    }

    /// Check the identity register
    pub fn identify(&mut self) -> Result<u8> {
        let identity = D::PROFILE.identity;
        let found = self.session()?.read_u8(identity.register)?;
        if found != identity.expected {
            return Err(SensorError::UnexpectedDeviceId {
                expected: identity.expected,
                found,
            });
        }
        Ok(found)
    }

    /// Raw register read for diagnostics
    pub fn read_register(&mut self, register: u8, count: usize) -> Result<Vec<u8>> {
        self.session()?.read_register(register, count)
    }

    /// Raw register write for diagnostics
    pub fn write_register(&mut self, register: u8, bytes: &[u8]) -> Result<()> {
        self.session()?.write_register(register, bytes)
    }

    /// Read and convert every axis of a channel
    pub fn read_channel(&mut self, channel: &Channel) -> Result<Vec<f64>> {
        let session = self.session()?;

        if let Some(gate) = channel.gate {
            let status = session.read_u8(gate.register)?;
            if status & gate.mask == 0 {
                debug!(
                    "{}: {} not ready (status 0x{:02X})",
                    D::PROFILE.name,
                    channel.name,
                    status
                );
                return Err(SensorError::SensorDataNotReady {
                    channel: channel.name,
                });
            }
        }

        let raw = session.read_signed_block(channel.register, channel.width, channel.axes)?;

        let values = match channel.conversion {
            Conversion::Calibrated(layout) => {
                let pair = layout.read(session)?;
                raw.iter()
                    .map(|&counts| pair.interpolate(counts, layout.measurement))
                    .collect::<Result<Vec<_>>>()?
            }
            Conversion::Sensitivity(table) => {
                let per_lsb = table.read(session)?;
                raw.iter().map(|&counts| f64::from(counts) * per_lsb).collect()
            }
            Conversion::Fixed { per_lsb } => {
                raw.iter().map(|&counts| f64::from(counts) * per_lsb).collect()
            }
            Conversion::Linear {
                counts_per_unit,
                offset,
            } => raw
                .iter()
                .map(|&counts| f64::from(counts) / counts_per_unit + offset)
                .collect(),
        };

        debug!(
            "{}: {} raw={:?} -> {:?} {}",
            D::PROFILE.name,
            channel.name,
            raw,
            values,
            channel.unit
        );
        Ok(values)
    }

    /// Read a single-axis channel
    pub fn read_scalar(&mut self, channel: &Channel) -> Result<f64> {
        match self.read_channel(channel)?.as_slice() {
            &[value] => Ok(value),
            other => Err(SensorError::UnsupportedConfiguration(format!(
                "channel {} yields {} axes, expected 1",
                channel.name,
                other.len()
            ))),
        }
    }

    /// Read a three-axis channel
    pub fn read_vector(&mut self, channel: &Channel) -> Result<Vector3> {
        match self.read_channel(channel)?.as_slice() {
            &[x, y, z] => Ok(Vector3::new(x, y, z)),
            other => Err(SensorError::UnsupportedConfiguration(format!(
                "channel {} yields {} axes, expected 3",
                channel.name,
                other.len()
            ))),
        }
    }

    /// Read every channel of the device, in table order
    ///
    /// Channels whose status bit is clear are skipped; any other failure
    /// aborts the sweep.
    pub fn read_all(&mut self) -> Result<Vec<Measurement>> {
        let mut measurements = Vec::new();
        for channel in D::channels() {
            match self.read_channel(channel) {
                Ok(values) => measurements.push(Measurement {
                    channel: channel.name.to_string(),
                    unit: channel.unit,
                    values,
                }),
                Err(e) if e.is_not_ready() => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(measurements)
    }

    /// Power the device down and end the session
    pub fn release(mut self) -> Result<()> {
        let mut session = self.session.take().ok_or(SensorError::SessionReleased)?;
        Self::power_down(&mut session)
    }

    fn power_down(session: &mut DeviceSession<B>) -> Result<()> {
        let profile = D::PROFILE;
        let mut first_error = None;

        for action in profile.power_down {
            let outcome = match *action {
                PowerDown::Write { register, value } => session.write_register(register, &[value]),
                PowerDown::SetBits { register, mask } => session
                    .update_register(register, |current| current | mask)
                    .map(|_| ()),
            };
            if let Err(e) = outcome {
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            None => {
                info!("{} at 0x{:02X} powered down", profile.name, profile.address);
                Ok(())
            }
            Some(e) => Err(e),
        }
    }
}

impl<B: I2CBusDriver, D: DeviceKind> Drop for SensorDriver<B, D> {
    fn drop(&mut self) {
        if let Some(mut session) = self.session.take() {
            if let Err(e) = Self::power_down(&mut session) {
                warn!("{}: power-down on drop failed: {}", D::PROFILE.name, e);
            }
        }
    }
}

#[cfg(feature = "native-i2c")]
impl<D: DeviceKind> SensorDriver<crate::bus::NativeI2CDriver, D> {
    /// Open the named Linux bus (`"I2C1"`, `"/dev/i2c-1"`) and configure the device
    pub fn open(bus_id: &str, mode: D::Mode) -> Result<Self> {
        let bus = crate::bus::NativeI2CDriver::new(bus_id).map_err(SensorError::Transport)?;
        Self::new(bus, mode)
    }
}
