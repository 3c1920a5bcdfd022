// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-mems-sensors project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Sampling loop used by `sensor_monitor`
//!
//! A [`Monitor`] owns one driver per enabled sensor, all talking through
//! clones of the same bus handle. Each sweep reads every channel of every
//! sensor; channels without fresh data are skipped and picked up on a later
//! sweep, other failures are recorded in the reading and do not stop the
//! remaining sensors.
//!
//! [`Monitor::run`] repeats sweeps until a sweep count is reached or a stop
//! flag is raised, leaving the caller to power the sensors down.

use crate::bus::I2CBusDriver;
use crate::config::SensorsConfig;
use crate::devices::{Hts221, Lis2mdl, Lps22hb, Lsm6dsl};
use crate::driver::{DeviceKind, SensorDriver};
use crate::error::Result;
use crate::measurement::Measurement;
use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

/// Longest delay between a stop request and the end of [`Monitor::run`]
pub const STOP_POLL: Duration = Duration::from_millis(50);

/// Object-safe view of a configured driver
pub trait Sampler {
    fn name(&self) -> &'static str;

    /// Check the identity register
    fn identify(&mut self) -> Result<u8>;

    /// Read every channel that has data
    fn sample(&mut self) -> Result<Vec<Measurement>>;

    /// Power the device down
    fn shutdown(self: Box<Self>) -> Result<()>;
}

impl<B: I2CBusDriver, D: DeviceKind> Sampler for SensorDriver<B, D> {
    fn name(&self) -> &'static str {
        self.profile().name
    }

    fn identify(&mut self) -> Result<u8> {
        SensorDriver::identify(self)
    }

    fn sample(&mut self) -> Result<Vec<Measurement>> {
        self.read_all()
    }

    fn shutdown(self: Box<Self>) -> Result<()> {
        self.release()
    }
}

/// One sensor's contribution to a sweep
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorReading {
    pub sensor: String,
    pub timestamp: DateTime<Utc>,
    pub measurements: Vec<Measurement>,
    /// Failure of this sensor during the sweep
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Drivers for every enabled sensor
pub struct Monitor {
    samplers: Vec<Box<dyn Sampler>>,
}

impl Monitor {
    pub fn new(samplers: Vec<Box<dyn Sampler>>) -> Self {
        Self { samplers }
    }

    /// Construct the drivers enabled in `sensors`, each on a clone of `bus`
    ///
    /// Fails on the first driver that cannot be constructed; drivers built
    /// before it are powered down when dropped. An identity mismatch is only
    /// logged.
    pub fn from_config<B>(sensors: &SensorsConfig, bus: B) -> Result<Self>
    where
        B: I2CBusDriver + Clone + 'static,
    {
        let mut samplers: Vec<Box<dyn Sampler>> = Vec::new();

        if sensors.hts221.enabled {
            samplers.push(Box::new(Hts221::new(bus.clone(), sensors.hts221.mode)?));
        }
        if sensors.lps22hb.enabled {
            samplers.push(Box::new(Lps22hb::new(bus.clone(), sensors.lps22hb.mode)?));
        }
        if sensors.lis2mdl.enabled {
            samplers.push(Box::new(Lis2mdl::new(bus.clone(), sensors.lis2mdl.mode)?));
        }
        if sensors.lsm6dsl.enabled {
            samplers.push(Box::new(Lsm6dsl::new(bus, sensors.lsm6dsl.mode)?));
        }

        for sampler in samplers.iter_mut() {
            match sampler.identify() {
                Ok(id) => info!("{} identified (0x{:02X})", sampler.name(), id),
                Err(e) => warn!("{} identification failed: {}", sampler.name(), e),
            }
        }

        Ok(Self::new(samplers))
    }

    pub fn sensor_names(&self) -> Vec<&'static str> {
        self.samplers.iter().map(|s| s.name()).collect()
    }

    /// Read every sensor once
    pub fn sweep(&mut self) -> Vec<SensorReading> {
        self.samplers
            .iter_mut()
            .map(|sampler| {
                let timestamp = Utc::now();
                match sampler.sample() {
                    Ok(measurements) => SensorReading {
                        sensor: sampler.name().to_string(),
                        timestamp,
                        measurements,
                        error: None,
                    },
                    Err(e) => {
                        warn!("{} sampling failed: {}", sampler.name(), e);
                        SensorReading {
                            sensor: sampler.name().to_string(),
                            timestamp,
                            measurements: Vec::new(),
                            error: Some(e.to_string()),
                        }
                    }
                }
            })
            .collect()
    }

    /// Sweep until `count` sweeps are done or `stop` is raised
    ///
    /// Each sweep is handed to `sink`; a sink error ends the run. `None`
    /// runs until stopped. Returns the number of completed sweeps.
    pub fn run<E, F>(
        &mut self,
        count: Option<u64>,
        interval: Duration,
        stop: &AtomicBool,
        mut sink: F,
    ) -> std::result::Result<u64, E>
    where
        F: FnMut(&[SensorReading]) -> std::result::Result<(), E>,
    {
        let mut sweeps = 0u64;
        while !stop.load(Ordering::SeqCst) {
            sink(&self.sweep())?;
            sweeps += 1;
            if count.is_some_and(|count| sweeps >= count) {
                break;
            }
            wait_unless_stopped(interval, stop);
        }
        if stop.load(Ordering::SeqCst) {
            info!("Sampling stopped after {} sweeps", sweeps);
        }
        Ok(sweeps)
    }

    /// Power every sensor down, returning the first failure
    pub fn release(self) -> Result<()> {
        let mut first_error = None;
        for sampler in self.samplers {
            let name = sampler.name();
            if let Err(e) = sampler.shutdown() {
                warn!("{} power-down failed: {}", name, e);
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

fn wait_unless_stopped(interval: Duration, stop: &AtomicBool) {
    let deadline = Instant::now() + interval;
    while !stop.load(Ordering::SeqCst) {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            break;
        }
        thread::sleep(remaining.min(STOP_POLL));
    }
}
