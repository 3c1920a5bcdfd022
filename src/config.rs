// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-mems-sensors project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! # Configuration Management
//!
//! Configuration for the `sensor_monitor` application, loaded from YAML and
//! validated against the embedded JSON Schema before deserialisation.
//!
//! ## Configuration Structure
//!
//! - `bus`: transport selection (`native` or `mock`) and bus identifier
//! - `sensors`: one section per supported device with an `enabled` flag and
//!   its operating mode
//! - `sampling`: polling interval and number of samples
//!
//! ## Usage
//!
//! ```no_run
//! use rust_mems_sensors::config::Config;
//!
//! // Load config from file, creates a default if not found
//! let mut config = Config::from_file("sensors.yaml").unwrap();
//!
//! // Command line overrides
//! config.apply_args(Some("I2C1".to_string()), false, Some(500), Some(10));
//!
//! println!("Polling every {} ms", config.sampling.interval_ms);
//! ```

use crate::bus::parse_bus_number;
use crate::devices::{FifoMode, Hts221Mode, Lis2mdlMode, Lsm6dslMode};
use anyhow::{Context, Result};
use log::{debug, error};
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, File},
    io::Write,
    path::Path,
};

/// Transport used to reach the sensors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum I2CBusType {
    /// Linux i2c-dev bus
    Native,
    /// In-memory bus with preset sensor images
    Mock,
}

/// I2C bus selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct I2CBusConfig {
    #[serde(rename = "type")]
    pub bus_type: I2CBusType,

    /// Bus identifier, e.g. `"I2C1"` or `"/dev/i2c-1"`
    #[serde(default = "default_bus_id")]
    pub bus_id: String,
}

impl Default for I2CBusConfig {
    fn default() -> Self {
        Self {
            bus_type: I2CBusType::Native,
            bus_id: default_bus_id(),
        }
    }
}

/// Per-sensor section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorConfig<M> {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default)]
    pub mode: M,
}

impl<M: Default> Default for SensorConfig<M> {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            mode: M::default(),
        }
    }
}

/// Every supported sensor
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorsConfig {
    #[serde(default)]
    pub hts221: SensorConfig<Hts221Mode>,
    #[serde(default)]
    pub lps22hb: SensorConfig<FifoMode>,
    #[serde(default)]
    pub lis2mdl: SensorConfig<Lis2mdlMode>,
    #[serde(default)]
    pub lsm6dsl: SensorConfig<Lsm6dslMode>,
}

impl SensorsConfig {
    /// Number of sensors with `enabled: true`
    pub fn enabled_count(&self) -> usize {
        [
            self.hts221.enabled,
            self.lps22hb.enabled,
            self.lis2mdl.enabled,
            self.lsm6dsl.enabled,
        ]
        .iter()
        .filter(|enabled| **enabled)
        .count()
    }
}

/// Polling schedule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SamplingConfig {
    /// Delay between two sweeps in milliseconds
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Number of sweeps; unlimited when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            count: None,
        }
    }
}

/// Root configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub bus: I2CBusConfig,
    #[serde(default)]
    pub sensors: SensorsConfig,
    #[serde(default)]
    pub sampling: SamplingConfig,
}

fn default_bus_id() -> String {
    "I2C1".to_string()
}

fn default_enabled() -> bool {
    true
}

fn default_interval_ms() -> u64 {
    1000
}

impl Config {
    /// Helper method to create a sample config file when validation fails
    fn create_sample_config<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        let sample_path = path.with_extension("sample.yaml");
        debug!("Creating sample configuration file at {:?}", sample_path);

        if let Some(parent) = sample_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).with_context(|| {
                    format!(
                        "Failed to create directory for sample config at {:?}",
                        parent
                    )
                })?;
            }
        }

        Self::default()
            .save_to_file(&sample_path)
            .with_context(|| format!("Failed to save sample config to {:?}", sample_path))?;

        error!(
            "Sample configuration file created at {:?}\nPlease edit and rename it",
            sample_path
        );
        Ok(())
    }

    /// Load configuration from a file
    ///
    /// A missing file is created with default values. A file that fails
    /// schema validation, deserialisation or the specific rules leaves a
    /// `*.sample.yaml` next to it and returns the error.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(
                "Configuration file not found at {:?}, creating default",
                path
            );
            let default_config = Self::default();
            default_config.save_to_file(path)?;
            return Ok(default_config);
        }

        debug!("Loading configuration from {:?}", path);
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file at {:?}", path))?;

        let yaml_value: serde_yml::Value = serde_yml::from_str(&contents)
            .with_context(|| format!("Failed to parse YAML configuration from {:?}", path))?;

        let json_value = serde_json::to_value(&yaml_value)
            .context("Failed to convert YAML to JSON for validation")?;

        let schema: serde_json::Value =
            serde_json::from_str(config_schema()).context("Failed to parse JSON schema")?;

        let validator = jsonschema::draft202012::options()
            .should_validate_formats(true)
            .build(&schema)?;

        debug!("Validating {} configuration against schema", path.display());
        if let Err(error) = validator.validate(&json_value) {
            error!("Configuration validation error before deserialization");
            Self::create_sample_config(path)?;
            anyhow::bail!("Configuration validation failed: {}", error);
        }

        let config: Config = match serde_yml::from_str(&contents) {
            Ok(config) => config,
            Err(err) => {
                error!("Configuration deserialization error: {}", err);
                if let Err(e) = Self::create_sample_config(path) {
                    error!("Failed to create sample config: {}", e);
                }
                return Err(anyhow::anyhow!(
                    "Failed to deserialize configuration from {}: {}",
                    path.display(),
                    err
                ));
            }
        };

        if let Err(err) = Self::validate_specific_rules(&config) {
            error!("Configuration specific validation error: {}", err);
            Self::create_sample_config(path)?;
            return Err(err);
        }

        Ok(config)
    }

    /// Save the configuration to a file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml =
            serde_yml::to_string(self).context("Failed to serialize configuration to YAML")?;

        let mut file = File::create(path.as_ref())
            .with_context(|| format!("Failed to create config file at {:?}", path.as_ref()))?;

        file.write_all(yaml.as_bytes())
            .with_context(|| format!("Failed to write configuration to {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Apply command line arguments to override configuration values
    ///
    /// # Parameters
    ///
    /// * `bus_id` - Bus identifier for the native transport
    /// * `mock` - If true, switch to the in-memory mock bus
    /// * `interval_ms` - Delay between two sweeps
    /// * `count` - Number of sweeps
    pub fn apply_args(
        &mut self,
        bus_id: Option<String>,
        mock: bool,
        interval_ms: Option<u64>,
        count: Option<u64>,
    ) {
        if let Some(bus_id) = bus_id {
            debug!("Overriding bus id from command line: {}", bus_id);
            self.bus.bus_id = bus_id;
        }

        if mock {
            debug!("Using mock I2C bus from command line");
            self.bus.bus_type = I2CBusType::Mock;
        }

        if let Some(interval_ms) = interval_ms {
            debug!("Overriding sampling interval from command line: {} ms", interval_ms);
            self.sampling.interval_ms = interval_ms;
        }

        if let Some(count) = count {
            debug!("Overriding sample count from command line: {}", count);
            self.sampling.count = Some(count);
        }
    }

    /// Checks the schema cannot express
    ///
    /// - **Bus identifier**: a native bus id must name a Linux bus number
    /// - **Interval**: the polling interval must be positive
    /// - **Sensors**: at least one sensor must be enabled
    fn validate_specific_rules(config: &Config) -> Result<()> {
        debug!("Performing additional validation checks");

        if config.bus.bus_type == I2CBusType::Native {
            parse_bus_number(&config.bus.bus_id)
                .with_context(|| format!("Invalid native bus id '{}'", config.bus.bus_id))?;
        }

        if config.sampling.interval_ms == 0 {
            anyhow::bail!("Sampling interval must be greater than zero");
        }

        if config.sensors.enabled_count() == 0 {
            anyhow::bail!("No sensor is enabled");
        }

        Ok(())
    }
}

/// Embedded JSON Schema of the configuration file
pub fn config_schema() -> &'static str {
    include_str!("../resources/config.schema.json")
}

/// Print the configuration schema to stdout
pub fn output_config_schema() -> Result<()> {
    let schema: serde_json::Value =
        serde_json::from_str(config_schema()).context("Failed to parse JSON schema")?;

    let formatted_schema =
        serde_json::to_string_pretty(&schema).context("Failed to format JSON schema")?;

    println!("{}", formatted_schema);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::{AccelFullScale, GyroFullScale};

    #[test]
    fn test_defaults_pass_specific_rules() {
        let config = Config::default();
        assert!(Config::validate_specific_rules(&config).is_ok());
        assert_eq!(config.sensors.enabled_count(), 4);
    }

    #[test]
    fn test_specific_rules() {
        let mut config = Config::default();
        config.sampling.interval_ms = 0;
        assert!(Config::validate_specific_rules(&config).is_err());

        let mut config = Config::default();
        config.bus.bus_id = "spi0".to_string();
        assert!(Config::validate_specific_rules(&config).is_err());
        config.bus.bus_type = I2CBusType::Mock;
        assert!(Config::validate_specific_rules(&config).is_ok());
    }

    #[test]
    fn test_modes_deserialize() {
        let yaml = r#"
bus:
  type: mock
sensors:
  hts221:
    mode: 12.5hz
  lps22hb:
    enabled: false
    mode: stream
  lsm6dsl:
    mode:
      accel: 8g
      gyro: 125dps
"#;
        let config: Config = serde_yml::from_str(yaml).unwrap();
        assert_eq!(config.bus.bus_type, I2CBusType::Mock);
        assert_eq!(config.bus.bus_id, "I2C1");
        assert_eq!(config.sensors.hts221.mode, Hts221Mode::Hz12_5);
        assert_eq!(config.sensors.lps22hb.mode, FifoMode::Stream);
        assert!(!config.sensors.lps22hb.enabled);
        assert_eq!(config.sensors.lis2mdl.mode, Lis2mdlMode::Hz10);
        assert_eq!(config.sensors.lsm6dsl.mode.accel, AccelFullScale::G8);
        assert_eq!(config.sensors.lsm6dsl.mode.gyro, GyroFullScale::Dps125);
    }

    #[test]
    fn test_apply_args() {
        let mut config = Config::default();
        config.apply_args(Some("/dev/i2c-3".to_string()), true, Some(250), Some(4));
        assert_eq!(config.bus.bus_id, "/dev/i2c-3");
        assert_eq!(config.bus.bus_type, I2CBusType::Mock);
        assert_eq!(config.sampling.interval_ms, 250);
        assert_eq!(config.sampling.count, Some(4));
    }

    #[test]
    fn test_schema_is_valid_json() {
        let schema: serde_json::Value = serde_json::from_str(config_schema()).unwrap();
        assert!(jsonschema::draft202012::options().build(&schema).is_ok());
    }
}
