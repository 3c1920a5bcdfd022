// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-mems-sensors project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

use anyhow::Result;
use rust_mems_sensors::config::{
    Config, I2CBusConfig, I2CBusType, SamplingConfig, SensorConfig, SensorsConfig,
};
use rust_mems_sensors::devices::{
    AccelFullScale, FifoMode, GyroFullScale, Hts221Mode, Lis2mdlMode, Lsm6dslMode,
};
use tempfile::tempdir;

#[test]
fn test_config_load_and_save() -> Result<()> {
    let temp_dir = tempdir()?;
    let config_path = temp_dir.path().join("sensors.yaml");

    let config = Config {
        bus: I2CBusConfig {
            bus_type: I2CBusType::Mock,
            bus_id: "/dev/i2c-3".to_string(),
        },
        sensors: SensorsConfig {
            hts221: SensorConfig {
                enabled: true,
                mode: Hts221Mode::Hz7,
            },
            lps22hb: SensorConfig {
                enabled: false,
                mode: FifoMode::Bypass,
            },
            lis2mdl: SensorConfig {
                enabled: true,
                mode: Lis2mdlMode::Hz100,
            },
            lsm6dsl: SensorConfig {
                enabled: true,
                mode: Lsm6dslMode {
                    accel: AccelFullScale::G16,
                    gyro: GyroFullScale::Dps2000,
                },
            },
        },
        sampling: SamplingConfig {
            interval_ms: 250,
            count: Some(12),
        },
    };

    config.save_to_file(&config_path)?;
    let loaded_config = Config::from_file(&config_path)?;
    assert_eq!(loaded_config, config);

    // Loading a missing file creates it with defaults
    let non_existent_path = temp_dir.path().join("non_existent.yaml");
    let default_config = Config::from_file(&non_existent_path)?;
    assert!(non_existent_path.exists());
    assert_eq!(default_config, Config::default());
    assert_eq!(default_config.bus.bus_type, I2CBusType::Native);
    assert_eq!(default_config.bus.bus_id, "I2C1");
    assert_eq!(default_config.sampling.interval_ms, 1000);

    Ok(())
}

#[test]
fn test_partial_file_uses_defaults() -> Result<()> {
    let temp_dir = tempdir()?;
    let config_path = temp_dir.path().join("sensors.yaml");
    std::fs::write(
        &config_path,
        r#"
bus:
  type: mock
sensors:
  lis2mdl:
    enabled: false
"#,
    )?;

    let config = Config::from_file(&config_path)?;
    assert_eq!(config.bus.bus_id, "I2C1");
    assert!(config.sensors.hts221.enabled);
    assert!(!config.sensors.lis2mdl.enabled);
    assert_eq!(config.sensors.enabled_count(), 3);
    assert_eq!(config.sampling.count, None);

    Ok(())
}
