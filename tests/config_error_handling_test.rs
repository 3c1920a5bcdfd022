// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-mems-sensors project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

use anyhow::Result;
use rust_mems_sensors::config::Config;
use std::fs;
use std::path::Path;
use std::sync::Once;
use tempfile::tempdir;

static INIT: Once = Once::new();

// Setup logger for tests
fn setup() {
    INIT.call_once(|| {
        env_logger::builder()
            .filter_level(log::LevelFilter::Debug)
            .is_test(true)
            .init();
    });
}

fn assert_sample_created(config_path: &Path) -> Result<()> {
    let sample_path = config_path.with_extension("sample.yaml");
    assert!(sample_path.exists(), "Sample config file was not created");

    let sample_config = Config::from_file(&sample_path)?;
    assert_eq!(sample_config, Config::default());
    Ok(())
}

#[test]
fn test_schema_violation_creates_sample_file() -> Result<()> {
    setup();
    let temp_dir = tempdir()?;
    let config_path = temp_dir.path().join("sensors.yaml");

    let invalid_yaml = r#"
bus:
  type: cp2112
sensors:
  hts221:
    mode: 25hz
"#;
    fs::write(&config_path, invalid_yaml)?;

    let result = Config::from_file(&config_path);
    assert!(result.is_err(), "Config loading should have failed");
    assert_sample_created(&config_path)
}

#[test]
fn test_unknown_key_is_rejected() -> Result<()> {
    setup();
    let temp_dir = tempdir()?;
    let config_path = temp_dir.path().join("sensors.yaml");

    fs::write(
        &config_path,
        r#"
sensors:
  lsm6dsl:
    enabled: true
    odr: 416
"#,
    )?;

    assert!(Config::from_file(&config_path).is_err());
    assert_sample_created(&config_path)
}

#[test]
fn test_specific_rule_violation_creates_sample_file() -> Result<()> {
    setup();
    let temp_dir = tempdir()?;
    let config_path = temp_dir.path().join("sensors.yaml");

    // Schema-valid, but no sensor left to poll
    let config = r#"
bus:
  type: mock
sensors:
  hts221:
    enabled: false
  lps22hb:
    enabled: false
  lis2mdl:
    enabled: false
  lsm6dsl:
    enabled: false
"#;
    fs::write(&config_path, config)?;

    let err = Config::from_file(&config_path).unwrap_err();
    assert!(err.to_string().contains("No sensor is enabled"));
    assert_sample_created(&config_path)
}

#[test]
fn test_invalid_native_bus_id() -> Result<()> {
    setup();
    let temp_dir = tempdir()?;
    let config_path = temp_dir.path().join("sensors.yaml");

    fs::write(
        &config_path,
        r#"
bus:
  type: native
  bus_id: spi0
"#,
    )?;

    assert!(Config::from_file(&config_path).is_err());
    Ok(())
}
