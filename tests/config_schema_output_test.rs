// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-mems-sensors project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

use anyhow::Result;
use rust_mems_sensors::config::{self, Config};

#[test]
fn test_config_schema_output() -> Result<()> {
    config::output_config_schema()?;
    Ok(())
}

#[test]
fn test_default_config_matches_schema() -> Result<()> {
    let schema: serde_json::Value = serde_json::from_str(config::config_schema())?;
    let validator = jsonschema::draft202012::options().build(&schema)?;

    let yaml = serde_yml::to_string(&Config::default())?;
    let value: serde_yml::Value = serde_yml::from_str(&yaml)?;
    let json = serde_json::to_value(&value)?;

    assert!(validator.is_valid(&json), "default config: {}", json);
    Ok(())
}
