// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-mems-sensors project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

use anyhow::Result;
use rust_mems_sensors::bus::{create_bus_driver, MockI2CDriver, SharedI2CBus};
use rust_mems_sensors::config::{Config, I2CBusType, SensorsConfig};
use rust_mems_sensors::devices::{hts221, lis2mdl, lps22hb, lsm6dsl};
use rust_mems_sensors::monitor::{Monitor, SensorReading};
use rust_mems_sensors::Unit;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

#[test]
fn test_mock_sweep_serializes_to_json_lines() -> Result<()> {
    let mut config = Config::default();
    config.apply_args(None, true, Some(10), Some(1));
    assert_eq!(config.bus.bus_type, I2CBusType::Mock);

    let bus = SharedI2CBus::new(create_bus_driver(&config.bus)?);
    let mut monitor = Monitor::from_config(&config.sensors, bus)?;

    let readings = monitor.sweep();
    let mut lines = Vec::new();
    for reading in &readings {
        lines.push(serde_json::to_string(reading)?);
    }
    monitor.release()?;

    assert_eq!(lines.len(), 4);
    let first: SensorReading = serde_json::from_str(&lines[0])?;
    assert_eq!(first.sensor, "HTS221");
    assert_eq!(first.measurements[0].unit, Unit::RelativeHumidity);
    assert!(lines[0].contains("\"timestamp\""));
    assert!(!lines[0].contains("\"error\""));

    let pressure = serde_json::from_str::<SensorReading>(&lines[1])?;
    assert_eq!(pressure.measurements[0].values, vec![1013.25]);
    Ok(())
}

#[test]
fn test_unbounded_run_powers_down_after_interrupt() -> Result<()> {
    let mock = MockI2CDriver::with_preset_devices();
    let mut config = Config::default();
    config.apply_args(None, true, Some(100), None);
    assert_eq!(config.sampling.count, None);

    let mut monitor = Monitor::from_config(&config.sensors, SharedI2CBus::new(mock.clone()))?;
    let stop = Arc::new(AtomicBool::new(false));
    let interrupt = {
        let stop = Arc::clone(&stop);
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(250));
            stop.store(true, Ordering::SeqCst);
        })
    };

    let started = Instant::now();
    let interval = Duration::from_millis(config.sampling.interval_ms);
    let sweeps = monitor.run(config.sampling.count, interval, &stop, |readings| {
        assert_eq!(readings.len(), 4);
        Ok::<_, anyhow::Error>(())
    })?;
    interrupt.join().expect("interrupt thread panicked");

    assert!(sweeps >= 1);
    assert!(started.elapsed() < Duration::from_secs(5));

    monitor.release()?;
    assert_eq!(mock.register(hts221::ADDRESS, hts221::CTRL_REG1), Some(0x00));
    assert_eq!(mock.register(lps22hb::ADDRESS, lps22hb::CTRL_REG1), Some(0x00));
    assert_eq!(
        mock.register(lis2mdl::ADDRESS, lis2mdl::CFG_REG_A),
        Some(lis2mdl::CFG_REG_A_IDLE)
    );
    assert_eq!(
        mock.register(lsm6dsl::ADDRESS, lsm6dsl::CTRL3_C).map(|v| v & lsm6dsl::SW_RESET),
        Some(lsm6dsl::SW_RESET)
    );
    Ok(())
}

#[test]
fn test_counted_run_ignores_unraised_flag() -> Result<()> {
    let mock = MockI2CDriver::with_preset_devices();
    let mut monitor = Monitor::from_config(&SensorsConfig::default(), mock)?;
    let stop = AtomicBool::new(false);

    let mut lines = Vec::new();
    let sweeps = monitor.run(Some(2), Duration::from_millis(1), &stop, |readings| {
        for reading in readings {
            lines.push(serde_json::to_string(reading)?);
        }
        Ok::<_, anyhow::Error>(())
    })?;
    monitor.release()?;

    assert_eq!(sweeps, 2);
    assert_eq!(lines.len(), 8);
    Ok(())
}
