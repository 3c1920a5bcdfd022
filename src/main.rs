// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-mems-sensors project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

// Main entry point for the MEMS sensor monitor
use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info};
use rust_mems_sensors::bus::{create_bus_driver, SharedI2CBus};
use rust_mems_sensors::config::{output_config_schema, Config};
use rust_mems_sensors::monitor::{Monitor, SensorReading};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;

/// Poll HTS221, LPS22HB, LIS2MDL and LSM6DSL sensors over I2C
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file (created with defaults if missing)
    #[arg(short, long, default_value = "sensors.yaml")]
    config: PathBuf,

    /// I2C bus identifier, e.g. I2C1 or /dev/i2c-1
    #[arg(long)]
    bus_id: Option<String>,

    /// Use the in-memory mock bus instead of hardware
    #[arg(long)]
    mock: bool,

    /// Delay between two sweeps in milliseconds
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Number of sweeps (runs until interrupted when absent)
    #[arg(short = 'n', long)]
    count: Option<u64>,

    /// Output file for readings (JSON lines)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Print the configuration JSON Schema and exit
    #[arg(long)]
    show_config_schema: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if args.show_config_schema {
        return output_config_schema();
    }

    let mut config = Config::from_file(&args.config)
        .with_context(|| format!("Failed to load configuration from {:?}", args.config))?;
    config.apply_args(args.bus_id, args.mock, args.interval_ms, args.count);

    let bus = SharedI2CBus::new(create_bus_driver(&config.bus)?);
    let mut monitor =
        Monitor::from_config(&config.sensors, bus).context("Failed to configure sensors")?;
    info!("Monitoring {}", monitor.sensor_names().join(", "));

    let mut output = match &args.output {
        Some(path) => Some(BufWriter::new(
            File::create(path).with_context(|| format!("Failed to create {:?}", path))?,
        )),
        None => None,
    };

    // Ctrl+C raises the flag so the loop ends and the sensors are powered down
    let stop = Arc::new(AtomicBool::new(false));
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .context("Failed to start signal handler runtime")?;
    runtime.spawn(wait_for_shutdown(Arc::clone(&stop)));

    let interval = Duration::from_millis(config.sampling.interval_ms);
    let result = monitor.run(config.sampling.count, interval, &stop, |readings| {
        write_readings(readings, output.as_mut())
    });

    monitor.release().context("Failed to power down sensors")?;
    runtime.shutdown_background();
    let sweeps = result?;
    info!("Completed {} sweeps", sweeps);
    Ok(())
}

async fn wait_for_shutdown(stop: Arc<AtomicBool>) {
    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Received shutdown signal, stopping sensor sampling");
            stop.store(true, Ordering::SeqCst);
        }
        Err(err) => {
            error!("Unable to listen for shutdown signal: {}", err);
        }
    }
}

/// Write one sweep as JSON lines to `output`, or as text to stdout
fn write_readings(readings: &[SensorReading], output: Option<&mut BufWriter<File>>) -> Result<()> {
    match output {
        Some(out) => {
            for reading in readings {
                serde_json::to_writer(&mut *out, reading).context("Failed to serialize reading")?;
                writeln!(out).context("Failed to write reading")?;
            }
            out.flush().context("Failed to flush output")?;
        }
        None => {
            for reading in readings {
                let stamp = reading.timestamp.format("%H:%M:%S%.3f");
                match &reading.error {
                    Some(error) => println!("{} {:<8} error: {}", stamp, reading.sensor, error),
                    None => {
                        for measurement in &reading.measurements {
                            println!("{} {:<8} {}", stamp, reading.sensor, measurement);
                        }
                    }
                }
            }
        }
    }
    Ok(())
}
