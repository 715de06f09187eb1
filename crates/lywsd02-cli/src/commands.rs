//! Command implementations.
//!
//! Each command opens a session, runs one or more device operations,
//! renders the result, and always releases the connection.

use std::time::Duration;

use anyhow::{Context, Result};
use time::OffsetDateTime;
use tracing::warn;

use lywsd02_core::{
    DeviceSession, ScanOptions, SensorSample, SessionConfig, TemperatureUnit, TimeReading,
    scan_for_devices,
};

use crate::OutputFormat;

/// Connect a session to the given device.
async fn open_session(device: &str, scan_timeout: Duration) -> Result<DeviceSession> {
    let config = SessionConfig::new().scan_timeout(scan_timeout);
    let mut session = DeviceSession::with_config(config);
    if let Err(e) = session.connect_to(device).await {
        session.disconnect().await.ok();
        return Err(e).with_context(|| format!("failed to connect to '{device}'"));
    }
    Ok(session)
}

pub async fn cmd_scan(scan_timeout: Duration, all: bool, format: OutputFormat) -> Result<()> {
    let mut options = ScanOptions::new().duration(scan_timeout);
    if all {
        options = options.all_devices();
    }
    let devices = scan_for_devices(options).await.context("scan failed")?;

    match format {
        OutputFormat::Json => {
            let entries: Vec<serde_json::Value> = devices
                .iter()
                .map(|device| {
                    serde_json::json!({
                        "name": device.name,
                        "address": device.address,
                        "rssi": device.rssi,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        OutputFormat::Text => {
            if devices.is_empty() {
                println!("No devices found");
                return Ok(());
            }
            for device in &devices {
                let name = device.name.as_deref().unwrap_or("(unnamed)");
                match device.rssi {
                    Some(rssi) => println!("{}  {}  {} dBm", device.address, name, rssi),
                    None => println!("{}  {}", device.address, name),
                }
            }
        }
    }
    Ok(())
}

pub async fn cmd_time(device: &str, scan_timeout: Duration, format: OutputFormat) -> Result<()> {
    let mut session = open_session(device, scan_timeout).await?;
    let result = session.read_time().await;
    session.disconnect().await.ok();
    let reading = result.context("failed to read device clock")?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&reading)?),
        OutputFormat::Text => print_time(&reading),
    }
    Ok(())
}

fn print_time(reading: &TimeReading) {
    match reading.utc_offset {
        Some(offset) => println!("Device clock: {} (UTC{:+})", reading, offset),
        None => println!("Device clock: {} (no UTC offset reported)", reading),
    }
}

pub async fn cmd_set_time(device: &str, scan_timeout: Duration) -> Result<()> {
    // The device stores local wall-clock time plus the offset; fall back to
    // UTC when the platform refuses to disclose the local offset.
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| {
        warn!("Local UTC offset unavailable, writing UTC time");
        OffsetDateTime::now_utc()
    });

    let mut session = open_session(device, scan_timeout).await?;
    let result = session.set_time(now).await;
    session.disconnect().await.ok();
    result.context("failed to set device clock")?;

    println!(
        "Device clock set to {} (UTC{:+})",
        now.time(),
        now.offset().whole_hours()
    );
    Ok(())
}

pub async fn cmd_units(device: &str, scan_timeout: Duration, format: OutputFormat) -> Result<()> {
    let mut session = open_session(device, scan_timeout).await?;
    let result = session.read_units().await;
    session.disconnect().await.ok();
    let unit = result.context("failed to read display unit")?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&unit)?),
        OutputFormat::Text => println!("Display unit: {}", unit),
    }
    Ok(())
}

pub async fn cmd_set_units(
    device: &str,
    scan_timeout: Duration,
    unit: TemperatureUnit,
) -> Result<()> {
    let mut session = open_session(device, scan_timeout).await?;
    let result = session.set_units(unit).await;
    session.disconnect().await.ok();
    result.context("failed to set display unit")?;

    println!("Display unit set to {}", unit);
    Ok(())
}

pub async fn cmd_read(device: &str, scan_timeout: Duration, format: OutputFormat) -> Result<()> {
    let mut session = open_session(device, scan_timeout).await?;
    let result = session.read_sensor().await;
    session.disconnect().await.ok();
    let sample = result.context("failed to read sensor sample")?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&sample)?),
        OutputFormat::Text => print_sample(&sample),
    }
    Ok(())
}

fn print_sample(sample: &SensorSample) {
    println!("Temperature: {:.2}°", sample.temperature);
    println!("Humidity:    {}%", sample.humidity);
}

pub async fn cmd_history(device: &str, scan_timeout: Duration, format: OutputFormat) -> Result<()> {
    let mut session = open_session(device, scan_timeout).await?;
    let result = session.read_history_record().await;
    session.disconnect().await.ok();
    let record = result.context("failed to read history record")?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&record)?),
        OutputFormat::Text => {
            println!("Record #{} at {}", record.index, record.datetime());
            println!(
                "Temperature: {:.2}° min / {:.2}° max",
                record.min_temperature, record.max_temperature
            );
            println!(
                "Humidity:    {}% min / {}% max",
                record.min_humidity, record.max_humidity
            );
        }
    }
    Ok(())
}
