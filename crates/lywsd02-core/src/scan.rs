//! Device discovery and scanning.
//!
//! The LYWSD02 advertises its model name; the default discovery filter
//! matches that name exactly. An explicit identifier (name or address) can
//! be supplied to pick a specific unit when several are in range.

use std::time::Duration;

use btleplug::api::{Central, Manager as _, Peripheral as _, ScanFilter};
use btleplug::platform::{Adapter, Manager, Peripheral};
use tokio::time::sleep;
use tracing::{debug, info};

use crate::error::{DeviceNotFoundReason, Error, Result};

/// Advertised device name used by the default discovery filter.
pub const ADVERTISED_NAME: &str = "LYWSD02";

/// Information about a discovered device.
#[derive(Debug, Clone)]
pub struct DiscoveredDevice {
    /// The advertised device name.
    pub name: Option<String>,
    /// The BLE address as a string (may be zeros on macOS).
    pub address: String,
    /// RSSI signal strength in dBm, if reported.
    pub rssi: Option<i16>,
}

/// Options for scanning.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// How long to scan for devices.
    pub duration: Duration,
    /// Only return devices advertising the LYWSD02 name.
    pub filter_lywsd02_only: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            duration: Duration::from_secs(5),
            filter_lywsd02_only: true,
        }
    }
}

impl ScanOptions {
    /// Create new scan options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the scan duration.
    #[must_use]
    pub fn duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Scan for all BLE devices, not just LYWSD02 units.
    #[must_use]
    pub fn all_devices(mut self) -> Self {
        self.filter_lywsd02_only = false;
        self
    }
}

/// Get the first available Bluetooth adapter.
pub async fn get_adapter() -> Result<Adapter> {
    let manager = Manager::new().await?;
    let adapters = manager.adapters().await?;

    adapters
        .into_iter()
        .next()
        .ok_or(Error::DeviceNotFound(DeviceNotFoundReason::NoAdapter))
}

/// Scan for LYWSD02 devices in range.
///
/// Returns a list of discovered devices, or an error if the scan failed.
/// An empty list indicates no devices were found (not an error).
pub async fn scan_for_devices(options: ScanOptions) -> Result<Vec<DiscoveredDevice>> {
    let adapter = get_adapter().await?;
    info!(
        "Starting BLE scan for {} seconds...",
        options.duration.as_secs()
    );

    adapter.start_scan(ScanFilter::default()).await?;
    sleep(options.duration).await;
    adapter.stop_scan().await?;

    let mut discovered = Vec::new();
    for peripheral in adapter.peripherals().await? {
        let Some(properties) = peripheral.properties().await? else {
            continue;
        };
        let name = properties.local_name.clone();
        let is_lywsd02 = name.as_deref() == Some(ADVERTISED_NAME);

        if options.filter_lywsd02_only && !is_lywsd02 {
            continue;
        }

        discovered.push(DiscoveredDevice {
            name,
            address: properties.address.to_string(),
            rssi: properties.rssi,
        });
    }

    info!("Scan complete. Found {} device(s)", discovered.len());
    Ok(discovered)
}

/// Find a specific device by advertised name or address.
///
/// Scans for `options.duration`, then searches the adapter's peripheral list
/// for a match. Name matches are exact; address matches ignore case and
/// colon separators.
pub async fn find_device(identifier: &str, options: &ScanOptions) -> Result<(Adapter, Peripheral)> {
    let adapter = get_adapter().await?;
    info!("Looking for device: {}", identifier);

    // A unit already known to the adapter from a previous scan can be
    // returned without scanning again.
    if let Some(peripheral) = find_peripheral(&adapter, identifier).await? {
        debug!("Found device in adapter cache, no scan needed");
        return Ok((adapter, peripheral));
    }

    adapter.start_scan(ScanFilter::default()).await?;
    sleep(options.duration).await;
    adapter.stop_scan().await?;

    match find_peripheral(&adapter, identifier).await? {
        Some(peripheral) => Ok((adapter, peripheral)),
        None => Err(Error::device_not_found(identifier)),
    }
}

/// Search the adapter's known peripherals for one matching the identifier.
async fn find_peripheral(adapter: &Adapter, identifier: &str) -> Result<Option<Peripheral>> {
    let wanted_address = identifier.to_lowercase().replace(':', "");

    for peripheral in adapter.peripherals().await? {
        let Ok(Some(properties)) = peripheral.properties().await else {
            continue;
        };

        if properties.local_name.as_deref() == Some(identifier) {
            debug!("Matched by name: {}", identifier);
            return Ok(Some(peripheral));
        }

        let address = properties.address.to_string().to_lowercase().replace(':', "");
        if address != "000000000000" && address == wanted_address {
            debug!("Matched by address: {}", properties.address);
            return Ok(Some(peripheral));
        }
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advertised_name() {
        assert_eq!(ADVERTISED_NAME, "LYWSD02");
    }

    #[test]
    fn test_scan_options_defaults() {
        let options = ScanOptions::default();
        assert_eq!(options.duration, Duration::from_secs(5));
        assert!(options.filter_lywsd02_only);
    }

    #[test]
    fn test_scan_options_builder() {
        let options = ScanOptions::new()
            .duration(Duration::from_secs(12))
            .all_devices();
        assert_eq!(options.duration, Duration::from_secs(12));
        assert!(!options.filter_lywsd02_only);
    }
}
