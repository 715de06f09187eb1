//! LYWSD02 device session: connection lifecycle and characteristic protocol.
//!
//! A [`DeviceSession`] is created unconnected, gains a transport through
//! [`connect`](DeviceSession::connect), and exposes the device operations:
//! read/set the clock, read the cached UTC offset, read/set the display
//! unit, and obtain sensor samples and history records via the one-shot
//! notification handshake.
//!
//! Operations take `&mut self`, so one session can only ever run one
//! operation at a time; issuing the next requires awaiting the previous.

use std::collections::HashMap;
use std::time::Duration;

use btleplug::api::{Characteristic, Peripheral as _, WriteType};
use btleplug::platform::{Adapter, Peripheral};
use time::OffsetDateTime;
use tokio::time::timeout;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::notify::first_notification;
use crate::scan::{ADVERTISED_NAME, ScanOptions, find_device};
use lywsd02_types::uuid::{HISTORY, PRIMARY_SERVICE, SENSOR_DATA, TIME, UNITS};
use lywsd02_types::{HistoryRecord, SensorSample, TemperatureUnit, TimeReading};

/// Default timeout for the discovery scan.
const DEFAULT_SCAN_TIMEOUT: Duration = Duration::from_secs(10);

/// Default timeout for establishing the transport connection.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

/// Default timeout for service discovery after connection.
const DEFAULT_DISCOVERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Default timeout for characteristic read operations.
const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(10);

/// Default timeout for characteristic write operations.
const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(10);

/// Default timeout for awaiting a one-shot notification.
///
/// The device pushes a sensor sample within a couple of seconds of
/// subscribing; 15 seconds leaves margin for congested radio environments.
const DEFAULT_NOTIFY_TIMEOUT: Duration = Duration::from_secs(15);

/// Configuration for session timeouts.
///
/// Every transport call the session makes is bounded by one of these, so a
/// silent device fails the operation instead of suspending the caller
/// forever.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Timeout for the discovery scan.
    pub scan_timeout: Duration,
    /// Timeout for establishing the transport connection.
    pub connect_timeout: Duration,
    /// Timeout for service discovery after connection.
    pub discovery_timeout: Duration,
    /// Timeout for characteristic read operations.
    pub read_timeout: Duration,
    /// Timeout for characteristic write operations.
    pub write_timeout: Duration,
    /// Timeout for awaiting a one-shot notification.
    pub notify_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            scan_timeout: DEFAULT_SCAN_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            discovery_timeout: DEFAULT_DISCOVERY_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
            notify_timeout: DEFAULT_NOTIFY_TIMEOUT,
        }
    }
}

impl SessionConfig {
    /// Create a new session config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the discovery scan timeout.
    #[must_use]
    pub fn scan_timeout(mut self, timeout: Duration) -> Self {
        self.scan_timeout = timeout;
        self
    }

    /// Set the connection timeout.
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the read timeout.
    #[must_use]
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Set the write timeout.
    #[must_use]
    pub fn write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    /// Set the notification wait timeout.
    #[must_use]
    pub fn notify_timeout(mut self, timeout: Duration) -> Self {
        self.notify_timeout = timeout;
        self
    }
}

/// The transport half of a connected session.
struct Link {
    /// Kept alive for the lifetime of the peripheral connection; the
    /// peripheral may hold internal references to the adapter.
    #[allow(dead_code)]
    adapter: Adapter,
    peripheral: Peripheral,
    /// Characteristics of the primary service, keyed by UUID.
    characteristics: HashMap<Uuid, Characteristic>,
}

impl Link {
    fn characteristic(&self, uuid: Uuid) -> Result<Characteristic> {
        self.characteristics
            .get(&uuid)
            .cloned()
            .ok_or_else(|| Error::characteristic_not_found(uuid))
    }
}

/// One logical connection to a physical LYWSD02 device.
///
/// # Lifecycle
///
/// `Unconnected → (connect success) → Connected → (disconnect) → Unconnected`.
/// A failed `connect` leaves the session unconnected; a dropped connection is
/// not auto-recovered, the caller must call [`connect`](Self::connect) again.
/// [`disconnect`](Self::disconnect) is idempotent and safe on a session that
/// never connected, which makes it usable unconditionally on failure paths.
///
/// # Example
///
/// ```no_run
/// use lywsd02_core::DeviceSession;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let mut session = DeviceSession::new();
///     session.connect().await?;
///     let sample = session.read_sensor().await?;
///     println!("{} at {}%", sample.temperature, sample.humidity);
///     session.disconnect().await?;
///     Ok(())
/// }
/// ```
pub struct DeviceSession {
    config: SessionConfig,
    link: Option<Link>,
    /// Offset from UTC in whole hours, cached from the last time read that
    /// carried one. `None` means the device has not reported an offset.
    utc_offset: Option<i8>,
}

impl std::fmt::Debug for DeviceSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceSession")
            .field("connected", &self.link.is_some())
            .field("utc_offset", &self.utc_offset)
            .finish_non_exhaustive()
    }
}

impl Default for DeviceSession {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceSession {
    /// Create an unconnected session with default timeouts.
    pub fn new() -> Self {
        Self::with_config(SessionConfig::default())
    }

    /// Create an unconnected session with custom timeouts.
    pub fn with_config(config: SessionConfig) -> Self {
        Self {
            config,
            link: None,
            utc_offset: None,
        }
    }

    /// Whether the session currently holds a connection.
    pub fn is_connected(&self) -> bool {
        self.link.is_some()
    }

    /// The session's timeout configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Connect to the first device advertising the `LYWSD02` name.
    #[tracing::instrument(level = "info", skip_all)]
    pub async fn connect(&mut self) -> Result<()> {
        self.connect_to(ADVERTISED_NAME).await
    }

    /// Connect to a specific device by advertised name or address.
    ///
    /// Scans for the device, opens the transport connection, discovers
    /// services, and caches the characteristics of the primary service.
    ///
    /// # Errors
    ///
    /// - [`Error::DeviceNotFound`] if the scan yields no matching device.
    /// - [`Error::GattUnavailable`] if the connected device does not expose
    ///   the LYWSD02 primary service.
    /// - [`Error::Timeout`] or a propagated transport error if connecting or
    ///   service discovery fails; the session stays unconnected.
    #[tracing::instrument(level = "info", skip_all, fields(identifier = %identifier))]
    pub async fn connect_to(&mut self, identifier: &str) -> Result<()> {
        if self.link.is_some() {
            debug!("Session already connected");
            return Ok(());
        }

        let options = ScanOptions::new().duration(self.config.scan_timeout);
        let (adapter, peripheral) = find_device(identifier, &options).await?;

        info!("Connecting to device...");
        timeout(self.config.connect_timeout, peripheral.connect())
            .await
            .map_err(|_| Error::timeout("connect to device", self.config.connect_timeout))??;
        info!("Connected!");

        info!("Discovering services...");
        timeout(
            self.config.discovery_timeout,
            peripheral.discover_services(),
        )
        .await
        .map_err(|_| Error::timeout("discover services", self.config.discovery_timeout))??;

        let Some(service) = peripheral
            .services()
            .into_iter()
            .find(|service| service.uuid == PRIMARY_SERVICE)
        else {
            if let Err(e) = peripheral.disconnect().await {
                debug!("Disconnect after missing service failed: {}", e);
            }
            return Err(Error::GattUnavailable);
        };

        let characteristics: HashMap<Uuid, Characteristic> = service
            .characteristics
            .iter()
            .map(|characteristic| (characteristic.uuid, characteristic.clone()))
            .collect();
        debug!("Cached {} characteristics", characteristics.len());

        self.link = Some(Link {
            adapter,
            peripheral,
            characteristics,
        });
        Ok(())
    }

    /// Release the connection if one is held.
    ///
    /// No-op on an unconnected session; safe to call repeatedly.
    #[tracing::instrument(level = "info", skip_all)]
    pub async fn disconnect(&mut self) -> Result<()> {
        if let Some(link) = self.link.take() {
            info!("Disconnecting from device...");
            link.peripheral.disconnect().await?;
        }
        Ok(())
    }

    /// Read the device clock.
    ///
    /// When the payload carries a UTC offset byte, the session caches it for
    /// [`utc_offset`](Self::utc_offset).
    #[tracing::instrument(level = "debug", skip_all)]
    pub async fn read_time(&mut self) -> Result<TimeReading> {
        let data = self.read_characteristic(TIME, "read time").await?;
        let reading = TimeReading::from_bytes(&data)?;
        if reading.utc_offset.is_some() {
            self.utc_offset = reading.utc_offset;
        }
        debug!("Device time: {} (offset {:?})", reading, reading.utc_offset);
        Ok(reading)
    }

    /// The device's offset from UTC in whole hours.
    ///
    /// Returns the cached value from a prior time read, fetching the time
    /// once when the cache is empty. `None` means the device has never
    /// reported an offset; it is never coerced to zero.
    pub async fn utc_offset(&mut self) -> Result<Option<i8>> {
        if self.link.is_none() {
            return Err(Error::NotConnected);
        }
        if self.utc_offset.is_none() {
            self.read_time().await?;
        }
        Ok(self.utc_offset)
    }

    /// Set the device clock.
    ///
    /// Writes the instant's unix timestamp and its signed whole-hour UTC
    /// offset (positive = ahead of UTC) to the time characteristic.
    #[tracing::instrument(level = "debug", skip_all)]
    pub async fn set_time(&mut self, when: OffsetDateTime) -> Result<()> {
        // The device clock is a 32-bit unix timestamp.
        let timestamp = when.unix_timestamp().clamp(0, i64::from(u32::MAX)) as u32;
        let reading = TimeReading {
            timestamp,
            utc_offset: Some(when.offset().whole_hours()),
        };
        self.write_characteristic(TIME, &reading.to_bytes(), "set time")
            .await
    }

    /// Read the temperature unit shown on the device display.
    #[tracing::instrument(level = "debug", skip_all)]
    pub async fn read_units(&mut self) -> Result<TemperatureUnit> {
        let data = self.read_characteristic(UNITS, "read units").await?;
        let byte = data.first().copied().ok_or(Error::Decode(
            lywsd02_types::ParseError::InvalidLength {
                payload: "units",
                actual: 0,
            },
        ))?;
        Ok(TemperatureUnit::from_wire(byte)?)
    }

    /// Set the temperature unit shown on the device display.
    #[tracing::instrument(level = "debug", skip_all, fields(unit = %unit))]
    pub async fn set_units(&mut self, unit: TemperatureUnit) -> Result<()> {
        self.write_characteristic(UNITS, &[unit.wire_byte()], "set units")
            .await
    }

    /// Read a one-shot temperature/humidity sample.
    ///
    /// The sensor-data characteristic does not support synchronous reads;
    /// this uses the notification handshake and consumes exactly one event.
    #[tracing::instrument(level = "debug", skip_all)]
    pub async fn read_sensor(&mut self) -> Result<SensorSample> {
        let data = self.read_via_notify(SENSOR_DATA).await?;
        let sample = SensorSample::from_bytes(&data)?;
        debug!("Sensor sample: {}", sample);
        Ok(sample)
    }

    /// Read one historical min/max record.
    ///
    /// The device streams records over the history characteristic; this
    /// returns the first one. [`HistoryRecord::from_bytes`] is reusable
    /// should record iteration be added.
    #[tracing::instrument(level = "debug", skip_all)]
    pub async fn read_history_record(&mut self) -> Result<HistoryRecord> {
        let data = self.read_via_notify(HISTORY).await?;
        Ok(HistoryRecord::from_bytes(&data)?)
    }

    /// Read a characteristic's current value with the configured timeout.
    async fn read_characteristic(&self, uuid: Uuid, operation: &str) -> Result<Vec<u8>> {
        let link = self.link.as_ref().ok_or(Error::NotConnected)?;
        let characteristic = link.characteristic(uuid)?;
        let data = timeout(self.config.read_timeout, link.peripheral.read(&characteristic))
            .await
            .map_err(|_| Error::timeout(operation, self.config.read_timeout))??;
        Ok(data)
    }

    /// Write a value to a characteristic with the configured timeout.
    async fn write_characteristic(&self, uuid: Uuid, data: &[u8], operation: &str) -> Result<()> {
        let link = self.link.as_ref().ok_or(Error::NotConnected)?;
        let characteristic = link.characteristic(uuid)?;
        timeout(
            self.config.write_timeout,
            link.peripheral
                .write(&characteristic, data, WriteType::WithResponse),
        )
        .await
        .map_err(|_| Error::timeout(operation, self.config.write_timeout))??;
        Ok(())
    }

    /// Run the one-shot notification handshake against a characteristic:
    /// subscribe, await the first matching event, unsubscribe.
    async fn read_via_notify(&self, uuid: Uuid) -> Result<Vec<u8>> {
        let link = self.link.as_ref().ok_or(Error::NotConnected)?;
        let characteristic = link.characteristic(uuid)?;

        link.peripheral.subscribe(&characteristic).await?;
        let mut stream = link.peripheral.notifications().await?;

        let result = first_notification(&mut stream, uuid, self.config.notify_timeout).await;

        // Best-effort: the value (or the error) is already decided.
        if let Err(e) = link.peripheral.unsubscribe(&characteristic).await {
            debug!("Unsubscribe after one-shot read failed: {}", e);
        }

        result
    }
}

// Best-effort cleanup when the session is dropped while still connected.
// Callers SHOULD call `disconnect().await` themselves; the spawned task may
// not complete during shutdown.
impl Drop for DeviceSession {
    fn drop(&mut self) {
        if let Some(link) = self.link.take() {
            warn!(
                "DeviceSession dropped without disconnect(), releasing connection in background"
            );
            if let Ok(handle) = tokio::runtime::Handle::try_current() {
                handle.spawn(async move {
                    if let Err(e) = link.peripheral.disconnect().await {
                        debug!("Best-effort disconnect failed: {}", e);
                    }
                });
            }
        }
    }
}
