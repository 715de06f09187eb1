//! BLE session library for the Xiaomi LYWSD02 clock/hygrometer.
//!
//! This crate connects to an LYWSD02 over Bluetooth Low Energy and exposes
//! the device's GATT protocol:
//!
//! - **Device discovery**: scan for units advertising the `LYWSD02` name
//! - **Clock**: read the device time and UTC offset, set the clock
//! - **Display unit**: read and set Celsius/Fahrenheit
//! - **Sensor sample**: one-shot temperature/humidity via the notification
//!   handshake (the device does not answer synchronous reads on that
//!   characteristic)
//! - **History**: read a historical min/max record
//!
//! Wire types and codecs live in [`lywsd02_types`] and are re-exported here.
//!
//! # Quick Start
//!
//! ```no_run
//! use lywsd02_core::DeviceSession;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut session = DeviceSession::new();
//!     session.connect().await?;
//!
//!     let time = session.read_time().await?;
//!     println!("Device clock: {}", time);
//!
//!     let sample = session.read_sensor().await?;
//!     println!("{:.2}° at {}% humidity", sample.temperature, sample.humidity);
//!
//!     session.disconnect().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Sequencing
//!
//! Session operations take `&mut self`: one session runs one operation at a
//! time, which is exactly the contract the device's notification handshake
//! needs. Every transport call is bounded by a [`SessionConfig`] timeout.

pub mod error;
pub mod notify;
pub mod scan;
pub mod session;

// Re-export the wire types and UUID table from lywsd02-types.
pub use lywsd02_types::uuid;
pub use lywsd02_types::{HistoryRecord, ParseError, SensorSample, TemperatureUnit, TimeReading};

pub use error::{DeviceNotFoundReason, Error, Result};
pub use scan::{ADVERTISED_NAME, DiscoveredDevice, ScanOptions, scan_for_devices};
pub use session::{DeviceSession, SessionConfig};
