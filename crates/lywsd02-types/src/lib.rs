//! Platform-agnostic wire types for the Xiaomi LYWSD02 clock/hygrometer.
//!
//! This crate contains everything about the LYWSD02 GATT protocol that does
//! not require a Bluetooth stack: the service/characteristic UUIDs, the
//! decoded value types, and the byte-level codecs for each characteristic
//! payload. The BLE session itself lives in `lywsd02-core`.
//!
//! # Payload shapes
//!
//! | Characteristic | Wire payload |
//! |----------------|--------------|
//! | Time | 4 bytes (u32 LE unix seconds) or 5 bytes (plus i8 UTC offset in hours) |
//! | Units | 1 byte, `0xFF` = Celsius, `0x01` = Fahrenheit |
//! | Sensor data | 3 bytes: i16 LE temperature in hundredths, u8 humidity percent |
//! | History | 14 bytes, see [`HistoryRecord`] |

pub mod error;
pub mod types;
pub mod uuid;

pub use error::{ParseError, ParseResult};
pub use types::{HistoryRecord, SensorSample, TemperatureUnit, TimeReading};
