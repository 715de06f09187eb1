//! Decoded value types and codecs for LYWSD02 payloads.

use core::fmt;

use bytes::{Buf, BufMut, BytesMut};
use time::{OffsetDateTime, UtcOffset};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// Wire size of a time payload without the UTC offset byte.
pub const TIME_PAYLOAD_SHORT: usize = 4;

/// Wire size of a time payload carrying the UTC offset byte.
pub const TIME_PAYLOAD_FULL: usize = 5;

/// Wire size of a sensor-sample notification payload.
pub const SENSOR_PAYLOAD_LEN: usize = 3;

/// Wire size of a history-record notification payload.
pub const HISTORY_PAYLOAD_LEN: usize = 14;

/// Temperature unit shown on the device display.
///
/// The wire encoding is a single byte: `0xFF` for Celsius and `0x01` for
/// Fahrenheit. The mapping is bijective; any other byte is a decode error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TemperatureUnit {
    /// Degrees Celsius (wire byte `0xFF`).
    Celsius,
    /// Degrees Fahrenheit (wire byte `0x01`).
    Fahrenheit,
}

impl TemperatureUnit {
    /// The byte written to the units characteristic for this unit.
    ///
    /// # Examples
    ///
    /// ```
    /// use lywsd02_types::TemperatureUnit;
    ///
    /// assert_eq!(TemperatureUnit::Celsius.wire_byte(), 0xFF);
    /// assert_eq!(TemperatureUnit::Fahrenheit.wire_byte(), 0x01);
    /// ```
    #[must_use]
    pub fn wire_byte(&self) -> u8 {
        match self {
            TemperatureUnit::Celsius => 0xFF,
            TemperatureUnit::Fahrenheit => 0x01,
        }
    }

    /// Decode a unit from its wire byte.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::UnknownUnit`] for any byte other than the two
    /// known encodings.
    pub fn from_wire(byte: u8) -> Result<Self, ParseError> {
        match byte {
            0xFF => Ok(TemperatureUnit::Celsius),
            0x01 => Ok(TemperatureUnit::Fahrenheit),
            other => Err(ParseError::UnknownUnit(other)),
        }
    }
}

impl fmt::Display for TemperatureUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemperatureUnit::Celsius => write!(f, "°C"),
            TemperatureUnit::Fahrenheit => write!(f, "°F"),
        }
    }
}

/// Decoded device-clock payload.
///
/// The device reports its clock as a little-endian u32 unix timestamp,
/// optionally followed by a signed whole-hour offset from UTC. Firmware that
/// has never been told an offset sends the 4-byte form; `utc_offset` is then
/// `None`, which is distinct from an offset of zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TimeReading {
    /// Unix timestamp in seconds.
    pub timestamp: u32,
    /// Offset from UTC in whole hours, if the device reported one.
    pub utc_offset: Option<i8>,
}

impl TimeReading {
    /// Decode a time payload.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::InvalidLength`] unless `data` is exactly
    /// [`TIME_PAYLOAD_SHORT`] (4) or [`TIME_PAYLOAD_FULL`] (5) bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self, ParseError> {
        if data.len() != TIME_PAYLOAD_SHORT && data.len() != TIME_PAYLOAD_FULL {
            return Err(ParseError::InvalidLength {
                payload: "time",
                actual: data.len(),
            });
        }

        let mut buf = data;
        let timestamp = buf.get_u32_le();
        let utc_offset = if buf.has_remaining() {
            Some(buf.get_i8())
        } else {
            None
        };

        Ok(TimeReading {
            timestamp,
            utc_offset,
        })
    }

    /// Encode this reading back to its wire form.
    ///
    /// Produces 5 bytes when the offset is known and 4 when it is not, so
    /// decode → encode round-trips byte-identically.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = BytesMut::with_capacity(TIME_PAYLOAD_FULL);
        buf.put_u32_le(self.timestamp);
        if let Some(offset) = self.utc_offset {
            buf.put_i8(offset);
        }
        buf.to_vec()
    }

    /// The timestamp as an [`OffsetDateTime`], shifted into the reported
    /// offset when one is present (UTC otherwise).
    #[must_use]
    pub fn datetime(&self) -> OffsetDateTime {
        let utc = OffsetDateTime::from_unix_timestamp(i64::from(self.timestamp))
            .unwrap_or(OffsetDateTime::UNIX_EPOCH);
        match self.utc_offset {
            Some(hours) => {
                let offset = UtcOffset::from_hms(hours, 0, 0).unwrap_or(UtcOffset::UTC);
                utc.to_offset(offset)
            }
            None => utc,
        }
    }
}

/// Renders the time-of-day in the device's reported offset (UTC when the
/// offset is unknown).
impl fmt::Display for TimeReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dt = self.datetime();
        write!(f, "{:02}:{:02}:{:02}", dt.hour(), dt.minute(), dt.second())
    }
}

/// Decoded one-shot temperature/humidity sample.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SensorSample {
    /// Temperature in degrees, in the unit configured on the device.
    pub temperature: f32,
    /// Relative humidity percentage (0-100).
    pub humidity: u8,
}

impl SensorSample {
    /// Decode a sensor-sample notification payload.
    ///
    /// The byte format is:
    /// - bytes 0-1: temperature (i16 LE, hundredths of a degree)
    /// - byte 2: humidity (u8, percent)
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::InvalidLength`] if `data` contains fewer than
    /// [`SENSOR_PAYLOAD_LEN`] (3) bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self, ParseError> {
        if data.len() < SENSOR_PAYLOAD_LEN {
            return Err(ParseError::InvalidLength {
                payload: "sensor sample",
                actual: data.len(),
            });
        }

        let mut buf = data;
        let temp_raw = buf.get_i16_le();
        let humidity = buf.get_u8();

        Ok(SensorSample {
            temperature: f32::from(temp_raw) / 100.0,
            humidity,
        })
    }
}

impl fmt::Display for SensorSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}° {}%", self.temperature, self.humidity)
    }
}

/// Decoded historical min/max record.
///
/// The device stores one record per hour with the extremes observed in that
/// hour. Records arrive via notification, newest-known index first.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HistoryRecord {
    /// Record index in device memory.
    pub index: u32,
    /// Unix timestamp of the record in seconds.
    pub timestamp: u32,
    /// Maximum temperature observed, in degrees.
    pub max_temperature: f32,
    /// Maximum humidity observed, percent.
    pub max_humidity: u8,
    /// Minimum temperature observed, in degrees.
    pub min_temperature: f32,
    /// Minimum humidity observed, percent.
    pub min_humidity: u8,
}

impl HistoryRecord {
    /// Decode a history notification payload.
    ///
    /// The byte format (all little-endian) is:
    /// - bytes 0-3: index (u32)
    /// - bytes 4-7: unix timestamp (u32)
    /// - bytes 8-9: max temperature (i16, hundredths)
    /// - byte 10: max humidity (u8)
    /// - bytes 11-12: min temperature (i16, hundredths)
    /// - byte 13: min humidity (u8)
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::InvalidLength`] if `data` contains fewer than
    /// [`HISTORY_PAYLOAD_LEN`] (14) bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self, ParseError> {
        if data.len() < HISTORY_PAYLOAD_LEN {
            return Err(ParseError::InvalidLength {
                payload: "history record",
                actual: data.len(),
            });
        }

        let mut buf = data;
        let index = buf.get_u32_le();
        let timestamp = buf.get_u32_le();
        let max_temp_raw = buf.get_i16_le();
        let max_humidity = buf.get_u8();
        let min_temp_raw = buf.get_i16_le();
        let min_humidity = buf.get_u8();

        Ok(HistoryRecord {
            index,
            timestamp,
            max_temperature: f32::from(max_temp_raw) / 100.0,
            max_humidity,
            min_temperature: f32::from(min_temp_raw) / 100.0,
            min_humidity,
        })
    }

    /// The record timestamp as a UTC [`OffsetDateTime`].
    #[must_use]
    pub fn datetime(&self) -> OffsetDateTime {
        OffsetDateTime::from_unix_timestamp(i64::from(self.timestamp))
            .unwrap_or(OffsetDateTime::UNIX_EPOCH)
    }
}
