//! Error types for lywsd02-core.
//!
//! All failures surface to the caller; the session performs no silent
//! recovery or retry. The only operation intended for unconditional use on
//! failure paths is [`DeviceSession::disconnect`](crate::DeviceSession::disconnect),
//! which is idempotent.

use std::time::Duration;

use thiserror::Error;

use lywsd02_types::ParseError;

/// Errors that can occur when communicating with a LYWSD02 device.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Bluetooth Low Energy error, surfaced unchanged from the transport.
    #[error("Bluetooth error: {0}")]
    Bluetooth(#[from] btleplug::Error),

    /// Device not found during scan.
    #[error("device not found: {0}")]
    DeviceNotFound(DeviceNotFoundReason),

    /// The connected device does not expose the LYWSD02 primary service.
    #[error("device does not expose the LYWSD02 primary service")]
    GattUnavailable,

    /// Operation attempted while not connected to a device.
    #[error("not connected to device")]
    NotConnected,

    /// Required characteristic not found under the primary service.
    #[error("characteristic not found: {uuid}")]
    CharacteristicNotFound {
        /// The UUID that was not found.
        uuid: String,
    },

    /// The unit byte did not match either known encoding.
    #[error("unknown temperature unit byte: 0x{0:02X}")]
    UnknownUnit(u8),

    /// Payload length or structure did not match the expected shape.
    #[error("invalid payload: {0}")]
    Decode(#[source] ParseError),

    /// Operation timed out.
    #[error("operation '{operation}' timed out after {duration:?}")]
    Timeout {
        /// The operation that timed out.
        operation: String,
        /// The timeout duration.
        duration: Duration,
    },
}

/// Reason why a device was not found.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new reasons
/// in future versions without breaking downstream code.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum DeviceNotFoundReason {
    /// No Bluetooth adapter available.
    NoAdapter,
    /// Device with the given name/address was not seen during the scan.
    NotFound {
        /// The identifier that was searched for.
        identifier: String,
    },
}

impl std::fmt::Display for DeviceNotFoundReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoAdapter => write!(f, "no Bluetooth adapter available"),
            Self::NotFound { identifier } => write!(f, "device '{}' not found", identifier),
        }
    }
}

impl Error {
    /// Create a device not found error for a specific identifier.
    pub fn device_not_found(identifier: impl Into<String>) -> Self {
        Self::DeviceNotFound(DeviceNotFoundReason::NotFound {
            identifier: identifier.into(),
        })
    }

    /// Create a timeout error with operation context.
    pub fn timeout(operation: impl Into<String>, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Create a characteristic not found error.
    pub fn characteristic_not_found(uuid: impl ToString) -> Self {
        Self::CharacteristicNotFound {
            uuid: uuid.to_string(),
        }
    }
}

impl From<ParseError> for Error {
    fn from(err: ParseError) -> Self {
        match err {
            ParseError::UnknownUnit(byte) => Error::UnknownUnit(byte),
            other => Error::Decode(other),
        }
    }
}

/// Result type alias using lywsd02-core's Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::device_not_found("LYWSD02");
        assert!(err.to_string().contains("LYWSD02"));

        let err = Error::NotConnected;
        assert_eq!(err.to_string(), "not connected to device");

        let err = Error::characteristic_not_found(lywsd02_types::uuid::TIME);
        assert!(err.to_string().contains("ebe0ccb7"));

        let err = Error::timeout("read time", Duration::from_secs(10));
        assert!(err.to_string().contains("read time"));
        assert!(err.to_string().contains("10s"));
    }

    #[test]
    fn test_parse_error_mapping() {
        let err: Error = ParseError::UnknownUnit(0x42).into();
        assert!(matches!(err, Error::UnknownUnit(0x42)));

        let err: Error = ParseError::InvalidLength {
            payload: "time",
            actual: 3,
        }
        .into();
        assert!(matches!(err, Error::Decode(_)));
    }

    #[test]
    fn test_no_adapter_display() {
        let err = Error::DeviceNotFound(DeviceNotFoundReason::NoAdapter);
        assert!(err.to_string().contains("no Bluetooth adapter"));
    }
}
