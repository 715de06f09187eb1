//! Error types for payload parsing in lywsd02-types.

use thiserror::Error;

/// Errors that can occur when decoding LYWSD02 payloads.
///
/// This error type is platform-agnostic and does not include BLE-specific
/// errors (those belong in `lywsd02-core`).
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ParseError {
    /// The payload length did not match the expected shape for its
    /// characteristic.
    #[error("invalid {payload} payload length: {actual} bytes")]
    InvalidLength {
        /// Which payload shape was being decoded.
        payload: &'static str,
        /// Actual number of bytes received.
        actual: usize,
    },

    /// The unit byte did not match either known encoding (0xFF / 0x01).
    #[error("unknown temperature unit byte: 0x{0:02X}")]
    UnknownUnit(u8),
}

/// Result type alias using lywsd02-types' ParseError type.
pub type ParseResult<T> = std::result::Result<T, ParseError>;
