//! Bluetooth UUIDs for the LYWSD02 sensor.
//!
//! All characteristics live under a single primary service. The sensor-data
//! and history characteristics are notify-only; the device does not answer
//! synchronous reads on them.

use uuid::{Uuid, uuid};

/// Primary service exposing every LYWSD02 characteristic.
pub const PRIMARY_SERVICE: Uuid = uuid!("ebe0ccb0-7a0a-4b0c-8a1a-6ff2997da3a6");

/// Device clock characteristic (read/write, 4 or 5 bytes).
pub const TIME: Uuid = uuid!("ebe0ccb7-7a0a-4b0c-8a1a-6ff2997da3a6");

/// Temperature-unit characteristic (read/write, 1 byte).
pub const UNITS: Uuid = uuid!("ebe0ccbe-7a0a-4b0c-8a1a-6ff2997da3a6");

/// One-shot sensor sample characteristic (notify, 3 bytes).
pub const SENSOR_DATA: Uuid = uuid!("ebe0ccc1-7a0a-4b0c-8a1a-6ff2997da3a6");

/// History record characteristic (notify, 14 bytes per record).
pub const HISTORY: Uuid = uuid!("ebe0ccbc-7a0a-4b0c-8a1a-6ff2997da3a6");

/// Client characteristic configuration descriptor (standard 0x2902).
///
/// Enabling notifications writes this descriptor; btleplug's `subscribe`
/// does it on our behalf.
pub const CLIENT_CHARACTERISTIC_CONFIG: Uuid = uuid!("00002902-0000-1000-8000-00805f9b34fb");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_service_uuid() {
        let expected = "ebe0ccb0-7a0a-4b0c-8a1a-6ff2997da3a6";
        assert_eq!(PRIMARY_SERVICE.to_string(), expected);
    }

    #[test]
    fn test_time_uuid() {
        let expected = "ebe0ccb7-7a0a-4b0c-8a1a-6ff2997da3a6";
        assert_eq!(TIME.to_string(), expected);
    }

    #[test]
    fn test_units_uuid() {
        let expected = "ebe0ccbe-7a0a-4b0c-8a1a-6ff2997da3a6";
        assert_eq!(UNITS.to_string(), expected);
    }

    #[test]
    fn test_sensor_data_uuid() {
        let expected = "ebe0ccc1-7a0a-4b0c-8a1a-6ff2997da3a6";
        assert_eq!(SENSOR_DATA.to_string(), expected);
    }

    #[test]
    fn test_history_uuid() {
        let expected = "ebe0ccbc-7a0a-4b0c-8a1a-6ff2997da3a6";
        assert_eq!(HISTORY.to_string(), expected);
    }

    #[test]
    fn test_ccc_descriptor_uuid() {
        let expected = "00002902-0000-1000-8000-00805f9b34fb";
        assert_eq!(CLIENT_CHARACTERISTIC_CONFIG.to_string(), expected);
    }

    #[test]
    fn test_characteristic_uuids_share_service_prefix() {
        // All LYWSD02 characteristics start with ebe0cc
        for uuid in [PRIMARY_SERVICE, TIME, UNITS, SENSOR_DATA, HISTORY] {
            assert!(
                uuid.to_string().starts_with("ebe0cc"),
                "UUID {} should start with ebe0cc",
                uuid
            );
        }
    }

    #[test]
    fn test_characteristic_uuids_are_distinct() {
        let uuids = [PRIMARY_SERVICE, TIME, UNITS, SENSOR_DATA, HISTORY];
        for (i, a) in uuids.iter().enumerate() {
            for b in &uuids[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
