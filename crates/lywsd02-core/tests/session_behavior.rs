//! Behavioral tests for the session that need no BLE hardware: state-machine
//! preconditions, idempotent teardown, and the notification handshake over
//! synthetic event streams.

use std::time::Duration;

use btleplug::api::ValueNotification;
use futures::{StreamExt, stream};
use time::OffsetDateTime;

use lywsd02_core::notify::first_notification;
use lywsd02_core::uuid::{HISTORY, SENSOR_DATA};
use lywsd02_core::{
    DeviceSession, Error, HistoryRecord, SensorSample, SessionConfig, TemperatureUnit,
};

// --- Preconditions: every operation requires a connected session ---

#[tokio::test]
async fn read_time_before_connect_fails() {
    let mut session = DeviceSession::new();
    assert!(matches!(
        session.read_time().await,
        Err(Error::NotConnected)
    ));
}

#[tokio::test]
async fn utc_offset_before_connect_fails() {
    let mut session = DeviceSession::new();
    assert!(matches!(
        session.utc_offset().await,
        Err(Error::NotConnected)
    ));
}

#[tokio::test]
async fn read_units_before_connect_fails() {
    let mut session = DeviceSession::new();
    assert!(matches!(
        session.read_units().await,
        Err(Error::NotConnected)
    ));
}

#[tokio::test]
async fn set_units_before_connect_fails() {
    let mut session = DeviceSession::new();
    assert!(matches!(
        session.set_units(TemperatureUnit::Celsius).await,
        Err(Error::NotConnected)
    ));
}

#[tokio::test]
async fn read_sensor_before_connect_fails() {
    let mut session = DeviceSession::new();
    assert!(matches!(
        session.read_sensor().await,
        Err(Error::NotConnected)
    ));
}

#[tokio::test]
async fn read_history_before_connect_fails() {
    let mut session = DeviceSession::new();
    assert!(matches!(
        session.read_history_record().await,
        Err(Error::NotConnected)
    ));
}

#[tokio::test]
async fn set_time_before_connect_fails() {
    let mut session = DeviceSession::new();
    let now = OffsetDateTime::now_utc();
    assert!(matches!(
        session.set_time(now).await,
        Err(Error::NotConnected)
    ));
}

// --- Teardown ---

#[tokio::test]
async fn disconnect_without_connecting_is_ok() {
    let mut session = DeviceSession::new();
    assert!(session.disconnect().await.is_ok());
}

#[tokio::test]
async fn disconnect_twice_is_ok() {
    let mut session = DeviceSession::new();
    assert!(session.disconnect().await.is_ok());
    assert!(session.disconnect().await.is_ok());
    assert!(!session.is_connected());
}

#[tokio::test]
async fn custom_config_is_retained() {
    let session =
        DeviceSession::with_config(SessionConfig::new().notify_timeout(Duration::from_secs(3)));
    assert_eq!(session.config().notify_timeout, Duration::from_secs(3));
}

// --- Notification handshake over synthetic streams ---

fn sensor_event(value: Vec<u8>) -> ValueNotification {
    ValueNotification {
        uuid: SENSOR_DATA,
        value,
    }
}

#[tokio::test]
async fn handshake_resolves_once_and_leaves_second_event() {
    let mut events = stream::iter(vec![
        sensor_event(vec![0xE8, 0x03, 0x2C]),
        sensor_event(vec![0x10, 0x27, 0x63]),
    ]);

    let payload = first_notification(&mut events, SENSOR_DATA, Duration::from_secs(1))
        .await
        .unwrap();
    let sample = SensorSample::from_bytes(&payload).unwrap();
    assert!((sample.temperature - 10.00).abs() < f32::EPSILON);
    assert_eq!(sample.humidity, 44);

    // The handshake is not re-armed: the second event is still pending.
    let leftover: Vec<_> = events.collect().await;
    assert_eq!(leftover.len(), 1);
}

#[tokio::test]
async fn handshake_routes_by_characteristic_uuid() {
    let history_payload = {
        let mut data = [0u8; 14];
        data[0..4].copy_from_slice(&1u32.to_le_bytes());
        data[4..8].copy_from_slice(&1_700_000_000u32.to_le_bytes());
        data[8..10].copy_from_slice(&2500i16.to_le_bytes());
        data[10] = 60;
        data[11..13].copy_from_slice(&1800i16.to_le_bytes());
        data[13] = 30;
        data.to_vec()
    };

    let mut events = stream::iter(vec![
        sensor_event(vec![0xE8, 0x03, 0x2C]),
        ValueNotification {
            uuid: HISTORY,
            value: history_payload,
        },
    ]);

    let payload = first_notification(&mut events, HISTORY, Duration::from_secs(1))
        .await
        .unwrap();
    let record = HistoryRecord::from_bytes(&payload).unwrap();
    assert_eq!(record.index, 1);
    assert_eq!(record.timestamp, 1_700_000_000);
    assert!((record.max_temperature - 25.00).abs() < f32::EPSILON);
    assert_eq!(record.max_humidity, 60);
    assert!((record.min_temperature - 18.00).abs() < f32::EPSILON);
    assert_eq!(record.min_humidity, 30);
}

#[tokio::test]
async fn handshake_that_never_fires_times_out() {
    let mut events = stream::pending::<ValueNotification>();
    let err = first_notification(&mut events, SENSOR_DATA, Duration::from_millis(20))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Timeout { .. }));
}

#[tokio::test]
async fn malformed_notification_payload_is_rejected() {
    let mut events = stream::iter(vec![sensor_event(vec![0xE8])]);
    let payload = first_notification(&mut events, SENSOR_DATA, Duration::from_secs(1))
        .await
        .unwrap();

    // Decode-on-receipt validation: a truncated payload must reject instead
    // of resolving with garbage.
    let err: Error = SensorSample::from_bytes(&payload).unwrap_err().into();
    assert!(matches!(err, Error::Decode(_)));
}
