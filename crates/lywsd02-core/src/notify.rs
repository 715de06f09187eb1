//! One-shot notification handshake.
//!
//! The LYWSD02 does not answer synchronous reads on its sensor-data and
//! history characteristics; values arrive as notifications. The handshake
//! is: subscribe, await exactly one notification for the target
//! characteristic, unsubscribe, decode. It never consumes a second event
//! and is bounded by a timeout so a silent device fails the call instead of
//! hanging it forever.

use std::time::Duration;

use btleplug::api::ValueNotification;
use futures::{Stream, StreamExt};
use tokio::time::timeout;
use uuid::Uuid;

use crate::error::{Error, Result};

/// Await the first notification for `uuid` on `stream`, bounded by `wait`.
///
/// Events for other characteristics are skipped; the first matching event's
/// payload is returned and nothing further is read from the stream, so a
/// second notification stays unconsumed. The stream ending before a matching
/// event fails with [`Error::NotConnected`] (the transport closes the
/// notification stream when the peripheral drops).
///
/// # Errors
///
/// Returns [`Error::Timeout`] when no matching notification arrives within
/// `wait`.
pub async fn first_notification<S>(stream: &mut S, uuid: Uuid, wait: Duration) -> Result<Vec<u8>>
where
    S: Stream<Item = ValueNotification> + Unpin,
{
    let recv = async {
        while let Some(event) = stream.next().await {
            if event.uuid == uuid {
                return Ok(event.value);
            }
            tracing::debug!("Skipping notification for {}", event.uuid);
        }
        Err(Error::NotConnected)
    };

    match timeout(wait, recv).await {
        Ok(result) => result,
        Err(_) => Err(Error::timeout(format!("notification on {uuid}"), wait)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;
    use lywsd02_types::uuid::{HISTORY, SENSOR_DATA};

    fn event(uuid: Uuid, value: Vec<u8>) -> ValueNotification {
        ValueNotification { uuid, value }
    }

    #[tokio::test]
    async fn test_resolves_with_first_matching_event() {
        let mut events = stream::iter(vec![
            event(SENSOR_DATA, vec![0xE8, 0x03, 0x2C]),
            event(SENSOR_DATA, vec![0x00, 0x00, 0x00]),
        ]);

        let value = first_notification(&mut events, SENSOR_DATA, Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(value, vec![0xE8, 0x03, 0x2C]);

        // The second event must not have been consumed by the handshake.
        let rest: Vec<_> = events.collect().await;
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].value, vec![0x00, 0x00, 0x00]);
    }

    #[tokio::test]
    async fn test_skips_events_for_other_characteristics() {
        let mut events = stream::iter(vec![
            event(HISTORY, vec![0xAA; 14]),
            event(SENSOR_DATA, vec![0xE8, 0x03, 0x2C]),
        ]);

        let value = first_notification(&mut events, SENSOR_DATA, Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(value, vec![0xE8, 0x03, 0x2C]);
    }

    #[tokio::test]
    async fn test_times_out_when_nothing_fires() {
        let mut events = stream::pending::<ValueNotification>();

        let err = first_notification(&mut events, SENSOR_DATA, Duration::from_millis(10))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Timeout { .. }));
    }

    #[tokio::test]
    async fn test_closed_stream_reports_disconnect() {
        let mut events = stream::iter(Vec::<ValueNotification>::new());

        let err = first_notification(&mut events, SENSOR_DATA, Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotConnected));
    }
}
