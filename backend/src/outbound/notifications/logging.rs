//! Handler that writes each notification to the tracing log instead of
//! sending it.
//!
//! A payload that cannot be decoded is logged at `error` and acknowledged,
//! since redelivering the same bytes cannot succeed.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tracing::{error, info};

use crate::domain::NotificationBatch;
use crate::domain::ports::{NotificationHandler, NotificationHandlerError};

/// Decodes a batch and logs one line per recipient.
#[derive(Debug, Default)]
pub struct LoggingNotificationHandler {
    logged: AtomicU64,
}

impl LoggingNotificationHandler {
    /// Create a handler with a zeroed message counter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages logged since construction.
    pub fn logged(&self) -> u64 {
        self.logged.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl NotificationHandler for LoggingNotificationHandler {
    async fn handle(&self, payload: &[u8]) -> Result<(), NotificationHandlerError> {
        let batch = match NotificationBatch::from_bytes(payload) {
            Ok(batch) => batch,
            Err(error) => {
                error!(
                    %error,
                    payload = %String::from_utf8_lossy(payload),
                    "discarding undecodable notification batch"
                );
                return Ok(());
            }
        };

        for message in batch.messages() {
            info!(
                recipient = %message.recipient,
                subject = %message.subject,
                body = %message.body,
                "notification dispatched"
            );
        }
        self.logged
            .fetch_add(batch.messages().len() as u64, Ordering::Relaxed);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[tokio::test]
    async fn logs_every_message_in_batch() {
        let handler = LoggingNotificationHandler::new();
        let payload = br#"[
            {"subject": "Animal Sighting", "body": "Animal 1 was sighted", "recipient": "a@example.org"},
            {"subject": "Animal Sighting", "body": "Animal 1 was sighted", "recipient": "b@example.org"}
        ]"#;

        handler.handle(payload).await.expect("batch handled");

        assert_eq!(handler.logged(), 2);
    }

    #[rstest]
    #[case::not_json(b"not json".as_slice())]
    #[case::wrong_shape(br#"{"subject": "x"}"#.as_slice())]
    #[case::null(b"null".as_slice())]
    #[tokio::test]
    async fn accepts_batches_it_cannot_send(#[case] payload: &[u8]) {
        let handler = LoggingNotificationHandler::new();

        handler.handle(payload).await.expect("payload settled");

        assert_eq!(handler.logged(), 0);
    }
}
