//! Notification batches sent to everyone who reported an animal.
//!
//! A batch holds one message per sighting in the animal's history and travels
//! as a single JSON array: `[{"subject", "body", "recipient"}, ...]`. There is
//! no envelope or version field, so producers and consumers must agree on this
//! shape out of band. A JSON `null` body decodes as an empty batch.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::Sighting;

/// Subject line shared by every notification.
pub const NOTIFICATION_SUBJECT: &str = "Animal Sighting";

/// A single notification addressed to one reporter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationMessage {
    /// Fixed subject line.
    pub subject: String,
    /// Rendered body naming the animal and the sighting position.
    pub body: String,
    /// Reporter identity the message is addressed to.
    pub recipient: String,
}

/// Failure to encode or decode a batch.
#[derive(Debug, Error)]
#[error("notification batch codec failed: {0}")]
pub struct NotificationCodecError(#[from] serde_json::Error);

/// Ordered notifications composed from a sighting history.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationBatch(Vec<NotificationMessage>);

impl NotificationBatch {
    /// Build one message per sighting, preserving input order.
    ///
    /// # Examples
    /// ```
    /// use backend::domain::NotificationBatch;
    ///
    /// let batch = NotificationBatch::compose(&[]);
    /// assert!(batch.messages().is_empty());
    /// ```
    pub fn compose(sightings: &[Sighting]) -> Self {
        Self(sightings.iter().map(render).collect())
    }

    /// Messages in the batch.
    pub fn messages(&self) -> &[NotificationMessage] {
        &self.0
    }

    /// Serialise the batch as the queue message body.
    pub fn to_bytes(&self) -> Result<Vec<u8>, NotificationCodecError> {
        Ok(serde_json::to_vec(&self.0)?)
    }

    /// Parse a queue message body.
    pub fn from_bytes(payload: &[u8]) -> Result<Self, NotificationCodecError> {
        let messages: Option<Vec<NotificationMessage>> = serde_json::from_slice(payload)?;
        Ok(Self(messages.unwrap_or_default()))
    }
}

fn render(sighting: &Sighting) -> NotificationMessage {
    let position = sighting.coordinates();
    NotificationMessage {
        subject: NOTIFICATION_SUBJECT.to_owned(),
        body: format!(
            "Animal {} was sighted at {{Lat: {}, Long: {}}}",
            sighting.animal_id(),
            position.latitude,
            position.longitude
        ),
        recipient: sighting.reporter().as_str().to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use rstest::{fixture, rstest};

    use super::*;
    use crate::domain::{AnimalId, SightingId, SightingSubmission};

    fn sighting(id: i64, lat: f64, long: f64, reporter: &str) -> Sighting {
        SightingSubmission {
            animal_id: AnimalId::new(9),
            timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).single(),
            latitude: Some(lat),
            longitude: Some(long),
            reporter: reporter.to_owned(),
            image: None,
        }
        .validate()
        .expect("valid sighting")
        .into_persisted(SightingId::new(id))
    }

    #[fixture]
    fn history() -> Vec<Sighting> {
        vec![
            sighting(2, 13.35, 56.79, "second@example.org"),
            sighting(1, 12.34, 56.78, "first@example.org"),
        ]
    }

    #[rstest]
    fn composes_one_message_per_sighting(history: Vec<Sighting>) {
        let batch = NotificationBatch::compose(&history);
        let recipients: Vec<&str> = batch
            .messages()
            .iter()
            .map(|message| message.recipient.as_str())
            .collect();
        assert_eq!(recipients, ["second@example.org", "first@example.org"]);
        assert!(
            batch
                .messages()
                .iter()
                .all(|message| message.subject == NOTIFICATION_SUBJECT)
        );
    }

    #[rstest]
    fn body_embeds_animal_and_position(history: Vec<Sighting>) {
        let batch = NotificationBatch::compose(&history);
        let first = batch.messages().first().expect("one message");
        assert_eq!(first.body, "Animal 9 was sighted at {Lat: 13.35, Long: 56.79}");
    }

    #[rstest]
    fn wire_format_is_a_bare_array(history: Vec<Sighting>) {
        let bytes = NotificationBatch::compose(&history)
            .to_bytes()
            .expect("encode batch");
        let value: serde_json::Value = serde_json::from_slice(&bytes).expect("valid json");
        let entries = value.as_array().expect("top-level array");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1]["recipient"], "first@example.org");
        assert_eq!(entries[1]["subject"], NOTIFICATION_SUBJECT);
    }

    #[rstest]
    fn rejects_non_array_payloads() {
        assert!(NotificationBatch::from_bytes(br#"{"subject":"x"}"#).is_err());
    }

    #[rstest]
    #[case::null(b"null".as_slice())]
    #[case::empty_array(b"[]".as_slice())]
    fn empty_history_decodes_as_empty_batch(#[case] payload: &[u8]) {
        let batch = NotificationBatch::from_bytes(payload).expect("decode batch");
        assert!(batch.messages().is_empty());
    }
}
