//! Sighting ingestion service.
//!
//! Accepting a sighting runs these steps in order:
//! 1. validate the submission;
//! 2. fetch the animal's most recent prior sighting;
//! 3. reject the submission when it lies within [`DEDUP_THRESHOLD_KM`] of
//!    that prior sighting;
//! 4. persist it;
//! 5. read back the animal's full history;
//! 6. publish one notification batch built from it.
//!
//! A repository failure in any step is returned to the caller, including the
//! history read after the write. Publishing is best-effort: once the history
//! is in hand the caller gets success, whatever happens to the notification.
//! Only the single most recent
//! prior sighting is consulted, and nothing locks the animal between the
//! check and the write, so two concurrent submissions that are each far from
//! the previous sighting but close to one another can both be accepted.

use std::sync::Arc;

use pagination::{Page, PageRequest};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::domain::ports::{MessagePublisher, SightingRepository, SightingRepositoryError};
use crate::domain::{
    AnimalId, DEDUP_THRESHOLD_KM, Error, NotificationBatch, Sighting, SightingId,
    SightingSubmission, SightingValidationError,
};

fn map_repository_error(error: SightingRepositoryError) -> Error {
    match error {
        SightingRepositoryError::Connection { message } => {
            Error::persistence(format!("sighting repository unavailable: {message}"))
        }
        SightingRepositoryError::Query { message } => {
            Error::persistence(format!("sighting repository error: {message}"))
        }
    }
}

fn map_validation_error(error: SightingValidationError) -> Error {
    let details = match &error {
        SightingValidationError::MissingFields(fields) => json!({ "missing": fields }),
        SightingValidationError::NonFiniteCoordinate(field) => json!({ "field": field }),
    };
    Error::invalid_request(error.to_string()).with_details(details)
}

/// Orchestrates validation, dedup, persistence and notification dispatch.
#[derive(Clone)]
pub struct SightingIngestionService {
    repository: Arc<dyn SightingRepository>,
    publisher: Arc<dyn MessagePublisher>,
}

impl SightingIngestionService {
    /// Create a service over a repository and the queue's publishing half.
    pub fn new(
        repository: Arc<dyn SightingRepository>,
        publisher: Arc<dyn MessagePublisher>,
    ) -> Self {
        Self {
            repository,
            publisher,
        }
    }

    /// Validate, dedup and store a sighting, then notify prior reporters.
    ///
    /// # Errors
    ///
    /// - [`ErrorCode::InvalidRequest`](crate::domain::ErrorCode::InvalidRequest)
    ///   when a required field is absent or zero;
    /// - [`ErrorCode::DuplicateSighting`](crate::domain::ErrorCode::DuplicateSighting)
    ///   when the most recent prior sighting is within the dedup radius;
    /// - [`ErrorCode::PersistenceFailure`](crate::domain::ErrorCode::PersistenceFailure)
    ///   when the prior-sighting lookup, the write or the history read fails.
    ///   The sighting stays stored if only the history read fails.
    ///
    /// Notification encode and publish failures are logged and never
    /// returned.
    pub async fn submit_sighting(
        &self,
        submission: SightingSubmission,
    ) -> Result<SightingId, Error> {
        let draft = submission.validate().map_err(map_validation_error)?;
        let animal_id = draft.animal_id();

        let prior = self
            .repository
            .most_recent(animal_id)
            .await
            .map_err(map_repository_error)?;

        if let Some(prior) = prior {
            let distance_km = prior.coordinates().distance_km(&draft.coordinates());
            if distance_km <= DEDUP_THRESHOLD_KM {
                info!(
                    animal_id = animal_id.get(),
                    prior_sighting_id = prior.id().get(),
                    distance_km,
                    "rejecting duplicate sighting"
                );
                return Err(Error::duplicate_sighting(format!(
                    "a sighting within {DEDUP_THRESHOLD_KM} km of the latest report already exists"
                ))
                .with_details(json!({
                    "priorSightingId": prior.id(),
                    "distanceKm": distance_km,
                    "thresholdKm": DEDUP_THRESHOLD_KM,
                })));
            }
        }

        let stored = self
            .repository
            .create(&draft)
            .await
            .map_err(map_repository_error)?;
        info!(
            animal_id = animal_id.get(),
            sighting_id = stored.id().get(),
            "sighting recorded"
        );

        let history = self
            .repository
            .list_for_animal(animal_id)
            .await
            .map_err(map_repository_error)?;
        self.notify_reporters(animal_id, &history).await;
        Ok(stored.id())
    }

    /// Page through an animal's sightings, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorCode::PersistenceFailure`](crate::domain::ErrorCode::PersistenceFailure)
    /// when the repository read fails.
    pub async fn list_sightings(
        &self,
        animal_id: AnimalId,
        request: PageRequest,
    ) -> Result<Page<Sighting>, Error> {
        let (mut items, total_count) = self
            .repository
            .page_for_animal(animal_id, request.offset(), request.limit())
            .await
            .map_err(map_repository_error)?;
        items.sort_by_key(|sighting| std::cmp::Reverse(sighting.timestamp()));
        Ok(Page::new(items, total_count, request))
    }

    async fn notify_reporters(&self, animal_id: AnimalId, history: &[Sighting]) {
        let payload = match NotificationBatch::compose(history).to_bytes() {
            Ok(payload) => payload,
            Err(error) => {
                warn!(animal_id = animal_id.get(), %error, "skipping notification: encode failed");
                return;
            }
        };

        match self.publisher.publish(&payload).await {
            Ok(()) => debug!(
                animal_id = animal_id.get(),
                recipients = history.len(),
                "notification batch published"
            ),
            Err(error) => warn!(
                animal_id = animal_id.get(),
                error.kind = error.kind(),
                %error,
                "failed to publish notification batch"
            ),
        }
    }
}

#[cfg(test)]
#[path = "sighting_ingestion_tests.rs"]
mod tests;
