//! Port for sighting persistence and history reads.

use async_trait::async_trait;

use crate::domain::{AnimalId, NewSighting, Sighting};

use super::define_port_error;

define_port_error! {
    /// Errors raised by sighting repository adapters.
    pub enum SightingRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "sighting repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "sighting repository query failed: {message}",
    }
}

/// Port for storing sightings and reading an animal's sighting history.
///
/// Adapters define "most recent" as the sighting with the greatest
/// timestamp. Nothing here serialises concurrent writers, so two submissions
/// racing for the same animal may both observe the same most recent sighting.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SightingRepository: Send + Sync {
    /// Persist a sighting and return it with its assigned identifier.
    async fn create(&self, sighting: &NewSighting) -> Result<Sighting, SightingRepositoryError>;

    /// Latest sighting by timestamp for `animal_id`, if any.
    async fn most_recent(
        &self,
        animal_id: AnimalId,
    ) -> Result<Option<Sighting>, SightingRepositoryError>;

    /// Full history for `animal_id`, newest first.
    async fn list_for_animal(
        &self,
        animal_id: AnimalId,
    ) -> Result<Vec<Sighting>, SightingRepositoryError>;

    /// One slice of the history for `animal_id` plus the unpaginated total.
    async fn page_for_animal(
        &self,
        animal_id: AnimalId,
        offset: u64,
        limit: u32,
    ) -> Result<(Vec<Sighting>, u64), SightingRepositoryError>;
}
