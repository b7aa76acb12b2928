//! Port for tracked animal registration and listing.

use async_trait::async_trait;

use crate::domain::{NewTrackedAnimal, TrackedAnimal};

use super::define_port_error;

define_port_error! {
    /// Errors raised by animal repository adapters.
    pub enum AnimalRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "animal repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "animal repository query failed: {message}",
    }
}

/// Port for writing and paging tracked animals.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AnimalRepository: Send + Sync {
    /// Persist a new animal and return it with its assigned identifier.
    async fn create(
        &self,
        animal: &NewTrackedAnimal,
    ) -> Result<TrackedAnimal, AnimalRepositoryError>;

    /// One slice of all animals, most recently seen first, plus the total.
    async fn page(
        &self,
        offset: u64,
        limit: u32,
    ) -> Result<(Vec<TrackedAnimal>, u64), AnimalRepositoryError>;
}
