//! Administrative operations on tracked animals.

use std::sync::Arc;

use pagination::{Page, PageRequest};
use tracing::info;

use crate::domain::ports::{AnimalRepository, AnimalRepositoryError};
use crate::domain::{Error, NewTrackedAnimal, TrackedAnimal};

fn map_repository_error(error: AnimalRepositoryError) -> Error {
    match error {
        AnimalRepositoryError::Connection { message } => {
            Error::persistence(format!("animal repository unavailable: {message}"))
        }
        AnimalRepositoryError::Query { message } => {
            Error::persistence(format!("animal repository error: {message}"))
        }
    }
}

/// Registers animals and lists them by recency.
#[derive(Clone)]
pub struct TrackedAnimalService {
    repository: Arc<dyn AnimalRepository>,
}

impl TrackedAnimalService {
    /// Create a service over the animal repository.
    pub fn new(repository: Arc<dyn AnimalRepository>) -> Self {
        Self { repository }
    }

    /// Register a new animal.
    pub async fn create_animal(&self, animal: NewTrackedAnimal) -> Result<TrackedAnimal, Error> {
        let stored = self
            .repository
            .create(&animal)
            .await
            .map_err(map_repository_error)?;
        info!(animal_id = stored.id().get(), name = stored.name(), "animal registered");
        Ok(stored)
    }

    /// Page through animals, most recently seen first.
    pub async fn list_animals(&self, request: PageRequest) -> Result<Page<TrackedAnimal>, Error> {
        let (mut items, total_count) = self
            .repository
            .page(request.offset(), request.limit())
            .await
            .map_err(map_repository_error)?;
        items.sort_by_key(|animal| std::cmp::Reverse(animal.last_seen()));
        Ok(Page::new(items, total_count, request))
    }
}
