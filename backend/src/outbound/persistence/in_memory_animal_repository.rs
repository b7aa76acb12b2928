//! In-memory tracked animal repository.

use std::cmp::Reverse;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::domain::ports::{AnimalRepository, AnimalRepositoryError};
use crate::domain::{AnimalId, NewTrackedAnimal, TrackedAnimal};

#[derive(Debug, Default)]
struct AnimalStore {
    last_id: i64,
    rows: Vec<TrackedAnimal>,
}

/// [`AnimalRepository`] holding rows in process memory, paged by last-seen
/// time descending.
#[derive(Debug, Default)]
pub struct InMemoryAnimalRepository {
    store: Mutex<AnimalStore>,
}

impl InMemoryAnimalRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, AnimalStore>, AnimalRepositoryError> {
        self.store
            .lock()
            .map_err(|_| AnimalRepositoryError::connection("animal store lock poisoned"))
    }
}

#[async_trait]
impl AnimalRepository for InMemoryAnimalRepository {
    async fn create(&self, animal: &NewTrackedAnimal) -> Result<TrackedAnimal, AnimalRepositoryError> {
        let mut store = self.lock()?;
        store.last_id += 1;
        let stored = animal.clone().into_persisted(AnimalId::new(store.last_id));
        store.rows.push(stored.clone());
        Ok(stored)
    }

    async fn page(
        &self,
        offset: u64,
        limit: u32,
    ) -> Result<(Vec<TrackedAnimal>, u64), AnimalRepositoryError> {
        let mut rows = self.lock()?.rows.clone();
        rows.sort_by_key(|animal| Reverse((animal.last_seen(), animal.id().get())));
        let total = rows.len() as u64;
        let skip = usize::try_from(offset).unwrap_or(usize::MAX);
        let take = usize::try_from(limit).unwrap_or(usize::MAX);
        Ok((rows.into_iter().skip(skip).take(take).collect(), total))
    }
}
