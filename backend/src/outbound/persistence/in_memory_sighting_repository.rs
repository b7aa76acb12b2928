//! In-memory sighting repository.

use std::cmp::Reverse;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::domain::ports::{SightingRepository, SightingRepositoryError};
use crate::domain::{AnimalId, NewSighting, Sighting, SightingId};

#[derive(Debug, Default)]
struct SightingStore {
    last_id: i64,
    rows: Vec<Sighting>,
}

impl SightingStore {
    /// Sightings for `animal_id`, newest first; ties go to the later insert.
    fn newest_first(&self, animal_id: AnimalId) -> Vec<Sighting> {
        let mut rows: Vec<Sighting> = self
            .rows
            .iter()
            .filter(|sighting| sighting.animal_id() == animal_id)
            .cloned()
            .collect();
        rows.sort_by_key(|sighting| Reverse((sighting.timestamp(), sighting.id().get())));
        rows
    }
}

/// [`SightingRepository`] holding rows in process memory.
///
/// Identifiers are assigned sequentially from 1.
#[derive(Debug, Default)]
pub struct InMemorySightingRepository {
    store: Mutex<SightingStore>,
}

impl InMemorySightingRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, SightingStore>, SightingRepositoryError> {
        self.store
            .lock()
            .map_err(|_| SightingRepositoryError::connection("sighting store lock poisoned"))
    }
}

#[async_trait]
impl SightingRepository for InMemorySightingRepository {
    async fn create(&self, sighting: &NewSighting) -> Result<Sighting, SightingRepositoryError> {
        let mut store = self.lock()?;
        store.last_id += 1;
        let stored = sighting
            .clone()
            .into_persisted(SightingId::new(store.last_id));
        store.rows.push(stored.clone());
        Ok(stored)
    }

    async fn most_recent(
        &self,
        animal_id: AnimalId,
    ) -> Result<Option<Sighting>, SightingRepositoryError> {
        Ok(self.lock()?.newest_first(animal_id).into_iter().next())
    }

    async fn list_for_animal(
        &self,
        animal_id: AnimalId,
    ) -> Result<Vec<Sighting>, SightingRepositoryError> {
        Ok(self.lock()?.newest_first(animal_id))
    }

    async fn page_for_animal(
        &self,
        animal_id: AnimalId,
        offset: u64,
        limit: u32,
    ) -> Result<(Vec<Sighting>, u64), SightingRepositoryError> {
        let rows = self.lock()?.newest_first(animal_id);
        let total = rows.len() as u64;
        let skip = usize::try_from(offset).unwrap_or(usize::MAX);
        let take = usize::try_from(limit).unwrap_or(usize::MAX);
        Ok((rows.into_iter().skip(skip).take(take).collect(), total))
    }
}
