//! Repository adapters.
//!
//! Both repositories keep rows in process memory behind a mutex. They apply
//! the ordering the domain expects of any backing store: sightings and
//! animals newest first, with "most recent" decided by timestamp rather than
//! insertion order.

mod in_memory_animal_repository;
mod in_memory_sighting_repository;

pub use in_memory_animal_repository::InMemoryAnimalRepository;
pub use in_memory_sighting_repository::InMemorySightingRepository;
