//! Tracked animal data model.
//!
//! Animals are created through an administrative operation and never updated
//! afterwards; their last-seen fields describe the state at registration.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use super::{AnimalId, Coordinates};

/// Validation errors returned by [`NewTrackedAnimal::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnimalValidationError {
    /// The name is empty once trimmed of whitespace.
    EmptyName,
    /// A last-seen latitude or longitude is NaN or infinite.
    NonFiniteCoordinate,
}

impl fmt::Display for AnimalValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "animal name must not be empty"),
            Self::NonFiniteCoordinate => write!(f, "last seen coordinates must be finite"),
        }
    }
}

impl std::error::Error for AnimalValidationError {}

/// Animal registration awaiting persistence.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTrackedAnimal {
    name: String,
    date_of_birth: NaiveDate,
    last_seen: DateTime<Utc>,
    last_seen_at: Coordinates,
}

impl NewTrackedAnimal {
    /// Validate and construct a registration.
    ///
    /// # Examples
    /// ```
    /// use backend::domain::{Coordinates, NewTrackedAnimal};
    /// use chrono::{NaiveDate, Utc};
    ///
    /// let born = NaiveDate::from_ymd_opt(2019, 5, 4).expect("valid date");
    /// let animal = NewTrackedAnimal::new("Shere Khan", born, Utc::now(), Coordinates::new(21.1, 79.0));
    /// assert!(animal.is_ok());
    /// ```
    pub fn new(
        name: impl Into<String>,
        date_of_birth: NaiveDate,
        last_seen: DateTime<Utc>,
        last_seen_at: Coordinates,
    ) -> Result<Self, AnimalValidationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(AnimalValidationError::EmptyName);
        }
        if !last_seen_at.latitude.is_finite() || !last_seen_at.longitude.is_finite() {
            return Err(AnimalValidationError::NonFiniteCoordinate);
        }
        Ok(Self {
            name,
            date_of_birth,
            last_seen,
            last_seen_at,
        })
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Date of birth.
    pub fn date_of_birth(&self) -> NaiveDate {
        self.date_of_birth
    }

    /// When the animal was last seen.
    pub fn last_seen(&self) -> DateTime<Utc> {
        self.last_seen
    }

    /// Where the animal was last seen.
    pub fn last_seen_at(&self) -> Coordinates {
        self.last_seen_at
    }

    /// Attach the repository-assigned identifier.
    pub fn into_persisted(self, id: AnimalId) -> TrackedAnimal {
        TrackedAnimal {
            id,
            name: self.name,
            date_of_birth: self.date_of_birth,
            last_seen: self.last_seen,
            last_seen_at: self.last_seen_at,
        }
    }
}

/// Persisted tracked animal.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedAnimal {
    id: AnimalId,
    name: String,
    date_of_birth: NaiveDate,
    last_seen: DateTime<Utc>,
    #[serde(flatten)]
    last_seen_at: Coordinates,
}

impl TrackedAnimal {
    /// Repository-assigned identifier.
    pub fn id(&self) -> AnimalId {
        self.id
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Date of birth.
    pub fn date_of_birth(&self) -> NaiveDate {
        self.date_of_birth
    }

    /// When the animal was last seen.
    pub fn last_seen(&self) -> DateTime<Utc> {
        self.last_seen
    }

    /// Where the animal was last seen.
    pub fn last_seen_at(&self) -> Coordinates {
        self.last_seen_at
    }
}
