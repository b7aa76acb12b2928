//! Sighting data model.
//!
//! A sighting moves through three shapes:
//! - [`SightingSubmission`]: raw inbound data with every required field
//!   optional;
//! - [`NewSighting`]: validated but not yet persisted;
//! - [`Sighting`]: persisted, carrying its repository-assigned identifier.
//!
//! Sightings are never mutated after creation.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Coordinates;

/// Sightings closer than or equal to this distance from the animal's most
/// recent prior sighting are rejected as duplicates.
pub const DEDUP_THRESHOLD_KM: f64 = 5.0;

/// Identifier of a tracked animal, assigned by persistence.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct AnimalId(i64);

impl AnimalId {
    /// Wrap a raw identifier.
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Access the raw identifier.
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for AnimalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a persisted sighting, assigned by persistence.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SightingId(i64);

impl SightingId {
    /// Wrap a raw identifier.
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Access the raw identifier.
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for SightingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validation errors raised while turning a submission into a [`NewSighting`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SightingValidationError {
    /// One or more required fields were absent or held their zero value.
    MissingFields(Vec<&'static str>),
    /// A coordinate was NaN or infinite.
    NonFiniteCoordinate(&'static str),
}

impl fmt::Display for SightingValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingFields(fields) => {
                write!(f, "missing required fields: {}", fields.join(", "))
            }
            Self::NonFiniteCoordinate(field) => write!(f, "{field} must be a finite number"),
        }
    }
}

impl std::error::Error for SightingValidationError {}

/// Identity of the person reporting a sighting.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ReporterEmail(String);

impl ReporterEmail {
    /// Validate and construct a reporter identity.
    pub fn new(raw: impl Into<String>) -> Result<Self, SightingValidationError> {
        let value = raw.into();
        if value.trim().is_empty() {
            return Err(SightingValidationError::MissingFields(vec!["reporterEmail"]));
        }
        Ok(Self(value))
    }

    /// Borrow the identity as a string slice.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for ReporterEmail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<ReporterEmail> for String {
    fn from(value: ReporterEmail) -> Self {
        value.0
    }
}

impl TryFrom<String> for ReporterEmail {
    type Error = SightingValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Raw sighting report as handed over by an inbound adapter.
///
/// Presence is explicit, but a coordinate equal to `0.0` is still treated as
/// missing. Sightings exactly on the equator or prime meridian are therefore
/// rejected; this matches the behaviour reporters already rely on.
#[derive(Debug, Clone, PartialEq)]
pub struct SightingSubmission {
    /// Animal the sighting refers to. Not checked for existence.
    pub animal_id: AnimalId,
    /// When the animal was seen.
    pub timestamp: Option<DateTime<Utc>>,
    /// Latitude in signed decimal degrees.
    pub latitude: Option<f64>,
    /// Longitude in signed decimal degrees.
    pub longitude: Option<f64>,
    /// Identity taken from the authenticated caller.
    pub reporter: String,
    /// Optional photograph, already processed by the inbound adapter.
    pub image: Option<Vec<u8>>,
}

fn required_coordinate(value: Option<f64>) -> Option<f64> {
    value.filter(|degrees| *degrees != 0.0)
}

impl SightingSubmission {
    /// Check required fields and produce a [`NewSighting`].
    ///
    /// # Examples
    /// ```
    /// use backend::domain::{AnimalId, SightingSubmission, SightingValidationError};
    /// use chrono::Utc;
    ///
    /// let submission = SightingSubmission {
    ///     animal_id: AnimalId::new(1),
    ///     timestamp: Some(Utc::now()),
    ///     latitude: Some(0.0),
    ///     longitude: Some(12.0),
    ///     reporter: "ranger@example.org".to_owned(),
    ///     image: None,
    /// };
    /// let err = submission.validate().expect_err("zero latitude counts as missing");
    /// assert_eq!(err, SightingValidationError::MissingFields(vec!["lat"]));
    /// ```
    pub fn validate(self) -> Result<NewSighting, SightingValidationError> {
        let latitude = required_coordinate(self.latitude);
        let longitude = required_coordinate(self.longitude);
        let reporter_present = !self.reporter.trim().is_empty();

        let mut missing = Vec::new();
        if latitude.is_none() {
            missing.push("lat");
        }
        if longitude.is_none() {
            missing.push("long");
        }
        if self.timestamp.is_none() {
            missing.push("timestamp");
        }
        if !reporter_present {
            missing.push("reporterEmail");
        }

        let (Some(lat), Some(long), Some(timestamp), true) =
            (latitude, longitude, self.timestamp, reporter_present)
        else {
            return Err(SightingValidationError::MissingFields(missing));
        };

        if !lat.is_finite() {
            return Err(SightingValidationError::NonFiniteCoordinate("lat"));
        }
        if !long.is_finite() {
            return Err(SightingValidationError::NonFiniteCoordinate("long"));
        }

        Ok(NewSighting {
            animal_id: self.animal_id,
            timestamp,
            coordinates: Coordinates::new(lat, long),
            reporter: ReporterEmail::new(self.reporter)?,
            image: self.image,
        })
    }
}

/// Validated sighting awaiting persistence.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSighting {
    animal_id: AnimalId,
    timestamp: DateTime<Utc>,
    coordinates: Coordinates,
    reporter: ReporterEmail,
    image: Option<Vec<u8>>,
}

impl NewSighting {
    /// Animal the sighting refers to.
    pub fn animal_id(&self) -> AnimalId {
        self.animal_id
    }

    /// When the animal was seen.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Where the animal was seen.
    pub fn coordinates(&self) -> Coordinates {
        self.coordinates
    }

    /// Who reported the sighting.
    pub fn reporter(&self) -> &ReporterEmail {
        &self.reporter
    }

    /// Optional photograph bytes.
    pub fn image(&self) -> Option<&[u8]> {
        self.image.as_deref()
    }

    /// Attach the repository-assigned identifier.
    pub fn into_persisted(self, id: SightingId) -> Sighting {
        Sighting { id, inner: self }
    }
}

/// Persisted sighting.
#[derive(Debug, Clone, PartialEq)]
pub struct Sighting {
    id: SightingId,
    inner: NewSighting,
}

impl Sighting {
    /// Repository-assigned identifier.
    pub fn id(&self) -> SightingId {
        self.id
    }

    /// Animal the sighting refers to.
    pub fn animal_id(&self) -> AnimalId {
        self.inner.animal_id
    }

    /// When the animal was seen.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.inner.timestamp
    }

    /// Where the animal was seen.
    pub fn coordinates(&self) -> Coordinates {
        self.inner.coordinates
    }

    /// Who reported the sighting.
    pub fn reporter(&self) -> &ReporterEmail {
        &self.inner.reporter
    }

    /// Optional photograph bytes.
    pub fn image(&self) -> Option<&[u8]> {
        self.inner.image.as_deref()
    }
}
