//! Domain primitives, services and ports.
//!
//! Purpose: hold the sighting rules independent of any transport. Types are
//! immutable once validated; services depend only on the traits in
//! [`ports`].
//!
//! Public surface:
//! - [`SightingIngestionService`]: validate, dedup, persist and notify.
//! - [`TrackedAnimalService`]: register and list tracked animals.
//! - [`QueueConsumer`]: drain the notification queue with a
//!   [`RedeliveryPolicy`].
//! - [`Error`] and [`ErrorCode`]: caller-facing failures.

pub mod animal;
pub mod coordinates;
pub mod error;
pub mod notification;
pub mod ports;
pub mod queue_consumer;
pub mod sighting;
pub mod sighting_ingestion;
pub mod tracked_animal_service;

pub use self::animal::{AnimalValidationError, NewTrackedAnimal, TrackedAnimal};
pub use self::coordinates::{Coordinates, EARTH_RADIUS_KM, haversine_km};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::notification::{
    NOTIFICATION_SUBJECT, NotificationBatch, NotificationCodecError, NotificationMessage,
};
pub use self::queue_consumer::{
    ConsumerSummary, DeliveryOutcome, QueueConsumer, RedeliveryBackoff, RedeliveryPolicy,
    RedeliverySleeper, TokioSleeper,
};
pub use self::sighting::{
    AnimalId, DEDUP_THRESHOLD_KM, NewSighting, ReporterEmail, Sighting, SightingId,
    SightingSubmission, SightingValidationError,
};
pub use self::sighting_ingestion::SightingIngestionService;
pub use self::tracked_animal_service::TrackedAnimalService;
