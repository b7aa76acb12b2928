//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod animal_repository;
mod message_queue;
mod notification_handler;
mod sighting_repository;

#[cfg(test)]
pub use animal_repository::MockAnimalRepository;
pub use animal_repository::{AnimalRepository, AnimalRepositoryError};
#[cfg(test)]
pub use message_queue::{MockMessagePublisher, MockMessageSubscriber};
pub use message_queue::{
    Delivery, DeliveryTag, MessagePublisher, MessageQueueError, MessageSubscriber,
};
#[cfg(test)]
pub use notification_handler::MockNotificationHandler;
pub use notification_handler::{NotificationHandler, NotificationHandlerError};
#[cfg(test)]
pub use sighting_repository::MockSightingRepository;
pub use sighting_repository::{SightingRepository, SightingRepositoryError};
