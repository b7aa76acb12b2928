//! Domain ports describing the durable notification queue.
//!
//! The queue is split into a publishing half used by request handling and a
//! subscribing half drained by the consumer loop. Adapters usually implement
//! both on one type so the two paths share a single connection.
//!
//! Acknowledgement is always manual: a received [`Delivery`] stays in flight
//! until it is acked (removed for good) or nacked (requeued at the tail, or
//! dropped when `requeue` is false).

use std::fmt;

use async_trait::async_trait;

use super::define_port_error;

define_port_error! {
    /// Errors surfaced by queue adapters.
    pub enum MessageQueueError {
        /// The queue was closed; no further deliveries will arrive.
        Closed => "message queue is closed",
        /// Transport-level failure (connection, channel, or statement).
        Unavailable { message: String } => "message queue is unavailable: {message}",
        /// Ack or nack referenced a delivery that is not in flight.
        UnknownDelivery { tag: i64 } => "delivery {tag} is not in flight",
    }
}

/// Adapter-assigned handle identifying one in-flight delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeliveryTag(i64);

impl DeliveryTag {
    /// Wrap a raw adapter tag.
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Access the raw adapter tag.
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for DeliveryTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One message handed to the consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// Handle for ack/nack.
    pub tag: DeliveryTag,
    /// Opaque message body.
    pub payload: Vec<u8>,
    /// How many times this message has been delivered, including this one.
    pub delivery_count: u32,
}

/// Publishing half of the queue.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessagePublisher: Send + Sync {
    /// Append one message to the queue.
    async fn publish(&self, payload: &[u8]) -> Result<(), MessageQueueError>;
}

/// Consuming half of the queue.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageSubscriber: Send + Sync {
    /// Wait for the next message in delivery order.
    ///
    /// Returns [`MessageQueueError::Closed`] once the queue has been closed.
    async fn receive(&self) -> Result<Delivery, MessageQueueError>;

    /// Remove an in-flight message permanently.
    async fn ack(&self, tag: DeliveryTag) -> Result<(), MessageQueueError>;

    /// Release an in-flight message, returning it to the tail of the queue
    /// when `requeue` is true and discarding it otherwise.
    async fn nack(&self, tag: DeliveryTag, requeue: bool) -> Result<(), MessageQueueError>;

    /// Close the underlying connection and wake any pending receivers.
    async fn close(&self) -> Result<(), MessageQueueError>;
}
