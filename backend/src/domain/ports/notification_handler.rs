//! Port invoked by the queue consumer for every delivered message.

use async_trait::async_trait;

use super::define_port_error;

define_port_error! {
    /// Errors raised while handling a delivered notification batch.
    ///
    /// Any error makes the consumer nack the delivery; none reach a caller.
    /// Report only failures a later attempt could fix.
    pub enum NotificationHandlerError {
        /// Downstream delivery failed.
        Delivery { message: String } =>
            "notification delivery failed: {message}",
    }
}

/// Handles one queue message body.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationHandler: Send + Sync {
    /// Process `payload`; returning `Ok` acknowledges the delivery.
    async fn handle(&self, payload: &[u8]) -> Result<(), NotificationHandlerError>;
}
