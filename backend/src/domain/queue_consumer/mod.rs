//! Single-threaded consumer loop draining the notification queue.
//!
//! Each delivery moves through `received -> handling -> acked | requeued |
//! dropped`. Only one message is in flight at a time. The loop runs until the
//! shutdown signal flips, the signal's sender is dropped, or the queue
//! reports [`MessageQueueError::Closed`]. Any other transport error is logged
//! and retried after [`QueueConsumer::with_retry_delay`]. Shutdown is only
//! observed between messages, so a delivery being handled is always settled
//! first.

use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::domain::ports::{
    Delivery, MessageQueueError, MessageSubscriber, NotificationHandler,
};

mod policy;

pub use policy::{RedeliveryBackoff, RedeliveryPolicy};

/// Pause before receiving again after a transient queue failure.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Async sleeping abstraction used for redelivery backoff.
#[async_trait]
pub trait RedeliverySleeper: Send + Sync {
    /// Suspend execution for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// Tokio-based sleeper implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl RedeliverySleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// How a single delivery was settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The handler succeeded and the message was removed.
    Acked,
    /// The handler failed and the message went back to the tail.
    Requeued,
    /// The handler failed on the last permitted attempt and the message was
    /// discarded.
    Dropped,
}

/// Counters reported when the consumer loop exits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConsumerSummary {
    /// Deliveries acknowledged.
    pub acked: u64,
    /// Deliveries returned to the queue.
    pub requeued: u64,
    /// Deliveries discarded after exhausting the redelivery policy.
    pub dropped: u64,
}

impl ConsumerSummary {
    fn record(&mut self, outcome: DeliveryOutcome) {
        let counter = match outcome {
            DeliveryOutcome::Acked => &mut self.acked,
            DeliveryOutcome::Requeued => &mut self.requeued,
            DeliveryOutcome::Dropped => &mut self.dropped,
        };
        *counter = counter.saturating_add(1);
    }
}

/// Drains a [`MessageSubscriber`] into a [`NotificationHandler`].
pub struct QueueConsumer {
    subscriber: Arc<dyn MessageSubscriber>,
    handler: Arc<dyn NotificationHandler>,
    policy: RedeliveryPolicy,
    sleeper: Arc<dyn RedeliverySleeper>,
    retry_delay: Duration,
}

impl QueueConsumer {
    /// Build a consumer that sleeps on the Tokio timer between redeliveries.
    pub fn new(
        subscriber: Arc<dyn MessageSubscriber>,
        handler: Arc<dyn NotificationHandler>,
        policy: RedeliveryPolicy,
    ) -> Self {
        Self {
            subscriber,
            handler,
            policy,
            sleeper: Arc::new(TokioSleeper),
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }

    /// Replace the sleeper used for redelivery backoff.
    #[must_use]
    pub fn with_sleeper(mut self, sleeper: Arc<dyn RedeliverySleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Replace the pause applied after a transient receive failure.
    #[must_use]
    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    /// Consume until shutdown is signalled or the queue closes.
    ///
    /// Transport failures other than [`MessageQueueError::Closed`] never end
    /// the loop. A failed receive is retried after the retry delay; a failed
    /// ack or nack leaves the message to the queue's own recovery.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> ConsumerSummary {
        let mut summary = ConsumerSummary::default();
        info!(
            max_attempts = self.policy.max_attempts.map(|max| max.get()),
            "queue consumer started"
        );

        loop {
            if *shutdown.borrow_and_update() {
                info!("queue consumer stopping on shutdown signal");
                break;
            }

            let received = tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        info!("shutdown sender dropped; queue consumer stopping");
                        break;
                    }
                    continue;
                }
                received = self.subscriber.receive() => received,
            };

            let settled = match received {
                Ok(delivery) => self.process(delivery).await,
                Err(error) => Err(error),
            };

            match settled {
                Ok(outcome) => summary.record(outcome),
                Err(MessageQueueError::Closed) => {
                    info!("queue closed; queue consumer stopping");
                    break;
                }
                Err(error @ MessageQueueError::UnknownDelivery { .. }) => {
                    error!(error.kind = error.kind(), %error, "failed to settle delivery");
                }
                Err(error) => {
                    warn!(
                        error.kind = error.kind(),
                        %error,
                        retry_delay = ?self.retry_delay,
                        "queue unavailable; retrying"
                    );
                    if self.pause(&mut shutdown).await.is_break() {
                        info!("queue consumer stopping on shutdown signal");
                        break;
                    }
                }
            }
        }

        info!(
            acked = summary.acked,
            requeued = summary.requeued,
            dropped = summary.dropped,
            "queue consumer stopped"
        );
        summary
    }

    /// Sleep for the retry delay unless shutdown arrives first.
    async fn pause(&self, shutdown: &mut watch::Receiver<bool>) -> ControlFlow<()> {
        tokio::select! {
            biased;
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow_and_update() {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            }
            () = self.sleeper.sleep(self.retry_delay) => ControlFlow::Continue(()),
        }
    }

    /// Hand one delivery to the handler and settle it.
    ///
    /// # Errors
    ///
    /// Returns the queue error raised while acking or nacking.
    pub async fn process(&self, delivery: Delivery) -> Result<DeliveryOutcome, MessageQueueError> {
        let Delivery {
            tag,
            payload,
            delivery_count,
        } = delivery;

        let failure = match self.handler.handle(&payload).await {
            Ok(()) => {
                self.subscriber.ack(tag).await?;
                debug!(tag = tag.get(), delivery_count, "delivery acknowledged");
                return Ok(DeliveryOutcome::Acked);
            }
            Err(failure) => failure,
        };

        if self.policy.is_exhausted(delivery_count) {
            error!(
                tag = tag.get(),
                delivery_count,
                error.kind = failure.kind(),
                error = %failure,
                "dropping message after final delivery attempt"
            );
            self.subscriber.nack(tag, false).await?;
            return Ok(DeliveryOutcome::Dropped);
        }

        warn!(
            tag = tag.get(),
            delivery_count,
            error.kind = failure.kind(),
            error = %failure,
            "notification handler failed; requeueing message"
        );
        if let Some(delay) = self.policy.delay_for(delivery_count) {
            self.sleeper.sleep(delay).await;
        }
        self.subscriber.nack(tag, true).await?;
        Ok(DeliveryOutcome::Requeued)
    }
}
