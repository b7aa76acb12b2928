//! Process wiring shared by the binaries.
//!
//! [`connect_queue`] picks the queue adapter from [`WorkerSettings`] and
//! hands back one instance behind both port halves. [`ConsumerRuntime`] runs
//! a [`QueueConsumer`] in the background and owns shutdown ordering: signal
//! the consumer, wait for it to settle its current message, then close the
//! queue.

mod config;

pub use config::{DEFAULT_QUEUE_NAME, WorkerSettings};

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::domain::ports::{
    MessagePublisher, MessageQueueError, MessageSubscriber, NotificationHandler,
};
use crate::domain::{ConsumerSummary, QueueConsumer, RedeliveryPolicy};
use crate::outbound::queue::{InMemoryMessageQueue, PostgresMessageQueue, PostgresQueueConfig};

/// The two halves of one queue connection.
#[derive(Clone)]
pub struct QueueHandles {
    /// Used by the ingestion service.
    pub publisher: Arc<dyn MessagePublisher>,
    /// Drained by the consumer loop.
    pub subscriber: Arc<dyn MessageSubscriber>,
}

impl QueueHandles {
    /// Share one adapter between both halves.
    pub fn shared<Q>(queue: Arc<Q>) -> Self
    where
        Q: MessagePublisher + MessageSubscriber + 'static,
    {
        Self {
            publisher: queue.clone(),
            subscriber: queue,
        }
    }
}

/// Connect the queue described by `settings`.
///
/// # Errors
///
/// Returns [`MessageQueueError::Unavailable`] when the durable queue cannot
/// be reached or prepared.
pub async fn connect_queue(settings: &WorkerSettings) -> Result<QueueHandles, MessageQueueError> {
    let Some(database_url) = settings.database_url() else {
        info!(queue = settings.queue_name(), "no database configured; using in-memory queue");
        return Ok(QueueHandles::shared(Arc::new(InMemoryMessageQueue::new())));
    };

    let config = PostgresQueueConfig::new(database_url, settings.queue_name())
        .with_poll_interval(settings.poll_interval());
    let queue = PostgresMessageQueue::connect(config).await?;
    Ok(QueueHandles::shared(Arc::new(queue)))
}

/// Failures raised while stopping a [`ConsumerRuntime`].
#[derive(Debug, Error)]
pub enum ShutdownError {
    /// The consumer did not stop in time and was aborted.
    #[error("queue consumer did not stop within {timeout:?}")]
    TimedOut { timeout: Duration },
    /// The consumer task panicked or was cancelled.
    #[error("queue consumer task failed: {message}")]
    Join { message: String },
    /// Closing the queue failed.
    #[error(transparent)]
    Queue(#[from] MessageQueueError),
}

/// A [`QueueConsumer`] running on its own task.
pub struct ConsumerRuntime {
    subscriber: Arc<dyn MessageSubscriber>,
    shutdown: watch::Sender<bool>,
    finished: watch::Receiver<()>,
    task: JoinHandle<ConsumerSummary>,
}

impl ConsumerRuntime {
    /// Spawn a consumer draining `subscriber` on the current runtime.
    pub fn spawn(
        subscriber: Arc<dyn MessageSubscriber>,
        handler: Arc<dyn NotificationHandler>,
        policy: RedeliveryPolicy,
    ) -> Self {
        let consumer = QueueConsumer::new(subscriber.clone(), handler, policy);
        let (shutdown, shutdown_rx) = watch::channel(false);
        // Dropped with the task, whichever way it ends.
        let (finished_tx, finished) = watch::channel(());
        let task = tokio::spawn(async move {
            let _finished = finished_tx;
            consumer.run(shutdown_rx).await
        });

        Self {
            subscriber,
            shutdown,
            finished,
            task,
        }
    }

    /// Resolve once the consumer task has ended without being asked to.
    ///
    /// The loop only ends on its own when the queue closes or the task
    /// panics, so a long-lived process treats this as fatal.
    pub async fn stopped(&self) {
        let mut finished = self.finished.clone();
        while finished.changed().await.is_ok() {}
    }

    /// Stop consuming, then close the queue.
    ///
    /// The queue is closed even when the consumer has to be aborted.
    ///
    /// # Errors
    ///
    /// See [`ShutdownError`].
    pub async fn shutdown(self, timeout: Duration) -> Result<ConsumerSummary, ShutdownError> {
        let Self {
            subscriber,
            shutdown,
            mut task,
            ..
        } = self;

        shutdown.send_replace(true);
        let stopped = match tokio::time::timeout(timeout, &mut task).await {
            Ok(Ok(summary)) => Ok(summary),
            Ok(Err(join_error)) => Err(ShutdownError::Join {
                message: join_error.to_string(),
            }),
            Err(_) => {
                warn!(?timeout, "queue consumer did not stop in time; aborting");
                task.abort();
                Err(ShutdownError::TimedOut { timeout })
            }
        };

        subscriber.close().await?;
        info!("notification queue closed");
        stopped
    }
}
