//! Durable queue stored in a PostgreSQL table.
//!
//! Every queue shares the `queue_messages` table and is selected by its
//! `queue_name` column. Rows are ordered by `position`, drawn from a
//! dedicated sequence, so a requeued row takes a fresh position behind every
//! message already waiting.
//!
//! A delivery is a row with `claimed_at` set. `receive` claims the oldest
//! unclaimed row with `FOR UPDATE SKIP LOCKED`, polling at a fixed interval
//! while the queue is empty. Ack and discarding nacks delete the row; a
//! requeueing nack clears the claim and moves the row to the tail.
//!
//! [`PostgresMessageQueue::connect`] releases rows left claimed by a consumer
//! that died mid-delivery. This assumes one consumer per queue name.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tokio::sync::watch;
use tracing::{debug, info};

use crate::domain::ports::{
    Delivery, DeliveryTag, MessagePublisher, MessageQueueError, MessageSubscriber,
};

const SCHEMA_STATEMENTS: [&str; 3] = [
    "CREATE SEQUENCE IF NOT EXISTS queue_messages_position_seq",
    "CREATE TABLE IF NOT EXISTS queue_messages (
        id BIGSERIAL PRIMARY KEY,
        queue_name TEXT NOT NULL,
        position BIGINT NOT NULL DEFAULT nextval('queue_messages_position_seq'),
        payload BYTEA NOT NULL,
        delivery_count INTEGER NOT NULL DEFAULT 0,
        enqueued_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        claimed_at TIMESTAMPTZ
    )",
    "CREATE INDEX IF NOT EXISTS queue_messages_ready_idx
        ON queue_messages (queue_name, position)
        WHERE claimed_at IS NULL",
];

const PUBLISH_SQL: &str = "INSERT INTO queue_messages (queue_name, payload) VALUES ($1, $2)";

const CLAIM_SQL: &str = "UPDATE queue_messages
    SET claimed_at = NOW(), delivery_count = delivery_count + 1
    WHERE id = (
        SELECT id FROM queue_messages
        WHERE queue_name = $1 AND claimed_at IS NULL
        ORDER BY position
        LIMIT 1
        FOR UPDATE SKIP LOCKED
    )
    RETURNING id, payload, delivery_count";

const DELETE_CLAIMED_SQL: &str =
    "DELETE FROM queue_messages WHERE id = $1 AND queue_name = $2 AND claimed_at IS NOT NULL";

const REQUEUE_SQL: &str = "UPDATE queue_messages
    SET claimed_at = NULL, position = nextval('queue_messages_position_seq')
    WHERE id = $1 AND queue_name = $2 AND claimed_at IS NOT NULL";

const RELEASE_STALE_SQL: &str = "UPDATE queue_messages
    SET claimed_at = NULL
    WHERE queue_name = $1 AND claimed_at IS NOT NULL";

/// Connection settings for [`PostgresMessageQueue`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostgresQueueConfig {
    database_url: String,
    queue_name: String,
    poll_interval: Duration,
    max_connections: u32,
}

impl PostgresQueueConfig {
    /// Settings for `queue_name` on `database_url`, polling every 500 ms
    /// over at most 5 connections.
    pub fn new(database_url: impl Into<String>, queue_name: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            queue_name: queue_name.into(),
            poll_interval: Duration::from_millis(500),
            max_connections: 5,
        }
    }

    /// Override how long `receive` waits between polls of an empty queue.
    #[must_use]
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Override the pool size.
    #[must_use]
    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections.max(1);
        self
    }

    /// Queue selected by this configuration.
    pub fn queue_name(&self) -> &str {
        &self.queue_name
    }

    /// Interval between polls of an empty queue.
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }
}

fn map_sqlx_error(error: sqlx::Error) -> MessageQueueError {
    match error {
        sqlx::Error::PoolClosed => MessageQueueError::closed(),
        other => MessageQueueError::unavailable(other.to_string()),
    }
}

fn delivery_from_row((id, payload, delivery_count): (i64, Vec<u8>, i32)) -> Delivery {
    Delivery {
        tag: DeliveryTag::new(id),
        payload,
        delivery_count: u32::try_from(delivery_count).unwrap_or(0),
    }
}

/// Table-backed [`MessagePublisher`] and [`MessageSubscriber`].
///
/// The pool is shared by both halves, so one instance can serve the
/// publishing path and the consumer loop concurrently.
pub struct PostgresMessageQueue {
    pool: PgPool,
    queue_name: String,
    poll_interval: Duration,
    closed: watch::Sender<bool>,
}

impl PostgresMessageQueue {
    /// Connect, create the schema if needed and release stale claims.
    ///
    /// # Errors
    ///
    /// Returns [`MessageQueueError::Unavailable`] when the database cannot be
    /// reached or a schema statement fails.
    pub async fn connect(config: PostgresQueueConfig) -> Result<Self, MessageQueueError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.database_url)
            .await
            .map_err(map_sqlx_error)?;
        let queue = Self::with_pool(pool, config.queue_name, config.poll_interval);
        queue.prepare().await?;
        Ok(queue)
    }

    /// Wrap an existing pool without touching the schema.
    pub fn with_pool(pool: PgPool, queue_name: impl Into<String>, poll_interval: Duration) -> Self {
        let (closed, _) = watch::channel(false);
        Self {
            pool,
            queue_name: queue_name.into(),
            poll_interval,
            closed,
        }
    }

    /// Create the queue table and release rows claimed by a previous run.
    ///
    /// # Errors
    ///
    /// Returns [`MessageQueueError::Unavailable`] when a statement fails.
    pub async fn prepare(&self) -> Result<u64, MessageQueueError> {
        for statement in SCHEMA_STATEMENTS {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(map_sqlx_error)?;
        }

        let released = sqlx::query(RELEASE_STALE_SQL)
            .bind(&self.queue_name)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?
            .rows_affected();
        info!(
            queue = %self.queue_name,
            released,
            "postgres message queue ready"
        );
        Ok(released)
    }

    fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }

    async fn try_claim(&self) -> Result<Option<Delivery>, MessageQueueError> {
        let row: Option<(i64, Vec<u8>, i32)> = sqlx::query_as(CLAIM_SQL)
            .bind(&self.queue_name)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.map(delivery_from_row))
    }

    async fn settle(&self, sql: &str, tag: DeliveryTag) -> Result<(), MessageQueueError> {
        let affected = sqlx::query(sql)
            .bind(tag.get())
            .bind(&self.queue_name)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?
            .rows_affected();
        if affected == 0 {
            return Err(MessageQueueError::unknown_delivery(tag.get()));
        }
        Ok(())
    }
}

#[async_trait]
impl MessagePublisher for PostgresMessageQueue {
    async fn publish(&self, payload: &[u8]) -> Result<(), MessageQueueError> {
        if self.is_closed() {
            return Err(MessageQueueError::closed());
        }
        sqlx::query(PUBLISH_SQL)
            .bind(&self.queue_name)
            .bind(payload)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        debug!(queue = %self.queue_name, bytes = payload.len(), "message published");
        Ok(())
    }
}

#[async_trait]
impl MessageSubscriber for PostgresMessageQueue {
    async fn receive(&self) -> Result<Delivery, MessageQueueError> {
        let mut closed = self.closed.subscribe();
        loop {
            if *closed.borrow_and_update() {
                return Err(MessageQueueError::closed());
            }
            if let Some(delivery) = self.try_claim().await? {
                return Ok(delivery);
            }
            tokio::select! {
                _ = closed.changed() => {}
                () = tokio::time::sleep(self.poll_interval) => {}
            }
        }
    }

    async fn ack(&self, tag: DeliveryTag) -> Result<(), MessageQueueError> {
        self.settle(DELETE_CLAIMED_SQL, tag).await
    }

    async fn nack(&self, tag: DeliveryTag, requeue: bool) -> Result<(), MessageQueueError> {
        let sql = if requeue {
            REQUEUE_SQL
        } else {
            DELETE_CLAIMED_SQL
        };
        self.settle(sql, tag).await
    }

    async fn close(&self) -> Result<(), MessageQueueError> {
        self.closed.send_replace(true);
        self.pool.close().await;
        info!(queue = %self.queue_name, "postgres message queue closed");
        Ok(())
    }
}
