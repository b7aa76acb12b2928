//! Worker configuration loaded via OrthoConfig.
//!
//! Values come from `SIGHTINGS_*` environment variables, CLI flags or a
//! configuration file. Every field is optional; the accessors supply the
//! defaults.

use std::num::NonZeroU32;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::domain::{RedeliveryBackoff, RedeliveryPolicy};

/// Queue name used when none is configured.
pub const DEFAULT_QUEUE_NAME: &str = "sighting_notifications";

const DEFAULT_POLL_INTERVAL_MS: u64 = 500;
const DEFAULT_BACKOFF_MAX_MS: u64 = 30_000;
const DEFAULT_SHUTDOWN_TIMEOUT_MS: u64 = 5_000;

/// Settings for the notification worker.
#[derive(Debug, Clone, Default, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "SIGHTINGS")]
pub struct WorkerSettings {
    /// PostgreSQL URL for the durable queue. The in-memory queue is used
    /// when absent.
    pub database_url: Option<String>,
    /// Queue to publish to and consume from.
    pub queue_name: Option<String>,
    /// Milliseconds between polls of an empty durable queue.
    pub poll_interval_ms: Option<u64>,
    /// Deliveries allowed before a failing message is dropped. Zero or
    /// absent means unbounded.
    pub max_delivery_attempts: Option<u32>,
    /// Initial redelivery delay in milliseconds. Zero or absent disables
    /// backoff.
    pub redelivery_backoff_ms: Option<u64>,
    /// Cap on the redelivery delay in milliseconds.
    pub redelivery_backoff_max_ms: Option<u64>,
    /// Milliseconds to wait for the consumer to stop before abandoning it.
    pub shutdown_timeout_ms: Option<u64>,
}

impl WorkerSettings {
    /// Configured database URL, ignoring blank values.
    pub fn database_url(&self) -> Option<&str> {
        self.database_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    /// Configured queue name, falling back to [`DEFAULT_QUEUE_NAME`].
    pub fn queue_name(&self) -> &str {
        self.queue_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(DEFAULT_QUEUE_NAME)
    }

    /// Interval between polls of an empty durable queue.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.unwrap_or(DEFAULT_POLL_INTERVAL_MS).max(1))
    }

    /// Bound on the consumer's shutdown.
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(
            self.shutdown_timeout_ms
                .unwrap_or(DEFAULT_SHUTDOWN_TIMEOUT_MS),
        )
    }

    /// Redelivery policy assembled from the attempt and backoff settings.
    pub fn redelivery_policy(&self) -> RedeliveryPolicy {
        let policy = RedeliveryPolicy {
            max_attempts: self.max_delivery_attempts.and_then(NonZeroU32::new),
            ..RedeliveryPolicy::default()
        };
        match self.redelivery_backoff_ms.filter(|ms| *ms > 0) {
            Some(initial_ms) => {
                let max_ms = self
                    .redelivery_backoff_max_ms
                    .unwrap_or(DEFAULT_BACKOFF_MAX_MS)
                    .max(initial_ms);
                policy.with_backoff(RedeliveryBackoff::Exponential {
                    initial: Duration::from_millis(initial_ms),
                    max: Duration::from_millis(max_ms),
                })
            }
            None => policy,
        }
    }
}
