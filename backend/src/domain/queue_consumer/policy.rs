//! Redelivery policy applied when a notification handler fails.

use std::num::NonZeroU32;
use std::time::Duration;

/// Delay applied before a failed delivery is returned to the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RedeliveryBackoff {
    /// Requeue immediately.
    #[default]
    None,
    /// Double the delay on every delivery, starting at `initial` and capped
    /// at `max`.
    Exponential {
        /// Delay after the first failed delivery.
        initial: Duration,
        /// Upper bound for any single delay.
        max: Duration,
    },
}

impl RedeliveryBackoff {
    /// Delay to apply after the delivery numbered `delivery_count` failed.
    pub fn delay_for(&self, delivery_count: u32) -> Option<Duration> {
        match *self {
            Self::None => None,
            Self::Exponential { initial, max } => {
                let exponent = 2_u32.saturating_pow(delivery_count.saturating_sub(1));
                let base_ms = u64::try_from(initial.as_millis()).unwrap_or(u64::MAX);
                let max_ms = u64::try_from(max.as_millis()).unwrap_or(u64::MAX);
                let delay_ms = base_ms.saturating_mul(u64::from(exponent)).min(max_ms);
                (delay_ms > 0).then(|| Duration::from_millis(delay_ms))
            }
        }
    }
}

/// Decides whether a failed delivery is requeued or dropped.
///
/// The default keeps every failed message in circulation forever with no
/// delay between attempts. A handler that never succeeds will therefore spin
/// on the same message; bound it with [`RedeliveryPolicy::bounded`] where
/// that is not acceptable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RedeliveryPolicy {
    /// Deliveries allowed before a failing message is dropped. `None` means
    /// unbounded.
    pub max_attempts: Option<NonZeroU32>,
    /// Delay schedule between deliveries.
    pub backoff: RedeliveryBackoff,
}

impl RedeliveryPolicy {
    /// Requeue failed messages forever without delay.
    pub const fn unbounded() -> Self {
        Self {
            max_attempts: None,
            backoff: RedeliveryBackoff::None,
        }
    }

    /// Drop a message once it has failed `max_attempts` deliveries.
    pub const fn bounded(max_attempts: NonZeroU32) -> Self {
        Self {
            max_attempts: Some(max_attempts),
            backoff: RedeliveryBackoff::None,
        }
    }

    /// Replace the backoff schedule.
    #[must_use]
    pub const fn with_backoff(mut self, backoff: RedeliveryBackoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// True when a failed delivery numbered `delivery_count` must not be
    /// requeued.
    pub fn is_exhausted(&self, delivery_count: u32) -> bool {
        self.max_attempts
            .is_some_and(|max| delivery_count >= max.get())
    }

    /// Delay before requeueing the delivery numbered `delivery_count`.
    pub fn delay_for(&self, delivery_count: u32) -> Option<Duration> {
        self.backoff.delay_for(delivery_count)
    }
}
