//! Shared helpers for pipeline integration tests.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use backend::domain::NotificationBatch;
use backend::domain::ports::{NotificationHandler, NotificationHandlerError};

/// Records every payload it sees and fails the first `failures` calls whose
/// payload matches `fail_on` (any payload when `None`).
#[derive(Debug, Default)]
pub struct RecordingHandler {
    seen: Mutex<Vec<Vec<u8>>>,
    remaining_failures: Mutex<u32>,
    fail_on: Option<Vec<u8>>,
}

impl RecordingHandler {
    pub fn succeeding() -> Self {
        Self::default()
    }

    pub fn failing_times(failures: u32) -> Self {
        Self {
            remaining_failures: Mutex::new(failures),
            ..Self::default()
        }
    }

    pub fn failing_on(payload: &[u8], failures: u32) -> Self {
        Self {
            remaining_failures: Mutex::new(failures),
            fail_on: Some(payload.to_vec()),
            ..Self::default()
        }
    }

    pub fn seen(&self) -> Vec<Vec<u8>> {
        self.seen.lock().expect("seen mutex").clone()
    }

    pub fn batches(&self) -> Vec<NotificationBatch> {
        self.seen()
            .iter()
            .map(|payload| NotificationBatch::from_bytes(payload).expect("valid batch"))
            .collect()
    }
}

#[async_trait]
impl NotificationHandler for RecordingHandler {
    async fn handle(&self, payload: &[u8]) -> Result<(), NotificationHandlerError> {
        self.seen.lock().expect("seen mutex").push(payload.to_vec());
        if self
            .fail_on
            .as_deref()
            .is_some_and(|target| target != payload)
        {
            return Ok(());
        }
        let mut remaining = self.remaining_failures.lock().expect("failures mutex");
        if *remaining > 0 {
            *remaining -= 1;
            return Err(NotificationHandlerError::delivery("injected failure"));
        }
        Ok(())
    }
}

/// Poll `condition` until it holds, panicking after two seconds.
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not met within two seconds"
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
