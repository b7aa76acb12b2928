//! Process-local queue used by tests and by the worker when no database is
//! configured.
//!
//! Messages do not survive a restart. Ordering follows the durable adapter:
//! FIFO for fresh messages, with requeued messages appended behind whatever
//! is already waiting.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};
use tracing::debug;

use crate::domain::ports::{
    Delivery, DeliveryTag, MessagePublisher, MessageQueueError, MessageSubscriber,
};

#[derive(Debug, Clone)]
struct QueuedMessage {
    payload: Vec<u8>,
    delivery_count: u32,
}

#[derive(Debug, Default)]
struct QueueState {
    ready: VecDeque<QueuedMessage>,
    in_flight: HashMap<i64, QueuedMessage>,
    next_tag: i64,
    closed: bool,
}

/// In-memory [`MessagePublisher`] and [`MessageSubscriber`].
#[derive(Debug, Default)]
pub struct InMemoryMessageQueue {
    state: Mutex<QueueState>,
    wakeup: Notify,
}

impl InMemoryMessageQueue {
    /// Create an empty, open queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages waiting to be received.
    pub async fn ready_len(&self) -> usize {
        self.state.lock().await.ready.len()
    }

    /// Messages received but not yet acked or nacked.
    pub async fn in_flight_len(&self) -> usize {
        self.state.lock().await.in_flight.len()
    }

    async fn settle(&self, tag: DeliveryTag) -> Result<QueuedMessage, MessageQueueError> {
        let mut state = self.state.lock().await;
        state
            .in_flight
            .remove(&tag.get())
            .ok_or_else(|| MessageQueueError::unknown_delivery(tag.get()))
    }
}

#[async_trait]
impl MessagePublisher for InMemoryMessageQueue {
    async fn publish(&self, payload: &[u8]) -> Result<(), MessageQueueError> {
        let mut state = self.state.lock().await;
        if state.closed {
            return Err(MessageQueueError::closed());
        }
        state.ready.push_back(QueuedMessage {
            payload: payload.to_vec(),
            delivery_count: 0,
        });
        drop(state);
        self.wakeup.notify_waiters();
        Ok(())
    }
}

#[async_trait]
impl MessageSubscriber for InMemoryMessageQueue {
    async fn receive(&self) -> Result<Delivery, MessageQueueError> {
        loop {
            // Register for wakeups before inspecting state so a publish
            // between the check and the await is not missed.
            let notified = self.wakeup.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut state = self.state.lock().await;
                if state.closed {
                    return Err(MessageQueueError::closed());
                }
                if let Some(mut message) = state.ready.pop_front() {
                    message.delivery_count = message.delivery_count.saturating_add(1);
                    state.next_tag += 1;
                    let tag = state.next_tag;
                    let delivery = Delivery {
                        tag: DeliveryTag::new(tag),
                        payload: message.payload.clone(),
                        delivery_count: message.delivery_count,
                    };
                    state.in_flight.insert(tag, message);
                    return Ok(delivery);
                }
            }

            notified.await;
        }
    }

    async fn ack(&self, tag: DeliveryTag) -> Result<(), MessageQueueError> {
        self.settle(tag).await?;
        debug!(tag = tag.get(), "in-memory delivery acked");
        Ok(())
    }

    async fn nack(&self, tag: DeliveryTag, requeue: bool) -> Result<(), MessageQueueError> {
        let message = self.settle(tag).await?;
        if !requeue {
            debug!(tag = tag.get(), "in-memory delivery discarded");
            return Ok(());
        }
        let mut state = self.state.lock().await;
        state.ready.push_back(message);
        drop(state);
        self.wakeup.notify_waiters();
        Ok(())
    }

    async fn close(&self) -> Result<(), MessageQueueError> {
        self.state.lock().await.closed = true;
        self.wakeup.notify_waiters();
        Ok(())
    }
}
