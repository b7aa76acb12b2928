//! Message queue adapters implementing the publisher and subscriber ports.
//!
//! - [`InMemoryMessageQueue`]: process-local, for tests and database-less runs.
//! - [`PostgresMessageQueue`]: durable table-backed queue over `sqlx`.

mod in_memory;
mod postgres;

pub use in_memory::InMemoryMessageQueue;
pub use postgres::{PostgresMessageQueue, PostgresQueueConfig};
