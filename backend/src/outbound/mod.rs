//! Outbound adapters implementing domain ports.
//!
//! - **persistence**: in-memory sighting and animal repositories.
//! - **queue**: in-memory and PostgreSQL-backed notification queues.
//! - **notifications**: handlers invoked by the queue consumer.
//!
//! Adapters translate between domain types and their backing store. They
//! contain no business rules.

pub mod notifications;
pub mod persistence;
pub mod queue;
