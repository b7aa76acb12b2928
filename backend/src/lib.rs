//! Animal sighting ingestion and notification backend.
//!
//! `domain` holds the sighting rules and the ports they depend on, `outbound`
//! the adapters behind those ports, and `server` configuration plus the
//! wiring used by the `sightings-worker` binary.

pub mod domain;
pub mod outbound;
pub mod server;
