//! Embedded PostgreSQL helpers shared by the durable queue tests.

mod cluster_skip;
mod pg_embed;

pub use cluster_skip::{handle_cluster_setup_failure, should_run_embedded_cluster};
pub use pg_embed::test_cluster;
