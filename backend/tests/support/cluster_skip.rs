//! Opt-in and skip policy for tests that need an embedded cluster.
//!
//! The cluster downloads PostgreSQL binaries on first use, so these suites
//! only run when `RUN_PG_EMBEDDED=1`. Once opted in, setup failures fail the
//! test unless `SKIP_TEST_CLUSTER` is truthy.

/// True when `RUN_PG_EMBEDDED` is exactly `1`.
pub fn should_run_embedded_cluster() -> bool {
    std::env::var("RUN_PG_EMBEDDED").as_deref() == Ok("1")
}

/// Returns true when the `SKIP_TEST_CLUSTER` environment variable is set to a
/// truthy value.
///
/// Truthy values: "1", "true", "yes" (case-insensitive).
fn should_skip_test_cluster() -> bool {
    std::env::var("SKIP_TEST_CLUSTER")
        .map(|value| matches!(value.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

/// Prints a skip marker and returns `None` when `SKIP_TEST_CLUSTER` is
/// truthy; panics otherwise so a broken cluster is not mistaken for a pass.
pub fn handle_cluster_setup_failure<T>(reason: impl std::fmt::Display) -> Option<T> {
    if should_skip_test_cluster() {
        eprintln!("SKIP-TEST-CLUSTER: {reason}");
        None
    } else {
        panic!("Test cluster setup failed: {reason}. Set SKIP_TEST_CLUSTER=1 to skip.");
    }
}
