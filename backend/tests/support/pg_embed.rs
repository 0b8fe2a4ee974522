//! Embedded PostgreSQL for the Diesel adapter suites.
//!
//! Every suite in one test binary shares a single cluster and takes a fresh
//! database from it, migrated with the application's own migrations.
//!
//! Set `SKIP_TEST_CLUSTER=1` on hosts where the cluster cannot start; the
//! suites then print a skip marker instead of failing.

use std::time::Duration;

use orgreviews::outbound::persistence::run_migrations;
use pg_embedded_setup_unpriv::{ClusterHandle, TemporaryDatabase};
use tokio::runtime::Runtime;

const BOOTSTRAP_RETRIES: u32 = 3;
const RETRY_DELAY_MS: u64 = 500;
const STABLE_PASSWORD: &str = "orgreviews_embedded_test";

/// Returns true when `SKIP_TEST_CLUSTER` holds "1", "true" or "yes".
pub fn should_skip_test_cluster() -> bool {
    std::env::var("SKIP_TEST_CLUSTER")
        .map(|value| matches!(value.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

/// Skip marker when skipping is allowed, otherwise a loud failure.
pub fn handle_cluster_setup_failure<T>(reason: impl std::fmt::Display) -> Option<T> {
    if should_skip_test_cluster() {
        eprintln!("SKIP-TEST-CLUSTER: {reason}");
        None
    } else {
        panic!("Test cluster setup failed: {reason}. Set SKIP_TEST_CLUSTER=1 to skip.");
    }
}

/// The process-wide cluster, bootstrapped on first use.
///
/// A reused data directory keeps the password it was initialised with, so
/// `PG_PASSWORD` is pinned for the bootstrap unless the caller set one.
pub fn shared_cluster() -> Result<&'static ClusterHandle, String> {
    let _password = std::env::var_os("PG_PASSWORD")
        .is_none()
        .then(|| env_lock::lock_env([("PG_PASSWORD", Some(STABLE_PASSWORD))]));

    let mut attempt = 0;
    loop {
        match pg_embedded_setup_unpriv::test_support::shared_cluster_handle() {
            Ok(handle) => return Ok(handle),
            Err(error) if attempt < BOOTSTRAP_RETRIES => {
                let delay = Duration::from_millis(RETRY_DELAY_MS << attempt);
                eprintln!(
                    "pg-embed: bootstrap attempt {} failed, retrying in {delay:?}: {error:?}",
                    attempt + 1
                );
                std::thread::sleep(delay);
                attempt += 1;
            }
            Err(error) => return Err(format!("{error:?}")),
        }
    }
}

/// A fresh database with every migration applied.
pub fn migrated_database(runtime: &Runtime) -> Result<TemporaryDatabase, String> {
    let cluster = shared_cluster()?;
    let name = format!("orgreviews_test_{}", uuid::Uuid::new_v4().simple());
    let database = cluster
        .temporary_database(name.as_str())
        .map_err(|error| format!("create database: {error:?}"))?;
    let url = database.url().to_owned();
    runtime
        .block_on(run_migrations(&url))
        .map_err(|error| format!("migrate: {error}"))?;
    Ok(database)
}
