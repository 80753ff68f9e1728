// system-tests/src/fixtures.rs
// ============================================================================
// Module: Cross-Backend Fixtures
// Description: Backend construction helpers for system-test scenarios.
// Purpose: Execute one scenario body against every backend implementation.
// Dependencies: switch-ledger-core, switch-ledger-store-sqlite, tempfile
// ============================================================================

//! ## Overview
//! [`with_each_backend`] runs a scenario against the in-memory backend and a
//! fresh `SQLite` database in a temp directory. Scenario bodies receive the
//! backend behind [`SharedKeyValueBackend`] plus a label for assertion
//! messages.

// ============================================================================
// SECTION: Imports
// ============================================================================

use switch_ledger_core::MemoryBackend;
use switch_ledger_core::SharedKeyValueBackend;
use switch_ledger_store_sqlite::SqliteBackend;
use switch_ledger_store_sqlite::SqliteBackendConfig;
use tempfile::TempDir;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Builds a fresh in-memory backend.
#[must_use]
pub fn memory_backend() -> SharedKeyValueBackend {
    SharedKeyValueBackend::from_backend(MemoryBackend::new())
}

/// Builds a fresh `SQLite` backend in a new temp directory.
///
/// The returned [`TempDir`] must outlive the backend.
///
/// # Panics
///
/// Panics when the temp directory or the database cannot be created; system
/// tests treat that as an environment failure.
#[must_use]
#[allow(clippy::expect_used, reason = "Fixture setup failures should abort the test run.")]
pub fn sqlite_backend() -> (TempDir, SharedKeyValueBackend) {
    let dir = TempDir::new().expect("create temp dir");
    let config = SqliteBackendConfig::for_path(dir.path().join("ledger.db"));
    let backend = SqliteBackend::open(&config).expect("open sqlite backend");
    (dir, SharedKeyValueBackend::from_backend(backend))
}

/// Runs a scenario body against every backend implementation.
pub fn with_each_backend(scenario: impl Fn(&str, SharedKeyValueBackend)) {
    scenario("memory", memory_backend());
    let (_dir, backend) = sqlite_backend();
    scenario("sqlite", backend);
}
