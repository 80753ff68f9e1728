// system-tests/src/lib.rs
// ============================================================================
// Module: Switch Ledger System Tests Library
// Description: Shared fixtures for cross-backend test scenarios.
// Purpose: Run the same scenario against every KeyValueBackend implementation.
// Dependencies: switch-ledger-core, switch-ledger-store-sqlite, tempfile
// ============================================================================

//! ## Overview
//! This crate hosts shared fixtures used by the system-test binaries in
//! `system-tests/tests`. Scenarios are written once against
//! [`switch_ledger_core::SharedKeyValueBackend`] and executed against both
//! the in-memory backend and the `SQLite` backend.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod fixtures;
