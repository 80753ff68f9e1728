// crates/switch-ledger-store-sqlite/src/lib.rs
// ============================================================================
// Module: SQLite Key-Value Backend
// Description: Durable KeyValueBackend using SQLite WAL.
// Purpose: Provide production-grade persistence for Switch Ledger rows.
// Dependencies: switch-ledger-core, rusqlite
// ============================================================================

//! ## Overview
//! This crate provides a SQLite-backed [`KeyValueBackend`] implementation.
//! Rows live in a single table keyed by partition and sort key, with the
//! attribute map serialized as JSON. Conditional transactions evaluate every
//! guard and apply every write inside one SQLite transaction, which gives the
//! ordering protocol its atomic multi-row conditional-write primitive.
//!
//! [`KeyValueBackend`]: switch_ledger_core::KeyValueBackend

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use store::SqliteBackend;
pub use store::SqliteBackendConfig;
pub use store::SqliteBackendError;
pub use store::SqliteJournalMode;
pub use store::SqliteSyncMode;
