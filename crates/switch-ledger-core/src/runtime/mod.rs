// crates/switch-ledger-core/src/runtime/mod.rs
// ============================================================================
// Module: Switch Ledger Runtime
// Description: Ordering protocol, retry policy, and backing-store helpers.
// Purpose: Execute last-writer-wins saves and catalog flows over backends.
// Dependencies: crate::{core, interfaces}, rand, time
// ============================================================================

//! ## Overview
//! Runtime modules implement the last-writer-wins save protocol, the bounded
//! creation-race retry loop, the deadline/cancellation context, and the
//! supplemental identity-mapper and sensor-catalog flows. All of them speak
//! to storage exclusively through [`crate::interfaces::KeyValueBackend`].

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod catalog;
pub mod context;
pub mod mapper;
pub mod retry;
pub mod rows;
pub mod store;
pub mod toggle;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use catalog::CatalogError;
pub use catalog::SensorCatalog;
pub use context::CancelHandle;
pub use context::ContextError;
pub use context::StoreContext;
pub use mapper::IdentityMapper;
pub use mapper::MapperError;
pub use retry::RetryPolicy;
pub use rows::RowCodecError;
pub use store::MemoryBackend;
pub use toggle::ToggleStore;
pub use toggle::ToggleStoreError;
