// crates/switch-ledger-core/src/lib.rs
// ============================================================================
// Module: Switch Ledger Core Library
// Description: Public API surface for the Switch Ledger core.
// Purpose: Expose domain types, backend interfaces, and runtime stores.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Switch Ledger core persists toggle events under last-writer-wins ordering
//! by domain timestamp, on top of any key-value backend offering atomic
//! multi-row conditional writes. It is backend-agnostic and integrates
//! through explicit interfaces; a process-local in-memory backend ships for
//! tests and embedding.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use self::core::*;

pub use interfaces::Assignment;
pub use interfaces::AttributeValue;
pub use interfaces::BackendError;
pub use interfaces::CancellationReason;
pub use interfaces::Condition;
pub use interfaces::Item;
pub use interfaces::KeyValueBackend;
pub use interfaces::PutOp;
pub use interfaces::QueryRequest;
pub use interfaces::RowKey;
pub use interfaces::SharedKeyValueBackend;
pub use interfaces::SortKeyCondition;
pub use interfaces::TransactWriteError;
pub use interfaces::TransactionCancellation;
pub use interfaces::UpdateOp;
pub use interfaces::WriteOp;
pub use runtime::CancelHandle;
pub use runtime::CatalogError;
pub use runtime::ContextError;
pub use runtime::IdentityMapper;
pub use runtime::MapperError;
pub use runtime::MemoryBackend;
pub use runtime::RetryPolicy;
pub use runtime::RowCodecError;
pub use runtime::SensorCatalog;
pub use runtime::StoreContext;
pub use runtime::ToggleStore;
pub use runtime::ToggleStoreError;
