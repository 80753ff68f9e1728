// crates/switch-ledger-core/tests/toggle_protocol_unit.rs
// ============================================================================
// Module: Toggle Protocol Unit Tests
// Description: Targeted tests for last-writer-wins save semantics.
// Purpose: Validate pointer transitions, silent ordering losses, log row
//          accumulation, the bounded retry budget, and context expiry.
// ============================================================================

//! ## Overview
//! Unit-level tests for `ToggleStore` over the in-memory backend:
//! - First save creates the pointer and one log row
//! - Newer timestamps move the pointer; older ones are silent no-ops
//! - Equal timestamps lose the strict comparison and change nothing
//! - Losing events leave no log row behind
//! - Sustained creation races exhaust the budget and surface `Conflict`
//! - Expired and canceled contexts abort before touching the backend

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use std::num::NonZeroU32;
use std::time::Duration;

use switch_ledger_core::BackendError;
use switch_ledger_core::CancellationReason;
use switch_ledger_core::Item;
use switch_ledger_core::KeyValueBackend;
use switch_ledger_core::MemoryBackend;
use switch_ledger_core::QueryRequest;
use switch_ledger_core::RetryPolicy;
use switch_ledger_core::RowKey;
use switch_ledger_core::SortKeyCondition;
use switch_ledger_core::StoreContext;
use switch_ledger_core::Switch;
use switch_ledger_core::SwitchId;
use switch_ledger_core::ToggleStore;
use switch_ledger_core::ToggleStoreError;
use switch_ledger_core::TransactWriteError;
use switch_ledger_core::TransactionCancellation;
use switch_ledger_core::WriteOp;
use time::macros::datetime;

/// Switch event with a timestamp offset in milliseconds from a fixed base.
fn event(id: &str, state: bool, offset_ms: i64) -> Switch {
    let base = datetime!(2026-08-27 10:00:00 UTC);
    Switch {
        id: SwitchId::from(id),
        state,
        created_at: (base + Duration::from_millis(u64::try_from(offset_ms).unwrap())).into(),
    }
}

/// Counts log rows stored for an identity.
fn log_row_count(backend: &MemoryBackend, id: &str) -> usize {
    backend
        .query(&QueryRequest {
            partition: id.to_string(),
            sort: SortKeyCondition::BeginsWith("SWITCH#".to_string()),
            scan_forward: true,
            limit: None,
        })
        .unwrap()
        .len()
}

#[test]
fn first_save_creates_pointer_and_log_row() {
    let backend = MemoryBackend::new();
    let store = ToggleStore::new(&backend);
    let ctx = StoreContext::unbounded();
    let first = event("room-1", true, 0);

    store.save(&ctx, &first).unwrap();

    assert_eq!(store.latest(&ctx, &first.id).unwrap(), first);
    assert_eq!(log_row_count(&backend, "room-1"), 1);
}

#[test]
fn newer_event_moves_the_pointer() {
    let backend = MemoryBackend::new();
    let store = ToggleStore::new(&backend);
    let ctx = StoreContext::unbounded();

    store.save(&ctx, &event("room-1", true, 0)).unwrap();
    let newer = event("room-1", false, 100);
    store.save(&ctx, &newer).unwrap();

    assert_eq!(store.latest(&ctx, &newer.id).unwrap(), newer);
    assert_eq!(log_row_count(&backend, "room-1"), 2);
}

#[test]
fn older_event_is_a_silent_no_op() {
    let backend = MemoryBackend::new();
    let store = ToggleStore::new(&backend);
    let ctx = StoreContext::unbounded();

    let newer = event("room-1", false, 100);
    store.save(&ctx, &newer).unwrap();
    // Arrives late; loses to the stored timestamp without an error.
    store.save(&ctx, &event("room-1", true, 0)).unwrap();

    assert_eq!(store.latest(&ctx, &newer.id).unwrap(), newer);
}

#[test]
fn equal_timestamps_change_nothing() {
    let backend = MemoryBackend::new();
    let store = ToggleStore::new(&backend);
    let ctx = StoreContext::unbounded();

    let stored = event("room-1", true, 0);
    store.save(&ctx, &stored).unwrap();
    // Same timestamp, opposite value: loses the strict comparison.
    store.save(&ctx, &event("room-1", false, 0)).unwrap();

    assert_eq!(store.latest(&ctx, &stored.id).unwrap(), stored);
    assert_eq!(log_row_count(&backend, "room-1"), 1);
}

#[test]
fn losing_events_leave_no_log_row() {
    let backend = MemoryBackend::new();
    let store = ToggleStore::new(&backend);
    let ctx = StoreContext::unbounded();

    store.save(&ctx, &event("room-1", true, 500)).unwrap();
    for offset in [0, 100, 200] {
        store.save(&ctx, &event("room-1", false, offset)).unwrap();
    }

    assert_eq!(log_row_count(&backend, "room-1"), 1);
}

#[test]
fn identities_are_independent() {
    let backend = MemoryBackend::new();
    let store = ToggleStore::new(&backend);
    let ctx = StoreContext::unbounded();

    let one = event("room-1", true, 0);
    let two = event("room-2", false, 0);
    store.save(&ctx, &one).unwrap();
    store.save(&ctx, &two).unwrap();

    assert_eq!(store.latest(&ctx, &one.id).unwrap(), one);
    assert_eq!(store.latest(&ctx, &two.id).unwrap(), two);
}

#[test]
fn latest_reports_not_found_for_unknown_ids() {
    let store = ToggleStore::new(MemoryBackend::new());
    let ctx = StoreContext::unbounded();
    let missing = SwitchId::from("never-saved");

    let err = store.latest(&ctx, &missing).unwrap_err();
    assert_eq!(err, ToggleStoreError::NotFound {
        id: missing,
    });
}

/// Backend that cancels every transaction without pre-failure values,
/// simulating a creation race that never resolves.
struct AlwaysRacing;

impl KeyValueBackend for AlwaysRacing {
    fn get(&self, _key: &RowKey) -> Result<Option<Item>, BackendError> {
        Ok(None)
    }

    fn query(&self, _request: &QueryRequest) -> Result<Vec<Item>, BackendError> {
        Ok(Vec::new())
    }

    fn transact_write(&self, ops: &[WriteOp]) -> Result<(), TransactWriteError> {
        Err(TransactWriteError::Canceled(TransactionCancellation {
            reasons: ops.iter().map(|_| CancellationReason::condition_failed(None)).collect(),
        }))
    }
}

#[test]
fn sustained_creation_race_exhausts_the_budget() {
    let retry = RetryPolicy {
        max_attempts: NonZeroU32::new(3).unwrap(),
        base_backoff_ms: 0,
        max_backoff_ms: 0,
    };
    let store = ToggleStore::with_retry_policy(AlwaysRacing, retry);
    let ctx = StoreContext::unbounded();
    let switch = event("room-1", true, 0);

    let err = store.save(&ctx, &switch).unwrap_err();
    assert_eq!(err, ToggleStoreError::Conflict {
        id: switch.id,
        attempts: 3,
    });
}

#[test]
fn backend_errors_propagate_verbatim() {
    /// Backend that fails every transaction with an engine error.
    struct Broken;

    impl KeyValueBackend for Broken {
        fn get(&self, _key: &RowKey) -> Result<Option<Item>, BackendError> {
            Err(BackendError::Io("disk gone".to_string()))
        }

        fn query(&self, _request: &QueryRequest) -> Result<Vec<Item>, BackendError> {
            Err(BackendError::Io("disk gone".to_string()))
        }

        fn transact_write(&self, _ops: &[WriteOp]) -> Result<(), TransactWriteError> {
            Err(TransactWriteError::Backend(BackendError::Io("disk gone".to_string())))
        }
    }

    let store = ToggleStore::new(Broken);
    let ctx = StoreContext::unbounded();
    let err = store.save(&ctx, &event("room-1", true, 0)).unwrap_err();
    assert_eq!(err, ToggleStoreError::Backend(BackendError::Io("disk gone".to_string())));
}

#[test]
fn expired_deadline_aborts_before_the_backend() {
    let store = ToggleStore::new(MemoryBackend::new());
    let ctx = StoreContext::with_timeout(Duration::ZERO);
    let switch = event("room-1", true, 0);

    assert_eq!(store.save(&ctx, &switch).unwrap_err(), ToggleStoreError::DeadlineExceeded);
    assert_eq!(store.latest(&ctx, &switch.id).unwrap_err(), ToggleStoreError::DeadlineExceeded);
}

#[test]
fn canceled_context_aborts_before_the_backend() {
    let store = ToggleStore::new(MemoryBackend::new());
    let (ctx, handle) = StoreContext::unbounded().cancellable();
    let switch = event("room-1", true, 0);

    store.save(&ctx, &switch).unwrap();
    handle.cancel();
    assert_eq!(store.save(&ctx, &switch).unwrap_err(), ToggleStoreError::Canceled);
}
