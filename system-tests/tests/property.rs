// system-tests/tests/property.rs
// ============================================================================
// Module: Ordering Property-Based Tests
// Description: Property tests for arrival-order independence.
// Purpose: Detect ordering violations across randomized arrival permutations.
// ============================================================================

//! Property-based tests for last-writer-wins invariants.

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

use proptest::prelude::*;
use switch_ledger_core::EventTime;
use switch_ledger_core::MemoryBackend;
use switch_ledger_core::StoreContext;
use switch_ledger_core::Switch;
use switch_ledger_core::SwitchId;
use switch_ledger_core::ToggleStore;

/// Strategy producing nanosecond timestamps within the year range the
/// sortable encoding covers.
fn nanos_strategy() -> impl Strategy<Value = i128> {
    // 1970-01-01 through ~2200-01-01, in nanoseconds.
    0_i128..7_258_118_400_000_000_000_i128
}

proptest! {
    #[test]
    fn latest_is_the_maximum_timestamp_regardless_of_arrival_order(
        arrivals in prop::collection::vec((nanos_strategy(), any::<bool>()), 1..24)
            .prop_shuffle(),
    ) {
        let backend = MemoryBackend::new();
        let store = ToggleStore::new(&backend);
        let ctx = StoreContext::unbounded();

        let mut expected: Option<Switch> = None;
        for (nanos, state) in &arrivals {
            let switch = Switch {
                id: SwitchId::from("prop"),
                state: *state,
                created_at: EventTime::from_unix_nanos(*nanos).unwrap(),
            };
            store.save(&ctx, &switch).unwrap();
            // Strictly-greater timestamps replace; equal ones do not.
            let replaces = expected
                .as_ref()
                .is_none_or(|current| switch.created_at > current.created_at);
            if replaces {
                expected = Some(switch);
            }
        }

        let latest = store.latest(&ctx, &SwitchId::from("prop")).unwrap();
        prop_assert_eq!(latest, expected.unwrap());
    }
}
