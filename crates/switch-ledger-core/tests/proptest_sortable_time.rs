// crates/switch-ledger-core/tests/proptest_sortable_time.rs
// ============================================================================
// Module: Sortable Timestamp Property-Based Tests
// Description: Property tests for the sortable timestamp encoding.
// Purpose: Detect ordering and round-trip violations across wide input ranges.
// ============================================================================

//! Property-based tests for sortable timestamp invariants.

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

/// Strategy producing nanosecond timestamps within the year range the
/// sortable encoding covers.
fn nanos_strategy() -> impl Strategy<Value = i128> {
    // 1970-01-01 through ~2200-01-01, in nanoseconds.
    0_i128..7_258_118_400_000_000_000_i128
}

proptest! {
    #[test]
    fn encoded_order_equals_temporal_order(a in nanos_strategy(), b in nanos_strategy()) {
        let ta = EventTime::from_unix_nanos(a).unwrap();
        let tb = EventTime::from_unix_nanos(b).unwrap();
        prop_assert_eq!(a.cmp(&b), ta.encode_sortable().cmp(&tb.encode_sortable()));
        prop_assert_eq!(a.cmp(&b), ta.cmp(&tb));
    }

    #[test]
    fn encoding_round_trips(nanos in nanos_strategy()) {
        let original = EventTime::from_unix_nanos(nanos).unwrap();
        let parsed = EventTime::parse_sortable(&original.encode_sortable()).unwrap();
        prop_assert_eq!(parsed, original);
    }
}
