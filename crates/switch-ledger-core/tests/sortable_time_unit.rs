// crates/switch-ledger-core/tests/sortable_time_unit.rs
// ============================================================================
// Module: Sortable Time Unit Tests
// Description: Targeted tests for the fixed-width timestamp encoding.
// Purpose: Validate that lexicographic order on encoded timestamps equals
//          temporal order, including sub-millisecond values.
// ============================================================================

//! ## Overview
//! Unit-level tests for the sortable timestamp codec:
//! - Fixed 30-character width regardless of subsecond value
//! - Lexicographic order equals temporal order
//! - Round trip through encode/parse
//! - Rejection of variable-width and malformed encodings

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

use switch_ledger_core::EventTime;
use switch_ledger_core::TimeCodecError;
use time::macros::datetime;

#[test]
fn encoding_has_fixed_width() {
    let whole_second = EventTime::new(datetime!(2026-08-27 10:00:00 UTC));
    let with_nanos = EventTime::new(datetime!(2026-08-27 10:00:00.000000001 UTC));
    assert_eq!(whole_second.encode_sortable().len(), 30);
    assert_eq!(with_nanos.encode_sortable().len(), 30);
    assert_eq!(whole_second.encode_sortable(), "2026-08-27T10:00:00.000000000Z");
}

#[test]
fn lexicographic_order_matches_temporal_order() {
    // The zero-subsecond case is the one a variable-width encoding gets
    // wrong: "10:00:00Z" would sort after "10:00:00.5Z".
    let samples = [
        EventTime::new(datetime!(2026-08-27 09:59:59.999999999 UTC)),
        EventTime::new(datetime!(2026-08-27 10:00:00 UTC)),
        EventTime::new(datetime!(2026-08-27 10:00:00.000000001 UTC)),
        EventTime::new(datetime!(2026-08-27 10:00:00.5 UTC)),
        EventTime::new(datetime!(2026-08-27 10:00:01 UTC)),
        EventTime::new(datetime!(2027-01-01 00:00:00 UTC)),
    ];
    for pair in samples.windows(2) {
        assert!(pair[0] < pair[1]);
        assert!(pair[0].encode_sortable() < pair[1].encode_sortable());
    }
}

#[test]
fn round_trip_preserves_nanoseconds() {
    let original = EventTime::new(datetime!(2026-08-27 10:00:00.123456789 UTC));
    let parsed = EventTime::parse_sortable(&original.encode_sortable()).unwrap();
    assert_eq!(parsed, original);
}

#[test]
fn offset_input_normalizes_to_utc() {
    let offset = EventTime::new(datetime!(2026-08-27 12:00:00 +02:00));
    let utc = EventTime::new(datetime!(2026-08-27 10:00:00 UTC));
    assert_eq!(offset, utc);
    assert_eq!(offset.encode_sortable(), utc.encode_sortable());
}

#[test]
fn variable_width_encodings_are_rejected() {
    for bad in [
        "2026-08-27T10:00:00Z",
        "2026-08-27T10:00:00.5Z",
        "2026-08-27T10:00:00.000000000+02:00",
        "not a timestamp",
        "",
    ] {
        let err = EventTime::parse_sortable(bad).unwrap_err();
        assert_eq!(err, TimeCodecError::InvalidEncoding(bad.to_string()));
    }
}

#[test]
fn serde_uses_the_sortable_encoding() {
    let original = EventTime::new(datetime!(2026-08-27 10:00:00.25 UTC));
    let json = serde_json::to_string(&original).unwrap();
    assert_eq!(json, "\"2026-08-27T10:00:00.250000000Z\"");
    let back: EventTime = serde_json::from_str(&json).unwrap();
    assert_eq!(back, original);
}

#[test]
fn from_unix_millis_matches_explicit_construction() {
    let from_millis = EventTime::from_unix_millis(1_787_479_200_000).unwrap();
    assert_eq!(from_millis.encode_sortable(), "2026-08-23T10:00:00.000000000Z");
    assert!(EventTime::from_unix_nanos(i128::MAX).is_none());
}
