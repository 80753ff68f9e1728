// crates/switch-ledger-core/src/core/time.rs
// ============================================================================
// Module: Switch Ledger Time Model
// Description: Caller-supplied event timestamps with a sortable wire encoding.
// Purpose: Provide the fixed-precision encoding that makes timestamp ordering
//          equal to lexicographic ordering on stored sort keys.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! Event ordering in Switch Ledger is decided by timestamps embedded in
//! events, never by arrival order. The core never reads wall-clock time;
//! callers supply an [`EventTime`] with every event.
//!
//! [`EventTime`] encodes as UTC RFC 3339 with exactly nine subsecond digits
//! (`2026-08-27T10:00:00.000000000Z`). The width is fixed so lexicographic
//! order on the encoded string equals temporal order; the same encoding is
//! used both in sort keys and in the `created_at` attribute the backend
//! compares with `<`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;
use thiserror::Error;
use time::OffsetDateTime;
use time::PrimitiveDateTime;
use time::UtcOffset;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

// ============================================================================
// SECTION: Encoding
// ============================================================================

/// Parse format matching the fixed-width sortable encoding.
const SORTABLE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!(
    "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:9]Z"
);

/// Errors raised while decoding an [`EventTime`] from its wire form.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TimeCodecError {
    /// The encoded value did not match the fixed-width sortable format.
    #[error("invalid sortable timestamp: {0}")]
    InvalidEncoding(String),
}

// ============================================================================
// SECTION: Event Time
// ============================================================================

/// Caller-supplied event timestamp with nanosecond precision.
///
/// # Invariants
/// - Always normalized to UTC.
/// - Total order matches the lexicographic order of [`EventTime::encode_sortable`]
///   output for years 0000-9999.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventTime(OffsetDateTime);

impl EventTime {
    /// Creates an event time from any offset datetime, normalizing to UTC.
    #[must_use]
    pub fn new(datetime: OffsetDateTime) -> Self {
        Self(datetime.to_offset(UtcOffset::UTC))
    }

    /// Creates an event time from unix epoch nanoseconds.
    ///
    /// Returns `None` when the value is outside the representable range.
    #[must_use]
    pub fn from_unix_nanos(nanos: i128) -> Option<Self> {
        OffsetDateTime::from_unix_timestamp_nanos(nanos).ok().map(Self::new)
    }

    /// Creates an event time from unix epoch milliseconds.
    ///
    /// Returns `None` when the value is outside the representable range.
    #[must_use]
    pub fn from_unix_millis(millis: i64) -> Option<Self> {
        Self::from_unix_nanos(i128::from(millis) * 1_000_000)
    }

    /// Returns the underlying UTC datetime.
    #[must_use]
    pub const fn as_datetime(&self) -> OffsetDateTime {
        self.0
    }

    /// Encodes the timestamp in the fixed-width sortable form.
    #[must_use]
    pub fn encode_sortable(&self) -> String {
        format!(
            "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}.{:09}Z",
            self.0.year(),
            u8::from(self.0.month()),
            self.0.day(),
            self.0.hour(),
            self.0.minute(),
            self.0.second(),
            self.0.nanosecond(),
        )
    }

    /// Decodes a timestamp from its fixed-width sortable form.
    ///
    /// # Errors
    ///
    /// Returns [`TimeCodecError::InvalidEncoding`] when the input does not
    /// match the format produced by [`EventTime::encode_sortable`].
    pub fn parse_sortable(encoded: &str) -> Result<Self, TimeCodecError> {
        PrimitiveDateTime::parse(encoded, SORTABLE_FORMAT)
            .map(|parsed| Self(parsed.assume_utc()))
            .map_err(|_| TimeCodecError::InvalidEncoding(encoded.to_string()))
    }
}

impl fmt::Display for EventTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode_sortable())
    }
}

impl From<OffsetDateTime> for EventTime {
    fn from(datetime: OffsetDateTime) -> Self {
        Self::new(datetime)
    }
}

impl Serialize for EventTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.encode_sortable())
    }
}

impl<'de> Deserialize<'de> for EventTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        Self::parse_sortable(&encoded).map_err(serde::de::Error::custom)
    }
}
