// crates/switch-ledger-core/src/runtime/rows.rs
// ============================================================================
// Module: Switch Ledger Row Codecs
// Description: Encode/decode between domain events and stored rows.
// Purpose: Keep the physical two-row layout in one place.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! Each identity owns one partition holding two row shapes: the mutable
//! latest pointer under the [`LATEST_SWITCH_SORT_KEY`] and write-once log
//! rows under `SWITCH#<created_at>`. Both shapes carry the same `state` and
//! `created_at` attributes; `created_at` uses the fixed-width sortable
//! encoding so the backend's `<` comparison orders timestamps correctly.
//!
//! Decoding fails closed: rows that lack attributes or carry an unparsable
//! timestamp surface a typed error instead of a default value.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::identifiers::SwitchId;
use crate::core::state::Switch;
use crate::core::time::EventTime;
use crate::interfaces::ATTR_PARTITION_KEY;
use crate::interfaces::AttributeValue;
use crate::interfaces::Item;
use crate::interfaces::RowKey;

// ============================================================================
// SECTION: Layout Constants
// ============================================================================

/// Sort key of the mutable latest pointer row.
pub const LATEST_SWITCH_SORT_KEY: &str = "LATEST_SWITCH";
/// Sort-key prefix of write-once log rows.
pub const SWITCH_LOG_SORT_PREFIX: &str = "SWITCH#";
/// Attribute holding the toggle value.
pub const ATTR_STATE: &str = "state";
/// Attribute holding the encoded event timestamp.
pub const ATTR_CREATED_AT: &str = "created_at";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Row decode failures.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RowCodecError {
    /// A required attribute is absent or has the wrong type.
    #[error("row is missing attribute {attribute}")]
    MissingAttribute {
        /// Name of the absent attribute.
        attribute: String,
    },
    /// The stored timestamp does not match the sortable encoding.
    #[error("row carries an invalid timestamp: {encoded}")]
    InvalidTimestamp {
        /// Offending encoded value.
        encoded: String,
    },
}

// ============================================================================
// SECTION: Row Construction
// ============================================================================

/// Returns the key of the latest pointer row for an identity.
#[must_use]
pub fn latest_row_key(id: &SwitchId) -> RowKey {
    RowKey::new(id.as_str(), LATEST_SWITCH_SORT_KEY)
}

/// Returns the key of the log row recording one accepted event.
#[must_use]
pub fn log_row_key(switch: &Switch) -> RowKey {
    RowKey::new(
        switch.id.as_str(),
        format!("{SWITCH_LOG_SORT_PREFIX}{}", switch.created_at.encode_sortable()),
    )
}

/// Encodes a switch as its latest pointer row.
#[must_use]
pub fn latest_row(switch: &Switch) -> Item {
    encode_switch(switch, &latest_row_key(&switch.id))
}

/// Encodes a switch as its write-once log row.
#[must_use]
pub fn log_row(switch: &Switch) -> Item {
    encode_switch(switch, &log_row_key(switch))
}

/// Encodes the shared attribute payload under the given key.
fn encode_switch(switch: &Switch, key: &RowKey) -> Item {
    Item::for_key(key)
        .with(ATTR_STATE, AttributeValue::Bool(switch.state))
        .with(ATTR_CREATED_AT, AttributeValue::S(switch.created_at.encode_sortable()))
}

// ============================================================================
// SECTION: Row Decoding
// ============================================================================

/// Decodes a switch from either row shape.
///
/// # Errors
///
/// Returns [`RowCodecError`] when the row lacks a required attribute or the
/// stored timestamp is not in the sortable encoding.
pub fn decode_switch(item: &Item) -> Result<Switch, RowCodecError> {
    let id = item.get_str(ATTR_PARTITION_KEY).ok_or_else(|| RowCodecError::MissingAttribute {
        attribute: ATTR_PARTITION_KEY.to_string(),
    })?;
    let state = item.get_bool(ATTR_STATE).ok_or_else(|| RowCodecError::MissingAttribute {
        attribute: ATTR_STATE.to_string(),
    })?;
    let encoded = item.get_str(ATTR_CREATED_AT).ok_or_else(|| RowCodecError::MissingAttribute {
        attribute: ATTR_CREATED_AT.to_string(),
    })?;
    let created_at =
        EventTime::parse_sortable(encoded).map_err(|_| RowCodecError::InvalidTimestamp {
            encoded: encoded.to_string(),
        })?;
    Ok(Switch {
        id: SwitchId::new(id),
        state,
        created_at,
    })
}
