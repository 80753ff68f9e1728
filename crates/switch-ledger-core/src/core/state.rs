// crates/switch-ledger-core/src/core/state.rs
// ============================================================================
// Module: Switch Ledger Domain State
// Description: Switch events and sensor catalog entities.
// Purpose: Provide stable, serializable types for ledger operations.
// Dependencies: serde, crate::core::{identifiers, time}
// ============================================================================

//! ## Overview
//! Domain entities persisted through the key-value backend. A [`Switch`] is
//! one toggle event; the store keeps a mutable latest pointer and an
//! immutable log row per accepted event. [`Sensor`], [`Reading`], and
//! [`Location`] belong to the supplemental sensor catalog.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::SensorId;
use crate::core::identifiers::SwitchId;
use crate::core::time::EventTime;

// ============================================================================
// SECTION: Switch
// ============================================================================

/// One toggle event for an identity.
///
/// # Invariants
/// - `created_at` is the domain timestamp deciding last-writer-wins order;
///   arrival order at the store is irrelevant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Switch {
    /// Identity the event belongs to.
    pub id: SwitchId,
    /// Toggle value carried by the event.
    pub state: bool,
    /// Domain timestamp of the event.
    pub created_at: EventTime,
}

// ============================================================================
// SECTION: Sensor Catalog Entities
// ============================================================================

/// A registered sensor with its physical placement.
///
/// # Invariants
/// - Placement fields are opaque labels; the catalog derives the location
///   index key from them verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sensor {
    /// Sensor identifier.
    pub id: SensorId,
    /// City the sensor is installed in.
    pub city: String,
    /// Building label within the city.
    pub building: String,
    /// Floor label within the building.
    pub floor: String,
    /// Room label within the floor.
    pub room: String,
}

/// One measurement reported by a sensor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reading {
    /// Sensor the measurement belongs to.
    pub sensor_id: SensorId,
    /// Measured value as reported.
    pub value: String,
    /// Domain timestamp of the measurement.
    pub read_at: EventTime,
}

/// A location filter for sensor lookups, narrowing from city downward.
///
/// # Invariants
/// - `floor` is only considered when `building` is set; a floor without a
///   building selects the whole city.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// City to search in.
    pub city: String,
    /// Optional building filter.
    pub building: Option<String>,
    /// Optional floor filter within the building.
    pub floor: Option<String>,
}

impl Location {
    /// Returns the sort-key prefix selecting all index rows under this
    /// location.
    #[must_use]
    pub fn as_sort_prefix(&self) -> String {
        let Some(building) = &self.building else {
            return "LOCATION#".to_string();
        };
        match &self.floor {
            Some(floor) => format!("LOCATION#{building}#{floor}"),
            None => format!("LOCATION#{building}#"),
        }
    }
}
