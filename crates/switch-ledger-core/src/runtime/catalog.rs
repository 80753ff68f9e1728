// crates/switch-ledger-core/src/runtime/catalog.rs
// ============================================================================
// Module: Switch Ledger Sensor Catalog
// Description: Sensor registry with readings and a location index.
// Purpose: Register sensors, record readings, and answer placement queries.
// Dependencies: crate::{core, interfaces, runtime::context}
// ============================================================================

//! ## Overview
//! [`SensorCatalog`] keeps each sensor in a two-row shape: an info row in the
//! sensor's own partition and an index row in the city partition, written
//! together atomically so a sensor is never discoverable by location without
//! its info row existing. Readings share the sensor partition under a
//! time-encoded sort key that orders lexicographically before the info row,
//! so one descending query returns the info row followed by the newest
//! readings.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::identifiers::SensorId;
use crate::core::state::Location;
use crate::core::state::Reading;
use crate::core::state::Sensor;
use crate::core::time::EventTime;
use crate::interfaces::AttributeValue;
use crate::interfaces::BackendError;
use crate::interfaces::Condition;
use crate::interfaces::Item;
use crate::interfaces::KeyValueBackend;
use crate::interfaces::PutOp;
use crate::interfaces::QueryRequest;
use crate::interfaces::RowKey;
use crate::interfaces::SortKeyCondition;
use crate::interfaces::TransactWriteError;
use crate::interfaces::WriteOp;
use crate::runtime::context::ContextError;
use crate::runtime::context::StoreContext;

// ============================================================================
// SECTION: Row Layout
// ============================================================================

/// Partition-key prefix of sensor partitions.
pub const SENSOR_PARTITION_PREFIX: &str = "SENSOR#";
/// Sort key of the sensor info row.
pub const SENSOR_INFO_SORT_KEY: &str = "SENSORINFO";
/// Sort-key prefix of reading rows; sorts before the info row.
pub const READING_SORT_PREFIX: &str = "READ#";
/// Partition-key prefix of city index partitions.
pub const CITY_PARTITION_PREFIX: &str = "CITY#";

/// Attribute carrying the sensor identifier.
pub const ATTR_SENSOR_ID: &str = "id";
/// Attribute carrying the city label.
pub const ATTR_CITY: &str = "city";
/// Attribute carrying the building label.
pub const ATTR_BUILDING: &str = "building";
/// Attribute carrying the floor label.
pub const ATTR_FLOOR: &str = "floor";
/// Attribute carrying the room label.
pub const ATTR_ROOM: &str = "room";
/// Attribute carrying a reading's reported value.
pub const ATTR_VALUE: &str = "value";
/// Attribute carrying a reading's domain timestamp.
pub const ATTR_READ_AT: &str = "read_at";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Sensor catalog errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// Low-level backend failure, propagated verbatim.
    #[error(transparent)]
    Backend(#[from] BackendError),
    /// The sensor identifier is already registered.
    #[error("sensor already registered: {id}")]
    AlreadyRegistered {
        /// Identifier that was registered before.
        id: SensorId,
    },
    /// No sensor is registered under the identifier.
    #[error("sensor not found: {id}")]
    NotFound {
        /// Identifier with no info row.
        id: SensorId,
    },
    /// The context deadline passed before the call completed.
    #[error("deadline exceeded")]
    DeadlineExceeded,
    /// The caller canceled the call.
    #[error("operation canceled")]
    Canceled,
    /// A stored catalog row failed to decode.
    #[error("stored catalog row is corrupt: {0}")]
    Corrupt(String),
}

impl From<ContextError> for CatalogError {
    fn from(error: ContextError) -> Self {
        match error {
            ContextError::DeadlineExceeded => Self::DeadlineExceeded,
            ContextError::Canceled => Self::Canceled,
        }
    }
}

// ============================================================================
// SECTION: Sensor Catalog
// ============================================================================

/// Sensor registry over a conditional-write backend.
///
/// # Invariants
/// - The info row and the city index row of one sensor commit together or
///   not at all.
#[derive(Debug, Clone)]
pub struct SensorCatalog<B> {
    /// Backend providing reads, queries, and conditional writes.
    backend: B,
}

impl<B: KeyValueBackend> SensorCatalog<B> {
    /// Creates a sensor catalog over a backend.
    #[must_use]
    pub const fn new(backend: B) -> Self {
        Self {
            backend,
        }
    }

    /// Registers a sensor, rejecting duplicate identifiers.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::AlreadyRegistered`] when the identifier is
    /// taken, and context/backend errors otherwise.
    pub fn register(&self, ctx: &StoreContext, sensor: &Sensor) -> Result<(), CatalogError> {
        ctx.ensure_active()?;
        let info = WriteOp::Put(PutOp {
            item: sensor_info_row(sensor),
            condition: Some(Condition::row_not_exists()),
            return_values_on_failure: false,
        });
        let index = WriteOp::Put(PutOp {
            item: city_index_row(sensor),
            condition: None,
            return_values_on_failure: false,
        });
        match self.backend.transact_write(&[info, index]) {
            Ok(()) => Ok(()),
            Err(TransactWriteError::Canceled(_)) => Err(CatalogError::AlreadyRegistered {
                id: sensor.id.clone(),
            }),
            Err(TransactWriteError::Backend(error)) => Err(error.into()),
        }
    }

    /// Returns a registered sensor.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] when the identifier is unknown, and
    /// context/backend errors otherwise.
    pub fn get(&self, ctx: &StoreContext, id: &SensorId) -> Result<Sensor, CatalogError> {
        ctx.ensure_active()?;
        let item = self
            .backend
            .get(&sensor_info_row_key(id))?
            .ok_or_else(|| CatalogError::NotFound {
                id: id.clone(),
            })?;
        decode_sensor(&item)
    }

    /// Records a reading under its sensor partition.
    ///
    /// Readings are write-once by timestamp; re-reporting the same instant
    /// overwrites the earlier value.
    ///
    /// # Errors
    ///
    /// Returns context/backend errors.
    pub fn save_reading(&self, ctx: &StoreContext, reading: &Reading) -> Result<(), CatalogError> {
        ctx.ensure_active()?;
        let put = WriteOp::Put(PutOp {
            item: reading_row(reading),
            condition: None,
            return_values_on_failure: false,
        });
        match self.backend.transact_write(&[put]) {
            Ok(()) => Ok(()),
            Err(TransactWriteError::Canceled(_)) => Err(CatalogError::Corrupt(
                "unconditional reading write was canceled".to_string(),
            )),
            Err(TransactWriteError::Backend(error)) => Err(error.into()),
        }
    }

    /// Returns the sensor and up to `count` readings, newest first.
    ///
    /// One descending query covers both: the info row carries the greatest
    /// sort key in the partition, so it arrives first, followed by readings
    /// in reverse time order.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] when the identifier is unknown, and
    /// context/backend errors otherwise.
    pub fn latest_readings(
        &self,
        ctx: &StoreContext,
        id: &SensorId,
        count: usize,
    ) -> Result<(Sensor, Vec<Reading>), CatalogError> {
        ctx.ensure_active()?;
        let items = self.backend.query(&QueryRequest {
            partition: sensor_partition(id),
            sort: SortKeyCondition::AtMost(SENSOR_INFO_SORT_KEY.to_string()),
            scan_forward: false,
            limit: Some(count.saturating_add(1)),
        })?;
        let mut iter = items.iter();
        let info = iter.next().ok_or_else(|| CatalogError::NotFound {
            id: id.clone(),
        })?;
        let sensor = decode_sensor(info)?;
        let readings = iter.map(decode_reading).collect::<Result<Vec<_>, _>>()?;
        Ok((sensor, readings))
    }

    /// Returns the identifiers of every sensor under a location filter.
    ///
    /// # Errors
    ///
    /// Returns context/backend errors, or [`CatalogError::Corrupt`] when an
    /// index row lacks its sensor identifier.
    pub fn sensors_at(
        &self,
        ctx: &StoreContext,
        location: &Location,
    ) -> Result<Vec<SensorId>, CatalogError> {
        ctx.ensure_active()?;
        let items = self.backend.query(&QueryRequest {
            partition: city_partition(&location.city),
            sort: SortKeyCondition::BeginsWith(location.as_sort_prefix()),
            scan_forward: true,
            limit: None,
        })?;
        items
            .iter()
            .map(|item| {
                item.get_str(ATTR_SENSOR_ID).map(SensorId::from).ok_or_else(|| {
                    CatalogError::Corrupt("index row is missing the sensor id".to_string())
                })
            })
            .collect()
    }
}

// ============================================================================
// SECTION: Row Codec
// ============================================================================

/// Partition key of a sensor's rows.
fn sensor_partition(id: &SensorId) -> String {
    format!("{SENSOR_PARTITION_PREFIX}{}", id.as_str())
}

/// Partition key of a city's index rows.
fn city_partition(city: &str) -> String {
    format!("{CITY_PARTITION_PREFIX}{city}")
}

/// Key of the info row for a sensor identifier.
#[must_use]
pub fn sensor_info_row_key(id: &SensorId) -> RowKey {
    RowKey::new(sensor_partition(id), SENSOR_INFO_SORT_KEY)
}

/// Encodes the info row for a sensor.
fn sensor_info_row(sensor: &Sensor) -> Item {
    Item::for_key(&sensor_info_row_key(&sensor.id))
        .with(ATTR_SENSOR_ID, AttributeValue::S(sensor.id.as_str().to_string()))
        .with(ATTR_CITY, AttributeValue::S(sensor.city.clone()))
        .with(ATTR_BUILDING, AttributeValue::S(sensor.building.clone()))
        .with(ATTR_FLOOR, AttributeValue::S(sensor.floor.clone()))
        .with(ATTR_ROOM, AttributeValue::S(sensor.room.clone()))
}

/// Encodes the city index row for a sensor.
fn city_index_row(sensor: &Sensor) -> Item {
    let sort = format!(
        "LOCATION#{}#{}#{}",
        sensor.building, sensor.floor, sensor.room
    );
    Item::for_key(&RowKey::new(city_partition(&sensor.city), sort))
        .with(ATTR_SENSOR_ID, AttributeValue::S(sensor.id.as_str().to_string()))
}

/// Encodes a reading row under its sensor partition.
fn reading_row(reading: &Reading) -> Item {
    let encoded = reading.read_at.encode_sortable();
    let key = RowKey::new(
        sensor_partition(&reading.sensor_id),
        format!("{READING_SORT_PREFIX}{encoded}"),
    );
    Item::for_key(&key)
        .with(ATTR_SENSOR_ID, AttributeValue::S(reading.sensor_id.as_str().to_string()))
        .with(ATTR_VALUE, AttributeValue::S(reading.value.clone()))
        .with(ATTR_READ_AT, AttributeValue::S(encoded))
}

/// Decodes a sensor from its info row.
fn decode_sensor(item: &Item) -> Result<Sensor, CatalogError> {
    let field = |attribute: &str| {
        item.get_str(attribute)
            .map(str::to_string)
            .ok_or_else(|| CatalogError::Corrupt(format!("info row is missing {attribute}")))
    };
    Ok(Sensor {
        id: SensorId::from(field(ATTR_SENSOR_ID)?),
        city: field(ATTR_CITY)?,
        building: field(ATTR_BUILDING)?,
        floor: field(ATTR_FLOOR)?,
        room: field(ATTR_ROOM)?,
    })
}

/// Decodes a reading from a reading row.
fn decode_reading(item: &Item) -> Result<Reading, CatalogError> {
    let sensor_id = item
        .get_str(ATTR_SENSOR_ID)
        .map(SensorId::from)
        .ok_or_else(|| CatalogError::Corrupt("reading row is missing the sensor id".to_string()))?;
    let value = item
        .get_str(ATTR_VALUE)
        .map(str::to_string)
        .ok_or_else(|| CatalogError::Corrupt("reading row is missing its value".to_string()))?;
    let encoded = item
        .get_str(ATTR_READ_AT)
        .ok_or_else(|| CatalogError::Corrupt("reading row is missing read_at".to_string()))?;
    let read_at = EventTime::parse_sortable(encoded)
        .map_err(|error| CatalogError::Corrupt(error.to_string()))?;
    Ok(Reading {
        sensor_id,
        value,
        read_at,
    })
}
