// crates/switch-ledger-core/src/interfaces/mod.rs
// ============================================================================
// Module: Switch Ledger Backend Interfaces
// Description: Backend-agnostic capability surface for conditional writes.
// Purpose: Define the key-value contract the ordering protocol relies on.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! Switch Ledger integrates with its backing store through one capability:
//! an atomic multi-row conditional write plus point reads and fixed
//! key-condition queries. Implementations must evaluate every condition
//! against current row state inside the same atomic unit that applies the
//! writes; a single failing condition leaves every row in the group
//! unchanged.
//!
//! Condition expressions are deliberately tiny: attribute `<` comparison and
//! attribute existence, composable with `NOT` and `AND`. That vocabulary is
//! exactly what the ordering protocol needs to express "update only if
//! strictly older" and "create only if this exact key does not yet exist".

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Attribute Names
// ============================================================================

/// Attribute carrying a row's partition key.
pub const ATTR_PARTITION_KEY: &str = "pk";
/// Attribute carrying a row's sort key.
pub const ATTR_SORT_KEY: &str = "sk";

// ============================================================================
// SECTION: Items
// ============================================================================

/// A single attribute value stored in a row.
///
/// # Invariants
/// - Ordering comparisons are defined only between two `S` values
///   (lexicographic); any other pairing fails the comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttributeValue {
    /// UTF-8 string value.
    S(String),
    /// Boolean value.
    Bool(bool),
}

impl AttributeValue {
    /// Returns the string payload when this is an `S` value.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::S(value) => Some(value),
            Self::Bool(_) => None,
        }
    }

    /// Returns the boolean payload when this is a `Bool` value.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::S(_) => None,
            Self::Bool(value) => Some(*value),
        }
    }

    /// Returns true when `self < other` under the backend comparison rules.
    ///
    /// Mismatched or non-comparable types compare false, matching the
    /// fail-closed behavior of condition evaluation.
    #[must_use]
    pub fn less_than(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::S(lhs), Self::S(rhs)) => lhs < rhs,
            _ => false,
        }
    }
}

/// Addressing key of one row: partition plus sort component.
///
/// # Invariants
/// - Ordering is partition-major so rows of one partition are contiguous in
///   sorted storage.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RowKey {
    /// Partition key grouping related rows.
    pub partition: String,
    /// Sort key distinguishing rows within a partition.
    pub sort: String,
}

impl RowKey {
    /// Creates a row key from partition and sort components.
    #[must_use]
    pub fn new(partition: impl Into<String>, sort: impl Into<String>) -> Self {
        Self {
            partition: partition.into(),
            sort: sort.into(),
        }
    }
}

/// One stored row: an ordered map of attribute names to values.
///
/// # Invariants
/// - A well-formed item carries its own key under [`ATTR_PARTITION_KEY`] and
///   [`ATTR_SORT_KEY`] as `S` values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Item {
    /// Attribute map in stable name order.
    attributes: BTreeMap<String, AttributeValue>,
}

impl Item {
    /// Creates an item pre-populated with the key attributes for `key`.
    #[must_use]
    pub fn for_key(key: &RowKey) -> Self {
        let mut item = Self::default();
        item.set(ATTR_PARTITION_KEY, AttributeValue::S(key.partition.clone()));
        item.set(ATTR_SORT_KEY, AttributeValue::S(key.sort.clone()));
        item
    }

    /// Sets an attribute, replacing any previous value.
    pub fn set(&mut self, attribute: impl Into<String>, value: AttributeValue) {
        self.attributes.insert(attribute.into(), value);
    }

    /// Builder-style variant of [`Item::set`].
    #[must_use]
    pub fn with(mut self, attribute: impl Into<String>, value: AttributeValue) -> Self {
        self.set(attribute, value);
        self
    }

    /// Returns the attribute value, if present.
    #[must_use]
    pub fn get(&self, attribute: &str) -> Option<&AttributeValue> {
        self.attributes.get(attribute)
    }

    /// Returns the attribute as a string slice when present and of type `S`.
    #[must_use]
    pub fn get_str(&self, attribute: &str) -> Option<&str> {
        self.get(attribute).and_then(AttributeValue::as_str)
    }

    /// Returns the attribute as a boolean when present and of type `Bool`.
    #[must_use]
    pub fn get_bool(&self, attribute: &str) -> Option<bool> {
        self.get(attribute).and_then(AttributeValue::as_bool)
    }

    /// Extracts the row key carried in the item's key attributes.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Invalid`] when either key attribute is missing
    /// or not a string.
    pub fn key(&self) -> Result<RowKey, BackendError> {
        let partition = self
            .get_str(ATTR_PARTITION_KEY)
            .ok_or_else(|| BackendError::Invalid("item is missing the pk attribute".to_string()))?;
        let sort = self
            .get_str(ATTR_SORT_KEY)
            .ok_or_else(|| BackendError::Invalid("item is missing the sk attribute".to_string()))?;
        Ok(RowKey::new(partition, sort))
    }
}

// ============================================================================
// SECTION: Conditions
// ============================================================================

/// Condition expression evaluated server-side against the addressed row.
///
/// # Invariants
/// - Evaluation is total: a missing row fails both `LessThan` and
///   `AttributeExists`, so `Not(AttributeExists(..))` holds on absent rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// Holds when the stored attribute exists and is strictly less than
    /// `value`.
    LessThan {
        /// Attribute to compare.
        attribute: String,
        /// Candidate value forming the upper bound.
        value: AttributeValue,
    },
    /// Holds when the stored row exists and carries the attribute.
    AttributeExists {
        /// Attribute whose presence is tested.
        attribute: String,
    },
    /// Logical negation.
    Not(Box<Condition>),
    /// Logical conjunction.
    And(Box<Condition>, Box<Condition>),
}

impl Condition {
    /// Convenience constructor for "this exact key does not yet exist".
    #[must_use]
    pub fn row_not_exists() -> Self {
        Self::Not(Box::new(Self::AttributeExists {
            attribute: ATTR_PARTITION_KEY.to_string(),
        }))
    }

    /// Evaluates the condition against the currently stored row, if any.
    #[must_use]
    pub fn evaluate(&self, stored: Option<&Item>) -> bool {
        match self {
            Self::LessThan {
                attribute,
                value,
            } => stored
                .and_then(|item| item.get(attribute))
                .is_some_and(|current| current.less_than(value)),
            Self::AttributeExists {
                attribute,
            } => stored.is_some_and(|item| item.get(attribute).is_some()),
            Self::Not(inner) => !inner.evaluate(stored),
            Self::And(lhs, rhs) => lhs.evaluate(stored) && rhs.evaluate(stored),
        }
    }
}

// ============================================================================
// SECTION: Write Operations
// ============================================================================

/// One attribute assignment applied by an update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    /// Attribute to set.
    pub attribute: String,
    /// Value to store.
    pub value: AttributeValue,
}

impl Assignment {
    /// Creates an assignment.
    #[must_use]
    pub fn new(attribute: impl Into<String>, value: AttributeValue) -> Self {
        Self {
            attribute: attribute.into(),
            value,
        }
    }
}

/// Full-row put guarded by an optional condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutOp {
    /// Complete row to store, including its key attributes.
    pub item: Item,
    /// Optional guard evaluated against the currently stored row.
    pub condition: Option<Condition>,
    /// When true, a condition failure returns the pre-failure row.
    pub return_values_on_failure: bool,
}

/// In-place attribute update guarded by an optional condition.
///
/// # Invariants
/// - When no row exists and the condition passes, the update creates the row
///   from its key plus assignments (upsert semantics).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateOp {
    /// Key of the row to update.
    pub key: RowKey,
    /// Attribute assignments applied on success.
    pub assignments: Vec<Assignment>,
    /// Optional guard evaluated against the currently stored row.
    pub condition: Option<Condition>,
    /// When true, a condition failure returns the pre-failure row.
    pub return_values_on_failure: bool,
}

/// One operation inside a conditional transactional write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOp {
    /// Store a complete row.
    Put(PutOp),
    /// Update attributes of one row.
    Update(UpdateOp),
}

impl WriteOp {
    /// Returns the key of the row this operation addresses.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Invalid`] when a put item lacks key attributes.
    pub fn target_key(&self) -> Result<RowKey, BackendError> {
        match self {
            Self::Put(put) => put.item.key(),
            Self::Update(update) => Ok(update.key.clone()),
        }
    }

    /// Returns the guard condition attached to this operation, if any.
    #[must_use]
    pub const fn condition(&self) -> Option<&Condition> {
        match self {
            Self::Put(put) => put.condition.as_ref(),
            Self::Update(update) => update.condition.as_ref(),
        }
    }

    /// Returns true when the operation requested pre-failure values.
    #[must_use]
    pub const fn wants_previous(&self) -> bool {
        match self {
            Self::Put(put) => put.return_values_on_failure,
            Self::Update(update) => update.return_values_on_failure,
        }
    }
}

// ============================================================================
// SECTION: Queries
// ============================================================================

/// Sort-key bound of a fixed key-condition query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortKeyCondition {
    /// Rows whose sort key starts with the prefix.
    BeginsWith(String),
    /// Rows whose sort key is lexicographically `<=` the bound.
    AtMost(String),
}

impl SortKeyCondition {
    /// Returns true when `sort` satisfies the bound.
    #[must_use]
    pub fn matches(&self, sort: &str) -> bool {
        match self {
            Self::BeginsWith(prefix) => sort.starts_with(prefix.as_str()),
            Self::AtMost(bound) => sort <= bound.as_str(),
        }
    }
}

/// Fixed key-condition query over one partition.
///
/// # Invariants
/// - Results are ordered by sort key, ascending unless `scan_forward` is
///   false.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    /// Partition to read.
    pub partition: String,
    /// Sort-key bound selecting rows within the partition.
    pub sort: SortKeyCondition,
    /// Sort direction; false reads newest-sort-key first.
    pub scan_forward: bool,
    /// Optional cap on the number of returned rows.
    pub limit: Option<usize>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Low-level backend errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
/// - Messages avoid embedding row payloads.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// Backend I/O error.
    #[error("backend io error: {0}")]
    Io(String),
    /// Backend engine error.
    #[error("backend error: {0}")]
    Backend(String),
    /// Malformed request rejected before execution.
    #[error("backend invalid request: {0}")]
    Invalid(String),
}

/// Per-operation outcome attached to a canceled transaction.
///
/// # Invariants
/// - `item` is populated only when the operation both requested pre-failure
///   values and addressed an existing row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancellationReason {
    /// True when this operation's condition failed.
    pub condition_failed: bool,
    /// Pre-failure row, when requested and present.
    pub item: Option<Item>,
}

impl CancellationReason {
    /// Outcome for an operation whose condition passed.
    #[must_use]
    pub const fn passed() -> Self {
        Self {
            condition_failed: false,
            item: None,
        }
    }

    /// Outcome for an operation whose condition failed.
    #[must_use]
    pub const fn condition_failed(item: Option<Item>) -> Self {
        Self {
            condition_failed: true,
            item,
        }
    }
}

/// Detail of a canceled conditional transaction.
///
/// # Invariants
/// - `reasons` has one entry per submitted operation, in submission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionCancellation {
    /// Per-operation cancellation outcomes.
    pub reasons: Vec<CancellationReason>,
}

/// Errors returned by [`KeyValueBackend::transact_write`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransactWriteError {
    /// One or more conditions failed; no row was changed.
    #[error("conditional transaction canceled")]
    Canceled(TransactionCancellation),
    /// Low-level backend failure.
    #[error(transparent)]
    Backend(#[from] BackendError),
}

// ============================================================================
// SECTION: Backend Capability
// ============================================================================

/// Backend-agnostic key-value capability with atomic conditional writes.
pub trait KeyValueBackend {
    /// Reads one row by key.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] when the read fails.
    fn get(&self, key: &RowKey) -> Result<Option<Item>, BackendError>;

    /// Runs a fixed key-condition query over one partition.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] when the query fails.
    fn query(&self, request: &QueryRequest) -> Result<Vec<Item>, BackendError>;

    /// Applies a group of conditional writes atomically.
    ///
    /// Either every operation commits, or a [`TransactWriteError::Canceled`]
    /// reports per-operation outcomes and no row changes.
    ///
    /// # Errors
    ///
    /// Returns [`TransactWriteError`] on condition failure or backend error.
    fn transact_write(&self, ops: &[WriteOp]) -> Result<(), TransactWriteError>;
}

impl<B: KeyValueBackend + ?Sized> KeyValueBackend for &B {
    fn get(&self, key: &RowKey) -> Result<Option<Item>, BackendError> {
        (**self).get(key)
    }

    fn query(&self, request: &QueryRequest) -> Result<Vec<Item>, BackendError> {
        (**self).query(request)
    }

    fn transact_write(&self, ops: &[WriteOp]) -> Result<(), TransactWriteError> {
        (**self).transact_write(ops)
    }
}

impl<B: KeyValueBackend + ?Sized> KeyValueBackend for Arc<B> {
    fn get(&self, key: &RowKey) -> Result<Option<Item>, BackendError> {
        (**self).get(key)
    }

    fn query(&self, request: &QueryRequest) -> Result<Vec<Item>, BackendError> {
        (**self).query(request)
    }

    fn transact_write(&self, ops: &[WriteOp]) -> Result<(), TransactWriteError> {
        (**self).transact_write(ops)
    }
}

// ============================================================================
// SECTION: Shared Backend Wrapper
// ============================================================================

/// Shared key-value backend backed by an `Arc` trait object.
#[derive(Clone)]
pub struct SharedKeyValueBackend {
    /// Inner backend implementation.
    inner: Arc<dyn KeyValueBackend + Send + Sync>,
}

impl SharedKeyValueBackend {
    /// Wraps a backend in a shared, clonable wrapper.
    #[must_use]
    pub fn from_backend(backend: impl KeyValueBackend + Send + Sync + 'static) -> Self {
        Self {
            inner: Arc::new(backend),
        }
    }

    /// Wraps an existing shared backend.
    #[must_use]
    pub const fn new(backend: Arc<dyn KeyValueBackend + Send + Sync>) -> Self {
        Self {
            inner: backend,
        }
    }
}

impl KeyValueBackend for SharedKeyValueBackend {
    fn get(&self, key: &RowKey) -> Result<Option<Item>, BackendError> {
        self.inner.get(key)
    }

    fn query(&self, request: &QueryRequest) -> Result<Vec<Item>, BackendError> {
        self.inner.query(request)
    }

    fn transact_write(&self, ops: &[WriteOp]) -> Result<(), TransactWriteError> {
        self.inner.transact_write(ops)
    }
}
