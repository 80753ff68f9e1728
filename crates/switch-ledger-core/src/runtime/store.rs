// crates/switch-ledger-core/src/runtime/store.rs
// ============================================================================
// Module: Switch Ledger In-Memory Backend
// Description: Mutex-guarded map backend implementing conditional writes.
// Purpose: Provide a process-local backend for tests and embedding.
// Dependencies: std::sync, crate::interfaces
// ============================================================================

//! ## Overview
//! [`MemoryBackend`] keeps every row in a `BTreeMap` ordered by
//! [`RowKey`], so partition queries are range scans. A transaction holds the
//! map lock across evaluation and application: every condition is checked
//! against the pre-transaction state, and mutations apply only if all
//! conditions pass. Cancellation reports one [`CancellationReason`] per
//! operation in submission order.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::PoisonError;

use crate::interfaces::BackendError;
use crate::interfaces::CancellationReason;
use crate::interfaces::Item;
use crate::interfaces::KeyValueBackend;
use crate::interfaces::QueryRequest;
use crate::interfaces::RowKey;
use crate::interfaces::TransactWriteError;
use crate::interfaces::TransactionCancellation;
use crate::interfaces::WriteOp;

// ============================================================================
// SECTION: Memory Backend
// ============================================================================

/// Process-local backend over a mutex-guarded ordered map.
///
/// # Invariants
/// - Conditions evaluate against the state as of transaction entry; no
///   partial application is ever visible.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    /// Rows ordered partition-major by [`RowKey`].
    rows: Mutex<BTreeMap<RowKey, Item>>,
}

impl MemoryBackend {
    /// Creates an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows currently stored. Test and diagnostics aid.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Backend`] if the row lock is poisoned.
    pub fn row_count(&self) -> Result<usize, BackendError> {
        Ok(self.rows.lock().map_err(poisoned)?.len())
    }
}

/// Maps a poisoned lock to a backend error.
fn poisoned<T>(_: PoisonError<T>) -> BackendError {
    BackendError::Backend("row lock poisoned".to_string())
}

impl KeyValueBackend for MemoryBackend {
    fn get(&self, key: &RowKey) -> Result<Option<Item>, BackendError> {
        let rows = self.rows.lock().map_err(poisoned)?;
        Ok(rows.get(key).cloned())
    }

    fn query(&self, request: &QueryRequest) -> Result<Vec<Item>, BackendError> {
        let rows = self.rows.lock().map_err(poisoned)?;
        let lower = RowKey::new(request.partition.clone(), String::new());
        let mut matched: Vec<Item> = rows
            .range(lower..)
            .take_while(|(key, _)| key.partition == request.partition)
            .filter(|(key, _)| request.sort.matches(&key.sort))
            .map(|(_, item)| item.clone())
            .collect();
        if !request.scan_forward {
            matched.reverse();
        }
        if let Some(limit) = request.limit {
            matched.truncate(limit);
        }
        Ok(matched)
    }

    fn transact_write(&self, ops: &[WriteOp]) -> Result<(), TransactWriteError> {
        let mut rows = self.rows.lock().map_err(poisoned)?;

        // Two ops addressing the same row would make the evaluate-then-apply
        // split ambiguous; reject the transaction outright.
        for (index, op) in ops.iter().enumerate() {
            let target = op.target_key().map_err(TransactWriteError::Backend)?;
            for earlier in &ops[..index] {
                let earlier_key = earlier.target_key().map_err(TransactWriteError::Backend)?;
                if earlier_key == target {
                    return Err(TransactWriteError::Backend(BackendError::Invalid(format!(
                        "duplicate target key in transaction: {}/{}",
                        target.partition, target.sort
                    ))));
                }
            }
        }

        // Evaluate every condition against the pre-transaction state.
        let mut reasons = Vec::with_capacity(ops.len());
        let mut failed = false;
        for op in ops {
            let target = op.target_key().map_err(TransactWriteError::Backend)?;
            let existing = rows.get(&target);
            let passes = op.condition().is_none_or(|cond| cond.evaluate(existing));
            if passes {
                reasons.push(CancellationReason::passed());
            } else {
                failed = true;
                let item = if op.wants_previous() {
                    existing.cloned()
                } else {
                    None
                };
                reasons.push(CancellationReason::condition_failed(item));
            }
        }
        if failed {
            return Err(TransactWriteError::Canceled(TransactionCancellation {
                reasons,
            }));
        }

        // All conditions passed; apply every mutation.
        for op in ops {
            match op {
                WriteOp::Put(put) => {
                    let key = put.item.key().map_err(TransactWriteError::Backend)?;
                    rows.insert(key, put.item.clone());
                }
                WriteOp::Update(update) => {
                    let entry = rows
                        .entry(update.key.clone())
                        .or_insert_with(|| Item::for_key(&update.key));
                    for assignment in &update.assignments {
                        entry.set(&assignment.attribute, assignment.value.clone());
                    }
                }
            }
        }
        Ok(())
    }
}
