// crates/switch-ledger-core/src/runtime/toggle.rs
// ============================================================================
// Module: Switch Ledger Toggle Store
// Description: Last-writer-wins toggle store over conditional transactions.
// Purpose: Persist switch events so the latest pointer always reflects the
//          event with the greatest domain timestamp.
// Dependencies: crate::{core, interfaces, runtime::{context, retry, rows}}
// ============================================================================

//! ## Overview
//! [`ToggleStore`] owns the ordering protocol. A save is two conditional
//! transactions at most:
//!
//! 1. **Phase 1** updates the latest pointer guarded by `created_at < new`
//!    and puts the log row in the same atomic group. A cancellation that
//!    returns the pre-failure pointer means a newer-or-equal event already
//!    won; the save is a silent no-op. A cancellation with no pre-failure
//!    row means no pointer exists yet.
//! 2. **Phase 2** creates the pointer guarded by "this exact key does not
//!    yet exist", again together with the log row. A cancellation here means
//!    a concurrent first writer won the creation race; the save restarts
//!    from Phase 1 after a jittered pause, bounded by the retry budget.
//!
//! The store never reads outside a guarded transaction, so there is no
//! read-modify-write window. Log rows are written only in the winning
//! transaction; losing events persist nothing.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::thread;

use thiserror::Error;

use crate::core::identifiers::SwitchId;
use crate::core::state::Switch;
use crate::interfaces::Assignment;
use crate::interfaces::AttributeValue;
use crate::interfaces::BackendError;
use crate::interfaces::Condition;
use crate::interfaces::Item;
use crate::interfaces::KeyValueBackend;
use crate::interfaces::PutOp;
use crate::interfaces::TransactWriteError;
use crate::interfaces::UpdateOp;
use crate::interfaces::WriteOp;
use crate::runtime::context::ContextError;
use crate::runtime::context::StoreContext;
use crate::runtime::retry::RetryPolicy;
use crate::runtime::rows;
use crate::runtime::rows::RowCodecError;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Toggle store errors.
///
/// # Invariants
/// - Ordering losses and creation races are protocol-internal and never
///   appear here; `Conflict` is raised only once the retry budget is spent.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ToggleStoreError {
    /// Low-level backend failure, propagated verbatim.
    #[error(transparent)]
    Backend(#[from] BackendError),
    /// No latest pointer exists for the identity.
    #[error("switch not found: {id}")]
    NotFound {
        /// Identity that has no pointer row.
        id: SwitchId,
    },
    /// The creation race stayed unresolved past the retry budget.
    #[error("creation race unresolved for switch {id} after {attempts} attempts")]
    Conflict {
        /// Identity under contention.
        id: SwitchId,
        /// Attempts consumed before giving up.
        attempts: u32,
    },
    /// The context deadline passed before the call completed.
    #[error("deadline exceeded")]
    DeadlineExceeded,
    /// The caller canceled the call.
    #[error("operation canceled")]
    Canceled,
    /// A stored row failed to decode.
    #[error("stored row is corrupt: {0}")]
    Corrupt(String),
}

impl From<ContextError> for ToggleStoreError {
    fn from(error: ContextError) -> Self {
        match error {
            ContextError::DeadlineExceeded => Self::DeadlineExceeded,
            ContextError::Canceled => Self::Canceled,
        }
    }
}

impl From<RowCodecError> for ToggleStoreError {
    fn from(error: RowCodecError) -> Self {
        Self::Corrupt(error.to_string())
    }
}

// ============================================================================
// SECTION: Phase Outcomes
// ============================================================================

/// Outcome of the Phase 1 conditional update.
enum UpdateOutcome {
    /// The pointer moved and the log row committed.
    Committed,
    /// A newer-or-equal event already holds the pointer.
    LostOrdering,
    /// No pointer row exists yet for this identity.
    NoPointer,
}

/// Outcome of the Phase 2 creation attempt.
enum CreateOutcome {
    /// The pointer and log row were created.
    Committed,
    /// A concurrent first writer created the pointer.
    LostCreationRace,
}

// ============================================================================
// SECTION: Toggle Store
// ============================================================================

/// Last-writer-wins toggle store over a conditional-write backend.
///
/// # Invariants
/// - The latest pointer's `created_at` never decreases.
/// - A log row commits only together with a pointer transition it won.
#[derive(Debug, Clone)]
pub struct ToggleStore<B> {
    /// Backend providing the atomic conditional-write capability.
    backend: B,
    /// Budget bounding the creation-race restart loop.
    retry: RetryPolicy,
}

impl<B: KeyValueBackend> ToggleStore<B> {
    /// Creates a toggle store with the default retry policy.
    #[must_use]
    pub fn new(backend: B) -> Self {
        Self::with_retry_policy(backend, RetryPolicy::default())
    }

    /// Creates a toggle store with an explicit retry policy.
    #[must_use]
    pub const fn with_retry_policy(backend: B, retry: RetryPolicy) -> Self {
        Self {
            backend,
            retry,
        }
    }

    /// Persists a switch event under last-writer-wins semantics.
    ///
    /// Returns success even when the event loses the ordering race; losing
    /// events change nothing and persist nothing.
    ///
    /// # Errors
    ///
    /// Returns [`ToggleStoreError::Backend`] for non-condition backend
    /// failures, [`ToggleStoreError::Conflict`] when the creation race stays
    /// unresolved past the retry budget, and
    /// [`ToggleStoreError::DeadlineExceeded`] / [`ToggleStoreError::Canceled`]
    /// when the context expires.
    pub fn save(&self, ctx: &StoreContext, switch: &Switch) -> Result<(), ToggleStoreError> {
        let log_item = rows::log_row(switch);
        let mut attempt: u32 = 0;
        loop {
            ctx.ensure_active()?;
            match self.try_move_pointer(switch, &log_item)? {
                UpdateOutcome::Committed | UpdateOutcome::LostOrdering => return Ok(()),
                UpdateOutcome::NoPointer => {}
            }

            ctx.ensure_active()?;
            match self.try_create_pointer(switch, &log_item)? {
                CreateOutcome::Committed => return Ok(()),
                CreateOutcome::LostCreationRace => {
                    attempt += 1;
                    if attempt >= self.retry.max_attempts() {
                        return Err(ToggleStoreError::Conflict {
                            id: switch.id.clone(),
                            attempts: attempt,
                        });
                    }
                    let pause = ctx.clamp(self.retry.backoff_for(attempt));
                    if !pause.is_zero() {
                        thread::sleep(pause);
                    }
                }
            }
        }
    }

    /// Returns the currently-accepted switch for an identity.
    ///
    /// # Errors
    ///
    /// Returns [`ToggleStoreError::NotFound`] when no event was ever accepted
    /// for `id`, [`ToggleStoreError::Corrupt`] when the pointer row fails to
    /// decode, and context/backend errors as for [`ToggleStore::save`].
    pub fn latest(&self, ctx: &StoreContext, id: &SwitchId) -> Result<Switch, ToggleStoreError> {
        ctx.ensure_active()?;
        let item = self
            .backend
            .get(&rows::latest_row_key(id))?
            .ok_or_else(|| ToggleStoreError::NotFound {
                id: id.clone(),
            })?;
        Ok(rows::decode_switch(&item)?)
    }

    /// Phase 1: move the pointer if strictly older, with the log row.
    fn try_move_pointer(
        &self,
        switch: &Switch,
        log_item: &Item,
    ) -> Result<UpdateOutcome, ToggleStoreError> {
        let encoded = switch.created_at.encode_sortable();
        let update = WriteOp::Update(UpdateOp {
            key: rows::latest_row_key(&switch.id),
            assignments: vec![
                Assignment::new(rows::ATTR_CREATED_AT, AttributeValue::S(encoded.clone())),
                Assignment::new(rows::ATTR_STATE, AttributeValue::Bool(switch.state)),
            ],
            condition: Some(Condition::LessThan {
                attribute: rows::ATTR_CREATED_AT.to_string(),
                value: AttributeValue::S(encoded),
            }),
            return_values_on_failure: true,
        });
        let log = WriteOp::Put(PutOp {
            item: log_item.clone(),
            condition: None,
            return_values_on_failure: false,
        });

        match self.backend.transact_write(&[update, log]) {
            Ok(()) => Ok(UpdateOutcome::Committed),
            Err(TransactWriteError::Canceled(cancellation)) => {
                let pointer_exists =
                    cancellation.reasons.first().is_some_and(|reason| reason.item.is_some());
                if pointer_exists {
                    Ok(UpdateOutcome::LostOrdering)
                } else {
                    Ok(UpdateOutcome::NoPointer)
                }
            }
            Err(TransactWriteError::Backend(error)) => Err(error.into()),
        }
    }

    /// Phase 2: create the pointer guarded against a concurrent first writer.
    fn try_create_pointer(
        &self,
        switch: &Switch,
        log_item: &Item,
    ) -> Result<CreateOutcome, ToggleStoreError> {
        let create = WriteOp::Put(PutOp {
            item: rows::latest_row(switch),
            condition: Some(Condition::row_not_exists()),
            return_values_on_failure: false,
        });
        let log = WriteOp::Put(PutOp {
            item: log_item.clone(),
            condition: None,
            return_values_on_failure: false,
        });

        match self.backend.transact_write(&[create, log]) {
            Ok(()) => Ok(CreateOutcome::Committed),
            Err(TransactWriteError::Canceled(_)) => Ok(CreateOutcome::LostCreationRace),
            Err(TransactWriteError::Backend(error)) => Err(error.into()),
        }
    }
}
