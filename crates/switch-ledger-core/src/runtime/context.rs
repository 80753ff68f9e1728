// crates/switch-ledger-core/src/runtime/context.rs
// ============================================================================
// Module: Switch Ledger Call Context
// Description: Deadline and cancellation token threaded through store calls.
// Purpose: Let callers bound the total latency of retrying operations.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Every store operation takes a [`StoreContext`]. The context is checked
//! before each backend call and before each retry pause, so a deadline or an
//! explicit cancel bounds the whole retry-to-convergence loop rather than a
//! single backend round trip.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::time::Duration;
use std::time::Instant;

use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Context expiry conditions.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ContextError {
    /// The context deadline passed before the operation completed.
    #[error("deadline exceeded")]
    DeadlineExceeded,
    /// The caller canceled the operation.
    #[error("operation canceled")]
    Canceled,
}

// ============================================================================
// SECTION: Store Context
// ============================================================================

/// Deadline/cancellation token for store operations.
///
/// # Invariants
/// - An unbounded context never expires.
/// - Once expired or canceled, a context stays expired.
#[derive(Debug, Clone, Default)]
pub struct StoreContext {
    /// Absolute point after which the operation must stop.
    deadline: Option<Instant>,
    /// Shared cancel flag raised by a [`CancelHandle`].
    cancel: Option<Arc<AtomicBool>>,
}

impl StoreContext {
    /// Creates a context with no deadline and no cancel handle.
    #[must_use]
    pub const fn unbounded() -> Self {
        Self {
            deadline: None,
            cancel: None,
        }
    }

    /// Creates a context expiring `timeout` from now.
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    /// Creates a context expiring at an absolute instant.
    #[must_use]
    pub const fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            cancel: None,
        }
    }

    /// Attaches a cancel flag, returning the context and its handle.
    #[must_use]
    pub fn cancellable(mut self) -> (Self, CancelHandle) {
        let flag = Arc::new(AtomicBool::new(false));
        self.cancel = Some(Arc::clone(&flag));
        (self, CancelHandle {
            flag,
        })
    }

    /// Returns the time left before the deadline, if one is set.
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline.map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Clamps a pause to the remaining deadline budget.
    #[must_use]
    pub fn clamp(&self, pause: Duration) -> Duration {
        self.remaining().map_or(pause, |remaining| pause.min(remaining))
    }

    /// Verifies the context is still live.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError::Canceled`] when the cancel flag is raised, or
    /// [`ContextError::DeadlineExceeded`] when the deadline has passed.
    pub fn ensure_active(&self) -> Result<(), ContextError> {
        if self.cancel.as_ref().is_some_and(|flag| flag.load(Ordering::Acquire)) {
            return Err(ContextError::Canceled);
        }
        if self.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            return Err(ContextError::DeadlineExceeded);
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Cancel Handle
// ============================================================================

/// Handle raising the cancel flag of a [`StoreContext`].
#[derive(Debug, Clone)]
pub struct CancelHandle {
    /// Flag shared with the associated context.
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    /// Cancels every operation using the associated context.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }
}
