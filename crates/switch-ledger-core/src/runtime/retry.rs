// crates/switch-ledger-core/src/runtime/retry.rs
// ============================================================================
// Module: Switch Ledger Retry Policy
// Description: Bounded retry budget with jittered exponential backoff.
// Purpose: Replace unbounded creation-race restarts with a terminal budget.
// Dependencies: rand, serde
// ============================================================================

//! ## Overview
//! The creation-race restart in [`crate::runtime::toggle::ToggleStore::save`]
//! is bounded by a [`RetryPolicy`]. Each restart waits a full-jitter
//! exponential backoff; an exhausted budget surfaces a conflict error instead
//! of retrying forever under sustained contention.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::num::NonZeroU32;
use std::time::Duration;

use rand::Rng;
use serde::Deserialize;

// ============================================================================
// SECTION: Defaults
// ============================================================================

/// Default number of creation-race attempts before giving up.
const DEFAULT_MAX_ATTEMPTS: u32 = 8;
/// Default base backoff in milliseconds.
const DEFAULT_BASE_BACKOFF_MS: u64 = 10;
/// Default backoff cap in milliseconds.
const DEFAULT_MAX_BACKOFF_MS: u64 = 500;

/// Returns the default attempt budget.
fn default_max_attempts() -> NonZeroU32 {
    NonZeroU32::new(DEFAULT_MAX_ATTEMPTS).unwrap_or(NonZeroU32::MIN)
}

/// Returns the default base backoff in milliseconds.
const fn default_base_backoff_ms() -> u64 {
    DEFAULT_BASE_BACKOFF_MS
}

/// Returns the default backoff cap in milliseconds.
const fn default_max_backoff_ms() -> u64 {
    DEFAULT_MAX_BACKOFF_MS
}

// ============================================================================
// SECTION: Retry Policy
// ============================================================================

/// Retry budget for the creation-race restart loop.
///
/// # Invariants
/// - `max_attempts` is non-zero by construction.
/// - Backoff for attempt `n` is drawn uniformly from
///   `0..=min(max_backoff, base_backoff * 2^n)` (full jitter).
#[derive(Debug, Clone, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts allowed, counting the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: NonZeroU32,
    /// Base backoff in milliseconds.
    #[serde(default = "default_base_backoff_ms")]
    pub base_backoff_ms: u64,
    /// Backoff cap in milliseconds.
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_backoff_ms: DEFAULT_BASE_BACKOFF_MS,
            max_backoff_ms: DEFAULT_MAX_BACKOFF_MS,
        }
    }
}

impl RetryPolicy {
    /// Returns the attempt budget as a plain count.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts.get()
    }

    /// Draws the jittered pause preceding the given retry attempt.
    ///
    /// `attempt` is 1-based: the pause before the first retry uses `1`.
    #[must_use]
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.min(16);
        let scaled = self
            .base_backoff_ms
            .saturating_mul(1_u64.checked_shl(exponent).unwrap_or(u64::MAX));
        let cap = scaled.min(self.max_backoff_ms);
        if cap == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::thread_rng().gen_range(0..=cap))
    }
}
