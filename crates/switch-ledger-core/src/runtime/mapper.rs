// crates/switch-ledger-core/src/runtime/mapper.rs
// ============================================================================
// Module: Switch Ledger Identity Mapper
// Description: Exactly-once mapping from external identities to aliases.
// Purpose: Assign each external identity one stable pseudonymous alias.
// Dependencies: rand, crate::{core, interfaces, runtime::context}
// ============================================================================

//! ## Overview
//! [`IdentityMapper`] assigns every external identity exactly one alias,
//! even under concurrent first lookups. The mapping is claimed with a
//! conditional put guarded by "this exact key does not yet exist" that
//! requests pre-failure values: the winner stores its candidate alias, and
//! every loser reads the winner's alias out of the cancellation detail
//! without a second round trip.

// ============================================================================
// SECTION: Imports
// ============================================================================

use rand::Rng;
use thiserror::Error;

use crate::core::identifiers::AliasId;
use crate::core::identifiers::ExternalId;
use crate::interfaces::AttributeValue;
use crate::interfaces::BackendError;
use crate::interfaces::Condition;
use crate::interfaces::Item;
use crate::interfaces::KeyValueBackend;
use crate::interfaces::PutOp;
use crate::interfaces::RowKey;
use crate::interfaces::TransactWriteError;
use crate::interfaces::WriteOp;
use crate::runtime::context::ContextError;
use crate::runtime::context::StoreContext;

// ============================================================================
// SECTION: Row Layout
// ============================================================================

/// Sort key of every identity-mapping row.
pub const IDENTITY_MAP_SORT_KEY: &str = "IDENTITY_MAP";
/// Attribute carrying the external identity.
pub const ATTR_EXTERNAL_ID: &str = "external_id";
/// Attribute carrying the assigned alias.
pub const ATTR_ALIAS_ID: &str = "alias_id";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Identity mapper errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MapperError {
    /// Low-level backend failure, propagated verbatim.
    #[error(transparent)]
    Backend(#[from] BackendError),
    /// The context deadline passed before the call completed.
    #[error("deadline exceeded")]
    DeadlineExceeded,
    /// The caller canceled the call.
    #[error("operation canceled")]
    Canceled,
    /// A stored mapping row failed to decode.
    #[error("stored mapping row is corrupt: {0}")]
    Corrupt(String),
}

impl From<ContextError> for MapperError {
    fn from(error: ContextError) -> Self {
        match error {
            ContextError::DeadlineExceeded => Self::DeadlineExceeded,
            ContextError::Canceled => Self::Canceled,
        }
    }
}

// ============================================================================
// SECTION: Identity Mapper
// ============================================================================

/// Exactly-once external-identity-to-alias mapper.
///
/// # Invariants
/// - For a given external identity, every call across every process returns
///   the same alias.
#[derive(Debug, Clone)]
pub struct IdentityMapper<B> {
    /// Backend providing the conditional-write capability.
    backend: B,
}

impl<B: KeyValueBackend> IdentityMapper<B> {
    /// Creates an identity mapper over a backend.
    #[must_use]
    pub const fn new(backend: B) -> Self {
        Self {
            backend,
        }
    }

    /// Returns the alias for an external identity, assigning one on first
    /// use.
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::Corrupt`] when a concurrent winner's row lacks
    /// its alias attribute, and context/backend errors otherwise.
    pub fn alias_for(
        &self,
        ctx: &StoreContext,
        external: &ExternalId,
    ) -> Result<AliasId, MapperError> {
        ctx.ensure_active()?;
        let candidate = AliasId::new(random_hex_128());
        let claim = WriteOp::Put(PutOp {
            item: mapping_row(external, &candidate),
            condition: Some(Condition::row_not_exists()),
            return_values_on_failure: true,
        });
        match self.backend.transact_write(&[claim]) {
            Ok(()) => Ok(candidate),
            Err(TransactWriteError::Canceled(cancellation)) => {
                let existing = cancellation
                    .reasons
                    .into_iter()
                    .next()
                    .and_then(|reason| reason.item)
                    .ok_or_else(|| {
                        MapperError::Corrupt(
                            "claim canceled without a pre-failure mapping row".to_string(),
                        )
                    })?;
                decode_alias(&existing)
            }
            Err(TransactWriteError::Backend(error)) => Err(error.into()),
        }
    }
}

// ============================================================================
// SECTION: Row Codec
// ============================================================================

/// Key of the mapping row for an external identity.
#[must_use]
pub fn mapping_row_key(external: &ExternalId) -> RowKey {
    RowKey::new(external.as_str(), IDENTITY_MAP_SORT_KEY)
}

/// Encodes a mapping row for an external identity and alias.
fn mapping_row(external: &ExternalId, alias: &AliasId) -> Item {
    Item::for_key(&mapping_row_key(external))
        .with(ATTR_EXTERNAL_ID, AttributeValue::S(external.as_str().to_string()))
        .with(ATTR_ALIAS_ID, AttributeValue::S(alias.as_str().to_string()))
}

/// Decodes the alias carried by a mapping row.
fn decode_alias(item: &Item) -> Result<AliasId, MapperError> {
    item.get_str(ATTR_ALIAS_ID)
        .map(AliasId::from)
        .ok_or_else(|| MapperError::Corrupt("mapping row is missing alias_id".to_string()))
}

/// Lowercase hex digits for alias rendering.
const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

/// Generates a fresh 128-bit alias rendered as lowercase hex.
fn random_hex_128() -> String {
    let bytes: [u8; 16] = rand::thread_rng().r#gen();
    let mut rendered = String::with_capacity(32);
    for byte in bytes {
        rendered.push(char::from(HEX_DIGITS[usize::from(byte >> 4)]));
        rendered.push(char::from(HEX_DIGITS[usize::from(byte & 0x0f)]));
    }
    rendered
}
