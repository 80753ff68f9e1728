// crates/switch-ledger-core/src/core/mod.rs
// ============================================================================
// Module: Switch Ledger Core Types
// Description: Canonical identifiers, timestamps, and domain entities.
// Purpose: Provide stable, serializable types shared by the runtime and
//          backend implementations.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! Core types define the entities Switch Ledger persists and the timestamp
//! encoding its ordering protocol depends on. These types are the canonical
//! source of truth for any derived surfaces.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod identifiers;
pub mod state;
pub mod time;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use identifiers::AliasId;
pub use identifiers::ExternalId;
pub use identifiers::SensorId;
pub use identifiers::SwitchId;
pub use state::Location;
pub use state::Reading;
pub use state::Sensor;
pub use state::Switch;
pub use time::EventTime;
pub use time::TimeCodecError;
