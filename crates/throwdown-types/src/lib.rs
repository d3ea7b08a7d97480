//! Shared type definitions for the Throwdown challenge tracker.
//!
//! This crate is the single source of truth for the season document — the
//! one mutable aggregate the whole workspace revolves around — and the
//! supporting value types. Everything here is plain data: serializable with
//! `serde`, no I/O, no side effects.
//!
//! # Modules
//!
//! - [`ids`] -- Typed identifiers for players and devices
//! - [`enums`] -- Enumeration types (activity kinds)
//! - [`document`] -- The season document aggregate and its parts
//! - [`week`] -- ISO-week bucketing for the weekly point cap

pub mod document;
pub mod enums;
pub mod ids;
pub mod week;

// Re-export all public types at crate root for convenience.
pub use document::{
    Activity, ActivityPoints, ChatMessage, DocMeta, Player, ScoringConfig, SeasonDocument,
    SyncSettings, WeighIn,
};
pub use enums::ActivityKind;
pub use ids::{DeviceId, PlayerId};
pub use week::WeekKey;
