//! Season store: the canonical in-memory document, its mutation operations,
//! and local persistence.
//!
//! [`SeasonStore`] owns the one [`SeasonDocument`] for this device. Every
//! mutation computes a new document value, stamps fresh conflict-resolution
//! metadata, persists the whole document to a [`LocalStore`] slot, and
//! broadcasts the result to observers (the sync client among them).
//! Persistence failures are non-fatal: the in-memory document stays
//! authoritative and the next mutation's write is the retry.
//!
//! # Modules
//!
//! - [`storage`] -- The [`LocalStore`] slot trait, file and in-memory impls
//! - [`device`] -- Device identity: load-or-create the persistent token
//! - [`chat`] -- Banned-word filtering applied at write time
//! - [`share`] -- Share-code export/import (base64 JSON blob)
//! - [`store`] -- The [`SeasonStore`] itself
//! - [`error`] -- Error types
//!
//! [`SeasonDocument`]: throwdown_types::SeasonDocument

pub mod chat;
pub mod device;
pub mod error;
pub mod share;
pub mod storage;
pub mod store;

pub use error::{StorageError, StoreError};
pub use storage::{FileStore, LocalStore, MemoryStore};
pub use store::{DocUpdate, SeasonStore, UpdateOrigin};
