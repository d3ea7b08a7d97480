//! Sync client: optional cross-device replication of the season document.
//!
//! The season store is local-first and fully functional offline; this crate
//! bridges it to an external replicated document store under a coarse
//! whole-document last-writer-wins policy. Concurrency exists only across
//! devices and is resolved entirely by the merge policy — no locks, no
//! transactions, no server-side arbitration.
//!
//! # Modules
//!
//! - [`backend`] -- The [`DocumentBackend`] contract the client depends on
//! - [`memory`] -- In-process backend for tests and local demos
//! - [`policy`] -- The pure merge-decision function
//! - [`client`] -- The [`SyncClient`] state machine and its tasks
//! - [`error`] -- Error types

pub mod backend;
pub mod client;
pub mod error;
pub mod memory;
pub mod policy;

pub use backend::{DocumentBackend, SubscriptionHandle, WriterId};
pub use client::{SyncClient, SyncStatus};
pub use error::SyncError;
pub use memory::MemoryBackend;
pub use policy::{MergeDecision, evaluate_remote};
