//! Error types for the store layer.

use throwdown_types::PlayerId;

/// Errors that can occur in local storage.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Reading or writing a slot failed at the filesystem level.
    #[error("storage I/O error on slot `{slot}`: {source}")]
    Io {
        /// The slot being accessed.
        slot: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A slot held content that could not be (de)serialized.
    #[error("storage serialization error on slot `{slot}`: {source}")]
    Serialization {
        /// The slot being accessed.
        slot: String,
        /// The underlying JSON error.
        source: serde_json::Error,
    },
}

/// Errors that can occur in season store operations.
///
/// Local storage write failures are deliberately absent: they are non-fatal
/// and only logged (the in-memory document stays authoritative). What is
/// surfaced here are genuine caller errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The referenced player does not exist in the document.
    #[error("unknown player: {0}")]
    UnknownPlayer(PlayerId),

    /// A share code could not be decoded into a valid document.
    #[error("invalid share code: {0}")]
    InvalidShareCode(String),

    /// Loading initial state from local storage failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
}
