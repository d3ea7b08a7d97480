//! Error types for the sync layer.

/// Errors that can occur while connecting to or talking with the document
/// backend.
///
/// Merge conflicts are deliberately absent: they are resolved by policy,
/// never surfaced as errors. Transient push failures are also absent from
/// the connect path — they are swallowed by the outbound task and retried
/// implicitly on the next debounced push.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// No room ID was supplied.
    #[error("room ID required")]
    MissingRoomId,

    /// The opaque credentials string was rejected before any network work.
    #[error("invalid credentials: {0}")]
    Credentials(String),

    /// The backend rejected the authentication attempt.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// A transport-level failure while subscribing or pushing.
    #[error("transport error: {0}")]
    Transport(String),
}
