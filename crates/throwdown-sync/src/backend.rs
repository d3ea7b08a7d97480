//! The contract a replicated document backend must satisfy.
//!
//! The client is written against this trait so the replication substrate
//! can be swapped without touching the state machine. [`MemoryBackend`]
//! implements it in-process for tests; a production implementation would
//! wrap a hosted document store.
//!
//! [`MemoryBackend`]: crate::memory::MemoryBackend

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use throwdown_types::SeasonDocument;

use crate::error::SyncError;

/// Opaque identity the backend assigns to an authenticated writer.
///
/// Informational only: merge decisions key on the document's own
/// `updated_by` device ID, never on this.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriterId(String);

impl WriterId {
    /// Wrap a backend-assigned identity string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identity as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Handle to a live subscription; dropping it does NOT stop delivery,
/// call [`SubscriptionHandle::stop`].
#[derive(Debug)]
pub struct SubscriptionHandle {
    task: JoinHandle<()>,
}

impl SubscriptionHandle {
    /// Wrap the forwarding task that feeds the subscriber channel.
    #[must_use]
    pub fn new(task: JoinHandle<()>) -> Self {
        Self { task }
    }

    /// Stop delivery. Idempotent.
    pub fn stop(&self) {
        self.task.abort();
    }
}

/// A replicated whole-document store keyed by room ID.
///
/// The backend stores at most one document per room and notifies
/// subscribers on every write. It performs no merge arbitration beyond
/// retaining a last-writer-wins "latest" snapshot for late joiners; the
/// client's merge policy filters everything else.
#[async_trait]
pub trait DocumentBackend: Send + Sync {
    /// Validate the opaque credentials string and establish a writer
    /// identity.
    async fn authenticate(&self, credentials: &str) -> Result<WriterId, SyncError>;

    /// Subscribe to a room. The current document (if any) is delivered
    /// first, then every subsequent write, in commit order for this
    /// backend. Delivery stops when the handle is stopped or the
    /// receiver is dropped.
    async fn subscribe(
        &self,
        room_id: &str,
        tx: mpsc::Sender<SeasonDocument>,
    ) -> Result<SubscriptionHandle, SyncError>;

    /// Publish a document to a room, replacing the stored snapshot if the
    /// incoming one is newer.
    async fn put_merge(&self, room_id: &str, document: &SeasonDocument) -> Result<(), SyncError>;
}
