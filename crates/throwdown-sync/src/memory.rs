//! In-process document backend.
//!
//! Backs the integration tests and local demos: rooms live in a map, each
//! room holds the last-writer-wins snapshot plus a broadcast channel that
//! fans adopted writes out to subscribers. Semantics deliberately mirror a
//! hosted document store — late joiners get the current snapshot, everyone
//! else sees room state changes in commit order; a superseded write is
//! absorbed without notification.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc};
use tracing::debug;

use throwdown_types::SeasonDocument;

use crate::backend::{DocumentBackend, SubscriptionHandle, WriterId};
use crate::error::SyncError;

/// Per-subscriber buffer before a slow reader starts lagging.
const ROOM_CHANNEL_CAPACITY: usize = 64;

struct Room {
    latest: Option<SeasonDocument>,
    tx: broadcast::Sender<SeasonDocument>,
}

impl Room {
    fn new() -> Self {
        let (tx, _) = broadcast::channel(ROOM_CHANNEL_CAPACITY);
        Self { latest: None, tx }
    }
}

/// In-memory [`DocumentBackend`] shared between clients in one process.
pub struct MemoryBackend {
    rooms: Mutex<HashMap<String, Room>>,
}

impl MemoryBackend {
    /// Create an empty backend with no rooms.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
        }
    }

    /// Snapshot + broadcast sender for a room, creating the room on first
    /// touch.
    fn room_state(&self, room_id: &str) -> (Option<SeasonDocument>, broadcast::Sender<SeasonDocument>) {
        let mut rooms = match self.rooms.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let room = rooms.entry(room_id.to_owned()).or_insert_with(Room::new);
        (room.latest.clone(), room.tx.clone())
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentBackend for MemoryBackend {
    async fn authenticate(&self, credentials: &str) -> Result<WriterId, SyncError> {
        // Credentials are an opaque JSON blob (project config pasted by the
        // user); the only validation possible before network work is that
        // it parses.
        let parsed: serde_json::Value = serde_json::from_str(credentials)
            .map_err(|err| SyncError::Credentials(err.to_string()))?;
        let writer = parsed
            .get("appId")
            .and_then(serde_json::Value::as_str)
            .unwrap_or("anonymous")
            .to_owned();
        Ok(WriterId::new(writer))
    }

    async fn subscribe(
        &self,
        room_id: &str,
        tx: mpsc::Sender<SeasonDocument>,
    ) -> Result<SubscriptionHandle, SyncError> {
        let (snapshot, broadcast_tx) = self.room_state(room_id);
        let mut broadcast_rx = broadcast_tx.subscribe();
        let room = room_id.to_owned();

        let task = tokio::spawn(async move {
            if let Some(doc) = snapshot {
                if tx.send(doc).await.is_err() {
                    return;
                }
            }
            loop {
                match broadcast_rx.recv().await {
                    Ok(doc) => {
                        if tx.send(doc).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!(room = %room, skipped, "subscriber lagged; continuing");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        Ok(SubscriptionHandle::new(task))
    }

    async fn put_merge(&self, room_id: &str, document: &SeasonDocument) -> Result<(), SyncError> {
        let tx = {
            let mut rooms = match self.rooms.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            let room = rooms.entry(room_id.to_owned()).or_insert_with(Room::new);
            let keep = match &room.latest {
                Some(current) => document.meta.supersedes(&current.meta),
                None => true,
            };
            if !keep {
                debug!(room = %room_id, "Discarding superseded write");
                return Ok(());
            }
            room.latest = Some(document.clone());
            room.tx.clone()
        };
        // Subscribers only ever see state the room actually adopted; a
        // superseded write is absorbed, never fanned out.
        let _ = tx.send(document.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::arithmetic_side_effects)]

    use super::*;
    use throwdown_types::DeviceId;

    #[tokio::test]
    async fn rejects_malformed_credentials() {
        let backend = MemoryBackend::new();
        let result = backend.authenticate("not json at all").await;
        assert!(matches!(result, Err(SyncError::Credentials(_))));
    }

    #[tokio::test]
    async fn accepts_json_credentials_and_reads_app_id() {
        let backend = MemoryBackend::new();
        let writer = backend
            .authenticate(r#"{"appId":"fit-battle","apiKey":"x"}"#)
            .await;
        assert!(matches!(writer, Ok(w) if w.as_str() == "fit-battle"));
    }

    #[tokio::test]
    async fn late_joiner_receives_current_snapshot() {
        let backend = MemoryBackend::new();
        let device = DeviceId::generate();
        let mut doc = SeasonDocument::new_default(device);
        doc.stamp(device);
        backend.put_merge("room-a", &doc).await.ok();

        let (tx, mut rx) = mpsc::channel(4);
        let handle = backend.subscribe("room-a", tx).await.ok();
        assert!(handle.is_some());

        let delivered = rx.recv().await;
        assert!(matches!(delivered, Some(d) if d.meta == doc.meta));
        if let Some(h) = handle {
            h.stop();
        }
    }

    #[tokio::test]
    async fn superseded_write_is_not_fanned_out() {
        let backend = MemoryBackend::new();
        let device = DeviceId::generate();

        let mut newer = SeasonDocument::new_default(device);
        newer.stamp(device);
        let mut older = newer.clone();
        older.meta.updated_at = newer.meta.updated_at - chrono::Duration::seconds(30);
        backend.put_merge("room-c", &newer).await.ok();

        let (tx, mut rx) = mpsc::channel(4);
        let handle = backend.subscribe("room-c", tx).await.ok();
        // Snapshot delivery for the late joiner.
        assert!(rx.recv().await.is_some());

        // The losing write is absorbed; nothing further is delivered.
        backend.put_merge("room-c", &older).await.ok();
        let quiet = tokio::time::timeout(std::time::Duration::from_millis(100), rx.recv()).await;
        assert!(quiet.is_err());
        if let Some(h) = handle {
            h.stop();
        }
    }

    #[tokio::test]
    async fn older_write_does_not_replace_snapshot() {
        let backend = MemoryBackend::new();
        let device = DeviceId::generate();

        let mut newer = SeasonDocument::new_default(device);
        newer.stamp(device);
        let mut older = newer.clone();
        older.meta.updated_at = newer.meta.updated_at - chrono::Duration::seconds(30);

        backend.put_merge("room-b", &newer).await.ok();
        backend.put_merge("room-b", &older).await.ok();

        let (tx, mut rx) = mpsc::channel(4);
        let handle = backend.subscribe("room-b", tx).await.ok();
        let delivered = rx.recv().await;
        assert!(matches!(delivered, Some(d) if d.meta == newer.meta));
        if let Some(h) = handle {
            h.stop();
        }
    }
}
