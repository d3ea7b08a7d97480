//! The sync client: connects a [`SeasonStore`] to a [`DocumentBackend`].
//!
//! While connected, two background tasks run per connection:
//!
//! - **inbound** drains the backend subscription, runs every delivery
//!   through [`evaluate_remote`], and applies accepted documents to the
//!   store wholesale.
//! - **outbound** watches the store's local-update broadcast and pushes a
//!   fresh snapshot after a trailing-edge debounce, so a burst of edits
//!   costs one write.
//!
//! Disconnecting aborts both tasks. The store stays fully usable offline;
//! the client only ever moves complete documents between it and the
//! backend.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use throwdown_store::{DocUpdate, SeasonStore, UpdateOrigin};
use throwdown_types::{SeasonDocument, SyncSettings};

use crate::backend::{DocumentBackend, SubscriptionHandle};
use crate::error::SyncError;
use crate::policy::{MergeDecision, evaluate_remote};

/// Quiet window after the last local edit before a push goes out.
const DEBOUNCE_WINDOW: Duration = Duration::from_millis(600);

/// Inbound delivery buffer between the backend subscription and the
/// merge loop.
const INBOUND_CHANNEL_CAPACITY: usize = 16;

// ============================================================================
// Status
// ============================================================================

/// Connection lifecycle as observed by callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncStatus {
    /// Not connected and not trying to be.
    Idle,
    /// `connect` is in flight.
    Connecting,
    /// Subscription live, pushes flowing.
    Connected,
    /// The connection failed or was lost; the message says why.
    Error(String),
}

impl SyncStatus {
    /// The wire/storage form used in [`SyncSettings::status`].
    #[must_use]
    pub fn as_label(&self) -> &str {
        match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Error(_) => "error",
        }
    }
}

// ============================================================================
// Client
// ============================================================================

struct Connection {
    subscription: SubscriptionHandle,
    inbound: JoinHandle<()>,
    outbound: JoinHandle<()>,
}

impl Connection {
    fn shut_down(&self) {
        self.subscription.stop();
        self.inbound.abort();
        self.outbound.abort();
    }
}

/// Replication client binding one store to one backend room at a time.
pub struct SyncClient {
    store: Arc<SeasonStore>,
    backend: Arc<dyn DocumentBackend>,
    status: Arc<Mutex<SyncStatus>>,
    connection: Mutex<Option<Connection>>,
}

impl SyncClient {
    /// Create a client in the [`SyncStatus::Idle`] state.
    #[must_use]
    pub fn new(store: Arc<SeasonStore>, backend: Arc<dyn DocumentBackend>) -> Self {
        Self {
            store,
            backend,
            status: Arc::new(Mutex::new(SyncStatus::Idle)),
            connection: Mutex::new(None),
        }
    }

    /// Current connection status.
    pub fn status(&self) -> SyncStatus {
        match self.status.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn set_status(&self, status: SyncStatus) {
        match self.status.lock() {
            Ok(mut guard) => *guard = status,
            Err(mut poisoned) => **poisoned.get_mut() = status,
        }
    }

    fn persist_settings(&self, connected: bool, room_id: &str, credentials: &str) {
        let settings = SyncSettings {
            connected,
            status: self.status().as_label().to_owned(),
            room_id: room_id.to_owned(),
            credentials: credentials.to_owned(),
        };
        self.store.save_sync_settings(&settings);
    }

    /// Connect to a room and start replicating.
    ///
    /// An empty or whitespace room ID fails before any backend work and
    /// leaves the store untouched. Calling while already connected tears
    /// the old connection down first. The current local document is pushed
    /// once before the subscription opens: the backend's timestamp
    /// arbitration makes this a merge, so offline edits reach the room
    /// without an older room snapshot ever clobbering them locally.
    ///
    /// # Errors
    ///
    /// [`SyncError::MissingRoomId`] for a blank room, plus whatever the
    /// backend's authenticate/subscribe path returns. All failures are
    /// also recorded in the status and persisted settings.
    pub async fn connect(&self, room_id: &str, credentials: &str) -> Result<(), SyncError> {
        let room_id = room_id.trim();
        if room_id.is_empty() {
            let err = SyncError::MissingRoomId;
            self.set_status(SyncStatus::Error(err.to_string()));
            self.persist_settings(false, room_id, credentials);
            return Err(err);
        }

        self.disconnect();
        self.set_status(SyncStatus::Connecting);

        let result = self.establish(room_id, credentials).await;
        match result {
            Ok(connection) => {
                match self.connection.lock() {
                    Ok(mut guard) => *guard = Some(connection),
                    Err(mut poisoned) => **poisoned.get_mut() = Some(connection),
                }
                self.set_status(SyncStatus::Connected);
                self.persist_settings(true, room_id, credentials);
                info!(room = %room_id, "Sync connected");
                Ok(())
            }
            Err(err) => {
                self.set_status(SyncStatus::Error(err.to_string()));
                self.persist_settings(false, room_id, credentials);
                warn!(room = %room_id, error = %err, "Sync connection failed");
                Err(err)
            }
        }
    }

    async fn establish(&self, room_id: &str, credentials: &str) -> Result<Connection, SyncError> {
        let writer = self.backend.authenticate(credentials).await?;
        debug!(writer = %writer.as_str(), "Authenticated with backend");

        // Push before subscribing. put_merge arbitrates by updated_at, so
        // a newer offline state replaces the room and the subscription's
        // first delivery is then our own write (a self-echo), while an
        // older local state loses and arrives back through the inbound
        // path.
        let snapshot = self.store.document();
        self.backend.put_merge(room_id, &snapshot).await?;

        let (tx, rx) = mpsc::channel(INBOUND_CHANNEL_CAPACITY);
        let subscription = self.backend.subscribe(room_id, tx).await?;

        let inbound = tokio::spawn(inbound_loop(
            Arc::clone(&self.store),
            Arc::clone(&self.status),
            rx,
        ));
        let outbound = tokio::spawn(outbound_loop(
            Arc::clone(&self.store),
            Arc::clone(&self.backend),
            room_id.to_owned(),
        ));

        Ok(Connection {
            subscription,
            inbound,
            outbound,
        })
    }

    /// Stop replicating. Idempotent; the store keeps working locally.
    pub fn disconnect(&self) {
        let previous = match self.connection.lock() {
            Ok(mut guard) => guard.take(),
            Err(mut poisoned) => poisoned.get_mut().take(),
        };
        if let Some(connection) = previous {
            connection.shut_down();
            info!("Sync disconnected");
        }
        self.set_status(SyncStatus::Idle);
        let settings = self.store.load_sync_settings();
        self.store.save_sync_settings(&SyncSettings {
            connected: false,
            status: SyncStatus::Idle.as_label().to_owned(),
            ..settings
        });
    }
}

impl Drop for SyncClient {
    fn drop(&mut self) {
        let previous = match self.connection.lock() {
            Ok(mut guard) => guard.take(),
            Err(mut poisoned) => poisoned.get_mut().take(),
        };
        if let Some(connection) = previous {
            connection.shut_down();
        }
    }
}

// ============================================================================
// Background tasks
// ============================================================================

/// Drain the subscription, filter through the merge policy, apply accepted
/// documents wholesale.
async fn inbound_loop(
    store: Arc<SeasonStore>,
    status: Arc<Mutex<SyncStatus>>,
    mut rx: mpsc::Receiver<SeasonDocument>,
) {
    let device = store.device();
    let mut last_accepted = None;

    while let Some(remote) = rx.recv().await {
        match evaluate_remote(&remote.meta, device, last_accepted) {
            MergeDecision::Accept => {
                debug!(
                    version = remote.meta.version,
                    updated_by = %remote.meta.updated_by,
                    "Accepting remote document"
                );
                last_accepted = Some(remote.meta.updated_at);
                store.apply_remote(remote);
            }
            MergeDecision::SelfEcho => {
                debug!("Ignoring self-echo");
            }
            MergeDecision::Stale => {
                debug!(version = remote.meta.version, "Ignoring stale remote document");
            }
        }
    }

    // The channel closing while we were still connected means the
    // subscription died underneath us.
    let mut guard = match status.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    if *guard == SyncStatus::Connected {
        warn!("Subscription closed unexpectedly");
        *guard = SyncStatus::Error("subscription closed".to_owned());
    }
}

fn debounce_deadline() -> tokio::time::Instant {
    tokio::time::Instant::now()
        .checked_add(DEBOUNCE_WINDOW)
        .unwrap_or_else(tokio::time::Instant::now)
}

/// Watch local store updates and push snapshots after a trailing-edge
/// debounce.
async fn outbound_loop(
    store: Arc<SeasonStore>,
    backend: Arc<dyn DocumentBackend>,
    room_id: String,
) {
    let mut updates = store.subscribe();
    let mut pending: Option<SeasonDocument> = None;
    let timer = tokio::time::sleep(DEBOUNCE_WINDOW);
    tokio::pin!(timer);

    loop {
        tokio::select! {
            update = updates.recv() => {
                match update {
                    Ok(DocUpdate { document, origin: UpdateOrigin::Local }) => {
                        pending = Some(document);
                        timer.as_mut().reset(debounce_deadline());
                    }
                    // Remote applications never bounce back out.
                    Ok(DocUpdate { origin: UpdateOrigin::Remote, .. }) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!(skipped, "Outbound lagged; re-snapshotting");
                        pending = Some(store.document());
                        timer.as_mut().reset(debounce_deadline());
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            () = &mut timer, if pending.is_some() => {
                if let Some(document) = pending.take() {
                    debug!(version = document.meta.version, "Pushing document");
                    if let Err(err) = backend.put_merge(&room_id, &document).await {
                        // Not fatal: the next local edit schedules another
                        // push carrying the full document anyway.
                        warn!(error = %err, "Push failed; will retry on next edit");
                    }
                }
            }
        }
    }
}
