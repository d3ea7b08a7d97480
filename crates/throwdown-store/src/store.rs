//! The season store: canonical document ownership and mutation operations.
//!
//! Every mutation follows one path: take the lock, compute the new document
//! value, stamp fresh meta (now, local device, version + 1), release the
//! lock, persist the whole document, broadcast to observers. Mutations are
//! serialized through the single document lock — there is one logical
//! writer per device, and cross-device concurrency is handled entirely by
//! the sync layer's merge policy.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use throwdown_points::{clamp_to_weekly_cap, nominal_points, weight_loss_points};
use throwdown_types::{
    Activity, ActivityKind, ChatMessage, DeviceId, Player, PlayerId, ScoringConfig,
    SeasonDocument, SyncSettings, WeekKey, WeighIn,
};

use crate::chat::filter_banned;
use crate::device;
use crate::error::StoreError;
use crate::share;
use crate::storage::{DOCUMENT_SLOT, LocalStore, SETTINGS_SLOT, read_json, write_json};

/// Capacity of the document-update broadcast channel.
///
/// A subscriber that falls behind by more than this many updates receives a
/// `Lagged` error and should resynchronize from [`SeasonStore::document`].
const BROADCAST_CAPACITY: usize = 256;

/// Where a document update originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOrigin {
    /// A mutation performed on this device. The sync client pushes these.
    Local,
    /// A document accepted from a remote writer. Never pushed back.
    Remote,
}

/// A document change delivered to observers.
#[derive(Debug, Clone)]
pub struct DocUpdate {
    /// The full document after the change.
    pub document: SeasonDocument,
    /// Where the change came from.
    pub origin: UpdateOrigin,
}

/// Owner of the canonical season document.
///
/// Cheap to share behind an [`std::sync::Arc`]; all methods take `&self`.
pub struct SeasonStore {
    device: DeviceId,
    storage: Box<dyn LocalStore>,
    document: Mutex<SeasonDocument>,
    tx: broadcast::Sender<DocUpdate>,
}

impl SeasonStore {
    /// Open a store over the given local storage.
    ///
    /// Restores the persisted document if one exists, otherwise creates the
    /// default two-player document. The device identity is loaded or
    /// generated as a side effect.
    pub fn open(storage: Box<dyn LocalStore>) -> Result<Self, StoreError> {
        let device = device::load_or_create(storage.as_ref())?;
        let document = match read_json::<SeasonDocument>(storage.as_ref(), DOCUMENT_SLOT) {
            Ok(Some(doc)) => doc,
            Ok(None) => SeasonDocument::new_default(device),
            Err(e) => {
                warn!(error = %e, "Persisted document unreadable, starting fresh");
                SeasonDocument::new_default(device)
            }
        };
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Ok(Self {
            device,
            storage,
            document: Mutex::new(document),
            tx,
        })
    }

    /// This device's identity token.
    pub const fn device(&self) -> DeviceId {
        self.device
    }

    /// A snapshot of the current document.
    pub fn document(&self) -> SeasonDocument {
        self.document
            .lock()
            .map_or_else(|e| e.into_inner().clone(), |doc| doc.clone())
    }

    /// Subscribe to document updates.
    pub fn subscribe(&self) -> broadcast::Receiver<DocUpdate> {
        self.tx.subscribe()
    }

    // =========================================================================
    // Domain mutations
    // =========================================================================

    /// Log an activity for a player and credit the capped point grant.
    ///
    /// Returns the points actually granted, which may be zero once the
    /// player's weekly total reaches the cap — the activity is still
    /// recorded.
    pub fn log_activity(
        &self,
        player_id: &PlayerId,
        kind: ActivityKind,
        magnitude: u32,
        note: &str,
    ) -> Result<u32, StoreError> {
        let now = Utc::now();
        let week = WeekKey::from_datetime(&now);
        let granted = self.mutate(|doc| {
            let cap = doc.config.weekly_point_cap;
            let nominal = nominal_points(kind, magnitude, &doc.config.points);
            let player = doc
                .player_mut(player_id)
                .ok_or_else(|| StoreError::UnknownPlayer(player_id.clone()))?;
            let used = player.points_used_in_week(&week);
            let granted = clamp_to_weekly_cap(nominal, used, cap);
            player.activities.push(Activity {
                kind,
                value: Decimal::from(magnitude),
                note: note.to_owned(),
                points: granted,
                when: now,
                week_key: week.clone(),
            });
            player.points = player.points.saturating_add(granted);
            Ok(granted)
        })?;
        debug!(player = %player_id, ?kind, granted, "Activity logged");
        Ok(granted)
    }

    /// Record a weigh-in and grant any newly unlocked weight-loss points.
    ///
    /// One atomic mutation from one snapshot: the first weigh-in fixes the
    /// start weight, the current weight and history always update, and the
    /// lifetime loss entitlement is compared against what was already
    /// awarded under [`ActivityKind::WeighInTotal`]. A positive delta is
    /// granted through the same weekly-cap clamp as any other activity; a
    /// clamped remainder stays grantable at a later weigh-in.
    ///
    /// Returns the points granted (zero for no new loss).
    pub fn record_weigh_in(
        &self,
        player_id: &PlayerId,
        weight: Decimal,
        when: DateTime<Utc>,
    ) -> Result<u32, StoreError> {
        let week = WeekKey::from_datetime(&when);
        let granted = self.mutate(|doc| {
            let cap = doc.config.weekly_point_cap;
            let per_lb = doc.config.weight_points_per_lb;
            let player = doc
                .player_mut(player_id)
                .ok_or_else(|| StoreError::UnknownPlayer(player_id.clone()))?;

            let start = player.start_weight.unwrap_or(weight);
            if player.start_weight.is_none() {
                player.start_weight = Some(weight);
            }
            player.current_weight = Some(weight);
            player.history.push(WeighIn { when, weight });

            let total_loss = start.saturating_sub(weight).max(Decimal::ZERO);
            let already = player.weigh_in_points_awarded();
            let unlocked = weight_loss_points(total_loss, per_lb, already);
            let used = player.points_used_in_week(&week);
            let granted = clamp_to_weekly_cap(unlocked, used, cap);
            if granted > 0 {
                player.activities.push(Activity {
                    kind: ActivityKind::WeighInTotal,
                    value: total_loss,
                    note: String::new(),
                    points: granted,
                    when,
                    week_key: week.clone(),
                });
                player.points = player.points.saturating_add(granted);
            }
            Ok(granted)
        })?;
        debug!(player = %player_id, %weight, granted, "Weigh-in recorded");
        Ok(granted)
    }

    /// Append a chat message, filtering banned words at write time.
    pub fn append_chat(&self, from: &str, text: &str) -> Result<(), StoreError> {
        self.mutate(|doc| {
            let clean = filter_banned(text, &doc.config.banned_words);
            doc.chat.push(ChatMessage {
                from: from.to_owned(),
                text: clean,
                when: Utc::now(),
            });
            Ok(())
        })
    }

    /// Replace the scoring configuration wholesale.
    ///
    /// Past weeks are never re-evaluated against the new cap; the clamp
    /// only reads config at grant time.
    pub fn update_config(&self, config: ScoringConfig) -> Result<(), StoreError> {
        self.mutate(|doc| {
            doc.config = config;
            Ok(())
        })
    }

    /// Replace the player list wholesale.
    pub fn update_players(&self, players: Vec<Player>) -> Result<(), StoreError> {
        self.mutate(|doc| {
            doc.players = players;
            Ok(())
        })
    }

    /// Append a reward idea to the configuration.
    pub fn add_reward_idea(&self, idea: &str) -> Result<(), StoreError> {
        self.mutate(|doc| {
            doc.config.reward_ideas.push(idea.to_owned());
            Ok(())
        })
    }

    /// Roll the season over in place.
    ///
    /// Preserves the scoring config and each player's identity, name, and
    /// recorded weights; zeroes points, activities, and history; clears the
    /// chat; increments the season counter; restarts the season clock.
    pub fn reset_season(&self) -> Result<(), StoreError> {
        self.mutate(|doc| {
            for player in &mut doc.players {
                player.points = 0;
                player.activities.clear();
                player.history.clear();
            }
            doc.chat.clear();
            doc.season_index = doc.season_index.saturating_add(1);
            doc.started_at = Utc::now();
            Ok(())
        })
    }

    // =========================================================================
    // Replication entry points
    // =========================================================================

    /// Accept a remote document wholesale.
    ///
    /// No field-level merge and no local stamp: the candidate's own meta is
    /// preserved so the sync layer's monotonicity guard keeps working. The
    /// update is persisted and re-broadcast with [`UpdateOrigin::Remote`] so
    /// the sync client does not push it back.
    ///
    /// Callers are expected to have applied the merge policy already; the
    /// store replaces unconditionally.
    pub fn apply_remote(&self, candidate: SeasonDocument) {
        let snapshot = {
            match self.document.lock() {
                Ok(mut doc) => {
                    *doc = candidate;
                    doc.clone()
                }
                Err(poisoned) => {
                    let mut doc = poisoned.into_inner();
                    *doc = candidate;
                    doc.clone()
                }
            }
        };
        self.persist(&snapshot);
        let _ = self.tx.send(DocUpdate {
            document: snapshot,
            origin: UpdateOrigin::Remote,
        });
    }

    // =========================================================================
    // Share codes
    // =========================================================================

    /// Export the current document as an opaque share-code blob.
    pub fn export_share_code(&self) -> Result<String, StoreError> {
        share::encode(&self.document())
    }

    /// Import a share-code blob, replacing the current document.
    ///
    /// A malformed blob returns [`StoreError::InvalidShareCode`] and leaves
    /// the document unchanged. A valid import reproduces the exported
    /// document exactly, embedded meta included — no local stamp. It is
    /// still broadcast as a local update so a connected sync client pushes
    /// the imported state.
    pub fn import_share_code(&self, blob: &str) -> Result<(), StoreError> {
        let imported = share::decode(blob)?;
        let snapshot = {
            let mut doc = match self.document.lock() {
                Ok(doc) => doc,
                Err(poisoned) => poisoned.into_inner(),
            };
            *doc = imported;
            doc.clone()
        };
        self.persist(&snapshot);
        let _ = self.tx.send(DocUpdate {
            document: snapshot,
            origin: UpdateOrigin::Local,
        });
        Ok(())
    }

    // =========================================================================
    // Projections
    // =========================================================================

    /// Players ordered by points, highest first. Ties keep document order.
    pub fn leaderboard(&self) -> Vec<Player> {
        let mut players = self.document().players;
        players.sort_by(|a, b| b.points.cmp(&a.points));
        players
    }

    // =========================================================================
    // Sync settings slot
    // =========================================================================

    /// Load the persisted sync settings, defaulting when absent or
    /// unreadable.
    pub fn load_sync_settings(&self) -> SyncSettings {
        match read_json::<SyncSettings>(self.storage.as_ref(), SETTINGS_SLOT) {
            Ok(Some(settings)) => settings,
            Ok(None) => SyncSettings::default(),
            Err(e) => {
                warn!(error = %e, "Sync settings slot unreadable, using defaults");
                SyncSettings::default()
            }
        }
    }

    /// Persist the sync settings. Failures are logged, not surfaced.
    pub fn save_sync_settings(&self, settings: &SyncSettings) {
        if let Err(e) = write_json(self.storage.as_ref(), SETTINGS_SLOT, settings) {
            warn!(error = %e, "Failed to persist sync settings");
        }
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Run a mutation under the document lock, stamp, persist, broadcast.
    ///
    /// The closure sees the document before stamping; if it errors, nothing
    /// is stamped, persisted, or broadcast.
    fn mutate<R>(
        &self,
        op: impl FnOnce(&mut SeasonDocument) -> Result<R, StoreError>,
    ) -> Result<R, StoreError> {
        let (result, snapshot) = {
            let mut doc = match self.document.lock() {
                Ok(doc) => doc,
                Err(poisoned) => poisoned.into_inner(),
            };
            let result = op(&mut doc)?;
            doc.stamp(self.device);
            (result, doc.clone())
        };
        self.persist(&snapshot);
        let _ = self.tx.send(DocUpdate {
            document: snapshot,
            origin: UpdateOrigin::Local,
        });
        Ok(result)
    }

    /// Persist the document. Write failures are non-fatal: the in-memory
    /// document stays authoritative and the next mutation retries.
    fn persist(&self, document: &SeasonDocument) {
        if let Err(e) = write_json(self.storage.as_ref(), DOCUMENT_SLOT, document) {
            warn!(error = %e, "Failed to persist document, in-memory state remains authoritative");
        }
    }
}
