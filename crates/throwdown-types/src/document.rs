//! The season document aggregate and its parts.
//!
//! [`SeasonDocument`] is the single root aggregate of the whole system. It is
//! owned exclusively by the season store, persisted as one JSON value, and
//! replicated wholesale — the conflict-resolution header in [`DocMeta`] is
//! the only machinery concurrent writers share.
//!
//! Field names serialize in camelCase, matching the document's JSON wire
//! format.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::enums::ActivityKind;
use crate::ids::{DeviceId, PlayerId};
use crate::week::WeekKey;

// ---------------------------------------------------------------------------
// Conflict-resolution metadata
// ---------------------------------------------------------------------------

/// Conflict-resolution header stamped on every local mutation.
///
/// `updated_at` and `updated_by` together form the last-writer-wins
/// discriminant: a document supersedes another when its `updated_at` is
/// strictly later, regardless of `version`. The version counter strictly
/// increases with every local mutation but is informational only.
///
/// Because the discriminant is wall-clock time, clock skew between devices
/// can make a logically older write win. This is a known property of the
/// design, not a bug to patch locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocMeta {
    /// Wall-clock time of the mutation.
    pub updated_at: DateTime<Utc>,
    /// The device that performed the mutation.
    pub updated_by: DeviceId,
    /// Monotonic local mutation counter. Informational only.
    pub version: u64,
}

impl DocMeta {
    /// Whether this header supersedes `other` under last-writer-wins.
    pub fn supersedes(&self, other: &Self) -> bool {
        self.updated_at > other.updated_at
    }
}

// ---------------------------------------------------------------------------
// Players and activities
// ---------------------------------------------------------------------------

/// A single weigh-in record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeighIn {
    /// When the weigh-in happened.
    pub when: DateTime<Utc>,
    /// The recorded weight in pounds.
    pub weight: Decimal,
}

/// A logged activity with the points actually granted for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    /// What kind of activity this is.
    pub kind: ActivityKind,
    /// Numeric magnitude; meaning depends on the kind (unit count for
    /// scaled kinds, total loss in pounds for `WeighInTotal`).
    pub value: Decimal,
    /// Free-text note.
    pub note: String,
    /// Points actually credited — may be below the nominal value when the
    /// weekly cap clamped the grant.
    pub points: u32,
    /// When the activity happened.
    pub when: DateTime<Utc>,
    /// ISO-week bucket assigned at creation. Never recomputed.
    pub week_key: WeekKey,
}

/// A participant in the challenge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    /// Stable identifier, preserved across season resets.
    pub id: PlayerId,
    /// Display name.
    pub name: String,
    /// Weight at the first weigh-in of the season, if any.
    pub start_weight: Option<Decimal>,
    /// Most recent weigh-in weight, if any.
    pub current_weight: Option<Decimal>,
    /// Running point total. Always equals the sum of `points` across
    /// `activities` — maintained by construction, never recomputed.
    pub points: u32,
    /// Weigh-in history, append-only.
    pub history: Vec<WeighIn>,
    /// Logged activities, append-only.
    pub activities: Vec<Activity>,
}

impl Player {
    /// Create a player with the given ID and name and no recorded data.
    pub fn new(id: PlayerId, name: &str) -> Self {
        Self {
            id,
            name: name.to_owned(),
            start_weight: None,
            current_weight: None,
            points: 0,
            history: Vec::new(),
            activities: Vec::new(),
        }
    }

    /// Points already granted to this player within the given week bucket.
    pub fn points_used_in_week(&self, week: &WeekKey) -> u32 {
        self.activities
            .iter()
            .filter(|a| a.week_key == *week)
            .fold(0u32, |sum, a| sum.saturating_add(a.points))
    }

    /// Lifetime weight-loss points already awarded via `WeighInTotal`.
    pub fn weigh_in_points_awarded(&self) -> u32 {
        self.activities
            .iter()
            .filter(|a| a.kind == ActivityKind::WeighInTotal)
            .fold(0u32, |sum, a| sum.saturating_add(a.points))
    }

    /// Sum of granted points across all activities.
    ///
    /// The store maintains `points` equal to this by construction; tests use
    /// this to verify the invariant after mutation sequences.
    pub fn activity_point_sum(&self) -> u32 {
        self.activities
            .iter()
            .fold(0u32, |sum, a| sum.saturating_add(a.points))
    }
}

// ---------------------------------------------------------------------------
// Chat
// ---------------------------------------------------------------------------

/// A chat message. Text is filtered at write time, so stored text is
/// already sanitized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// Display name of the sender.
    pub from: String,
    /// Sanitized message text.
    pub text: String,
    /// When the message was sent.
    pub when: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Scoring configuration
// ---------------------------------------------------------------------------

/// Base point values per activity kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityPoints {
    /// Flat points per workout.
    pub workout: u32,
    /// Points per 5,000 steps.
    pub steps5k: u32,
    /// Points per 10 active minutes.
    pub active10_min: u32,
    /// Flat bonus per personal record.
    pub pr: u32,
    /// Daily streak bonus. Reserved: no streak logic consumes this yet.
    pub streak_daily: u32,
}

impl Default for ActivityPoints {
    fn default() -> Self {
        Self {
            workout: 20,
            steps5k: 10,
            active10_min: 1,
            pr: 5,
            streak_daily: 5,
        }
    }
}

/// Season-wide scoring rules, replaced wholesale when edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringConfig {
    /// Display name of the season.
    pub season_name: String,
    /// Maximum points a player can earn per ISO week.
    pub weekly_point_cap: u32,
    /// Points per pound lost from the start weight.
    pub weight_points_per_lb: u32,
    /// Days of consecutive activity before a streak bonus would apply.
    /// Reserved: no streak logic consumes this yet.
    pub award_streak_after_days: u32,
    /// Base point values per activity kind.
    pub points: ActivityPoints,
    /// Words replaced with a placeholder glyph in chat messages.
    pub banned_words: Vec<String>,
    /// Reward and stake ideas, append-only from the UI's perspective.
    pub reward_ideas: Vec<String>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            season_name: String::from("October Throwdown"),
            weekly_point_cap: 400,
            weight_points_per_lb: 4,
            award_streak_after_days: 3,
            points: ActivityPoints::default(),
            banned_words: ["stupid", "idiot", "trash", "hate"]
                .map(String::from)
                .to_vec(),
            reward_ideas: [
                "Winner picks dinner",
                "Loser buys coffee",
                "Winner gets Friday night off bedtime routine",
                "Loser does dishes for a week",
                "Winner controls playlist on next drive",
            ]
            .map(String::from)
            .to_vec(),
        }
    }
}

// ---------------------------------------------------------------------------
// The root aggregate
// ---------------------------------------------------------------------------

/// The single root aggregate: all challenge state for one season.
///
/// Created once at first run (or restored from local storage), mutated
/// exclusively through the season store, never deleted — a season rollover
/// resets it in place. Always read and written as a whole, which is what
/// makes the coarse whole-document merge policy coherent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeasonDocument {
    /// Challenge participants, in display order.
    pub players: Vec<Player>,
    /// Chat log, append-only.
    pub chat: Vec<ChatMessage>,
    /// Scoring rules.
    pub config: ScoringConfig,
    /// When the current season started.
    pub started_at: DateTime<Utc>,
    /// Season counter, incremented on every reset.
    pub season_index: u32,
    /// Conflict-resolution header.
    pub meta: DocMeta,
}

impl SeasonDocument {
    /// Build the default two-player document for a fresh device.
    ///
    /// Player IDs are fixed (`p1`, `p2`) so peers that have never synced
    /// still agree on player identity. The meta is stamped at the Unix
    /// epoch with version 0: a never-edited document must lose
    /// last-writer-wins arbitration against any document that has seen a
    /// real mutation.
    pub fn new_default(device: DeviceId) -> Self {
        Self {
            players: vec![
                Player::new(PlayerId::new("p1"), "You"),
                Player::new(PlayerId::new("p2"), "Friend"),
            ],
            chat: Vec::new(),
            config: ScoringConfig::default(),
            started_at: Utc::now(),
            season_index: 1,
            meta: DocMeta {
                updated_at: DateTime::UNIX_EPOCH,
                updated_by: device,
                version: 0,
            },
        }
    }

    /// Stamp fresh mutation metadata: now, the local device, version + 1.
    pub fn stamp(&mut self, device: DeviceId) {
        self.meta = DocMeta {
            updated_at: Utc::now(),
            updated_by: device,
            version: self.meta.version.saturating_add(1),
        };
    }

    /// Find a player by ID.
    pub fn player(&self, id: &PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == *id)
    }

    /// Find a player by ID, mutably.
    pub fn player_mut(&mut self, id: &PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == *id)
    }
}

// ---------------------------------------------------------------------------
// Sync settings
// ---------------------------------------------------------------------------

/// Persisted sync configuration, stored in its own local-storage slot.
///
/// `credentials` is an opaque string passed through to the document backend;
/// the core never interprets it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncSettings {
    /// Whether the client considers itself connected.
    pub connected: bool,
    /// Human-readable connection status (`idle`, `connected`, `error`).
    pub status: String,
    /// The shared room the document is replicated under.
    pub room_id: String,
    /// Opaque backend credentials.
    pub credentials: String,
}
