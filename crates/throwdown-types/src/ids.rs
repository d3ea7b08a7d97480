//! Typed identifiers for players and devices.
//!
//! Players carry short, stable string identifiers (`"p1"`, `"p2"`) so a
//! freshly installed device produces the same default document as its peer —
//! a requirement for whole-document replication to make sense. Devices carry
//! a random UUID token generated once per installation and persisted; it is
//! what distinguishes writers in the conflict-resolution metadata.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a player within the season document.
///
/// Player IDs are plain strings, not UUIDs: the default document on two
/// devices must agree on player identity before any sync has happened.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    /// Create a player ID from a string slice.
    pub fn new(id: &str) -> Self {
        Self(id.to_owned())
    }

    /// Return the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Persistent per-device random token distinguishing writers.
///
/// Generated once on first run, stored in local storage, and stamped into
/// [`DocMeta::updated_by`] on every local mutation. Remote documents whose
/// `updated_by` equals the local device ID are self-echoes and are ignored
/// by the sync client.
///
/// [`DocMeta::updated_by`]: crate::document::DocMeta::updated_by
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(Uuid);

impl DeviceId {
    /// Generate a fresh random device token.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Return the inner [`Uuid`] value.
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl core::fmt::Display for DeviceId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for DeviceId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn player_ids_compare_by_content() {
        assert_eq!(PlayerId::new("p1"), PlayerId::from("p1"));
        assert_ne!(PlayerId::new("p1"), PlayerId::new("p2"));
    }

    #[test]
    fn device_ids_are_distinct() {
        assert_ne!(DeviceId::generate(), DeviceId::generate());
    }

    #[test]
    fn id_roundtrip_serde() {
        let device = DeviceId::generate();
        let json = serde_json::to_string(&device).ok();
        assert!(json.is_some());
        let restored: Result<DeviceId, _> =
            serde_json::from_str(json.as_deref().unwrap_or(""));
        assert_eq!(restored.ok(), Some(device));
    }
}
