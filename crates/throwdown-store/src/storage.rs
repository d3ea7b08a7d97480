//! Local durable storage: named JSON slots.
//!
//! The store persists exactly three things, each in its own named slot:
//! the serialized season document, the sync settings, and the device
//! identity token. The [`LocalStore`] trait abstracts where slots live so
//! the store can run against the filesystem in production and in memory in
//! tests.
//!
//! | Slot | Contents |
//! |------|----------|
//! | `season_document` | The whole [`SeasonDocument`] as JSON |
//! | `sync_settings` | Persisted [`SyncSettings`] |
//! | `device_id` | The device identity token |
//!
//! [`SeasonDocument`]: throwdown_types::SeasonDocument
//! [`SyncSettings`]: throwdown_types::SyncSettings

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::StorageError;

/// Slot holding the serialized season document.
pub const DOCUMENT_SLOT: &str = "season_document";

/// Slot holding the persisted sync settings.
pub const SETTINGS_SLOT: &str = "sync_settings";

/// Slot holding the device identity token.
pub const DEVICE_SLOT: &str = "device_id";

/// A named-slot store for small JSON values.
///
/// Implementations decide where slots live. The trait is string-based so it
/// stays object-safe; typed access goes through [`read_json`] and
/// [`write_json`].
pub trait LocalStore: Send + Sync {
    /// Read the raw contents of a slot, or `None` if it was never written.
    fn read_slot(&self, slot: &str) -> Result<Option<String>, StorageError>;

    /// Write the raw contents of a slot, creating it if needed.
    fn write_slot(&self, slot: &str, contents: &str) -> Result<(), StorageError>;
}

/// Read a slot and deserialize it from JSON.
pub fn read_json<T: DeserializeOwned>(
    store: &dyn LocalStore,
    slot: &str,
) -> Result<Option<T>, StorageError> {
    match store.read_slot(slot)? {
        None => Ok(None),
        Some(raw) => serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| StorageError::Serialization {
                slot: slot.to_owned(),
                source,
            }),
    }
}

/// Serialize a value as JSON and write it to a slot.
pub fn write_json<T: Serialize>(
    store: &dyn LocalStore,
    slot: &str,
    value: &T,
) -> Result<(), StorageError> {
    let raw = serde_json::to_string(value).map_err(|source| StorageError::Serialization {
        slot: slot.to_owned(),
        source,
    })?;
    store.write_slot(slot, &raw)
}

// ---------------------------------------------------------------------------
// FileStore
// ---------------------------------------------------------------------------

/// Filesystem-backed slot store: one `<slot>.json` file per slot under a
/// data directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Create a file store rooted at `dir`, creating the directory if
    /// missing.
    pub fn open(dir: &Path) -> Result<Self, StorageError> {
        std::fs::create_dir_all(dir).map_err(|source| StorageError::Io {
            slot: dir.display().to_string(),
            source,
        })?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    fn slot_path(&self, slot: &str) -> PathBuf {
        self.dir.join(format!("{slot}.json"))
    }
}

impl LocalStore for FileStore {
    fn read_slot(&self, slot: &str) -> Result<Option<String>, StorageError> {
        match std::fs::read_to_string(self.slot_path(slot)) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io {
                slot: slot.to_owned(),
                source,
            }),
        }
    }

    fn write_slot(&self, slot: &str, contents: &str) -> Result<(), StorageError> {
        std::fs::write(self.slot_path(slot), contents).map_err(|source| StorageError::Io {
            slot: slot.to_owned(),
            source,
        })
    }
}

// ---------------------------------------------------------------------------
// MemoryStore — always-public for consumer testing
// ---------------------------------------------------------------------------

/// In-memory slot store.
///
/// Useful for tests and for consumers who want to verify their code against
/// the [`LocalStore`] trait without touching the filesystem.
#[derive(Debug, Default)]
pub struct MemoryStore {
    slots: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalStore for MemoryStore {
    fn read_slot(&self, slot: &str) -> Result<Option<String>, StorageError> {
        Ok(self
            .slots
            .lock()
            .map_or(None, |slots| slots.get(slot).cloned()))
    }

    fn write_slot(&self, slot: &str, contents: &str) -> Result<(), StorageError> {
        if let Ok(mut slots) = self.slots.lock() {
            slots.insert(slot.to_owned(), contents.to_owned());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
    struct Probe {
        label: String,
        count: u32,
    }

    #[test]
    fn memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert!(matches!(store.read_slot("missing"), Ok(None)));

        let value = Probe {
            label: String::from("hello"),
            count: 3,
        };
        assert!(write_json(&store, "probe", &value).is_ok());
        let loaded: Result<Option<Probe>, _> = read_json(&store, "probe");
        assert_eq!(loaded.ok().flatten(), Some(value));
    }

    #[test]
    fn file_store_roundtrip() {
        let Ok(dir) = tempfile::tempdir() else {
            return;
        };
        let Ok(store) = FileStore::open(dir.path()) else {
            return;
        };

        assert!(matches!(store.read_slot(DOCUMENT_SLOT), Ok(None)));
        let value = Probe {
            label: String::from("persisted"),
            count: 7,
        };
        assert!(write_json(&store, DOCUMENT_SLOT, &value).is_ok());

        // A second store over the same directory sees the write.
        let Ok(reopened) = FileStore::open(dir.path()) else {
            return;
        };
        let loaded: Result<Option<Probe>, _> = read_json(&reopened, DOCUMENT_SLOT);
        assert_eq!(loaded.ok().flatten(), Some(value));
    }

    #[test]
    fn malformed_slot_is_a_serialization_error() {
        let store = MemoryStore::new();
        assert!(store.write_slot("probe", "not json").is_ok());
        let loaded: Result<Option<Probe>, _> = read_json(&store, "probe");
        assert!(matches!(
            loaded,
            Err(StorageError::Serialization { .. })
        ));
    }
}
