//! Device identity: load-or-create the persistent per-device token.

use throwdown_types::DeviceId;

use crate::error::StorageError;
use crate::storage::{DEVICE_SLOT, LocalStore, read_json, write_json};

/// Load the device identity from storage, generating and persisting a fresh
/// one on first run.
///
/// The token is stable across sessions on one device: once written it is
/// never regenerated. If the persisted value is unreadable the slot is
/// rewritten with a fresh token rather than failing startup — identity
/// continuity is best-effort, correctness of the merge policy only needs
/// the token to be stable from here on.
pub fn load_or_create(store: &dyn LocalStore) -> Result<DeviceId, StorageError> {
    match read_json::<DeviceId>(store, DEVICE_SLOT) {
        Ok(Some(device)) => Ok(device),
        Ok(None) => {
            let device = DeviceId::generate();
            write_json(store, DEVICE_SLOT, &device)?;
            tracing::info!(%device, "Generated new device identity");
            Ok(device)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Device identity slot unreadable, regenerating");
            let device = DeviceId::generate();
            write_json(store, DEVICE_SLOT, &device)?;
            Ok(device)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn identity_is_stable_across_loads() {
        let store = MemoryStore::new();
        let first = load_or_create(&store);
        let second = load_or_create(&store);
        assert!(first.is_ok());
        assert_eq!(first.ok(), second.ok());
    }

    #[test]
    fn unreadable_slot_regenerates() {
        let store = MemoryStore::new();
        assert!(store.write_slot(DEVICE_SLOT, "corrupt").is_ok());
        let device = load_or_create(&store);
        assert!(device.is_ok());
        // The regenerated token is persisted and stable afterwards.
        assert_eq!(device.ok(), load_or_create(&store).ok());
    }
}
