use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use rating_sync_models::{PendingRetry, SyncRecord, SyncState};
use thiserror::Error;
use tracing::{debug, warn};

pub const SYNCED_KEY: &str = "synced";
pub const WAIT_KEY: &str = "wait";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("state I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("state encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Opaque key/value blobs persisted between runs
pub trait StateStore: Send + Sync {
    fn load(&self, key: &str) -> Result<Option<Value>, StoreError>;

    fn save(&self, key: &str, value: &Value) -> Result<(), StoreError>;

    /// Returns whether anything was removed
    fn remove(&self, key: &str) -> Result<bool, StoreError>;
}

/// One JSON file per key under `<state_dir>/<plugin_id>/`
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(state_dir: &Path, plugin_id: &str) -> Self {
        Self {
            dir: state_dir.join(plugin_id),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl StateStore for JsonFileStore {
    fn load(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let path = self.path_for(key);
        if !path.exists() {
            debug!("No persisted {} blob at {:?}", key, path);
            return Ok(None);
        }

        let content = std::fs::read_to_string(&path)?;
        match serde_json::from_str(&content) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!("Ignoring unreadable {} blob at {:?}: {}", key, path, e);
                Ok(None)
            }
        }
    }

    fn save(&self, key: &str, value: &Value) -> Result<(), StoreError> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        let temp_path = path.with_extension("json.tmp");
        std::fs::write(&temp_path, serde_json::to_vec_pretty(value)?)?;
        std::fs::rename(&temp_path, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool, StoreError> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(false);
        }
        std::fs::remove_file(path)?;
        Ok(true)
    }
}

/// In-process store, mostly for tests
#[derive(Default)]
pub struct MemoryStore {
    blobs: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn blobs(&self) -> std::sync::MutexGuard<'_, HashMap<String, Value>> {
        self.blobs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl StateStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.blobs().get(key).cloned())
    }

    fn save(&self, key: &str, value: &Value) -> Result<(), StoreError> {
        self.blobs().insert(key.to_string(), value.clone());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.blobs().remove(key).is_some())
    }
}

/// Decode a blob entry by entry so one bad entry does not cost the map
fn decode_map<T: DeserializeOwned>(key: &str, blob: Option<Value>) -> BTreeMap<String, T> {
    let entries = match blob {
        Some(Value::Object(entries)) => entries,
        Some(Value::Null) | None => return BTreeMap::new(),
        Some(other) => {
            warn!("Persisted {} blob is not a map ({}); starting empty", key, other);
            return BTreeMap::new();
        }
    };

    entries
        .into_iter()
        .filter_map(|(entry_key, value)| match serde_json::from_value(value) {
            Ok(entry) => Some((entry_key, entry)),
            Err(e) => {
                warn!("Dropping unreadable {} entry {}: {}", key, entry_key, e);
                None
            }
        })
        .collect()
}

fn encode_map<T: Serialize>(map: &BTreeMap<String, T>) -> Result<Value, StoreError> {
    Ok(serde_json::to_value(map)?)
}

/// Read both blobs; missing ones come back empty
pub fn load_state(store: &dyn StateStore) -> Result<SyncState, StoreError> {
    let synced: BTreeMap<String, SyncRecord> = decode_map(SYNCED_KEY, store.load(SYNCED_KEY)?);
    let wait: BTreeMap<String, PendingRetry> = decode_map(WAIT_KEY, store.load(WAIT_KEY)?);
    Ok(SyncState { synced, wait })
}

/// Write both blobs as full snapshots
pub fn save_state(store: &dyn StateStore, state: &SyncState) -> Result<(), StoreError> {
    store.save(SYNCED_KEY, &encode_map(&state.synced)?)?;
    store.save(WAIT_KEY, &encode_map(&state.wait)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rating_sync_models::PendingReason;
    use serde_json::json;
    use tempfile::TempDir;

    fn sample_state() -> SyncState {
        let mut state = SyncState::new();
        state.mark_synced(
            "100".to_string(),
            SyncRecord {
                douban_id: "555".to_string(),
                trakt_rating: 8,
                title: "X".to_string(),
                year: Some(2020),
            },
        );
        state.mark_pending(
            "the-thing-1982".to_string(),
            PendingRetry {
                title: "The Thing".to_string(),
                year: Some(1982),
                trakt_rating: 9,
                reason: PendingReason::Unwritten { subject_id: "1293302".to_string() },
            },
        );
        state
    }

    #[test]
    fn test_json_file_store_persists_state() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path(), "trakt_ratings_sync");
        assert_eq!(load_state(&store).unwrap(), SyncState::new());

        let state = sample_state();
        save_state(&store, &state).unwrap();
        assert!(store.dir().join("synced.json").exists());
        assert!(store.dir().join("wait.json").exists());

        let reopened = JsonFileStore::new(dir.path(), "trakt_ratings_sync");
        assert_eq!(load_state(&reopened).unwrap(), state);
    }

    #[test]
    fn test_synced_blob_layout() {
        let store = MemoryStore::new();
        save_state(&store, &sample_state()).unwrap();
        assert_eq!(
            store.load(SYNCED_KEY).unwrap(),
            Some(json!({"100": {"douban_id": "555", "trakt_rating": 8, "title": "X", "year": 2020}}))
        );
    }

    #[test]
    fn test_corrupt_file_reads_as_empty() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path(), "p");
        std::fs::create_dir_all(store.dir()).unwrap();
        std::fs::write(store.dir().join("synced.json"), "{not json").unwrap();

        assert_eq!(store.load(SYNCED_KEY).unwrap(), None);
        assert!(load_state(&store).unwrap().synced.is_empty());
    }

    #[test]
    fn test_bad_entries_are_dropped_individually() {
        let store = MemoryStore::new();
        store
            .save(
                SYNCED_KEY,
                &json!({
                    "1": {"douban_id": "11", "trakt_rating": 7, "title": "A", "year": 2001},
                    "2": {"douban_id": 22},
                }),
            )
            .unwrap();
        store.save(WAIT_KEY, &json!(["not", "a", "map"])).unwrap();

        let state = load_state(&store).unwrap();
        assert_eq!(state.synced.len(), 1);
        assert_eq!(state.synced["1"].douban_id, "11");
        assert!(state.wait.is_empty());
    }

    #[test]
    fn test_remove() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path(), "p");
        save_state(&store, &sample_state()).unwrap();

        assert!(store.remove(WAIT_KEY).unwrap());
        assert!(!store.remove(WAIT_KEY).unwrap());
        let state = load_state(&store).unwrap();
        assert!(state.wait.is_empty());
        assert_eq!(state.synced.len(), 1);
    }
}
