use std::collections::BTreeMap;
use serde::{Deserialize, Serialize};

/// A title that reached the catalog site with the given rating
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SyncRecord {
    pub douban_id: String,
    pub trakt_rating: i32,
    pub title: String,
    pub year: Option<u32>,
}

/// A title that failed on its last pass and should be retried
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PendingRetry {
    pub title: String,
    pub year: Option<u32>,
    pub trakt_rating: i32,
    #[serde(flatten)]
    pub reason: PendingReason,
}

/// Why an entry is waiting. Serialized flat into the entry, so the
/// persisted shape is either `{.., subject_id}` or `{.., tmdb_id, imdb_id}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum PendingReason {
    /// Resolved but the status write failed; the id is reused next pass
    Unwritten { subject_id: String },
    /// Resolution timed out or failed outright
    Unresolved {
        #[serde(default)]
        tmdb_id: Option<u32>,
        #[serde(default)]
        imdb_id: Option<String>,
    },
}

/// Both persisted maps, loaded at run start and written back whole at run end
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncState {
    pub synced: BTreeMap<String, SyncRecord>,
    pub wait: BTreeMap<String, PendingRetry>,
}

impl SyncState {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when `key` was already written with this exact rating
    pub fn is_current(&self, key: &str, rating: i32) -> bool {
        self.synced
            .get(key)
            .map(|record| record.trakt_rating == rating && !record.douban_id.is_empty())
            .unwrap_or(false)
    }

    /// Subject id left behind by a failed write, if any
    pub fn pending_subject(&self, key: &str) -> Option<&str> {
        match self.wait.get(key).map(|entry| &entry.reason) {
            Some(PendingReason::Unwritten { subject_id }) if !subject_id.is_empty() => Some(subject_id),
            _ => None,
        }
    }

    /// Record a successful write and drop any stale retry entry
    pub fn mark_synced(&mut self, key: String, record: SyncRecord) {
        self.wait.remove(&key);
        self.synced.insert(key, record);
    }

    /// Create or refresh the retry entry for `key`
    pub fn mark_pending(&mut self, key: String, entry: PendingRetry) {
        self.wait.insert(key, entry);
    }

    pub fn clear_pending(&mut self, key: &str) -> bool {
        self.wait.remove(key).is_some()
    }
}
