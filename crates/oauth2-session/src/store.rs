//! Persisted credential stores.
//!
//! The session only needs a key-value store that honors expiration on read;
//! a cookie jar, local storage, or a platform keychain all fit behind
//! [`TokenStore`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default store file name within a data directory.
pub const STORE_FILE: &str = "session-store.json";

/// A key-value store with per-entry expiration.
pub trait TokenStore: Send + Sync + std::fmt::Debug {
    /// Read a live entry. Expired entries must be treated as absent.
    fn get(&self, key: &str) -> Option<String>;

    /// Write an entry that expires at the given instant.
    fn put(&self, key: &str, value: &str, expires_at: DateTime<Utc>) -> Result<()>;

    /// Remove an entry if present.
    fn remove(&self, key: &str) -> Result<()>;
}

// ============================================================================
// MemoryTokenStore
// ============================================================================

/// In-memory store for testing and single-process embedding.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    entries: Mutex<HashMap<String, (String, DateTime<Utc>)>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self, key: &str) -> Option<String> {
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some((value, expires_at)) if *expires_at > Utc::now() => Some(value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    fn put(&self, key: &str, value: &str, expires_at: DateTime<Utc>) -> Result<()> {
        self.entries
            .lock()
            .insert(key.to_string(), (value.to_string(), expires_at));
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries.lock().remove(key);
        Ok(())
    }
}

// ============================================================================
// FileTokenStore
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
struct StoredEntry {
    value: String,
    expires_at: DateTime<Utc>,
}

/// File-backed store: a single JSON file of keyed entries with expiry
/// timestamps. Expired entries are ignored on read and pruned on write.
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    /// Create a store backed by the given file.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Create a store at [`STORE_FILE`] inside a data directory.
    pub fn in_dir(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(STORE_FILE),
        }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<HashMap<String, StoredEntry>> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }

        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| Error::Storage(format!("failed to read store file: {}", e)))?;

        serde_json::from_str(&content)
            .map_err(|e| Error::Storage(format!("failed to parse store file: {}", e)))
    }

    fn save(&self, entries: &HashMap<String, StoredEntry>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::Storage(format!("failed to create store directory: {}", e)))?;
        }

        let json = serde_json::to_string_pretty(entries)
            .map_err(|e| Error::Storage(format!("failed to serialize store: {}", e)))?;

        std::fs::write(&self.path, json)
            .map_err(|e| Error::Storage(format!("failed to write store file: {}", e)))
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self, key: &str) -> Option<String> {
        let entries = match self.load() {
            Ok(entries) => entries,
            Err(err) => {
                tracing::warn!(%err, "token store unreadable, treating as empty");
                return None;
            }
        };

        entries
            .get(key)
            .filter(|entry| entry.expires_at > Utc::now())
            .map(|entry| entry.value.clone())
    }

    fn put(&self, key: &str, value: &str, expires_at: DateTime<Utc>) -> Result<()> {
        // A corrupt file should not block new writes; start over instead.
        let mut entries = self.load().unwrap_or_else(|err| {
            tracing::warn!(%err, "token store unreadable, starting fresh");
            HashMap::new()
        });

        let now = Utc::now();
        entries.retain(|_, entry| entry.expires_at > now);
        entries.insert(
            key.to_string(),
            StoredEntry {
                value: value.to_string(),
                expires_at,
            },
        );

        self.save(&entries)?;
        tracing::debug!(path = %self.path.display(), key, "store entry written");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        if !self.path.exists() {
            return Ok(());
        }

        let mut entries = self.load().unwrap_or_default();
        entries.remove(key);
        self.save(&entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::tempdir;

    fn in_one_hour() -> DateTime<Utc> {
        Utc::now() + Duration::hours(1)
    }

    #[test]
    fn test_memory_put_get_remove() {
        let store = MemoryTokenStore::new();
        assert!(store.get("k").is_none());

        store.put("k", "v", in_one_hour()).unwrap();
        assert_eq!(store.get("k").unwrap(), "v");

        store.remove("k").unwrap();
        assert!(store.get("k").is_none());
    }

    #[test]
    fn test_memory_expires_on_read() {
        let store = MemoryTokenStore::new();
        store
            .put("k", "v", Utc::now() - Duration::seconds(1))
            .unwrap();
        assert!(store.get("k").is_none());
    }

    #[test]
    fn test_file_put_get_remove() {
        let temp = tempdir().unwrap();
        let store = FileTokenStore::in_dir(temp.path());

        assert!(store.get("k").is_none());

        store.put("k", "v", in_one_hour()).unwrap();
        assert_eq!(store.get("k").unwrap(), "v");

        store.remove("k").unwrap();
        assert!(store.get("k").is_none());
    }

    #[test]
    fn test_file_survives_reload() {
        let temp = tempdir().unwrap();
        let path = temp.path().join(STORE_FILE);

        FileTokenStore::new(path.clone())
            .put("k", "v", in_one_hour())
            .unwrap();

        let reopened = FileTokenStore::new(path);
        assert_eq!(reopened.get("k").unwrap(), "v");
    }

    #[test]
    fn test_file_expires_on_read_and_prunes_on_write() {
        let temp = tempdir().unwrap();
        let store = FileTokenStore::in_dir(temp.path());

        store
            .put("stale", "old", Utc::now() - Duration::seconds(1))
            .unwrap();
        assert!(store.get("stale").is_none());

        store.put("fresh", "new", in_one_hour()).unwrap();
        let content = std::fs::read_to_string(store.path()).unwrap();
        assert!(!content.contains("stale"));
        assert!(content.contains("fresh"));
    }

    #[test]
    fn test_file_corrupt_is_treated_as_empty() {
        let temp = tempdir().unwrap();
        let path = temp.path().join(STORE_FILE);
        std::fs::write(&path, "not json").unwrap();

        let store = FileTokenStore::new(path);
        assert!(store.get("k").is_none());

        store.put("k", "v", in_one_hour()).unwrap();
        assert_eq!(store.get("k").unwrap(), "v");
    }
}
