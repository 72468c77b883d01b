//! Durable key-value storage for the last resolved snapshot and UI preferences.
//!
//! Values are JSON text stored under stable string keys, one file per key for
//! [`FileStore`]. [`MemoryStore`] keeps the same contract in-process for tests.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Security, UtcDateTime};

/// Key holding the last successfully fetched security list.
pub const SNAPSHOT_KEY: &str = "bist_stocks";

/// Key holding the persisted theme flag.
pub const THEME_KEY: &str = "theme";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("invalid storage key '{key}'")]
    InvalidKey { key: String },

    #[error("storage i/o failed for '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: io::Error,
    },

    #[error("storage lock poisoned")]
    Poisoned,

    #[error("stored value for '{key}' is not valid JSON: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode value for '{key}': {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// String-keyed text storage that survives process restarts.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Directory-backed store, one `<key>.json` file per key.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-');
        if !valid {
            return Err(StorageError::InvalidKey {
                key: key.to_owned(),
            });
        }
        Ok(self.root.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io {
                key: key.to_owned(),
                source,
            }),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        let io_error = |source| StorageError::Io {
            key: key.to_owned(),
            source,
        };

        fs::create_dir_all(&self.root).map_err(io_error)?;

        // Write-then-rename so a crash never leaves a truncated snapshot behind.
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, value).map_err(io_error)?;
        fs::rename(&staging, &path).map_err(io_error)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Io {
                key: key.to_owned(),
                source,
            }),
        }
    }
}

/// In-process store for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        entries.remove(key);
        Ok(())
    }
}

/// Persisted copy of the last successful fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSnapshot {
    pub stocks: Vec<Security>,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

impl StoredSnapshot {
    pub fn new(stocks: Vec<Security>, fetched_at: UtcDateTime) -> Self {
        Self {
            stocks,
            timestamp: fetched_at.unix_millis(),
        }
    }

    pub fn fetched_at(&self) -> Option<UtcDateTime> {
        UtcDateTime::from_unix_millis(self.timestamp)
    }

    pub fn load(store: &dyn KeyValueStore) -> Result<Option<Self>, StorageError> {
        let Some(raw) = store.get(SNAPSHOT_KEY)? else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| StorageError::Decode {
                key: SNAPSHOT_KEY.to_owned(),
                source,
            })
    }

    pub fn save(&self, store: &dyn KeyValueStore) -> Result<(), StorageError> {
        let raw = serde_json::to_string(self).map_err(|source| StorageError::Encode {
            key: SNAPSHOT_KEY.to_owned(),
            source,
        })?;
        store.set(SNAPSHOT_KEY, &raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Symbol;
    use tempfile::tempdir;

    fn sample() -> Security {
        let as_of = UtcDateTime::parse("2024-03-01T10:00:00Z").expect("timestamp");
        Security::new(
            Symbol::parse("THYAO").expect("symbol"),
            "Türk Hava Yolları",
            "Havacılık",
            280.0,
            140.0,
            as_of,
        )
        .expect("valid security")
    }

    #[test]
    fn file_store_round_trips_and_removes() {
        let dir = tempdir().expect("tempdir");
        let store = FileStore::new(dir.path().join("nested"));

        assert_eq!(store.get("theme").expect("read"), None);
        store.set("theme", "\"dark\"").expect("write");
        assert_eq!(store.get("theme").expect("read").as_deref(), Some("\"dark\""));

        store.remove("theme").expect("remove");
        store.remove("theme").expect("second remove is a no-op");
        assert_eq!(store.get("theme").expect("read"), None);
    }

    #[test]
    fn file_store_rejects_path_like_keys() {
        let dir = tempdir().expect("tempdir");
        let store = FileStore::new(dir.path());

        let err = store.set("../escape", "x").expect_err("must fail");
        assert!(matches!(err, StorageError::InvalidKey { .. }));
    }

    #[test]
    fn snapshot_keeps_millisecond_timestamp() {
        let store = MemoryStore::new();
        let fetched_at = UtcDateTime::parse("2024-03-01T10:00:00Z").expect("timestamp");
        StoredSnapshot::new(vec![sample()], fetched_at)
            .save(&store)
            .expect("save");

        let raw = store.get(SNAPSHOT_KEY).expect("read").expect("present");
        let value: serde_json::Value = serde_json::from_str(&raw).expect("json");
        assert_eq!(value["timestamp"], 1_709_287_200_000_i64);
        assert_eq!(value["stocks"][0]["symbol"], "THYAO");

        let loaded = StoredSnapshot::load(&store).expect("load").expect("present");
        assert_eq!(loaded.fetched_at(), Some(fetched_at));
        assert_eq!(loaded.stocks.len(), 1);
    }

    #[test]
    fn corrupt_snapshot_is_a_decode_error() {
        let store = MemoryStore::new();
        store.set(SNAPSHOT_KEY, "{not json").expect("write");

        let err = StoredSnapshot::load(&store).expect_err("must fail");
        assert!(matches!(err, StorageError::Decode { .. }));
    }
}
