//! JSON key-value store over the `app_state` table
//!
//! Every persisted entity (license, usage counters, export history,
//! achievements) lives under a single key as a JSON-encoded value.
//!
//! Storage is deliberately a soft dependency: `get` returns `None` for
//! absent or corrupt entries, and the mutating calls return `false` on
//! failure instead of propagating errors. Callers treat a failed `set` as
//! "state unpersisted this tick, retry next mutation".

use std::sync::MutexGuard;

use rusqlite::params;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use super::database::{Database, SharedDatabase};
use super::unix_timestamp;

/// Key-value store handle, cheap to clone
#[derive(Clone)]
pub struct KvStore {
    db: SharedDatabase,
}

impl KvStore {
    /// Create a store over the shared database
    pub fn new(db: SharedDatabase) -> Self {
        Self { db }
    }

    fn db(&self) -> MutexGuard<'_, Database> {
        // A poisoned lock means a panic elsewhere; the data itself is fine
        self.db.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Get a value, deserialized from JSON
    ///
    /// Returns `None` for absent keys and for entries that fail to
    /// deserialize (corrupt entries are logged, not surfaced).
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw: Option<String> = self
            .db()
            .conn()
            .query_row(
                "SELECT value FROM app_state WHERE key = ?1",
                [key],
                |row| row.get(0),
            )
            .ok();

        let raw = raw?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, "Discarding corrupt app_state entry: {}", e);
                None
            }
        }
    }

    /// Set a value, serialized as JSON
    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> bool {
        let json = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(e) => {
                warn!(key, "Failed to serialize app_state value: {}", e);
                return false;
            }
        };

        let result = self.db().conn().execute(
            "INSERT INTO app_state (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = ?3",
            params![key, json, unix_timestamp() as i64],
        );

        match result {
            Ok(_) => true,
            Err(e) => {
                warn!(key, "Failed to persist app_state entry: {}", e);
                false
            }
        }
    }

    /// Remove a key
    pub fn remove(&self, key: &str) -> bool {
        match self
            .db()
            .conn()
            .execute("DELETE FROM app_state WHERE key = ?1", [key])
        {
            Ok(_) => true,
            Err(e) => {
                warn!(key, "Failed to remove app_state entry: {}", e);
                false
            }
        }
    }

    /// Remove every key
    pub fn clear(&self) -> bool {
        match self.db().conn().execute("DELETE FROM app_state", []) {
            Ok(_) => true,
            Err(e) => {
                warn!("Failed to clear app_state: {}", e);
                false
            }
        }
    }

    /// Store a raw string without JSON encoding (test seam for corrupt data)
    #[cfg(test)]
    pub(crate) fn set_raw(&self, key: &str, raw: &str) {
        self.db()
            .conn()
            .execute(
                "INSERT INTO app_state (key, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = ?3",
                params![key, raw, unix_timestamp() as i64],
            )
            .expect("Failed to write raw entry");
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};
    use tempfile::TempDir;

    use super::KvStore;
    use crate::storage::Database;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        count: u64,
        label: String,
    }

    fn create_test_store() -> (KvStore, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db = Database::open_shared(&temp_dir.path().join("test.db"))
            .expect("Failed to create database");
        (KvStore::new(db), temp_dir)
    }

    #[test]
    fn test_get_absent_key_returns_none() {
        let (kv, _temp) = create_test_store();
        assert_eq!(kv.get::<Sample>("missing"), None);
    }

    #[test]
    fn test_set_then_get_round_trips() {
        let (kv, _temp) = create_test_store();

        let sample = Sample {
            count: 7,
            label: "hello".to_string(),
        };
        assert!(kv.set("sample", &sample));
        assert_eq!(kv.get::<Sample>("sample"), Some(sample));
    }

    #[test]
    fn test_set_overwrites_existing_value() {
        let (kv, _temp) = create_test_store();

        assert!(kv.set("n", &1u64));
        assert!(kv.set("n", &2u64));
        assert_eq!(kv.get::<u64>("n"), Some(2));
    }

    #[test]
    fn test_corrupt_entry_reads_as_none() {
        // A hand-damaged value must degrade to None, never panic
        let (kv, _temp) = create_test_store();

        kv.set_raw("sample", "{not json");
        assert_eq!(kv.get::<Sample>("sample"), None);
    }

    #[test]
    fn test_remove_deletes_key() {
        let (kv, _temp) = create_test_store();

        assert!(kv.set("n", &1u64));
        assert!(kv.remove("n"));
        assert_eq!(kv.get::<u64>("n"), None);

        // Removing an absent key is still a success
        assert!(kv.remove("n"));
    }

    #[test]
    fn test_clear_removes_everything() {
        let (kv, _temp) = create_test_store();

        assert!(kv.set("a", &1u64));
        assert!(kv.set("b", &2u64));
        assert!(kv.clear());
        assert_eq!(kv.get::<u64>("a"), None);
        assert_eq!(kv.get::<u64>("b"), None);
    }
}
