//! Append-only export history with a fixed cap
//!
//! Completed exports are prepended to a single JSON-encoded list; the list
//! never grows past [`HISTORY_CAP`] entries, evicting the oldest first.
//! There is no update or delete-by-id surface.

use serde::{Deserialize, Serialize};

use super::kv::KvStore;
use super::license::ExportKind;
use super::unix_timestamp;

/// Storage key for the history record
pub(crate) const HISTORY_KEY: &str = "export_history";

/// Record layout version; unknown versions are reset to empty
const HISTORY_SCHEMA_VERSION: u32 = 1;

/// Maximum number of retained entries
pub const HISTORY_CAP: usize = 50;

/// One completed export
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportHistoryEntry {
    pub id: String,
    pub kind: ExportKind,
    pub filename: String,
    pub size_bytes: u64,
    /// Unix seconds
    pub timestamp: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct HistoryRecord {
    version: u32,
    entries: Vec<ExportHistoryEntry>,
}

impl Default for HistoryRecord {
    fn default() -> Self {
        Self {
            version: HISTORY_SCHEMA_VERSION,
            entries: Vec::new(),
        }
    }
}

/// Capped log of completed exports, newest first
#[derive(Clone)]
pub struct ExportHistory {
    kv: KvStore,
}

impl ExportHistory {
    pub fn new(kv: KvStore) -> Self {
        Self { kv }
    }

    fn load(&self) -> HistoryRecord {
        match self.kv.get::<HistoryRecord>(HISTORY_KEY) {
            Some(record) if record.version == HISTORY_SCHEMA_VERSION => record,
            Some(record) => {
                tracing::warn!(version = record.version, "Unknown history layout, resetting");
                HistoryRecord::default()
            }
            None => HistoryRecord::default(),
        }
    }

    /// Append a completed export
    ///
    /// Assigns the id and timestamp, prepends, evicts past the cap, and
    /// persists. The entry is returned even when persistence soft-fails.
    pub fn append(&self, kind: ExportKind, filename: &str, size_bytes: u64) -> ExportHistoryEntry {
        let entry = ExportHistoryEntry {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
            filename: filename.to_string(),
            size_bytes,
            timestamp: unix_timestamp(),
        };

        let mut record = self.load();
        record.entries.insert(0, entry.clone());
        record.entries.truncate(HISTORY_CAP);
        self.kv.set(HISTORY_KEY, &record);

        entry
    }

    /// All retained entries, newest first
    pub fn list(&self) -> Vec<ExportHistoryEntry> {
        self.load().entries
    }
}
