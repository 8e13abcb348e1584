//! Persistence layer
//!
//! SQLite-based storage for:
//! - App state entities (license, usage counters, export history,
//!   achievements) as one JSON-encoded key each
//! - Saved projects (the generated-app gallery)
//!
//! Stores are explicit service objects built over a [`SharedDatabase`]
//! handle at startup and passed to consumers; there are no globals.

use std::time::{SystemTime, UNIX_EPOCH};

mod achievements;
mod database;
mod history;
mod kv;
mod license;
mod projects;
mod usage;

pub use achievements::{achievement_by_id, AchievementDef, AchievementEngine, UsageStats, ACHIEVEMENTS};
pub use database::{Database, SharedDatabase};
pub use history::{ExportHistory, ExportHistoryEntry, HISTORY_CAP};
pub use kv::KvStore;
pub use license::{
    export_quota, BillingCycle, ExportKind, FeatureSet, License, LicenseManager, Tier,
};
pub use projects::{Project, ProjectInfo, ProjectStore};
pub use usage::{Metric, QuotaLimit, UsageCounters, UsageTracker, RESET_PERIOD_SECS};

/// Get current Unix timestamp in seconds
#[inline]
pub fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
