//! Badge catalog and unlock evaluation
//!
//! Badges are evaluated against a stats snapshot. The unlocked set is
//! monotone: once an id is persisted it is never re-checked or revoked,
//! even if the stats that earned it later reset.

use serde::{Deserialize, Serialize};

use super::kv::KvStore;
use super::license::Tier;

/// Storage key for the unlocked-ids record
pub(crate) const ACHIEVEMENTS_KEY: &str = "achievements";

/// Record layout version; unknown versions are reset to empty
const ACHIEVEMENTS_SCHEMA_VERSION: u32 = 1;

/// Stats snapshot the predicates run against
#[derive(Debug, Clone, Copy, Default)]
pub struct UsageStats {
    pub ai_generations: u64,
    pub pwa_exports: u64,
    pub apk_builds: u64,
    /// Lifetime export count (history length, not period counters)
    pub total_exports: u64,
    pub projects_saved: u64,
    pub tier: Tier,
}

/// A badge definition
pub struct AchievementDef {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub predicate: fn(&UsageStats) -> bool,
}

/// Built-in badge catalog
pub const ACHIEVEMENTS: &[AchievementDef] = &[
    AchievementDef {
        id: "first_spark",
        name: "First Spark",
        description: "Generate your first app",
        predicate: |s| s.ai_generations >= 1,
    },
    AchievementDef {
        id: "app_smith",
        name: "App Smith",
        description: "Generate 10 apps",
        predicate: |s| s.ai_generations >= 10,
    },
    AchievementDef {
        id: "forge_master",
        name: "Forge Master",
        description: "Generate 50 apps",
        predicate: |s| s.ai_generations >= 50,
    },
    AchievementDef {
        id: "first_ship",
        name: "First Ship",
        description: "Complete your first export",
        predicate: |s| s.total_exports >= 1,
    },
    AchievementDef {
        id: "serial_shipper",
        name: "Serial Shipper",
        description: "Complete 10 exports",
        predicate: |s| s.total_exports >= 10,
    },
    AchievementDef {
        id: "web_publisher",
        name: "Web Publisher",
        description: "Export a PWA bundle",
        predicate: |s| s.pwa_exports >= 1,
    },
    AchievementDef {
        id: "store_bound",
        name: "Store Bound",
        description: "Build an app package",
        predicate: |s| s.apk_builds >= 1,
    },
    AchievementDef {
        id: "curator",
        name: "Curator",
        description: "Keep 5 projects in your gallery",
        predicate: |s| s.projects_saved >= 5,
    },
    AchievementDef {
        id: "patron",
        name: "Patron",
        description: "Hold a paid tier",
        predicate: |s| s.tier != Tier::Free,
    },
];

/// Look up a badge definition by id
pub fn achievement_by_id(id: &str) -> Option<&'static AchievementDef> {
    ACHIEVEMENTS.iter().find(|a| a.id == id)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct UnlockedRecord {
    version: u32,
    /// Ids in unlock order
    ids: Vec<String>,
}

impl Default for UnlockedRecord {
    fn default() -> Self {
        Self {
            version: ACHIEVEMENTS_SCHEMA_VERSION,
            ids: Vec::new(),
        }
    }
}

/// Evaluates the catalog against stats and persists unlocks
#[derive(Clone)]
pub struct AchievementEngine {
    kv: KvStore,
}

impl AchievementEngine {
    pub fn new(kv: KvStore) -> Self {
        Self { kv }
    }

    fn load(&self) -> UnlockedRecord {
        match self.kv.get::<UnlockedRecord>(ACHIEVEMENTS_KEY) {
            Some(record) if record.version == ACHIEVEMENTS_SCHEMA_VERSION => record,
            Some(record) => {
                tracing::warn!(
                    version = record.version,
                    "Unknown achievements layout, resetting"
                );
                UnlockedRecord::default()
            }
            None => UnlockedRecord::default(),
        }
    }

    /// Unlocked ids in unlock order
    pub fn unlocked(&self) -> Vec<String> {
        self.load().ids
    }

    /// Evaluate every locked badge against `stats`
    ///
    /// Newly satisfied badges are persisted and returned. Calling again
    /// with identical stats returns nothing; unlocked ids never leave the
    /// set.
    pub fn evaluate(&self, stats: &UsageStats) -> Vec<&'static AchievementDef> {
        let mut record = self.load();
        let mut unlocked = Vec::new();

        for def in ACHIEVEMENTS {
            if record.ids.iter().any(|id| id == def.id) {
                continue;
            }
            if (def.predicate)(stats) {
                record.ids.push(def.id.to_string());
                unlocked.push(def);
            }
        }

        if !unlocked.is_empty() {
            self.kv.set(ACHIEVEMENTS_KEY, &record);
            for def in &unlocked {
                tracing::info!(id = def.id, "Achievement unlocked");
            }
        }

        unlocked
    }
}
