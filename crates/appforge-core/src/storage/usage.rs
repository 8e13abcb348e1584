//! Per-action usage counters with a periodic reset
//!
//! Counters cover the metered actions (AI generations, PWA exports, app
//! package builds) and roll over on a fixed 30-day window from
//! `period_start`. The window check runs on every load and every mutating
//! call, so a long-dormant install resets on first touch.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::kv::KvStore;
use super::unix_timestamp;

/// Storage key for the counters record
pub(crate) const USAGE_KEY: &str = "export_stats";

/// Record layout version; unknown versions are reset to defaults
const USAGE_SCHEMA_VERSION: u32 = 1;

/// Length of one reset period (30 days)
pub const RESET_PERIOD_SECS: u64 = 30 * 24 * 60 * 60;

/// A metered action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    AiGeneration,
    PwaExport,
    ApkBuild,
}

/// A per-period ceiling on a metered action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaLimit {
    Unlimited,
    Limited(u64),
}

/// Persisted usage counters for the current period
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageCounters {
    pub version: u32,
    pub ai_generations: u64,
    pub pwa_exports: u64,
    pub apk_builds: u64,
    /// Unix seconds; monotonically non-decreasing across resets
    pub period_start: u64,
}

impl Default for UsageCounters {
    fn default() -> Self {
        Self {
            version: USAGE_SCHEMA_VERSION,
            ai_generations: 0,
            pwa_exports: 0,
            apk_builds: 0,
            period_start: unix_timestamp(),
        }
    }
}

impl UsageCounters {
    /// Counter value for a metric
    pub fn used(&self, metric: Metric) -> u64 {
        match metric {
            Metric::AiGeneration => self.ai_generations,
            Metric::PwaExport => self.pwa_exports,
            Metric::ApkBuild => self.apk_builds,
        }
    }

    fn bump(&mut self, metric: Metric) {
        let counter = match metric {
            Metric::AiGeneration => &mut self.ai_generations,
            Metric::PwaExport => &mut self.pwa_exports,
            Metric::ApkBuild => &mut self.apk_builds,
        };
        *counter = counter.saturating_add(1);
    }

    /// Apply the 30-day rollover in place; returns whether it fired
    fn apply_reset(&mut self, now: u64) -> bool {
        if now.saturating_sub(self.period_start) < RESET_PERIOD_SECS {
            return false;
        }
        self.ai_generations = 0;
        self.pwa_exports = 0;
        self.apk_builds = 0;
        self.period_start = now;
        true
    }
}

/// Tracks metered actions against the current period
#[derive(Clone)]
pub struct UsageTracker {
    kv: KvStore,
}

impl UsageTracker {
    pub fn new(kv: KvStore) -> Self {
        Self { kv }
    }

    /// Load the raw record, discarding unknown layouts
    fn load_raw(&self) -> UsageCounters {
        match self.kv.get::<UsageCounters>(USAGE_KEY) {
            Some(counters) if counters.version == USAGE_SCHEMA_VERSION => counters,
            Some(counters) => {
                warn!(
                    version = counters.version,
                    "Unknown usage counters layout, resetting"
                );
                UsageCounters::default()
            }
            None => UsageCounters::default(),
        }
    }

    /// Current counters, with the reset check applied
    pub fn counters(&self) -> UsageCounters {
        let mut counters = self.load_raw();
        if counters.apply_reset(unix_timestamp()) {
            debug!("Usage period rolled over on load");
            self.kv.set(USAGE_KEY, &counters);
        }
        counters
    }

    /// Counter value for a metric in the current period
    pub fn used(&self, metric: Metric) -> u64 {
        self.counters().used(metric)
    }

    /// Whether one more occurrence of `metric` fits under `limit`
    pub fn can_perform(&self, metric: Metric, limit: QuotaLimit) -> bool {
        match limit {
            QuotaLimit::Unlimited => true,
            QuotaLimit::Limited(max) => self.used(metric) < max,
        }
    }

    /// Record one occurrence of a metered action
    ///
    /// Returns whether the change was persisted; a storage failure leaves
    /// the previous record in place and reports `false`.
    pub fn increment(&self, metric: Metric) -> bool {
        let mut counters = self.load_raw();
        counters.apply_reset(unix_timestamp());
        counters.bump(metric);
        self.kv.set(USAGE_KEY, &counters)
    }

    /// Roll the period over if 30 days have elapsed; idempotent
    ///
    /// Returns whether a reset was applied.
    pub fn check_and_apply_monthly_reset(&self) -> bool {
        let mut counters = self.load_raw();
        if counters.apply_reset(unix_timestamp()) {
            debug!("Usage period rolled over");
            self.kv.set(USAGE_KEY, &counters)
        } else {
            false
        }
    }

    /// Zero the export counters, sparing `ai_generations` and the period
    ///
    /// Runs on tier changes so the new tier starts with a clean export
    /// allowance; generation counts are unlimited on every tier and are
    /// never forgiven.
    pub fn reset_export_counters(&self) -> bool {
        let mut counters = self.load_raw();
        counters.pwa_exports = 0;
        counters.apk_builds = 0;
        self.kv.set(USAGE_KEY, &counters)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::storage::Database;

    fn create_test_tracker() -> (UsageTracker, KvStore, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db = Database::open_shared(&temp_dir.path().join("test.db"))
            .expect("Failed to create database");
        let kv = KvStore::new(db);
        (UsageTracker::new(kv.clone()), kv, temp_dir)
    }

    #[test]
    fn test_first_run_starts_at_zero() {
        let (tracker, _kv, _temp) = create_test_tracker();

        let counters = tracker.counters();
        assert_eq!(counters.ai_generations, 0);
        assert_eq!(counters.pwa_exports, 0);
        assert_eq!(counters.apk_builds, 0);
        assert!(counters.period_start > 0);
    }

    #[test]
    fn test_increment_persists() {
        let (tracker, _kv, _temp) = create_test_tracker();

        assert!(tracker.increment(Metric::PwaExport));
        assert!(tracker.increment(Metric::PwaExport));
        assert!(tracker.increment(Metric::AiGeneration));

        assert_eq!(tracker.used(Metric::PwaExport), 2);
        assert_eq!(tracker.used(Metric::AiGeneration), 1);
        assert_eq!(tracker.used(Metric::ApkBuild), 0);
    }

    #[test]
    fn test_can_perform_limited_boundary() {
        // Exactly at the limit the next occurrence is denied (off-by-one)
        let (tracker, _kv, _temp) = create_test_tracker();

        let limit = QuotaLimit::Limited(3);
        assert!(tracker.can_perform(Metric::PwaExport, limit));
        tracker.increment(Metric::PwaExport);
        assert!(tracker.can_perform(Metric::PwaExport, limit));
        tracker.increment(Metric::PwaExport);
        assert!(tracker.can_perform(Metric::PwaExport, limit));
        tracker.increment(Metric::PwaExport);

        assert_eq!(tracker.used(Metric::PwaExport), 3);
        assert!(!tracker.can_perform(Metric::PwaExport, limit));
    }

    #[test]
    fn test_can_perform_unlimited_never_blocks() {
        let (tracker, _kv, _temp) = create_test_tracker();

        for _ in 0..100 {
            tracker.increment(Metric::AiGeneration);
        }
        assert!(tracker.can_perform(Metric::AiGeneration, QuotaLimit::Unlimited));
    }

    #[test]
    fn test_zero_quota_always_denies() {
        let (tracker, _kv, _temp) = create_test_tracker();

        assert!(!tracker.can_perform(Metric::ApkBuild, QuotaLimit::Limited(0)));
    }

    #[test]
    fn test_monthly_reset_fires_after_window() {
        let (tracker, kv, _temp) = create_test_tracker();

        tracker.increment(Metric::PwaExport);
        tracker.increment(Metric::AiGeneration);

        // Backdate the period start past the window
        let mut stale = tracker.counters();
        stale.period_start = unix_timestamp() - RESET_PERIOD_SECS - 1;
        kv.set(USAGE_KEY, &stale);

        assert!(tracker.check_and_apply_monthly_reset());

        let counters = tracker.counters();
        assert_eq!(counters.ai_generations, 0);
        assert_eq!(counters.pwa_exports, 0);
        assert!(
            counters.period_start > stale.period_start,
            "period_start must move forward on reset"
        );
    }

    #[test]
    fn test_monthly_reset_is_idempotent() {
        let (tracker, kv, _temp) = create_test_tracker();

        tracker.increment(Metric::PwaExport);
        let mut stale = tracker.counters();
        stale.period_start = unix_timestamp() - RESET_PERIOD_SECS - 1;
        kv.set(USAGE_KEY, &stale);

        assert!(tracker.check_and_apply_monthly_reset());
        // Second call in immediate succession changes nothing
        assert!(!tracker.check_and_apply_monthly_reset());
    }

    #[test]
    fn test_reset_inside_window_is_noop() {
        let (tracker, _kv, _temp) = create_test_tracker();

        tracker.increment(Metric::PwaExport);
        assert!(!tracker.check_and_apply_monthly_reset());
        assert_eq!(tracker.used(Metric::PwaExport), 1);
    }

    #[test]
    fn test_reset_export_counters_spares_generations() {
        let (tracker, _kv, _temp) = create_test_tracker();

        tracker.increment(Metric::AiGeneration);
        tracker.increment(Metric::PwaExport);
        tracker.increment(Metric::ApkBuild);

        let before = tracker.counters();
        assert!(tracker.reset_export_counters());
        let after = tracker.counters();

        assert_eq!(after.pwa_exports, 0);
        assert_eq!(after.apk_builds, 0);
        assert_eq!(after.ai_generations, 1, "generation count must survive");
        assert_eq!(
            after.period_start, before.period_start,
            "export reset must not restart the period"
        );
    }

    #[test]
    fn test_unknown_record_version_resets_to_default() {
        let (tracker, kv, _temp) = create_test_tracker();

        let future = UsageCounters {
            version: 99,
            ai_generations: 5,
            pwa_exports: 5,
            apk_builds: 5,
            period_start: 123,
        };
        kv.set(USAGE_KEY, &future);

        let counters = tracker.counters();
        assert_eq!(counters.version, 1);
        assert_eq!(counters.pwa_exports, 0);
    }
}
