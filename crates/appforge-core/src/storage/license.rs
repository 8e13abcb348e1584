//! License tiers, entitlements, and export gating
//!
//! The tier → feature/quota mapping is an enum-keyed total table, so every
//! `(tier, export kind)` combination has a defined answer. Strings from the
//! outside world cross into the engine through `parse` boundaries that
//! yield `None` for anything unrecognized, and `None` always denies: the
//! engine fails closed, never throws.
//!
//! The license record and the usage counters are deliberately separate
//! entities. Changing tiers replaces the license wholesale and explicitly
//! resets the export counters; nothing else about past usage is forgiven.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::kv::KvStore;
use super::unix_timestamp;
use super::usage::{Metric, QuotaLimit, UsageTracker};

/// Storage key for the license record
pub(crate) const LICENSE_KEY: &str = "license";

/// Record layout version; unknown versions are reset to defaults
const LICENSE_SCHEMA_VERSION: u32 = 1;

const DAY_SECS: u64 = 24 * 60 * 60;

/// Subscription level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    #[default]
    Free,
    Pro,
    Team,
}

impl Tier {
    /// Parse a user-supplied tier name; unknown names yield `None`
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "free" => Some(Tier::Free),
            "pro" => Some(Tier::Pro),
            "team" => Some(Tier::Team),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Free => "free",
            Tier::Pro => "pro",
            Tier::Team => "team",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Billing cycle chosen at upgrade time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingCycle {
    Monthly,
    Yearly,
    Lifetime,
}

impl BillingCycle {
    /// Parse a user-supplied cycle name; unknown names yield `None`
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "monthly" => Some(BillingCycle::Monthly),
            "yearly" => Some(BillingCycle::Yearly),
            "lifetime" => Some(BillingCycle::Lifetime),
            _ => None,
        }
    }

    /// Expiry timestamp for a cycle starting now; lifetime never expires
    fn expires_at(&self, now: u64) -> Option<u64> {
        match self {
            BillingCycle::Monthly => Some(now + 30 * DAY_SECS),
            BillingCycle::Yearly => Some(now + 365 * DAY_SECS),
            BillingCycle::Lifetime => None,
        }
    }
}

/// Kind of export artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportKind {
    Html,
    Pwa,
    Apk,
}

impl ExportKind {
    /// Parse a user-supplied kind name; unknown names yield `None`
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "html" => Some(ExportKind::Html),
            "pwa" => Some(ExportKind::Pwa),
            "apk" => Some(ExportKind::Apk),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExportKind::Html => "html",
            ExportKind::Pwa => "pwa",
            ExportKind::Apk => "apk",
        }
    }

    /// The usage metric consumed by this kind; `Html` is unmetered
    pub fn metric(&self) -> Option<Metric> {
        match self {
            ExportKind::Html => None,
            ExportKind::Pwa => Some(Metric::PwaExport),
            ExportKind::Apk => Some(Metric::ApkBuild),
        }
    }
}

impl fmt::Display for ExportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Feature flags for a tier, derived and never persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureSet {
    pub html_export: bool,
    pub pwa_export: bool,
    pub apk_export: bool,
    pub ai_generation: bool,
}

impl FeatureSet {
    /// Canonical feature set for a tier
    pub fn for_tier(tier: Tier) -> Self {
        match tier {
            Tier::Free => Self {
                html_export: true,
                pwa_export: true,
                apk_export: false,
                ai_generation: true,
            },
            Tier::Pro => Self {
                html_export: true,
                pwa_export: true,
                apk_export: true,
                ai_generation: true,
            },
            Tier::Team => Self {
                html_export: true,
                pwa_export: true,
                apk_export: true,
                ai_generation: true,
            },
        }
    }

    /// Whether the flag for an export kind is on
    pub fn allows_export(&self, kind: ExportKind) -> bool {
        match kind {
            ExportKind::Html => self.html_export,
            ExportKind::Pwa => self.pwa_export,
            ExportKind::Apk => self.apk_export,
        }
    }
}

/// Per-period export allowance for a tier
pub fn export_quota(tier: Tier, kind: ExportKind) -> QuotaLimit {
    match (tier, kind) {
        (_, ExportKind::Html) => QuotaLimit::Unlimited,
        (Tier::Free, ExportKind::Pwa) => QuotaLimit::Limited(3),
        (Tier::Free, ExportKind::Apk) => QuotaLimit::Limited(0),
        (Tier::Pro, ExportKind::Pwa) => QuotaLimit::Unlimited,
        (Tier::Pro, ExportKind::Apk) => QuotaLimit::Limited(10),
        (Tier::Team, ExportKind::Pwa) => QuotaLimit::Unlimited,
        (Tier::Team, ExportKind::Apk) => QuotaLimit::Unlimited,
    }
}

/// Persisted license record
///
/// Features are not stored; they are always derived from the tier, so the
/// persisted record cannot drift from the canonical table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct License {
    pub version: u32,
    pub tier: Tier,
    /// Unix seconds; `None` never expires
    pub expires_at: Option<u64>,
    pub created_at: u64,
}

impl License {
    fn free(now: u64) -> Self {
        Self {
            version: LICENSE_SCHEMA_VERSION,
            tier: Tier::Free,
            expires_at: None,
            created_at: now,
        }
    }

    /// Canonical feature set for this license's tier
    pub fn features(&self) -> FeatureSet {
        FeatureSet::for_tier(self.tier)
    }

    /// Whether the license has lapsed as of `now`
    pub fn is_expired(&self, now: u64) -> bool {
        matches!(self.expires_at, Some(at) if at < now)
    }
}

/// Entitlement engine: owns the license record and gates exports
#[derive(Clone)]
pub struct LicenseManager {
    kv: KvStore,
    usage: UsageTracker,
}

impl LicenseManager {
    pub fn new(kv: KvStore, usage: UsageTracker) -> Self {
        Self { kv, usage }
    }

    /// Load the raw record, discarding unknown layouts
    fn load_raw(&self) -> License {
        match self.kv.get::<License>(LICENSE_KEY) {
            Some(license) if license.version == LICENSE_SCHEMA_VERSION => license,
            Some(license) => {
                tracing::warn!(
                    version = license.version,
                    "Unknown license layout, resetting to free"
                );
                License::free(unix_timestamp())
            }
            None => License::free(unix_timestamp()),
        }
    }

    /// Current license; created as `free` and persisted on first run
    pub fn current(&self) -> License {
        match self.kv.get::<License>(LICENSE_KEY) {
            Some(license) if license.version == LICENSE_SCHEMA_VERSION => license,
            _ => {
                let license = License::free(unix_timestamp());
                self.kv.set(LICENSE_KEY, &license);
                license
            }
        }
    }

    /// Replace the license wholesale with a new tier and cycle
    ///
    /// Export counters are reset so the new tier starts with a clean
    /// allowance; generation counts are untouched.
    pub fn upgrade(&self, tier: Tier, cycle: BillingCycle) -> License {
        let now = unix_timestamp();
        let license = License {
            version: LICENSE_SCHEMA_VERSION,
            tier,
            expires_at: cycle.expires_at(now),
            created_at: now,
        };
        self.kv.set(LICENSE_KEY, &license);
        self.usage.reset_export_counters();
        info!(tier = %tier, "License changed");
        license
    }

    /// Force the license back to the free tier
    pub fn downgrade(&self) -> License {
        let now = unix_timestamp();
        let license = License::free(now);
        self.kv.set(LICENSE_KEY, &license);
        self.usage.reset_export_counters();
        info!("License downgraded to free");
        license
    }

    /// Validate the license, auto-downgrading a lapsed one
    ///
    /// Runs before every gated action; the returned license is the one the
    /// gate decision must use.
    pub fn validate(&self) -> License {
        let license = self.load_raw();
        if license.is_expired(unix_timestamp()) {
            info!(tier = %license.tier, "License expired, downgrading");
            return self.downgrade();
        }
        license
    }

    /// Whether an export of `kind` is currently allowed
    ///
    /// Requires both the tier's feature flag and quota headroom; never
    /// errors.
    pub fn can_export(&self, kind: ExportKind) -> bool {
        let license = self.validate();
        if !license.features().allows_export(kind) {
            return false;
        }
        match kind.metric() {
            Some(metric) => self
                .usage
                .can_perform(metric, export_quota(license.tier, kind)),
            // html is unmetered
            None => true,
        }
    }

    /// String-boundary variant of [`can_export`](Self::can_export)
    ///
    /// Unrecognized kind names deny under every tier.
    pub fn can_export_named(&self, name: &str) -> bool {
        match ExportKind::parse(name) {
            Some(kind) => self.can_export(kind),
            None => false,
        }
    }

    /// Record a completed export against the current period
    ///
    /// Returns whether a counter actually changed; unmetered kinds are a
    /// no-op. The license record itself is never mutated here.
    pub fn record_export(&self, kind: ExportKind) -> bool {
        match kind.metric() {
            Some(metric) => self.usage.increment(metric),
            None => false,
        }
    }

    /// The usage tracker this engine gates against
    pub fn usage(&self) -> &UsageTracker {
        &self.usage
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::storage::Database;

    fn create_test_manager() -> (LicenseManager, KvStore, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db = Database::open_shared(&temp_dir.path().join("test.db"))
            .expect("Failed to create database");
        let kv = KvStore::new(db);
        let usage = UsageTracker::new(kv.clone());
        (LicenseManager::new(kv.clone(), usage), kv, temp_dir)
    }

    #[test]
    fn test_first_run_creates_free_license() {
        let (manager, kv, _temp) = create_test_manager();

        let license = manager.current();
        assert_eq!(license.tier, Tier::Free);
        assert_eq!(license.expires_at, None);

        // First run persists the record
        assert!(kv.get::<License>(LICENSE_KEY).is_some());
    }

    #[test]
    fn test_quota_table_is_total() {
        // Every (tier, kind) combination has a defined answer
        for tier in [Tier::Free, Tier::Pro, Tier::Team] {
            for kind in [ExportKind::Html, ExportKind::Pwa, ExportKind::Apk] {
                let _ = export_quota(tier, kind);
            }
        }
    }

    #[test]
    fn test_can_export_matches_feature_and_quota() {
        // canExport == feature flag AND quota headroom, across the table
        let (manager, _kv, _temp) = create_test_manager();

        for tier in [Tier::Free, Tier::Pro, Tier::Team] {
            manager.upgrade(tier, BillingCycle::Lifetime);
            for kind in [ExportKind::Html, ExportKind::Pwa, ExportKind::Apk] {
                let features = FeatureSet::for_tier(tier);
                let quota_ok = match (kind.metric(), export_quota(tier, kind)) {
                    (None, _) | (_, QuotaLimit::Unlimited) => true,
                    (Some(metric), QuotaLimit::Limited(max)) => manager.usage().used(metric) < max,
                };
                assert_eq!(
                    manager.can_export(kind),
                    features.allows_export(kind) && quota_ok,
                    "tier {tier} kind {kind}"
                );
            }
        }
    }

    #[test]
    fn test_free_pwa_quota_boundary() {
        // Scenario: fresh free user exhausts the 3-export PWA allowance
        let (manager, _kv, _temp) = create_test_manager();

        assert!(manager.can_export(ExportKind::Pwa));
        assert!(manager.record_export(ExportKind::Pwa));

        assert!(manager.can_export(ExportKind::Pwa));
        assert!(manager.record_export(ExportKind::Pwa));

        assert!(manager.can_export(ExportKind::Pwa));
        assert!(manager.record_export(ExportKind::Pwa));

        // used == quota: the fourth check denies
        assert!(!manager.can_export(ExportKind::Pwa));
    }

    #[test]
    fn test_free_apk_always_denied() {
        // Scenario: quota(free, apk) = 0, regardless of usage
        let (manager, _kv, _temp) = create_test_manager();

        assert!(!manager.can_export(ExportKind::Apk));
    }

    #[test]
    fn test_html_export_unmetered() {
        let (manager, _kv, _temp) = create_test_manager();

        for _ in 0..20 {
            assert!(manager.can_export(ExportKind::Html));
            // Unmetered: recording changes no counter
            assert!(!manager.record_export(ExportKind::Html));
        }
        assert_eq!(manager.usage().used(Metric::PwaExport), 0);
    }

    #[test]
    fn test_upgrade_mid_period_unblocks_pwa() {
        // Scenario: free user at the PWA cap upgrades to pro
        let (manager, _kv, _temp) = create_test_manager();

        for _ in 0..3 {
            manager.record_export(ExportKind::Pwa);
        }
        assert!(!manager.can_export(ExportKind::Pwa));

        manager.upgrade(Tier::Pro, BillingCycle::Monthly);
        assert!(manager.can_export(ExportKind::Pwa));
    }

    #[test]
    fn test_upgrade_spares_generation_count() {
        let (manager, _kv, _temp) = create_test_manager();

        manager.usage().increment(Metric::AiGeneration);
        manager.usage().increment(Metric::PwaExport);

        manager.upgrade(Tier::Team, BillingCycle::Yearly);

        assert_eq!(manager.usage().used(Metric::PwaExport), 0);
        assert_eq!(manager.usage().used(Metric::AiGeneration), 1);
    }

    #[test]
    fn test_upgrade_then_downgrade_round_trips() {
        let (manager, _kv, _temp) = create_test_manager();

        let before = manager.current();
        manager.upgrade(Tier::Pro, BillingCycle::Monthly);
        let after = manager.downgrade();

        assert_eq!(after.tier, before.tier);
        assert_eq!(after.expires_at, before.expires_at);
        assert_eq!(after.features(), before.features());
        assert_eq!(
            export_quota(after.tier, ExportKind::Pwa),
            QuotaLimit::Limited(3)
        );
    }

    #[test]
    fn test_lifetime_never_expires() {
        let (manager, _kv, _temp) = create_test_manager();

        let license = manager.upgrade(Tier::Team, BillingCycle::Lifetime);
        assert_eq!(license.expires_at, None);
        assert_eq!(manager.validate().tier, Tier::Team);
    }

    #[test]
    fn test_expired_license_auto_downgrades() {
        let (manager, kv, _temp) = create_test_manager();

        let mut license = manager.upgrade(Tier::Pro, BillingCycle::Monthly);
        license.expires_at = Some(unix_timestamp() - 1);
        kv.set(LICENSE_KEY, &license);

        let validated = manager.validate();
        assert_eq!(validated.tier, Tier::Free);
        assert_eq!(validated.expires_at, None);

        // The downgrade was persisted, not just returned
        assert_eq!(manager.current().tier, Tier::Free);
    }

    #[test]
    fn test_expired_license_gates_at_free_quota() {
        // An expired pro license must check quotas as free
        let (manager, kv, _temp) = create_test_manager();

        let mut license = manager.upgrade(Tier::Pro, BillingCycle::Monthly);
        license.expires_at = Some(unix_timestamp() - 1);
        kv.set(LICENSE_KEY, &license);

        assert!(!manager.can_export(ExportKind::Apk));
    }

    #[test]
    fn test_unknown_export_kind_denied_under_every_tier() {
        // Scenario: "ios" is not a thing, under any tier
        let (manager, _kv, _temp) = create_test_manager();

        for tier in [Tier::Free, Tier::Pro, Tier::Team] {
            manager.upgrade(tier, BillingCycle::Lifetime);
            assert!(!manager.can_export_named("ios"), "tier {tier}");
            assert!(manager.can_export_named("html"), "tier {tier}");
        }
    }

    #[test]
    fn test_unknown_tier_name_fails_closed() {
        assert_eq!(Tier::parse("enterprise"), None);
        assert_eq!(Tier::parse(""), None);
        assert_eq!(Tier::parse("Pro"), Some(Tier::Pro));
    }

    #[test]
    fn test_unknown_license_layout_resets_to_free() {
        let (manager, kv, _temp) = create_test_manager();

        let future = License {
            version: 42,
            tier: Tier::Team,
            expires_at: None,
            created_at: 0,
        };
        kv.set(LICENSE_KEY, &future);

        assert_eq!(manager.validate().tier, Tier::Free);
    }
}
