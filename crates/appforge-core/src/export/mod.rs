//! Export builders and the gated export pipeline
//!
//! Every export runs the same sequence: validate the license, gate on the
//! tier's quota, build the artifact, count the usage, log the export, and
//! re-evaluate achievements. A denial is a normal outcome, not an error;
//! only artifact I/O can actually fail.

use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::info;

mod apk;
mod html;
mod pwa;

use crate::storage::{
    AchievementDef, AchievementEngine, ExportHistory, ExportHistoryEntry, ExportKind,
    LicenseManager, Metric, ProjectStore, UsageStats,
};

/// A file produced by one of the builders
#[derive(Debug, Clone)]
pub struct ExportArtifact {
    pub filename: String,
    pub size_bytes: u64,
    pub path: PathBuf,
}

/// Why an export was denied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// The tier's feature set does not include this export kind
    FeatureLocked,
    /// The feature is available but the period's quota is spent
    QuotaExhausted,
}

/// Result of an export attempt
pub enum ExportOutcome {
    Completed {
        entry: ExportHistoryEntry,
        path: PathBuf,
        /// Badges newly unlocked by this export
        unlocked: Vec<&'static AchievementDef>,
    },
    Denied {
        kind: ExportKind,
        reason: DenyReason,
    },
}

/// Orchestrates gated exports over the storage services
#[derive(Clone)]
pub struct ExportService {
    license: LicenseManager,
    history: ExportHistory,
    achievements: AchievementEngine,
    projects: ProjectStore,
}

impl ExportService {
    pub fn new(
        license: LicenseManager,
        history: ExportHistory,
        achievements: AchievementEngine,
        projects: ProjectStore,
    ) -> Self {
        Self {
            license,
            history,
            achievements,
            projects,
        }
    }

    /// Export `html` under `name` as `kind` into `out_dir`
    pub fn export(
        &self,
        kind: ExportKind,
        name: &str,
        html: &str,
        out_dir: &Path,
    ) -> Result<ExportOutcome> {
        let license = self.license.validate();

        if !self.license.can_export(kind) {
            let reason = if license.features().allows_export(kind) {
                DenyReason::QuotaExhausted
            } else {
                DenyReason::FeatureLocked
            };
            info!(kind = %kind, tier = %license.tier, ?reason, "Export denied");
            return Ok(ExportOutcome::Denied { kind, reason });
        }

        let artifact = match kind {
            ExportKind::Html => html::write_html(name, html, out_dir)?,
            ExportKind::Pwa => pwa::build_pwa(name, html, out_dir)?,
            ExportKind::Apk => apk::build_package(name, html, out_dir)?,
        };

        self.license.record_export(kind);
        let entry = self
            .history
            .append(kind, &artifact.filename, artifact.size_bytes);
        let unlocked = self.achievements.evaluate(&self.stats());

        info!(
            kind = %kind,
            filename = %artifact.filename,
            size = artifact.size_bytes,
            "Export completed"
        );

        Ok(ExportOutcome::Completed {
            entry,
            path: artifact.path,
            unlocked,
        })
    }

    /// Count a completed generation and re-evaluate achievements
    pub fn record_generation(&self) -> Vec<&'static AchievementDef> {
        self.license.usage().increment(Metric::AiGeneration);
        self.achievements.evaluate(&self.stats())
    }

    /// Snapshot of the stats the achievement predicates run against
    pub fn stats(&self) -> UsageStats {
        let counters = self.license.usage().counters();
        UsageStats {
            ai_generations: counters.ai_generations,
            pwa_exports: counters.pwa_exports,
            apk_builds: counters.apk_builds,
            total_exports: self.history.list().len() as u64,
            projects_saved: self.projects.count().unwrap_or(0),
            tier: self.license.current().tier,
        }
    }
}

/// Filesystem-safe file stem from an app name
fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_dash = true;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    if slug.is_empty() {
        slug.push_str("app");
    }
    slug
}
