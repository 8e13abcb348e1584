//! AppForge Core - Shared library for generation, entitlements, and export
//!
//! This crate provides the core functionality for the AppForge CLI:
//! - Prompt-driven generation of self-contained HTML apps
//! - Local entitlement engine (tiers, quotas, usage tracking)
//! - SQLite-backed state and project storage
//! - Export builders (standalone HTML, PWA bundle, app package)

pub mod ai;
pub mod constants;
pub mod export;
pub mod paths;
pub mod storage;

// Re-exports for convenience
pub use ai::client::{GenClient, GenClientConfig};
pub use ai::generator::{AppGenerator, GeneratedApp, GenerationSource};
pub use export::{ExportOutcome, ExportService};
pub use storage::{
    AchievementEngine, Database, ExportHistory, ExportKind, KvStore, LicenseManager, ProjectStore,
    SharedDatabase, Tier, UsageTracker,
};
