//! SQLite database wrapper with versioned migrations

use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

/// Current schema version
const SCHEMA_VERSION: i32 = 3;

/// SQLite database wrapper
pub struct Database {
    conn: Connection,
}

/// Shared handle passed to the stores constructed at startup
pub type SharedDatabase = Arc<Mutex<Database>>;

impl Database {
    /// Create a new database at the given path
    pub fn new(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        // Enable WAL mode for better concurrent access
        // This prevents lock contention when multiple instances try to access the database
        conn.pragma_update(None, "journal_mode", "WAL")?;

        // Set busy timeout to avoid immediate failures on lock contention
        conn.busy_timeout(std::time::Duration::from_secs(5))?;

        let db = Self { conn };
        db.run_migrations()?;
        Ok(db)
    }

    /// Open the database and wrap it in the shared handle
    pub fn open_shared(path: &Path) -> Result<SharedDatabase> {
        Ok(Arc::new(Mutex::new(Self::new(path)?)))
    }

    /// Get the underlying connection
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Get the current schema version from database
    pub(crate) fn get_schema_version(&self) -> i32 {
        // Create version table if it doesn't exist
        if let Err(e) = self.conn.execute(
            "CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )",
            [],
        ) {
            tracing::warn!("Failed to create schema_version table: {}", e);
            // Table creation failed, assume version 0
            return 0;
        }

        self.conn
            .query_row(
                "SELECT COALESCE(MAX(version), 0) FROM schema_version",
                [],
                |row| row.get(0),
            )
            .unwrap_or(0)
    }

    /// Set schema version after successful migration
    fn set_schema_version(&self, version: i32) -> Result<()> {
        self.conn.execute(
            "INSERT INTO schema_version (version) VALUES (?1)",
            [version],
        )?;
        Ok(())
    }

    /// Run database migrations incrementally
    pub(crate) fn run_migrations(&self) -> Result<()> {
        let current_version = self.get_schema_version();
        info!(
            "Database schema version: {} (target: {})",
            current_version, SCHEMA_VERSION
        );

        if current_version >= SCHEMA_VERSION {
            return Ok(());
        }

        // Migration 1: App state key-value table
        if current_version < 1 {
            info!("Running migration 1: App state table");
            self.conn.execute_batch(
                r#"
                -- One row per persisted entity, JSON-encoded value.
                -- Keys: license, export_stats, export_history, achievements
                CREATE TABLE IF NOT EXISTS app_state (
                    key TEXT PRIMARY KEY,
                    value TEXT NOT NULL,
                    updated_at INTEGER NOT NULL
                );
                "#,
            )?;
            self.set_schema_version(1)?;
        }

        // Migration 2: Saved projects (generated apps)
        if current_version < 2 {
            info!("Running migration 2: Projects table");
            self.conn.execute_batch(
                r#"
                -- Generated apps saved to the local gallery
                CREATE TABLE IF NOT EXISTS projects (
                    id TEXT PRIMARY KEY,
                    name TEXT NOT NULL,
                    prompt TEXT NOT NULL,
                    template TEXT,
                    html TEXT NOT NULL,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );
                "#,
            )?;
            self.set_schema_version(2)?;
        }

        // Migration 3: Index for project listing
        if current_version < 3 {
            info!("Running migration 3: Project listing index");
            self.conn.execute_batch(
                r#"
                CREATE INDEX IF NOT EXISTS idx_projects_updated
                    ON projects(updated_at DESC);
                "#,
            )?;
            self.set_schema_version(3)?;
        }

        info!("Migrations complete");
        Ok(())
    }
}
