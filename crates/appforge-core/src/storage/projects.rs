//! Saved project CRUD operations

use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::params;
use serde::{Deserialize, Serialize};

use super::database::SharedDatabase;

/// Project metadata for gallery listings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectInfo {
    pub id: String,
    pub name: String,
    pub prompt: String,
    /// Template id when generated from a bundled template
    pub template: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// A saved project including its generated document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub prompt: String,
    pub template: Option<String>,
    pub html: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Gallery of generated apps
#[derive(Clone)]
pub struct ProjectStore {
    db: SharedDatabase,
}

impl ProjectStore {
    pub fn new(db: SharedDatabase) -> Self {
        Self { db }
    }

    /// Save a generated app; returns its id
    pub fn save(
        &self,
        name: &str,
        prompt: &str,
        template: Option<&str>,
        html: &str,
    ) -> Result<String> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        let db = self.db.lock().unwrap_or_else(|e| e.into_inner());
        db.conn().execute(
            "INSERT INTO projects (id, name, prompt, template, html, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![id, name, prompt, template, html, now, now],
        )?;

        Ok(id)
    }

    /// List saved projects, newest first
    pub fn list(&self) -> Result<Vec<ProjectInfo>> {
        let db = self.db.lock().unwrap_or_else(|e| e.into_inner());
        let mut stmt = db.conn().prepare(
            "SELECT id, name, prompt, template, updated_at
             FROM projects
             ORDER BY updated_at DESC",
        )?;

        let projects = stmt
            .query_map([], |row| {
                let updated_at: String = row.get(4)?;
                Ok(ProjectInfo {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    prompt: row.get(2)?,
                    template: row.get(3)?,
                    updated_at: parse_timestamp(&updated_at),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(projects)
    }

    /// Number of saved projects
    pub fn count(&self) -> Result<u64> {
        let db = self.db.lock().unwrap_or_else(|e| e.into_inner());
        let count: i64 = db
            .conn()
            .query_row("SELECT COUNT(*) FROM projects", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Get a project with its full document
    pub fn get(&self, project_id: &str) -> Result<Option<Project>> {
        let db = self.db.lock().unwrap_or_else(|e| e.into_inner());
        let mut stmt = db.conn().prepare(
            "SELECT id, name, prompt, template, html, created_at, updated_at
             FROM projects WHERE id = ?1",
        )?;

        let project = stmt.query_row([project_id], |row| {
            let created_at: String = row.get(5)?;
            let updated_at: String = row.get(6)?;
            Ok(Project {
                id: row.get(0)?,
                name: row.get(1)?,
                prompt: row.get(2)?,
                template: row.get(3)?,
                html: row.get(4)?,
                created_at: parse_timestamp(&created_at),
                updated_at: parse_timestamp(&updated_at),
            })
        });

        match project {
            Ok(p) => Ok(Some(p)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Replace a project's document after a regeneration
    pub fn update_html(&self, project_id: &str, html: &str) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        let db = self.db.lock().unwrap_or_else(|e| e.into_inner());
        db.conn().execute(
            "UPDATE projects SET html = ?1, updated_at = ?2 WHERE id = ?3",
            params![html, now, project_id],
        )?;
        Ok(())
    }

    /// Delete a project
    pub fn delete(&self, project_id: &str) -> Result<()> {
        let db = self.db.lock().unwrap_or_else(|e| e.into_inner());
        db.conn()
            .execute("DELETE FROM projects WHERE id = ?1", params![project_id])?;
        tracing::info!(project_id = %project_id, "Project deleted");
        Ok(())
    }
}

fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::ProjectStore;
    use crate::storage::Database;

    fn create_test_store() -> (ProjectStore, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db = Database::open_shared(&temp_dir.path().join("test.db"))
            .expect("Failed to create database");
        (ProjectStore::new(db), temp_dir)
    }

    #[test]
    fn test_save_and_get_round_trips() {
        let (store, _temp) = create_test_store();

        let id = store
            .save("Tip Calculator", "a tip calculator", None, "<html></html>")
            .expect("Failed to save project");

        let project = store
            .get(&id)
            .expect("Failed to get project")
            .expect("Project should exist");

        assert_eq!(project.name, "Tip Calculator");
        assert_eq!(project.prompt, "a tip calculator");
        assert_eq!(project.template, None);
        assert_eq!(project.html, "<html></html>");
    }

    #[test]
    fn test_get_missing_project_is_none() {
        let (store, _temp) = create_test_store();

        let project = store.get("no-such-id").expect("Query should not fail");
        assert!(project.is_none());
    }

    #[test]
    fn test_list_and_count() {
        let (store, _temp) = create_test_store();

        store
            .save("One", "first", None, "<html>1</html>")
            .expect("Failed to save");
        store
            .save("Two", "second", Some("todo"), "<html>2</html>")
            .expect("Failed to save");

        assert_eq!(store.count().expect("Failed to count"), 2);

        let projects = store.list().expect("Failed to list");
        assert_eq!(projects.len(), 2);
    }

    #[test]
    fn test_update_html_replaces_document() {
        let (store, _temp) = create_test_store();

        let id = store
            .save("App", "app", None, "<html>v1</html>")
            .expect("Failed to save");
        store
            .update_html(&id, "<html>v2</html>")
            .expect("Failed to update");

        let project = store
            .get(&id)
            .expect("Failed to get")
            .expect("Project should exist");
        assert_eq!(project.html, "<html>v2</html>");
    }

    #[test]
    fn test_delete_removes_project() {
        let (store, _temp) = create_test_store();

        let id = store
            .save("App", "app", None, "<html></html>")
            .expect("Failed to save");
        store.delete(&id).expect("Failed to delete");

        assert!(store.get(&id).expect("Query should not fail").is_none());
        assert_eq!(store.count().expect("Failed to count"), 0);
    }
}
