//! SQLite-backed [`KeyValueStore`]

use super::KeyValueStore;
use crate::error::{Result, RagdeskError};
use anyhow::Context;
use chrono::Utc;
use directories::ProjectDirs;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};

/// Key-value storage in a single SQLite file
///
/// Each operation opens its own connection, so the store is cheap to share
/// and holds no locks between calls.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    db_path: PathBuf,
}

impl SqliteStore {
    /// Create a store in the user's data directory
    ///
    /// `RAGDESK_STORAGE_PATH` overrides the location.
    pub fn new() -> Result<Self> {
        if let Ok(override_path) = std::env::var("RAGDESK_STORAGE_PATH") {
            return Self::new_with_path(override_path);
        }

        let proj_dirs = ProjectDirs::from("com", "ragdesk", "ragdesk").ok_or_else(|| {
            RagdeskError::Persistence("Could not determine data directory".into())
        })?;

        Self::new_with_path(proj_dirs.data_dir().join("ragdesk.db"))
    }

    /// Create a store that uses the specified database path
    ///
    /// Parent directories are created as needed.
    ///
    /// # Examples
    ///
    /// ```
    /// use ragdesk::storage::{KeyValueStore, SqliteStore};
    ///
    /// let dir = tempfile::tempdir().unwrap();
    /// let store = SqliteStore::new_with_path(dir.path().join("state.db")).unwrap();
    /// store.set("sidebarCollapsed", "true").unwrap();
    /// ```
    pub fn new_with_path<P: Into<PathBuf>>(db_path: P) -> Result<Self> {
        let db_path = db_path.into();

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .context("Failed to create parent directory for database")
                .map_err(|e| RagdeskError::Persistence(e.to_string()))?;
        }

        let store = Self { db_path };
        store.init()?;
        Ok(store)
    }

    /// Path of the underlying database file
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    fn open(&self) -> Result<Connection> {
        Connection::open(&self.db_path)
            .context("Failed to open database")
            .map_err(|e| RagdeskError::Persistence(e.to_string()).into())
    }

    fn init(&self) -> Result<()> {
        let conn = self.open()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )
        .context("Failed to create tables")
        .map_err(|e| RagdeskError::Persistence(e.to_string()))?;

        Ok(())
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.open()?;

        let value = conn
            .query_row("SELECT value FROM kv WHERE key = ?", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()
            .context("Failed to query key")
            .map_err(|e| RagdeskError::Persistence(e.to_string()))?;

        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.open()?;
        let now = Utc::now().to_rfc3339();

        conn.execute(
            "INSERT INTO kv (key, value, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, now],
        )
        .context("Failed to write key")
        .map_err(|e| RagdeskError::Persistence(e.to_string()))?;

        tracing::debug!(key, bytes = value.len(), "Stored value");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let conn = self.open()?;

        conn.execute("DELETE FROM kv WHERE key = ?", params![key])
            .context("Failed to delete key")
            .map_err(|e| RagdeskError::Persistence(e.to_string()))?;

        Ok(())
    }
}
