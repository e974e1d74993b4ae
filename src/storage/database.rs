//! `SQLite` database connection and key-value operations.
//!
//! The database is stored at `~/.offsync/offsync.db` and holds a single
//! namespaced `kv_store` table.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use super::{migrations, KeyValueStore};
use crate::config::Paths;
use crate::error::{OffsyncError, StorageError};

/// Database connection wrapper.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at the default location.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrations fail.
    pub fn open() -> Result<Self, OffsyncError> {
        let paths = Paths::new()?;
        paths.ensure_dirs()?;
        Self::open_at(&paths.database)
    }

    /// Open the database at a specific path.
    ///
    /// Creates the database file and runs migrations if necessary.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrations fail.
    pub fn open_at(path: &std::path::Path) -> Result<Self, OffsyncError> {
        let conn = Connection::open(path).map_err(|e| {
            OffsyncError::Database(format!("Failed to open database {}: {e}", path.display()))
        })?;

        let db = Self { conn };
        db.migrate()?;

        Ok(db)
    }

    /// Open an in-memory database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrations fail.
    pub fn open_in_memory() -> Result<Self, OffsyncError> {
        let conn = Connection::open_in_memory().map_err(|e| {
            OffsyncError::Database(format!("Failed to open in-memory database: {e}"))
        })?;

        let db = Self { conn };
        db.migrate()?;

        Ok(db)
    }

    fn migrate(&self) -> Result<(), OffsyncError> {
        migrations::run(&self.conn)
    }

    /// Get the current schema version.
    ///
    /// # Errors
    ///
    /// Returns an error if the version cannot be read.
    pub fn schema_version(&self) -> Result<i32, OffsyncError> {
        migrations::get_version(&self.conn)
    }
}

impl KeyValueStore for Database {
    fn get(&self, namespace: &str, key: &str) -> Result<Option<String>, StorageError> {
        self.conn
            .query_row(
                "SELECT value FROM kv_store WHERE namespace = ?1 AND key = ?2",
                params![namespace, key],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| StorageError::Backend(format!("Failed to read {namespace}/{key}: {e}")))
    }

    fn set(&self, namespace: &str, key: &str, value: &str) -> Result<(), StorageError> {
        self.conn
            .execute(
                r"INSERT INTO kv_store (namespace, key, value, updated_at)
                  VALUES (?1, ?2, ?3, ?4)
                  ON CONFLICT(namespace, key) DO UPDATE SET
                  value = excluded.value,
                  updated_at = excluded.updated_at",
                params![namespace, key, value, Utc::now().to_rfc3339()],
            )
            .map_err(|e| {
                StorageError::Backend(format!("Failed to write {namespace}/{key}: {e}"))
            })?;

        Ok(())
    }
}
