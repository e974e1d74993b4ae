//! Path resolution for offsync configuration and data files.
//!
//! All offsync data is stored in `~/.offsync/` (or `$OFFSYNC_HOME`):
//! - `config.yaml` - Main configuration file
//! - `offsync.db` - SQLite key-value store holding the action pile
//! - `outbox.jsonl` - Delivered form submissions

use std::path::PathBuf;

use crate::error::OffsyncError;

/// Environment variable overriding the data root.
pub const HOME_ENV: &str = "OFFSYNC_HOME";

/// Paths to offsync configuration and data files.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Root directory: `~/.offsync/`
    pub root: PathBuf,
    /// Config file: `~/.offsync/config.yaml`
    pub config_file: PathBuf,
    /// Database file: `~/.offsync/offsync.db`
    pub database: PathBuf,
    /// Form outbox: `~/.offsync/outbox.jsonl`
    pub outbox: PathBuf,
}

impl Paths {
    /// Resolve paths from `$OFFSYNC_HOME`, falling back to `$HOME/.offsync`.
    ///
    /// # Errors
    ///
    /// Returns an error if neither variable is set.
    pub fn new() -> Result<Self, OffsyncError> {
        if let Ok(root) = std::env::var(HOME_ENV) {
            return Ok(Self::with_root(PathBuf::from(root)));
        }

        let home = std::env::var("HOME").map_err(|_| {
            OffsyncError::Config("Could not determine home directory".to_string())
        })?;

        Ok(Self::with_root(PathBuf::from(home).join(".offsync")))
    }

    /// Create paths with a custom root directory.
    #[must_use]
    pub fn with_root(root: PathBuf) -> Self {
        Self {
            config_file: root.join("config.yaml"),
            database: root.join("offsync.db"),
            outbox: root.join("outbox.jsonl"),
            root,
        }
    }

    /// Ensure the root directory exists.
    ///
    /// # Errors
    ///
    /// Returns an error if directory creation fails.
    pub fn ensure_dirs(&self) -> Result<(), OffsyncError> {
        if !self.root.exists() {
            std::fs::create_dir_all(&self.root).map_err(|e| {
                OffsyncError::Config(format!(
                    "Failed to create directory {}: {e}",
                    self.root.display()
                ))
            })?;
        }

        Ok(())
    }
}
