//! Storage layer for offsync.
//!
//! The action pile is persisted through the [`KeyValueStore`] trait as one
//! serialized string per `(namespace, key)`. Two backends are provided:
//! - [`Database`]: SQLite, used by the CLI
//! - [`MemoryStore`]: process-local, for embedding and tests

mod database;
mod memory;
mod migrations;

pub use database::Database;
pub use memory::MemoryStore;

use crate::error::StorageError;

/// Namespaced string storage.
#[cfg_attr(test, mockall::automock)]
pub trait KeyValueStore: Send {
    /// Read the value stored under `namespace`/`key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn get(&self, namespace: &str, key: &str) -> Result<Option<String>, StorageError>;

    /// Replace the value stored under `namespace`/`key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the write.
    fn set(&self, namespace: &str, key: &str, value: &str) -> Result<(), StorageError>;
}
