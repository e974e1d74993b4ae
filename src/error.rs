//! Error types for offsync.
//!
//! `OffsyncError` is the crate-wide error used by configuration, storage
//! setup and the CLI. Action execution reports its outcome through
//! [`ActionError`], whose [`ActionError::kind`] is the stable error string
//! callers match on (`offline`, `action-failed`, ...).

use serde_json::{json, Value};
use thiserror::Error;

/// Crate-wide error.
#[derive(Debug, Error)]
pub enum OffsyncError {
    /// Invalid or unreadable configuration.
    #[error("config error: {0}")]
    Config(String),

    /// SQLite failure.
    #[error("database error: {0}")]
    Database(String),

    /// Filesystem failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization failure.
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// User-supplied input is malformed.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A requested item does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The remote side answered but refused the submission.
    #[error("rejected: {0}")]
    Rejected(String),

    /// Persisting or loading the pile failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// An action could not be executed or queued.
    #[error(transparent)]
    Action(#[from] ActionError),
}

/// Failure of the key-value storage behind the pile.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend rejected a read or write.
    #[error("storage backend failed: {0}")]
    Backend(String),

    /// The pile could not be serialized.
    #[error("failed to serialize pile: {0}")]
    Serialize(#[source] serde_json::Error),

    /// The stored pile is not a JSON array of records.
    #[error("stored pile under {namespace}/{key} is corrupt: {source}")]
    Corrupt {
        namespace: String,
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Why an action did not complete.
#[derive(Debug, Error)]
pub enum ActionError {
    /// No handler is registered under this name. Never persisted.
    #[error("action not registered: {0}")]
    NotRegistered(String),

    /// The network is down. `queued` holds the id of the record appended
    /// for a direct call, `None` for a replay.
    #[error("offline")]
    Offline { queued: Option<String> },

    /// The handler rejected the action with `data`.
    #[error("action failed: {data}")]
    Failed { data: Value, queued: Option<String> },

    /// A replay referenced a record that is no longer in the pile.
    #[error("record not found in pile: {0}")]
    RecordNotFound(String),

    /// A replay referenced a record that is already being replayed.
    #[error("record is already being replayed: {0}")]
    RecordBusy(String),

    /// The pile could not be persisted.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ActionError {
    /// Stable error kind string.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::NotRegistered(_) => "action-not-registered",
            Self::Offline { .. } => "offline",
            Self::Failed { .. } => "action-failed",
            Self::RecordNotFound(_) => "record-not-found",
            Self::RecordBusy(_) => "record-busy",
            Self::Storage(_) => "storage-failed",
        }
    }

    /// Id of the record appended because of this failure, if any.
    #[must_use]
    pub fn queued(&self) -> Option<&str> {
        match self {
            Self::Offline { queued } | Self::Failed { queued, .. } => queued.as_deref(),
            _ => None,
        }
    }

    /// Whether the action is (still) waiting in the pile for a later replay.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Offline { .. } | Self::Failed { .. })
    }

    /// JSON shape `{ "error": kind, "data": ... }`.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let data = match self {
            Self::Failed { data, .. } => data.clone(),
            Self::NotRegistered(name) => json!({ "action_name": name }),
            Self::RecordNotFound(id) | Self::RecordBusy(id) => json!({ "id": id }),
            Self::Storage(e) => Value::String(e.to_string()),
            Self::Offline { .. } => json!({}),
        };
        json!({ "error": self.kind(), "data": data, "queued": self.queued() })
    }
}
