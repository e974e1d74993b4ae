//! Action records stored in the pile.
//!
//! A record is immutable once stored: it is only ever appended or removed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Caller-defined action payload.
pub type ActionData = Map<String, Value>;

/// Field added to the payload handed to a handler, carrying the record's
/// original timestamp.
pub const TIMESTAMP_FIELD: &str = "timestamp";

/// A pending action persisted in the pile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRecord {
    /// Unique per enqueue.
    pub id: String,
    /// SHA-256 of name and data; equal for identical submissions.
    #[serde(default)]
    pub content_key: String,
    /// Registry key of the handler that delivers this action.
    pub action_name: String,
    /// Caller payload, without the timestamp field.
    #[serde(default)]
    pub action_data: ActionData,
    /// Seconds since epoch at the first attempt.
    pub timestamp: i64,
}

impl ActionRecord {
    /// Create a record with a fresh id.
    #[must_use]
    pub fn new(action_name: &str, action_data: ActionData, timestamp: i64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            content_key: content_key(action_name, &action_data),
            action_name: action_name.to_string(),
            action_data,
            timestamp,
        }
    }

    /// Payload handed to the handler on replay.
    #[must_use]
    pub fn payload(&self) -> ActionData {
        with_timestamp(&self.action_data, self.timestamp)
    }

    /// Timestamp as a date, if representable.
    #[must_use]
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.timestamp, 0)
    }
}

/// Per-record replay state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordState {
    /// Stored, waiting for a replay.
    Pending,
    /// Handler invoked, result not in yet.
    Replaying,
}

impl std::fmt::Display for RecordState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Replaying => write!(f, "replaying"),
        }
    }
}

/// Content-derived key over `action_name-serialized(data)`.
#[must_use]
pub fn content_key(action_name: &str, data: &ActionData) -> String {
    let serialized = Value::Object(data.clone()).to_string();
    let digest = Sha256::digest(format!("{action_name}-{serialized}").as_bytes());
    format!("{digest:x}")
}

/// Copy of `data` with the timestamp field set.
#[must_use]
pub fn with_timestamp(data: &ActionData, timestamp: i64) -> ActionData {
    let mut payload = data.clone();
    payload.insert(TIMESTAMP_FIELD.to_string(), Value::from(timestamp));
    payload
}

/// Current time in whole seconds since epoch.
#[must_use]
pub fn now_timestamp() -> i64 {
    Utc::now().timestamp()
}

/// Timestamp carried by a handler payload, or now if it has none.
#[must_use]
pub fn timestamp_of(payload: &ActionData) -> i64 {
    payload
        .get(TIMESTAMP_FIELD)
        .and_then(Value::as_i64)
        .unwrap_or_else(now_timestamp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn form(first: &str, last: &str) -> ActionData {
        let mut data = ActionData::new();
        data.insert("firstname".into(), json!(first));
        data.insert("lastname".into(), json!(last));
        data
    }

    #[test]
    fn test_ids_unique_content_key_shared() {
        let a = ActionRecord::new("send_form", form("A", "B"), 10);
        let b = ActionRecord::new("send_form", form("A", "B"), 10);

        assert_ne!(a.id, b.id);
        assert_eq!(a.content_key, b.content_key);
        assert_eq!(a.content_key.len(), 64);
    }

    #[test]
    fn test_content_key_depends_on_name() {
        assert_ne!(
            content_key("send_form", &form("A", "B")),
            content_key("other", &form("A", "B"))
        );
        assert_ne!(
            content_key("send_form", &form("A", "B")),
            content_key("send_form", &form("A", "C"))
        );
    }

    #[test]
    fn test_payload_adds_timestamp_without_touching_record() {
        let record = ActionRecord::new("send_form", form("A", "B"), 1_700_000_000);
        let payload = record.payload();

        assert_eq!(payload[TIMESTAMP_FIELD], json!(1_700_000_000));
        assert_eq!(payload["firstname"], json!("A"));
        assert!(!record.action_data.contains_key(TIMESTAMP_FIELD));
        assert_eq!(timestamp_of(&payload), 1_700_000_000);
        assert!(timestamp_of(&record.action_data) >= 1_700_000_000);
    }

    #[test]
    fn test_serialized_shape() {
        let record = ActionRecord::new("send_form", form("A", "B"), 42);
        let value = serde_json::to_value(&record).unwrap();

        assert_eq!(value["action_name"], "send_form");
        assert_eq!(value["action_data"]["lastname"], "B");
        assert_eq!(value["timestamp"], 42);
        assert!(value["id"].is_string());
    }

    #[test]
    fn test_deserialize_without_content_key() {
        let json = r#"{"id":"abc","action_name":"send_form","action_data":{"firstname":"A"},"timestamp":5}"#;
        let record: ActionRecord = serde_json::from_str(json).unwrap();

        assert_eq!(record.id, "abc");
        assert!(record.content_key.is_empty());
        assert_eq!(record.created_at().unwrap().timestamp(), 5);
    }
}
