//! JSON output formatting for offsync.

use serde::Serialize;
use serde_json::json;

use crate::error::OffsyncError;
use crate::features::forms::OutboxPost;
use crate::features::sync::{ActionData, ActionRecord, PileStats};
use crate::network::NetworkState;

/// Format pile records as JSON
///
/// # Errors
///
/// Returns `OffsyncError::Parse` if JSON serialization fails.
pub fn format_records_json(records: &[ActionRecord]) -> Result<String, OffsyncError> {
    let output = json!({
        "count": records.len(),
        "items": records
    });
    Ok(serde_json::to_string_pretty(&output)?)
}

/// Format record payloads as a bare JSON array
///
/// # Errors
///
/// Returns `OffsyncError::Parse` if JSON serialization fails.
pub fn format_data_json(data: &[ActionData]) -> Result<String, OffsyncError> {
    Ok(serde_json::to_string_pretty(data)?)
}

/// Format pile statistics as JSON
///
/// # Errors
///
/// Returns `OffsyncError::Parse` if JSON serialization fails.
pub fn format_stats_json(stats: &PileStats, network: NetworkState) -> Result<String, OffsyncError> {
    let output = json!({
        "network": network.to_string(),
        "pending": stats.pending,
        "replaying": stats.replaying,
        "oldest": stats.oldest.map(|t| t.to_rfc3339()),
        "by_action": stats.by_action,
    });
    Ok(serde_json::to_string_pretty(&output)?)
}

/// Format outbox posts as JSON
///
/// # Errors
///
/// Returns `OffsyncError::Parse` if JSON serialization fails.
pub fn format_posts_json(posts: &[OutboxPost]) -> Result<String, OffsyncError> {
    let output = json!({
        "count": posts.len(),
        "items": posts
    });
    Ok(serde_json::to_string_pretty(&output)?)
}

/// Generic JSON formatter for any serializable type
///
/// # Errors
///
/// Returns `OffsyncError::Parse` if JSON serialization fails.
pub fn to_json<T: Serialize>(value: &T) -> Result<String, OffsyncError> {
    Ok(serde_json::to_string_pretty(value)?)
}
