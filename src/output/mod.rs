//! Output formatting for offsync.
//!
//! This module provides formatters for displaying the action pile in various formats.

mod json;
mod pretty;

use crate::cli::args::OutputFormat;
use crate::error::OffsyncError;
use crate::features::forms::OutboxPost;
use crate::features::sync::{format_replay_report, ActionData, ActionRecord, PileStats, ReplayReport};
use crate::network::NetworkState;

pub use json::*;
pub use pretty::*;

/// Format pile records based on output format
///
/// # Errors
///
/// Returns `OffsyncError::Parse` if JSON serialization fails.
pub fn format_records(records: &[ActionRecord], format: OutputFormat) -> Result<String, OffsyncError> {
    match format {
        OutputFormat::Pretty => Ok(format_records_pretty(records)),
        OutputFormat::Json => format_records_json(records),
    }
}

/// Format record payloads based on output format
///
/// # Errors
///
/// Returns `OffsyncError::Parse` if JSON serialization fails.
pub fn format_data(data: &[ActionData], format: OutputFormat) -> Result<String, OffsyncError> {
    match format {
        OutputFormat::Pretty => Ok(format_data_pretty(data)),
        OutputFormat::Json => format_data_json(data),
    }
}

/// Format pile statistics based on output format
///
/// # Errors
///
/// Returns `OffsyncError::Parse` if JSON serialization fails.
pub fn format_stats(
    stats: &PileStats,
    network: NetworkState,
    format: OutputFormat,
) -> Result<String, OffsyncError> {
    match format {
        OutputFormat::Pretty => Ok(format_stats_pretty(stats, network)),
        OutputFormat::Json => format_stats_json(stats, network),
    }
}

/// Format a replay report based on output format
///
/// # Errors
///
/// Returns `OffsyncError::Parse` if JSON serialization fails.
pub fn format_replay(report: &ReplayReport, format: OutputFormat) -> Result<String, OffsyncError> {
    match format {
        OutputFormat::Pretty => Ok(format_replay_report(report)),
        OutputFormat::Json => to_json(&report.to_json()),
    }
}

/// Format outbox posts based on output format
///
/// # Errors
///
/// Returns `OffsyncError::Parse` if JSON serialization fails.
pub fn format_posts(posts: &[OutboxPost], format: OutputFormat) -> Result<String, OffsyncError> {
    match format {
        OutputFormat::Pretty => Ok(format_posts_pretty(posts)),
        OutputFormat::Json => format_posts_json(posts),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(name: &str) -> ActionRecord {
        let mut data = ActionData::new();
        data.insert("firstname".into(), json!("Ada"));
        ActionRecord::new(name, data, 1_700_000_000)
    }

    #[test]
    fn test_records_json_shape() {
        let out = format_records(&[record("send_form")], OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();

        assert_eq!(value["count"], 1);
        assert_eq!(value["items"][0]["action_name"], "send_form");
    }

    #[test]
    fn test_records_pretty() {
        colored::control::set_override(false);
        let out = format_records(&[record("send_form")], OutputFormat::Pretty).unwrap();
        assert!(out.starts_with("Action pile (1 items)"));
        assert!(out.contains("send_form"));
        assert!(out.contains("2023-11-14"));

        let empty = format_records(&[], OutputFormat::Pretty).unwrap();
        assert!(empty.contains("Nothing queued"));
    }

    #[test]
    fn test_data_only_is_bare_array() {
        let out = format_data(&[record("send_form").action_data], OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value, json!([{"firstname": "Ada"}]));
    }

    #[test]
    fn test_stats_json() {
        let stats = PileStats {
            pending: 2,
            replaying: 0,
            oldest: None,
            by_action: [("send_form".to_string(), 2)].into_iter().collect(),
        };
        let out = format_stats(&stats, NetworkState::Offline, OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();

        assert_eq!(value["network"], "offline");
        assert_eq!(value["pending"], 2);
        assert_eq!(value["by_action"]["send_form"], 2);
    }

    #[test]
    fn test_empty_replay_json() {
        let out = format_replay(&ReplayReport::empty(), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["processed_something"], false);
    }
}
