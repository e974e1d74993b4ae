//! Action pile commands.

use std::path::Path;

use colored::Colorize;
use serde_json::{json, Value};

use crate::cli::args::OutputFormat;
use crate::error::{ActionError, OffsyncError};
use crate::features::forms::{read_answer, read_outbox, FormSubmission, SEND_FORM};
use crate::features::sync::{ActionAnswer, ActionData, ActionPile};
use crate::output::{format_data, format_posts, format_records, format_replay, format_stats, to_json};

/// Submit the contact form, queuing it if it cannot be delivered now.
///
/// # Errors
///
/// Returns an error for blank fields, a rejected form, or a pile that
/// could not be persisted.
pub async fn submit(
    pile: &ActionPile,
    firstname: &str,
    lastname: &str,
    format: OutputFormat,
) -> Result<String, OffsyncError> {
    let data = FormSubmission::new(firstname, lastname)?.into_data();
    let result = pile.execute(SEND_FORM, data).await;

    match result {
        Ok(answer) => {
            let post_id = read_answer(&answer.data)
                .map_err(|code| OffsyncError::Rejected(format!("form not processed: {code}")))?;
            match format {
                OutputFormat::Json => delivered_json(&answer),
                OutputFormat::Pretty => Ok(format!(
                    "{} Form data sent successfully (post #{post_id})",
                    "✓".green()
                )),
            }
        }
        Err(e) => queued_or_error(e, format),
    }
}

/// Queue an action without attempting it.
///
/// # Errors
///
/// Returns an error if `data` is not a JSON object, the action is not
/// registered, or the pile could not be persisted.
pub async fn enqueue(
    pile: &ActionPile,
    action: &str,
    data: &str,
    format: OutputFormat,
) -> Result<String, OffsyncError> {
    let data = parse_data(data)?;
    let id = pile.enqueue_action(action, data).await?;

    match format {
        OutputFormat::Json => to_json(&json!({ "status": "queued", "id": id, "action_name": action })),
        OutputFormat::Pretty => Ok(format!("{} Queued {} ({})", "+".cyan(), action.bold(), id.dimmed())),
    }
}

/// Replay the pile.
///
/// # Errors
///
/// Returns the first replay failure after printing the report.
pub async fn sync(pile: &ActionPile, format: OutputFormat) -> Result<String, OffsyncError> {
    let report = pile.replay_pile().await;
    let output = format_replay(&report, format)?;

    if report.all_succeeded() {
        return Ok(output);
    }

    println!("{output}");
    match report.into_result() {
        Err(e) => Err(e.into()),
        Ok(_) => Ok(String::new()),
    }
}

/// Show pile status.
///
/// # Errors
///
/// Returns an error if output formatting fails.
pub async fn status(pile: &ActionPile, format: OutputFormat) -> Result<String, OffsyncError> {
    let stats = pile.stats().await;
    format_stats(&stats, pile.network_state(), format)
}

/// List queued actions.
///
/// # Errors
///
/// Returns an error if output formatting fails.
pub async fn list(
    pile: &ActionPile,
    data_only: bool,
    format: OutputFormat,
) -> Result<String, OffsyncError> {
    if data_only {
        return format_data(&pile.data().await, format);
    }
    format_records(&pile.records().await, format)
}

/// Remove queued actions by name, and any whose action is unregistered.
///
/// # Errors
///
/// Returns an error if the pile could not be persisted.
pub async fn purge(
    pile: &ActionPile,
    action: Option<&str>,
    format: OutputFormat,
) -> Result<String, OffsyncError> {
    let removed = match action {
        Some(name) => pile.remove_action_by_name_from_pile(name).await?,
        None => pile.clean_pile().await?,
    };

    match format {
        OutputFormat::Json => to_json(&json!({ "removed": removed, "remaining": pile.len().await })),
        OutputFormat::Pretty => Ok(format!("Removed {removed} queued actions")),
    }
}

/// Show delivered forms.
///
/// # Errors
///
/// Returns an error if the outbox cannot be read.
pub fn outbox(path: &Path, format: OutputFormat) -> Result<String, OffsyncError> {
    format_posts(&read_outbox(path)?, format)
}

fn parse_data(data: &str) -> Result<ActionData, OffsyncError> {
    match serde_json::from_str::<Value>(data)? {
        Value::Object(map) => Ok(map),
        other => Err(OffsyncError::InvalidInput(format!(
            "action data must be a JSON object, got: {other}"
        ))),
    }
}

fn delivered_json(answer: &ActionAnswer) -> Result<String, OffsyncError> {
    to_json(&json!({ "status": "delivered", "data": answer.data }))
}

fn queued_or_error(err: ActionError, format: OutputFormat) -> Result<String, OffsyncError> {
    let Some(id) = err.queued().map(String::from) else {
        return Err(err.into());
    };

    match format {
        OutputFormat::Json => {
            let mut value = err.to_json();
            value["status"] = json!("queued");
            to_json(&value)
        }
        OutputFormat::Pretty => {
            let reason = match &err {
                ActionError::Offline { .. } => "You are offline".to_string(),
                other => other.to_string(),
            };
            Ok(format!(
                "{} {reason}. Form queued ({}) and will be sent on the next sync.",
                "!".yellow(),
                id.dimmed()
            ))
        }
    }
}
