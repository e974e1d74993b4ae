use chrono::{DateTime, Utc};
use colored::Colorize;
use serde_json::Value;

use crate::features::forms::OutboxPost;
use crate::features::sync::{ActionData, ActionRecord, PileStats};
use crate::network::NetworkState;

/// Format pile records as a list
pub fn format_records_pretty(records: &[ActionRecord]) -> String {
    if records.is_empty() {
        return "Action pile (0 items)\n  Nothing queued".to_string();
    }

    let mut output = format!("Action pile ({} items)\n", records.len());
    output.push_str(&"─".repeat(60));
    output.push('\n');

    for record in records {
        let queued_at = record.created_at().map_or_else(
            || record.timestamp.to_string(),
            |t| t.format("%Y-%m-%d %H:%M:%S").to_string(),
        );
        let short_id: String = record.id.chars().take(8).collect();

        output.push_str(&format!(
            "{} {}  {}\n",
            short_id.dimmed(),
            record.action_name.bold(),
            queued_at.yellow()
        ));
        if !record.action_data.is_empty() {
            output.push_str(&format!("    {}\n", format_payload(&record.action_data).dimmed()));
        }
    }

    output
}

/// Format record payloads, one per line
pub fn format_data_pretty(data: &[ActionData]) -> String {
    data.iter().map(format_payload).collect::<Vec<_>>().join("\n")
}

/// Format pile statistics
pub fn format_stats_pretty(stats: &PileStats, network: NetworkState) -> String {
    let mut lines = Vec::new();

    lines.push("Action Pile Status".bold().to_string());
    lines.push("─".repeat(40));

    let network = match network {
        NetworkState::Online => "online".green(),
        NetworkState::Offline => "offline".red(),
    };
    lines.push(format!("  Network:    {network}"));

    lines.push(format!(
        "  Pending:    {} {}",
        stats.pending,
        if stats.pending > 0 {
            "actions waiting".dimmed()
        } else {
            "".dimmed()
        }
    ));

    if stats.replaying > 0 {
        lines.push(format!("  Replaying:  {}", stats.replaying));
    }

    if let Some(oldest) = stats.oldest {
        lines.push(format!("  Oldest:     {}", age(oldest).dimmed()));
    }

    if !stats.by_action.is_empty() {
        lines.push(String::new());
        for (name, count) in &stats.by_action {
            lines.push(format!("  {name:<20} {count}"));
        }
    }

    if stats.pending > 0 {
        lines.push(String::new());
        lines.push(
            "Run 'offsync sync' to deliver pending actions"
                .dimmed()
                .to_string(),
        );
    }

    lines.join("\n")
}

/// Format delivered outbox posts
pub fn format_posts_pretty(posts: &[OutboxPost]) -> String {
    if posts.is_empty() {
        return "Outbox (0 posts)\n  No posts".to_string();
    }

    let mut output = format!("Outbox ({} posts)\n", posts.len());
    output.push_str(&"─".repeat(60));
    output.push('\n');

    for post in posts {
        output.push_str(&format!(
            "#{:<4} {}  {}\n",
            post.post_id,
            post.post_title.bold(),
            post.post_date_gmt.dimmed()
        ));
    }

    output
}

fn format_payload(data: &ActionData) -> String {
    Value::Object(data.clone()).to_string()
}

fn age(since: DateTime<Utc>) -> String {
    let age = Utc::now().signed_duration_since(since);
    if age.num_days() > 0 {
        format!("{} days ago", age.num_days())
    } else if age.num_hours() > 0 {
        format!("{} hours ago", age.num_hours())
    } else if age.num_minutes() > 0 {
        format!("{} minutes ago", age.num_minutes())
    } else {
        "just now".to_string()
    }
}
