//! Replay results.
//!
//! A replay launches every eligible record concurrently; the report keeps
//! each outcome so callers can see partial progress even when the aggregate
//! result is a failure.

use colored::Colorize;
use serde::Serialize;
use serde_json::{json, Value};

use crate::error::ActionError;

/// Successful outcome of an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionAnswer {
    /// Whatever the handler answered.
    pub data: Value,
}

/// Result of replaying a single record.
#[derive(Debug)]
pub struct ReplayOutcome {
    pub record_id: String,
    pub action_name: String,
    pub result: Result<ActionAnswer, ActionError>,
}

impl ReplayOutcome {
    #[must_use]
    pub const fn is_delivered(&self) -> bool {
        self.result.is_ok()
    }

    #[must_use]
    pub fn to_json(&self) -> Value {
        match &self.result {
            Ok(answer) => json!({
                "id": self.record_id,
                "action_name": self.action_name,
                "delivered": true,
                "data": answer.data,
            }),
            Err(e) => json!({
                "id": self.record_id,
                "action_name": self.action_name,
                "delivered": false,
                "error": e.kind(),
                "data": e.to_json()["data"],
            }),
        }
    }
}

/// Result of replaying the pile.
#[derive(Debug)]
pub struct ReplayReport {
    /// Whether at least one replay was launched.
    pub processed_something: bool,
    /// Records delivered and removed.
    pub delivered: usize,
    /// Records whose replay failed; they remain in the pile.
    pub failed: usize,
    /// Individual outcomes in pile order.
    pub outcomes: Vec<ReplayOutcome>,
}

impl ReplayReport {
    /// Report for a replay that launched nothing.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            processed_something: false,
            delivered: 0,
            failed: 0,
            outcomes: Vec::new(),
        }
    }

    /// Add an outcome.
    pub fn add(&mut self, outcome: ReplayOutcome) {
        if outcome.is_delivered() {
            self.delivered += 1;
        } else {
            self.failed += 1;
        }
        self.processed_something = true;
        self.outcomes.push(outcome);
    }

    #[must_use]
    pub const fn all_succeeded(&self) -> bool {
        self.failed == 0
    }

    #[must_use]
    pub const fn total(&self) -> usize {
        self.delivered + self.failed
    }

    /// First failure in pile order.
    #[must_use]
    pub fn first_error(&self) -> Option<&ActionError> {
        self.outcomes.iter().find_map(|o| o.result.as_ref().err())
    }

    /// Collapse into the aggregate result: `Ok` only if every launched
    /// replay succeeded, otherwise the first failure.
    ///
    /// # Errors
    ///
    /// Returns the first replay error in pile order.
    pub fn into_result(mut self) -> Result<Self, ActionError> {
        match self.outcomes.iter().position(|o| o.result.is_err()) {
            Some(index) => match self.outcomes.swap_remove(index).result {
                Err(e) => Err(e),
                Ok(_) => Ok(self),
            },
            None => Ok(self),
        }
    }

    #[must_use]
    pub fn to_json(&self) -> Value {
        json!({
            "processed_something": self.processed_something,
            "delivered": self.delivered,
            "failed": self.failed,
            "total": self.total(),
            "outcomes": self.outcomes.iter().map(ReplayOutcome::to_json).collect::<Vec<_>>(),
        })
    }
}

impl FromIterator<ReplayOutcome> for ReplayReport {
    fn from_iter<I: IntoIterator<Item = ReplayOutcome>>(iter: I) -> Self {
        let mut report = Self::empty();
        for outcome in iter {
            report.add(outcome);
        }
        report
    }
}

/// Format a replay report for display.
#[must_use]
pub fn format_replay_report(report: &ReplayReport) -> String {
    if !report.processed_something {
        return "Nothing to sync.".to_string();
    }

    let mut lines = Vec::new();

    lines.push(format!("Sync completed: {} actions", report.total()));
    lines.push("─".repeat(40));

    if report.delivered > 0 {
        lines.push(format!(
            "  {} {}",
            "✓".green(),
            format!("{} delivered", report.delivered).green()
        ));
    }

    if report.failed > 0 {
        lines.push(format!(
            "  {} {}",
            "✗".red(),
            format!("{} still pending", report.failed).red()
        ));
    }

    let errors: Vec<_> = report
        .outcomes
        .iter()
        .filter_map(|o| o.result.as_ref().err().map(|e| (o, e)))
        .take(3)
        .collect();

    if !errors.is_empty() {
        lines.push(String::new());
        lines.push("Errors:".to_string());
        for (outcome, err) in errors {
            lines.push(format!("  - {}: {}", outcome.action_name, err));
        }
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delivered(id: &str) -> ReplayOutcome {
        ReplayOutcome {
            record_id: id.to_string(),
            action_name: "send_form".to_string(),
            result: Ok(ActionAnswer { data: json!({"ok": 1}) }),
        }
    }

    fn offline(id: &str) -> ReplayOutcome {
        ReplayOutcome {
            record_id: id.to_string(),
            action_name: "send_form".to_string(),
            result: Err(ActionError::Offline { queued: None }),
        }
    }

    #[test]
    fn test_report_counts() {
        let report: ReplayReport = vec![delivered("a"), offline("b"), delivered("c")]
            .into_iter()
            .collect();

        assert!(report.processed_something);
        assert_eq!(report.delivered, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.total(), 3);
        assert!(!report.all_succeeded());
        assert_eq!(report.first_error().map(ActionError::kind), Some("offline"));
    }

    #[test]
    fn test_into_result_reports_first_error() {
        let failing = ReplayOutcome {
            record_id: "b".into(),
            action_name: "send_form".into(),
            result: Err(ActionError::Failed {
                data: json!("boom"),
                queued: None,
            }),
        };
        let report: ReplayReport = vec![delivered("a"), failing, offline("c")]
            .into_iter()
            .collect();

        let err = report.into_result().unwrap_err();
        assert_eq!(err.kind(), "action-failed");
    }

    #[test]
    fn test_into_result_all_ok() {
        let report: ReplayReport = vec![delivered("a")].into_iter().collect();
        let report = report.into_result().unwrap();
        assert!(report.all_succeeded());
    }

    #[test]
    fn test_empty_report() {
        let report = ReplayReport::empty();
        assert!(!report.processed_something);
        assert!(report.into_result().is_ok());
        assert_eq!(format_replay_report(&ReplayReport::empty()), "Nothing to sync.");
    }

    #[test]
    fn test_outcome_json() {
        let value = offline("b").to_json();
        assert_eq!(value["delivered"], false);
        assert_eq!(value["error"], "offline");
        assert_eq!(delivered("a").to_json()["data"]["ok"], 1);
    }
}
