//! Form submissions delivered through the action pile.
//!
//! The `send_form` action carries a first and last name. It is delivered to
//! an outbox file that stands in for the remote endpoint.

pub mod outbox;

pub use outbox::{read_outbox, FormOutbox, OutboxPost};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::OffsyncError;
use crate::features::sync::ActionData;

/// Action name the form handler is registered under.
pub const SEND_FORM: &str = "send_form";

/// Fields of the contact form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormSubmission {
    pub firstname: String,
    pub lastname: String,
}

impl FormSubmission {
    /// Build a submission, rejecting blank fields.
    ///
    /// # Errors
    ///
    /// Returns an error if either name is empty after trimming.
    pub fn new(firstname: &str, lastname: &str) -> Result<Self, OffsyncError> {
        let firstname = firstname.trim();
        let lastname = lastname.trim();
        if firstname.is_empty() || lastname.is_empty() {
            return Err(OffsyncError::InvalidInput(
                "both firstname and lastname are required".to_string(),
            ));
        }
        Ok(Self {
            firstname: firstname.to_string(),
            lastname: lastname.to_string(),
        })
    }

    /// Action data for the pile.
    #[must_use]
    pub fn into_data(self) -> ActionData {
        let mut data = ActionData::new();
        data.insert("firstname".into(), Value::String(self.firstname));
        data.insert("lastname".into(), Value::String(self.lastname));
        data
    }
}

/// Interpret a `send_form` answer: the created post id, or the error code
/// the endpoint reported.
///
/// # Errors
///
/// Returns the endpoint's error code when the answer is not `ok`.
pub fn read_answer(answer: &Value) -> Result<u64, String> {
    if answer.get("ok").and_then(Value::as_i64) == Some(1) {
        return Ok(answer
            .pointer("/data/post_id")
            .and_then(Value::as_u64)
            .unwrap_or_default());
    }

    Err(answer
        .get("error")
        .and_then(Value::as_str)
        .unwrap_or("unknown-error")
        .to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_submission_trims_and_validates() {
        let form = FormSubmission::new("  Ada ", "Lovelace").unwrap();
        assert_eq!(form.firstname, "Ada");

        assert!(matches!(
            FormSubmission::new("", "Lovelace"),
            Err(OffsyncError::InvalidInput(_))
        ));
        assert!(matches!(
            FormSubmission::new("Ada", "   "),
            Err(OffsyncError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_into_data() {
        let data = FormSubmission::new("Ada", "Lovelace").unwrap().into_data();
        assert_eq!(data["firstname"], "Ada");
        assert_eq!(data["lastname"], "Lovelace");
        assert_eq!(data.len(), 2);
    }

    #[test]
    fn test_read_answer() {
        assert_eq!(read_answer(&json!({"ok": 1, "data": {"post_id": 7}})), Ok(7));
        assert_eq!(
            read_answer(&json!({"ok": 0, "error": "wrong-form-fields"})),
            Err("wrong-form-fields".to_string())
        );
        assert_eq!(read_answer(&json!(null)), Err("unknown-error".to_string()));
    }
}
