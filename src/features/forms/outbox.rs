//! Outbox that receives delivered form submissions.
//!
//! Each delivery becomes one JSON line holding a post built from the form
//! fields. The post date is the submission's original timestamp, so a form
//! filled in offline and synced hours later keeps the time it was written.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::DateTime;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::OffsyncError;
use crate::features::sync::{timestamp_of, ActionData, ActionHandler, HandlerResult};

/// Post written to the outbox for one submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboxPost {
    pub post_id: u64,
    pub post_title: String,
    pub post_content: String,
    /// `%Y-%m-%d %H:%M:%S`, UTC.
    pub post_date_gmt: String,
    pub form_data: ActionData,
}

/// `send_form` handler appending posts to a JSON-lines file.
#[derive(Debug)]
pub struct FormOutbox {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FormOutbox {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn deliver(
        &self,
        firstname: &str,
        lastname: &str,
        timestamp: i64,
        form_data: ActionData,
    ) -> Result<OutboxPost, OffsyncError> {
        let _guard = self.write_lock.lock().await;

        // Post ids are the line count plus one, so the count must be read
        // under the same lock as the append.
        let existing = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents.lines().filter(|l| !l.trim().is_empty()).count(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => 0,
            Err(e) => return Err(e.into()),
        };

        let post_date_gmt = DateTime::from_timestamp(timestamp, 0)
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default();

        let post = OutboxPost {
            post_id: existing as u64 + 1,
            post_title: format!("Form submission : {firstname} {lastname}"),
            post_content: format!("Firstname: {firstname}\nLastname: {lastname}"),
            post_date_gmt,
            form_data,
        };

        let mut line = serde_json::to_string(&post)?;
        line.push('\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        debug!(post_id = post.post_id, path = %self.path.display(), "delivered form to outbox");
        Ok(post)
    }
}

#[async_trait]
impl ActionHandler for FormOutbox {
    async fn handle(&self, data: ActionData) -> HandlerResult {
        if data.is_empty() {
            return Ok(json!({ "ok": 0, "error": "no-form-data-found" }));
        }

        let field = |name: &str| {
            data.get(name)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(String::from)
        };
        let (Some(firstname), Some(lastname)) = (field("firstname"), field("lastname")) else {
            return Ok(json!({ "ok": 0, "error": "wrong-form-fields" }));
        };

        let timestamp = timestamp_of(&data);

        match self.deliver(&firstname, &lastname, timestamp, data).await {
            Ok(post) => Ok(json!({
                "ok": 1,
                "data": { "post_id": post.post_id, "form_data": post.form_data },
            })),
            Err(e) => Err(json!({ "error": "post-insertion-failed", "message": e.to_string() })),
        }
    }
}

/// Read every post delivered to the outbox at `path`.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn read_outbox(path: &Path) -> Result<Vec<OutboxPost>, OffsyncError> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    std::fs::read_to_string(path)?
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| serde_json::from_str(l).map_err(OffsyncError::from))
        .collect()
}
