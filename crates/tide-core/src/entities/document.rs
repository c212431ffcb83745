use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

/// One ingested newsletter email.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Document {
    pub id: String,
    /// Sender or list name, e.g. `"Stratechery"`.
    pub publisher: String,
    pub subject: String,
    pub sent_at: DateTime<Utc>,
    pub ingested_at: DateTime<Utc>,
    #[serde(default)]
    pub html: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

impl Document {
    /// Check the invariants ingestion must uphold.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Validation` if the id is blank or the document has
    /// neither HTML nor plain-text content.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.id.trim().is_empty() {
            return Err(CoreError::Validation("document id must not be empty".into()));
        }
        let has_body = |body: &Option<String>| body.as_deref().is_some_and(|b| !b.trim().is_empty());
        if !has_body(&self.html) && !has_body(&self.text) {
            return Err(CoreError::Validation(format!(
                "document {} has neither html nor text content",
                self.id
            )));
        }
        Ok(())
    }
}
