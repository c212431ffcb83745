use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::Sentiment;

/// Marker placed in `summary` when extraction failed for a document.
pub const EXTRACTION_FAILED_SUMMARY: &str = "[extraction failed] No structured insight could be extracted from this newsletter.";

/// Structured extraction for one document. Exactly one per processed document.
///
/// `document_id`, `publisher`, `subject`, `sent_at` and `snippet` always come
/// from the document itself; the rest comes from the extraction model.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Insight {
    pub document_id: String,
    pub publisher: String,
    pub subject: String,
    pub sent_at: DateTime<Utc>,
    pub snippet: String,
    pub themes: Vec<String>,
    pub entities: Vec<String>,
    pub sentiment: Sentiment,
    pub summary: String,
    pub key_claims: Vec<String>,
}

impl Insight {
    /// Whether this insight is the fallback produced for a failed extraction.
    #[must_use]
    pub fn is_extraction_failure(&self) -> bool {
        self.summary == EXTRACTION_FAILED_SUMMARY
    }
}
