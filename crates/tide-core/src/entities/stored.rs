use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::Briefing;

/// The unit of record: one pipeline run's briefing and the window it covered.
///
/// Immutable once inserted. The window is exclusive at start and inclusive at end.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct StoredBriefing {
    pub id: String,
    pub generated_at: DateTime<Utc>,
    pub time_window_start: DateTime<Utc>,
    pub time_window_end: DateTime<Utc>,
    pub briefing: Briefing,
    pub email_count: u32,
    /// Which extraction/synthesis models produced the briefing.
    pub model_version: String,
}

/// Lightweight archive row: only the first executive-summary bullet.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub id: String,
    pub generated_at: DateTime<Utc>,
    pub time_window_start: DateTime<Utc>,
    pub time_window_end: DateTime<Utc>,
    pub email_count: u32,
    pub headline: Option<String>,
}
