//! Prompt text for the two model calls.
//!
//! Wording is deliberately plain; the pipeline treats both calls as
//! document → JSON functions and validates everything it depends on.

use chrono::{DateTime, Utc};

pub const EXTRACTION_SYSTEM: &str = "\
You extract structured intelligence from a single newsletter email. \
Respond with one JSON object and nothing else, using exactly these keys: \
\"themes\" (array of short strings), \
\"entities\" (array of named companies, people, products or places), \
\"sentiment\" (one of \"positive\", \"negative\", \"neutral\"), \
\"summary\" (one or two sentences), \
\"key_claims\" (array of 2 to 3 concrete claims made by the author). \
Use only what the email says.";

pub const SYNTHESIS_SYSTEM: &str = "\
You write an intelligence briefing from a set of newsletter insights. \
Every statement must be traceable to at least one insight; do not use outside knowledge. \
Respond with one JSON object and nothing else, with these keys:
- \"executive_summary\": exactly 3 strings.
- \"narrative_clusters\": 3 to 7 objects with \"title\", \"synthesis\" (2 to 3 sentences), \
\"counter_point\" (only when a source explicitly disagrees, otherwise omit), \
\"source_ids\" (at least 2 insight ids), \"consensus_sentiment\" (\"Positive\", \"Negative\" or \"Mixed\").
- \"serendipity_corner\": exactly 2 objects with \"title\", \"insight\", \"source_id\", \"publisher\", \
taken from insights that fit no cluster.
- \"radar_signals\": 3 to 5 emerging terms or entities named in the insights, not generic concepts.";

/// User message for one extraction call. `content` is already truncated.
#[must_use]
pub fn extraction_user(
    publisher: &str,
    subject: &str,
    sent_at: DateTime<Utc>,
    content: &str,
) -> String {
    format!(
        "Publisher: {publisher}\nSubject: {subject}\nDate: {}\n\n{content}",
        sent_at.format("%Y-%m-%d")
    )
}

/// User message for the synthesis call.
#[must_use]
pub fn synthesis_user(context: &str) -> String {
    format!("Insights for this briefing window:\n\n{context}")
}
