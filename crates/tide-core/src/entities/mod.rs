//! Entity structs for all Tidings domain objects.
//!
//! `Document` and `StoredBriefing` map to tables in the libSQL database; the
//! briefing body is stored as a JSON column. All structs derive `Serialize`,
//! `Deserialize`, and `JsonSchema` for JSON roundtrip and schema validation.

mod briefing;
mod document;
mod insight;
mod stored;

pub use briefing::{
    Briefing, NarrativeCluster, QualityIssue, SentimentBreakdown, SerendipityItem, SourceCitation,
};
pub use document::Document;
pub use insight::{EXTRACTION_FAILED_SUMMARY, Insight};
pub use stored::{ArchiveEntry, StoredBriefing};
