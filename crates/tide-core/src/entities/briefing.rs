use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{ConsensusSentiment, QualityAction, QualityIssueKind, Sentiment};

/// The synthesized digest for one time window.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Briefing {
    pub executive_summary: Vec<String>,
    pub narrative_clusters: Vec<NarrativeCluster>,
    pub serendipity_corner: Vec<SerendipityItem>,
    pub radar_signals: Vec<String>,
    /// Contract violations found after verification. Empty for a clean briefing.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub quality_issues: Vec<QualityIssue>,
}

impl Briefing {
    /// First executive-summary bullet, used as the archive headline.
    #[must_use]
    pub fn headline(&self) -> Option<&str> {
        self.executive_summary.first().map(String::as_str)
    }
}

/// A theme shared by several newsletters, with its verified sentiment.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct NarrativeCluster {
    pub title: String,
    pub synthesis: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counter_point: Option<String>,
    /// Document ids cited by the synthesizer, as emitted.
    pub source_ids: Vec<String>,
    /// Citations resolved against the insight set. Unresolvable ids are absent.
    pub sources: Vec<SourceCitation>,
    /// Always equal to `sentiment_breakdown.calculated_consensus`.
    pub consensus_sentiment: ConsensusSentiment,
    pub sentiment_breakdown: SentimentBreakdown,
}

/// A resolved reference from a cluster to one source newsletter.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct SourceCitation {
    pub document_id: String,
    pub publisher: String,
    pub subject: String,
    pub date: DateTime<Utc>,
    pub snippet: String,
    pub sentiment: Sentiment,
}

/// Sentiment arithmetic over a cluster's cited insights.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct SentimentBreakdown {
    pub positive: u32,
    pub negative: u32,
    pub neutral: u32,
    pub total: u32,
    /// Computed from the counts alone. The only sentiment consumers should trust.
    pub calculated_consensus: ConsensusSentiment,
    /// What the synthesizer claimed; `None` if it claimed nothing recognizable.
    pub llm_consensus: Option<ConsensusSentiment>,
    pub override_applied: bool,
}

/// A single-source insight that fits no cluster.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct SerendipityItem {
    pub title: String,
    pub insight: String,
    pub source_id: String,
    pub publisher: String,
}

/// One synthesis-contract violation recorded on a briefing.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct QualityIssue {
    pub kind: QualityIssueKind,
    pub action: QualityAction,
    pub detail: String,
}
