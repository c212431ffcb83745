//! Sentiment labels and contract-validation enums for Tidings.
//!
//! Per-document labels (`Sentiment`) serialize lowercase, matching what the
//! extraction model emits. Cluster-level consensus (`ConsensusSentiment`)
//! serializes capitalized, matching the briefing wire shape.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Sentiment
// ---------------------------------------------------------------------------

/// Sentiment of a single newsletter, as judged by the extraction model.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    Positive,
    Negative,
    #[default]
    Neutral,
}

impl Sentiment {
    /// Parse a model-emitted label. Case and surrounding whitespace are
    /// ignored; anything unrecognized becomes `Neutral`.
    #[must_use]
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "positive" => Self::Positive,
            "negative" => Self::Negative,
            _ => Self::Neutral,
        }
    }

    /// Return the string representation used in SQL storage and prompts.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Negative => "negative",
            Self::Neutral => "neutral",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ConsensusSentiment
// ---------------------------------------------------------------------------

/// Aggregate sentiment of a narrative cluster.
///
/// There is no neutral consensus: a cluster without a strict positive or
/// negative plurality is `Mixed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum ConsensusSentiment {
    Positive,
    Negative,
    Mixed,
}

impl ConsensusSentiment {
    /// Parse the consensus a synthesizer claimed. Returns `None` when the
    /// claim is missing or not one of the three known values.
    #[must_use]
    pub fn parse_claim(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "positive" => Some(Self::Positive),
            "negative" => Some(Self::Negative),
            "mixed" => Some(Self::Mixed),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Positive => "Positive",
            Self::Negative => "Negative",
            Self::Mixed => "Mixed",
        }
    }
}

impl fmt::Display for ConsensusSentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// QualityIssueKind / QualityAction
// ---------------------------------------------------------------------------

/// A synthesis-contract violation detected after verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum QualityIssueKind {
    /// A cluster resolves to fewer than two cited insights.
    UndersourcedCluster,
    /// A serendipity item cites a document that was not in the window.
    UnknownSerendipitySource,
    /// Executive summary does not have exactly three bullets.
    ExecutiveSummaryCount,
    /// Serendipity corner does not have exactly two items.
    SerendipityCount,
    /// Radar signals fall outside three to five entries.
    RadarSignalCount,
    /// Narrative clusters fall outside three to seven entries.
    ClusterCount,
}

impl QualityIssueKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UndersourcedCluster => "undersourced_cluster",
            Self::UnknownSerendipitySource => "unknown_serendipity_source",
            Self::ExecutiveSummaryCount => "executive_summary_count",
            Self::SerendipityCount => "serendipity_count",
            Self::RadarSignalCount => "radar_signal_count",
            Self::ClusterCount => "cluster_count",
        }
    }
}

impl fmt::Display for QualityIssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What contract validation did about an issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum QualityAction {
    Flagged,
    Dropped,
}

impl QualityAction {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Flagged => "flagged",
            Self::Dropped => "dropped",
        }
    }
}

impl fmt::Display for QualityAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
