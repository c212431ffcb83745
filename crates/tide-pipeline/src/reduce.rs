//! Reduce stage: one synthesis call over the whole Insight set.
//!
//! The synthesizer's reply is parsed as-is, then after structural repair,
//! then replaced by a placeholder. Whatever path is taken, the result is
//! normalized into a [`DraftBriefing`] whose four sections always exist.

use std::time::Duration;

use serde_json::{Map, Value, json};
use tide_core::entities::{Insight, SerendipityItem};
use tide_core::enums::ConsensusSentiment;
use tide_llm::{LlmError, NarrativeSynthesizer, strip_code_fences};

use crate::error::PipelineError;
use crate::repair::repair_json;

pub const EMPTY_WINDOW_BULLET: &str = "No newsletters arrived in this window.";

pub const PLACEHOLDER_BULLETS: [&str; 3] = [
    "Briefing parsing incomplete: the synthesis output could not be read.",
    "Per-newsletter insights for this window were extracted and are still on record.",
    "Re-run the window to regenerate a full briefing.",
];

pub const MISSING_SUMMARY_BULLET: &str = "The synthesis output did not include an executive summary.";

const UNTITLED_CLUSTER: &str = "Untitled narrative";

/// How the reduce stage arrived at its draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReduceOutcome {
    /// No insights; the synthesizer was not called.
    EmptyWindow,
    Parsed,
    Repaired,
    /// Neither the reply nor its repair parsed.
    Placeholder,
}

impl ReduceOutcome {
    /// Whether the draft came from synthesizer content.
    #[must_use]
    pub const fn is_synthesized(self) -> bool {
        matches!(self, Self::Parsed | Self::Repaired)
    }
}

/// A cluster as the synthesizer proposed it, before verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftCluster {
    pub title: String,
    pub synthesis: String,
    pub counter_point: Option<String>,
    pub source_ids: Vec<String>,
    /// The consensus the synthesizer claimed; `None` if absent or unknown.
    pub claimed_consensus: Option<ConsensusSentiment>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DraftBriefing {
    pub executive_summary: Vec<String>,
    pub clusters: Vec<DraftCluster>,
    pub serendipity_corner: Vec<SerendipityItem>,
    pub radar_signals: Vec<String>,
}

impl DraftBriefing {
    #[must_use]
    pub fn empty_window() -> Self {
        Self {
            executive_summary: vec![EMPTY_WINDOW_BULLET.to_string()],
            ..Self::default()
        }
    }

    #[must_use]
    pub fn placeholder() -> Self {
        Self {
            executive_summary: PLACEHOLDER_BULLETS.iter().map(ToString::to_string).collect(),
            ..Self::default()
        }
    }
}

/// Serialize insights into the synthesis context: one JSON object per line.
#[must_use]
pub fn serialize_context(insights: &[Insight]) -> String {
    insights
        .iter()
        .map(|insight| {
            json!({
                "id": insight.document_id,
                "publisher": insight.publisher,
                "subject": insight.subject,
                "date": insight.sent_at.format("%Y-%m-%d").to_string(),
                "themes": insight.themes,
                "entities": insight.entities,
                "sentiment": insight.sentiment.as_str(),
                "summary": insight.summary,
                "claims": insight.key_claims,
            })
            .to_string()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Run the synthesizer over `insights` and parse its reply.
///
/// An empty insight set short-circuits without calling the synthesizer.
///
/// # Errors
///
/// - [`PipelineError::Synthesis`] if the call fails or returns blank text.
/// - [`PipelineError::Timeout`] if the call exceeds `timeout`.
pub async fn reduce<N: NarrativeSynthesizer>(
    synthesizer: &N,
    insights: &[Insight],
    timeout: Duration,
) -> Result<(DraftBriefing, ReduceOutcome), PipelineError> {
    if insights.is_empty() {
        tracing::info!("no insights in window; skipping synthesis");
        return Ok((DraftBriefing::empty_window(), ReduceOutcome::EmptyWindow));
    }

    let context = serialize_context(insights);
    tracing::debug!(
        insights = insights.len(),
        context_chars = context.len(),
        "requesting narrative synthesis"
    );

    let raw = match tokio::time::timeout(timeout, synthesizer.synthesize(&context)).await {
        Ok(Ok(raw)) => raw,
        Ok(Err(error)) => return Err(PipelineError::Synthesis(error)),
        Err(_) => {
            return Err(PipelineError::Timeout {
                stage: "synthesis",
                secs: timeout.as_secs(),
            });
        }
    };
    if raw.trim().is_empty() {
        return Err(PipelineError::Synthesis(LlmError::EmptyResponse {
            model: synthesizer.model_id().to_string(),
        }));
    }

    Ok(parse_draft(&raw))
}

/// Parse a synthesizer reply, repairing or replacing it as needed.
#[must_use]
pub fn parse_draft(raw: &str) -> (DraftBriefing, ReduceOutcome) {
    let text = strip_code_fences(raw);
    if let Some(draft) = parse_object(text) {
        return (draft, ReduceOutcome::Parsed);
    }

    tracing::info!(chars = text.len(), "synthesis output did not parse; attempting repair");
    if let Some(draft) = parse_object(&repair_json(text)) {
        tracing::warn!("synthesis output was truncated or malformed; repaired");
        return (draft, ReduceOutcome::Repaired);
    }

    tracing::warn!("synthesis output could not be repaired; storing placeholder briefing");
    (DraftBriefing::placeholder(), ReduceOutcome::Placeholder)
}

fn parse_object(text: &str) -> Option<DraftBriefing> {
    match serde_json::from_str::<Value>(text).ok()? {
        Value::Object(map) => Some(normalize(&map)),
        _ => None,
    }
}

fn normalize(map: &Map<String, Value>) -> DraftBriefing {
    let executive_summary = string_list(map.get("executive_summary"))
        .filter(|bullets| !bullets.is_empty())
        .unwrap_or_else(|| vec![MISSING_SUMMARY_BULLET.to_string()]);

    let clusters = object_list(map.get("narrative_clusters"))
        .map(|cluster| DraftCluster {
            title: string_field(cluster, "title").unwrap_or_else(|| UNTITLED_CLUSTER.to_string()),
            synthesis: string_field(cluster, "synthesis").unwrap_or_default(),
            counter_point: string_field(cluster, "counter_point"),
            source_ids: string_list(cluster.get("source_ids")).unwrap_or_default(),
            claimed_consensus: cluster
                .get("consensus_sentiment")
                .and_then(Value::as_str)
                .and_then(ConsensusSentiment::parse_claim),
        })
        .collect();

    let serendipity_corner = object_list(map.get("serendipity_corner"))
        .map(|item| SerendipityItem {
            title: string_field(item, "title").unwrap_or_default(),
            insight: string_field(item, "insight").unwrap_or_default(),
            source_id: string_field(item, "source_id").unwrap_or_default(),
            publisher: string_field(item, "publisher").unwrap_or_default(),
        })
        .collect();

    DraftBriefing {
        executive_summary,
        clusters,
        serendipity_corner,
        radar_signals: string_list(map.get("radar_signals")).unwrap_or_default(),
    }
}

/// Non-blank strings from a JSON array; numbers are accepted as ids.
/// `None` when the value is missing or not an array.
fn string_list(value: Option<&Value>) -> Option<Vec<String>> {
    let items = value?.as_array()?;
    Some(
        items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect(),
    )
}

fn object_list(value: Option<&Value>) -> impl Iterator<Item = &Map<String, Value>> {
    value
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_object)
}

fn string_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    object
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
