//! Deterministic sentiment verification.
//!
//! A cluster's displayed consensus is recomputed from the sentiments of the
//! insights it cites, never taken from the synthesizer. The synthesizer's
//! claim is kept only for the audit trail in [`SentimentBreakdown`].

use std::collections::{HashMap, HashSet};

use tide_core::entities::{Briefing, Insight, NarrativeCluster, SentimentBreakdown, SourceCitation};
use tide_core::enums::{ConsensusSentiment, Sentiment};

use crate::reduce::{DraftBriefing, DraftCluster};

/// Consensus from raw counts: a strict plurality of positive or negative,
/// otherwise `Mixed` (including ties, a neutral plurality, and no citations).
#[must_use]
pub const fn consensus_from_counts(positive: u32, negative: u32, neutral: u32) -> ConsensusSentiment {
    if positive > negative && positive > neutral {
        ConsensusSentiment::Positive
    } else if negative > positive && negative > neutral {
        ConsensusSentiment::Negative
    } else {
        ConsensusSentiment::Mixed
    }
}

/// Count the sentiments of `cited` and compare against `claimed`.
#[must_use]
pub fn breakdown(cited: &[&Insight], claimed: Option<ConsensusSentiment>) -> SentimentBreakdown {
    let (mut positive, mut negative, mut neutral) = (0u32, 0u32, 0u32);
    for insight in cited {
        match insight.sentiment {
            Sentiment::Positive => positive += 1,
            Sentiment::Negative => negative += 1,
            Sentiment::Neutral => neutral += 1,
        }
    }
    let calculated = consensus_from_counts(positive, negative, neutral);
    SentimentBreakdown {
        positive,
        negative,
        neutral,
        total: positive + negative + neutral,
        calculated_consensus: calculated,
        llm_consensus: claimed,
        override_applied: claimed != Some(calculated),
    }
}

/// Resolve a draft cluster against the insight index.
///
/// Unknown and repeated ids are dropped; `source_ids` keeps only ids that
/// resolved, in citation order.
fn verify_cluster(draft: DraftCluster, index: &HashMap<&str, &Insight>) -> NarrativeCluster {
    let mut seen = HashSet::new();
    let mut cited = Vec::with_capacity(draft.source_ids.len());
    for id in &draft.source_ids {
        match index.get(id.as_str()) {
            Some(insight) if seen.insert(id.as_str()) => cited.push(*insight),
            Some(_) => {}
            None => tracing::debug!(cluster = %draft.title, source_id = %id, "dropping unresolvable citation"),
        }
    }

    let counts = breakdown(&cited, draft.claimed_consensus);
    if counts.override_applied {
        tracing::info!(
            cluster = %draft.title,
            claimed = ?counts.llm_consensus,
            calculated = %counts.calculated_consensus,
            "overriding synthesizer sentiment"
        );
    }

    NarrativeCluster {
        title: draft.title,
        synthesis: draft.synthesis,
        counter_point: draft.counter_point,
        source_ids: cited.iter().map(|i| i.document_id.clone()).collect(),
        sources: cited.iter().map(|i| citation(i)).collect(),
        consensus_sentiment: counts.calculated_consensus,
        sentiment_breakdown: counts,
    }
}

fn citation(insight: &Insight) -> SourceCitation {
    SourceCitation {
        document_id: insight.document_id.clone(),
        publisher: insight.publisher.clone(),
        subject: insight.subject.clone(),
        date: insight.sent_at,
        snippet: insight.snippet.clone(),
        sentiment: insight.sentiment,
    }
}

/// Turn a draft into a Briefing whose cluster sentiment is reproducible from
/// `insights` alone.
#[must_use]
pub fn verify(draft: DraftBriefing, insights: &[Insight]) -> Briefing {
    let index: HashMap<&str, &Insight> = insights
        .iter()
        .map(|insight| (insight.document_id.as_str(), insight))
        .collect();

    Briefing {
        executive_summary: draft.executive_summary,
        narrative_clusters: draft
            .clusters
            .into_iter()
            .map(|cluster| verify_cluster(cluster, &index))
            .collect(),
        serendipity_corner: draft.serendipity_corner,
        radar_signals: draft.radar_signals,
        quality_issues: Vec::new(),
    }
}
