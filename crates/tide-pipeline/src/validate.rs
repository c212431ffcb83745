//! Post-verification contract checks.
//!
//! The synthesis prompt asks for counts and citation rules the rest of the
//! system relies on. Violations are recorded on the briefing as
//! [`QualityIssue`]s; under [`ContractPolicy::Enforce`] the offending
//! clusters and serendipity items are also removed. Validation never fails a
//! run.

use std::collections::HashMap;
use std::ops::RangeInclusive;

use tide_core::entities::{Briefing, Insight, QualityIssue};
use tide_core::enums::{QualityAction, QualityIssueKind};

pub const EXECUTIVE_SUMMARY_BULLETS: usize = 3;
pub const SERENDIPITY_ITEMS: usize = 2;
pub const RADAR_SIGNALS: RangeInclusive<usize> = 3..=5;
pub const NARRATIVE_CLUSTERS: RangeInclusive<usize> = 3..=7;
pub const MIN_CLUSTER_SOURCES: usize = 2;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ContractPolicy {
    /// Record issues only.
    #[default]
    Flag,
    /// Record issues and drop under-sourced clusters and serendipity items
    /// citing unknown documents.
    Enforce,
}

impl ContractPolicy {
    #[must_use]
    pub const fn from_enforce(enforce: bool) -> Self {
        if enforce { Self::Enforce } else { Self::Flag }
    }

    const fn action(self) -> QualityAction {
        match self {
            Self::Flag => QualityAction::Flagged,
            Self::Enforce => QualityAction::Dropped,
        }
    }
}

/// Check `briefing` against the synthesis contract.
///
/// `check_counts` is false for placeholder and empty-window briefings,
/// whose shapes are fixed by the pipeline rather than the synthesizer.
pub fn validate_contracts(
    briefing: &mut Briefing,
    insights: &[Insight],
    policy: ContractPolicy,
    check_counts: bool,
) {
    let mut issues = Vec::new();
    let action = policy.action();

    briefing.narrative_clusters.retain(|cluster| {
        if cluster.source_ids.len() >= MIN_CLUSTER_SOURCES {
            return true;
        }
        issues.push(QualityIssue {
            kind: QualityIssueKind::UndersourcedCluster,
            action,
            detail: format!(
                "cluster \"{}\" cites {} resolvable source(s), expected at least {MIN_CLUSTER_SOURCES}",
                cluster.title,
                cluster.source_ids.len()
            ),
        });
        policy == ContractPolicy::Flag
    });

    // The cited document's publisher wins over whatever the synthesizer wrote.
    let known: HashMap<&str, &str> = insights
        .iter()
        .map(|i| (i.document_id.as_str(), i.publisher.as_str()))
        .collect();
    briefing.serendipity_corner.retain_mut(|item| {
        if let Some(publisher) = known.get(item.source_id.as_str()) {
            item.publisher = (*publisher).to_string();
            return true;
        }
        issues.push(QualityIssue {
            kind: QualityIssueKind::UnknownSerendipitySource,
            action,
            detail: format!(
                "serendipity item \"{}\" cites unknown document \"{}\"",
                item.title, item.source_id
            ),
        });
        policy == ContractPolicy::Flag
    });

    if check_counts {
        check_count(
            &mut issues,
            QualityIssueKind::ExecutiveSummaryCount,
            "executive summary bullets",
            briefing.executive_summary.len(),
            &(EXECUTIVE_SUMMARY_BULLETS..=EXECUTIVE_SUMMARY_BULLETS),
        );
        check_count(
            &mut issues,
            QualityIssueKind::ClusterCount,
            "narrative clusters",
            briefing.narrative_clusters.len(),
            &NARRATIVE_CLUSTERS,
        );
        check_count(
            &mut issues,
            QualityIssueKind::SerendipityCount,
            "serendipity items",
            briefing.serendipity_corner.len(),
            &(SERENDIPITY_ITEMS..=SERENDIPITY_ITEMS),
        );
        check_count(
            &mut issues,
            QualityIssueKind::RadarSignalCount,
            "radar signals",
            briefing.radar_signals.len(),
            &RADAR_SIGNALS,
        );
    }

    for issue in &issues {
        tracing::warn!(kind = %issue.kind, action = ?issue.action, "{}", issue.detail);
    }
    briefing.quality_issues.extend(issues);
}

fn check_count(
    issues: &mut Vec<QualityIssue>,
    kind: QualityIssueKind,
    what: &str,
    found: usize,
    expected: &RangeInclusive<usize>,
) {
    if expected.contains(&found) {
        return;
    }
    let expected = if expected.start() == expected.end() {
        expected.start().to_string()
    } else {
        format!("{} to {}", expected.start(), expected.end())
    };
    issues.push(QualityIssue {
        kind,
        action: QualityAction::Flagged,
        detail: format!("expected {expected} {what}, found {found}"),
    });
}
