//! Map stage: one Insight per Document, never fewer.
//!
//! Documents are processed in sequential batches; calls within a batch run
//! concurrently and the next batch starts only once every call in the
//! current one has settled, so at most `batch_size` extractions are ever in
//! flight. Any failure (error, timeout, empty or malformed reply) yields a
//! default Insight built from the document alone.

use std::time::Duration;

use futures::future::join_all;
use serde::Deserialize;
use tide_core::entities::{Document, EXTRACTION_FAILED_SUMMARY, Insight};
use tide_core::enums::Sentiment;
use tide_llm::{ExtractionRequest, InsightExtractor, strip_code_fences};

use crate::text::{document_body, snippet, truncate_chars};

/// Map-stage knobs, resolved once per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapSettings {
    pub batch_size: usize,
    pub content_char_cap: usize,
    pub timeout: Duration,
}

/// Shape the extractor is asked to return.
#[derive(Debug, Deserialize)]
struct ExtractedInsight {
    #[serde(default)]
    themes: Vec<String>,
    #[serde(default)]
    entities: Vec<String>,
    #[serde(default)]
    sentiment: Option<String>,
    summary: String,
    #[serde(default)]
    key_claims: Vec<String>,
}

/// Run the extractor over `documents`. The result has exactly one Insight per
/// document, in input order.
pub async fn map_documents<E: InsightExtractor>(
    extractor: &E,
    documents: &[Document],
    settings: &MapSettings,
) -> Vec<Insight> {
    let mut insights = Vec::with_capacity(documents.len());
    for batch in documents.chunks(settings.batch_size.max(1)) {
        insights.extend(map_batch(extractor, batch, settings).await);
    }
    log_completion(&insights);
    insights
}

/// Extract every document of one batch concurrently and wait for all of them.
pub async fn map_batch<E: InsightExtractor>(
    extractor: &E,
    batch: &[Document],
    settings: &MapSettings,
) -> Vec<Insight> {
    let settled = join_all(
        batch
            .iter()
            .map(|document| extract_one(extractor, document, settings)),
    )
    .await;
    let failed = settled.iter().filter(|i| i.is_extraction_failure()).count();
    tracing::debug!(size = batch.len(), failed, "map batch settled");
    settled
}

pub(crate) fn log_completion(insights: &[Insight]) {
    let failed = insights.iter().filter(|i| i.is_extraction_failure()).count();
    tracing::info!(documents = insights.len(), failed, "map stage complete");
}

async fn extract_one<E: InsightExtractor>(
    extractor: &E,
    document: &Document,
    settings: &MapSettings,
) -> Insight {
    let body = document_body(document);
    let preview = snippet(&body);
    let request = ExtractionRequest {
        document_id: &document.id,
        publisher: &document.publisher,
        subject: &document.subject,
        sent_at: document.sent_at,
        content: truncate_chars(&body, settings.content_char_cap),
    };

    let failure = match tokio::time::timeout(settings.timeout, extractor.extract(&request)).await {
        Ok(Ok(raw)) => match parse_insight(document, &preview, &raw) {
            Ok(insight) => return insight,
            Err(reason) => reason,
        },
        Ok(Err(error)) => error.to_string(),
        Err(_) => format!("timed out after {}s", settings.timeout.as_secs()),
    };

    tracing::warn!(
        document_id = %document.id,
        error = %failure,
        "insight extraction failed; using default insight"
    );
    default_insight(document, preview)
}

/// Parse extractor output into an Insight for `document`.
///
/// Identity fields always come from the document, never from the reply.
fn parse_insight(document: &Document, preview: &str, raw: &str) -> Result<Insight, String> {
    let json = strip_code_fences(raw);
    if json.is_empty() {
        return Err("empty extraction reply".into());
    }
    let extracted: ExtractedInsight =
        serde_json::from_str(json).map_err(|e| format!("unparseable extraction reply: {e}"))?;
    if extracted.summary.trim().is_empty() {
        return Err("extraction reply has an empty summary".into());
    }

    Ok(Insight {
        document_id: document.id.clone(),
        publisher: document.publisher.clone(),
        subject: document.subject.clone(),
        sent_at: document.sent_at,
        snippet: preview.to_string(),
        themes: extracted.themes,
        entities: extracted.entities,
        sentiment: extracted
            .sentiment
            .as_deref()
            .map_or(Sentiment::Neutral, Sentiment::parse_lenient),
        summary: extracted.summary.trim().to_string(),
        key_claims: extracted.key_claims,
    })
}

/// Insight used when extraction fails: neutral, no themes, marked summary.
#[must_use]
pub fn default_insight(document: &Document, preview: String) -> Insight {
    Insight {
        document_id: document.id.clone(),
        publisher: document.publisher.clone(),
        subject: document.subject.clone(),
        sent_at: document.sent_at,
        snippet: preview,
        themes: Vec::new(),
        entities: Vec::new(),
        sentiment: Sentiment::Neutral,
        summary: EXTRACTION_FAILED_SUMMARY.to_string(),
        key_claims: Vec::new(),
    }
}
