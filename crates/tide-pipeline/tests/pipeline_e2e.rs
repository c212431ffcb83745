//! End-to-end pipeline runs against an in-memory store with fake models.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use pretty_assertions::assert_eq;
use tide_core::entities::{Document, StoredBriefing};
use tide_core::enums::{ConsensusSentiment, QualityIssueKind};
use tide_db::TideDb;
use tide_db::error::DatabaseError;
use tide_llm::{ExtractionRequest, InsightExtractor, LlmError, NarrativeSynthesizer};
use tide_pipeline::reduce::{EMPTY_WINDOW_BULLET, PLACEHOLDER_BULLETS};
use tokio::sync::Notify;
use tide_pipeline::{
    BriefingPipeline, BriefingStore, ContractPolicy, DocumentSource, PIPELINE_LEASE,
    PipelineError, PipelineSettings, RunOptions,
};

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

/// Reads the wanted sentiment from the document body (`sentiment=positive`).
/// Bodies containing `fail` produce an API error.
struct BodyExtractor;

impl InsightExtractor for BodyExtractor {
    fn model_id(&self) -> &str {
        "extract-v1"
    }

    async fn extract(&self, request: &ExtractionRequest<'_>) -> Result<String, LlmError> {
        if request.content.contains("fail") {
            return Err(LlmError::Api {
                status: 502,
                message: "bad gateway".into(),
            });
        }
        let sentiment = request
            .content
            .split_once("sentiment=")
            .map_or("neutral", |(_, rest)| rest.split_whitespace().next().unwrap_or("neutral"));
        Ok(format!(
            r#"{{"themes": ["markets"], "entities": ["Fed"], "sentiment": "{sentiment}",
                "summary": "Summary of {}.", "key_claims": ["a", "b"]}}"#,
            request.document_id
        ))
    }
}

/// Returns a fixed reply and records every context it was given.
struct ScriptedSynthesizer {
    reply: Result<String, LlmError>,
    contexts: Mutex<Vec<String>>,
}

impl ScriptedSynthesizer {
    fn replying(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_string()),
            contexts: Mutex::new(Vec::new()),
        }
    }

    fn failing() -> Self {
        Self {
            reply: Err(LlmError::RateLimited {
                retry_after_secs: 60,
            }),
            contexts: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> usize {
        self.contexts.lock().unwrap().len()
    }
}

impl NarrativeSynthesizer for ScriptedSynthesizer {
    fn model_id(&self) -> &str {
        "synth-v1"
    }

    async fn synthesize(&self, context: &str) -> Result<String, LlmError> {
        self.contexts.lock().unwrap().push(context.to_string());
        match &self.reply {
            Ok(reply) => Ok(reply.clone()),
            Err(_) => Err(LlmError::RateLimited {
                retry_after_secs: 60,
            }),
        }
    }
}

/// Signals `started` on its first call, then parks until `release` fires.
struct GatedExtractor {
    started: Arc<Notify>,
    release: Arc<Notify>,
}

impl InsightExtractor for GatedExtractor {
    fn model_id(&self) -> &str {
        "extract-v1"
    }

    async fn extract(&self, request: &ExtractionRequest<'_>) -> Result<String, LlmError> {
        self.started.notify_one();
        self.release.notified().await;
        Ok(format!(
            r#"{{"themes": ["rates"], "entities": [], "sentiment": "neutral",
                "summary": "Summary of {}.", "key_claims": []}}"#,
            request.document_id
        ))
    }
}

/// Delegates to [`TideDb`] but refuses every briefing insert.
struct ReadOnlyStore(TideDb);

impl BriefingStore for ReadOnlyStore {
    async fn max_window_end(&self) -> Result<Option<DateTime<Utc>>, DatabaseError> {
        self.0.max_window_end().await
    }

    async fn insert_briefing(&self, _stored: &StoredBriefing) -> Result<(), DatabaseError> {
        Err(DatabaseError::Query("database is read-only".into()))
    }

    async fn generate_id(&self, prefix: &str) -> Result<String, DatabaseError> {
        self.0.generate_id(prefix).await
    }

    async fn try_acquire_lease(
        &self,
        name: &str,
        holder: &str,
        now: DateTime<Utc>,
        ttl: chrono::Duration,
    ) -> Result<bool, DatabaseError> {
        self.0.try_acquire_lease(name, holder, now, ttl).await
    }

    async fn lease_holder(&self, name: &str) -> Result<Option<String>, DatabaseError> {
        self.0.lease_holder(name).await
    }

    async fn renew_lease(
        &self,
        name: &str,
        holder: &str,
        now: DateTime<Utc>,
        ttl: chrono::Duration,
    ) -> Result<bool, DatabaseError> {
        self.0.renew_lease(name, holder, now, ttl).await
    }

    async fn release_lease(&self, name: &str, holder: &str) -> Result<bool, DatabaseError> {
        self.0.release_lease(name, holder).await
    }
}

impl DocumentSource for ReadOnlyStore {
    async fn documents_in_window(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<Document>, DatabaseError> {
        self.0.documents_in_window(&start, &end, limit).await
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, day, hour, 0, 0).unwrap()
}

fn document(id: &str, ingested_at: DateTime<Utc>, body: &str) -> Document {
    Document {
        id: id.to_string(),
        publisher: format!("Publisher {id}"),
        subject: format!("Subject {id}"),
        sent_at: ingested_at,
        ingested_at,
        html: None,
        text: Some(body.to_string()),
    }
}

async fn store_with(documents: &[Document]) -> TideDb {
    let db = TideDb::open_local(":memory:").await.unwrap();
    for doc in documents {
        db.insert_document(doc).await.unwrap();
    }
    db
}

fn settings() -> PipelineSettings {
    PipelineSettings {
        map_batch_size: 3,
        extraction_timeout: Duration::from_secs(5),
        synthesis_timeout: Duration::from_secs(5),
        store_timeout: Duration::from_secs(5),
        ..PipelineSettings::default()
    }
}

fn pipeline(
    db: TideDb,
    synthesizer: ScriptedSynthesizer,
) -> BriefingPipeline<TideDb, BodyExtractor, ScriptedSynthesizer> {
    BriefingPipeline::new(db, BodyExtractor, synthesizer, settings())
}

/// A reply that satisfies every contract for documents `m1`..`m4`.
const CONFORMING_REPLY: &str = r#"{
    "executive_summary": ["Rates dominate.", "Chips cool.", "Oil steady."],
    "narrative_clusters": [
        {"title": "Rates", "synthesis": "Writers expect cuts.", "source_ids": ["m1", "m2", "m3"],
         "consensus_sentiment": "Negative"},
        {"title": "Chips", "synthesis": "Demand slows.", "source_ids": ["m2", "m4"],
         "consensus_sentiment": "Mixed"},
        {"title": "Oil", "synthesis": "Prices flat.", "source_ids": ["m3", "m4"],
         "consensus_sentiment": "Mixed"}
    ],
    "serendipity_corner": [
        {"title": "Bees", "insight": "Hive robots.", "source_id": "m1", "publisher": "Publisher m1"},
        {"title": "Maps", "insight": "Old atlases.", "source_id": "m4", "publisher": "Publisher m4"}
    ],
    "radar_signals": ["FOMC dot plot", "HBM4", "Brent"]
}"#;

fn four_documents() -> Vec<Document> {
    vec![
        document("m1", at(1, 2), "sentiment=positive rates"),
        document("m2", at(1, 3), "sentiment=positive rates"),
        document("m3", at(1, 4), "sentiment=negative rates"),
        document("m4", at(1, 5), "sentiment=neutral chips"),
    ]
}

// ---------------------------------------------------------------------------
// Window behaviour
// ---------------------------------------------------------------------------

#[tokio::test]
async fn consecutive_runs_share_a_boundary_and_never_double_count() {
    let first_end = at(2, 0);
    let boundary_doc = document("edge", first_end, "sentiment=positive boundary");
    let db = store_with(&[boundary_doc]).await;
    let pipeline = pipeline(db, ScriptedSynthesizer::replying(CONFORMING_REPLY));

    let first = pipeline.run_at(&RunOptions::default(), first_end).await.unwrap();
    // A document arriving after the first run lands in the second window.
    pipeline
        .store()
        .insert_document(&document("later", at(2, 6), "sentiment=negative"))
        .await
        .unwrap();
    let second = pipeline.run_at(&RunOptions::default(), at(2, 12)).await.unwrap();

    assert_eq!(first.time_window_start, first_end - chrono::Duration::hours(24));
    assert_eq!(first.time_window_end, first_end);
    assert_eq!(second.time_window_start, first.time_window_end);
    assert_eq!(first.email_count, 1);
    assert_eq!(second.email_count, 1);

    let contexts = pipeline.synthesizer_contexts();
    assert!(contexts[0].contains("\"edge\""));
    assert!(!contexts[1].contains("\"edge\""));
    assert!(contexts[1].contains("\"later\""));
}

#[tokio::test]
async fn explicit_window_ignores_cursor() {
    let db = store_with(&four_documents()).await;
    let pipeline = pipeline(db, ScriptedSynthesizer::replying(CONFORMING_REPLY));
    pipeline.run_at(&RunOptions::default(), at(3, 0)).await.unwrap();

    let options = RunOptions {
        window_start: Some(at(1, 0)),
        window_end: Some(at(1, 3)),
        ..RunOptions::default()
    };
    let rerun = pipeline.run_at(&options, at(3, 1)).await.unwrap();

    assert_eq!(rerun.time_window_start, at(1, 0));
    assert_eq!(rerun.time_window_end, at(1, 3));
    assert_eq!(rerun.email_count, 2);
}

#[tokio::test]
async fn max_emails_keeps_most_recent() {
    let db = store_with(&four_documents()).await;
    let pipeline = pipeline(db, ScriptedSynthesizer::replying(CONFORMING_REPLY));
    let options = RunOptions {
        max_emails: Some(2),
        ..RunOptions::default()
    };

    let stored = pipeline.run_at(&options, at(1, 12)).await.unwrap();

    assert_eq!(stored.email_count, 2);
    let context = &pipeline.synthesizer_contexts()[0];
    assert!(context.contains("\"m4\"") && context.contains("\"m3\""));
    assert!(!context.contains("\"m1\""));
}

// ---------------------------------------------------------------------------
// Empty window
// ---------------------------------------------------------------------------

#[tokio::test]
async fn empty_window_is_stored_and_advances_cursor() {
    let db = store_with(&[]).await;
    let pipeline = pipeline(db, ScriptedSynthesizer::replying(CONFORMING_REPLY));

    let empty = pipeline.run_at(&RunOptions::default(), at(5, 0)).await.unwrap();
    assert_eq!(empty.email_count, 0);
    assert_eq!(empty.briefing.executive_summary, vec![EMPTY_WINDOW_BULLET]);
    assert!(empty.briefing.narrative_clusters.is_empty());
    assert!(empty.briefing.serendipity_corner.is_empty());
    assert!(empty.briefing.radar_signals.is_empty());
    assert!(empty.briefing.quality_issues.is_empty());
    assert_eq!(pipeline.synthesizer_calls(), 0);

    let latest = pipeline.store().latest_briefing().await.unwrap().unwrap();
    assert_eq!(latest, empty);

    let next = pipeline.run_at(&RunOptions::default(), at(5, 6)).await.unwrap();
    assert_eq!(next.time_window_start, empty.time_window_end);
}

// ---------------------------------------------------------------------------
// Map, reduce and verification through the whole pipeline
// ---------------------------------------------------------------------------

#[tokio::test]
async fn verified_sentiment_overrides_synthesizer_claim() {
    let db = store_with(&four_documents()).await;
    let pipeline = pipeline(db, ScriptedSynthesizer::replying(CONFORMING_REPLY));

    let stored = pipeline.run_at(&RunOptions::default(), at(1, 12)).await.unwrap();

    let rates = &stored.briefing.narrative_clusters[0];
    assert_eq!(rates.consensus_sentiment, ConsensusSentiment::Positive);
    assert_eq!(rates.sentiment_breakdown.positive, 2);
    assert_eq!(rates.sentiment_breakdown.negative, 1);
    assert_eq!(
        rates.sentiment_breakdown.llm_consensus,
        Some(ConsensusSentiment::Negative)
    );
    assert!(rates.sentiment_breakdown.override_applied);
    assert_eq!(rates.sources[0].publisher, "Publisher m1");

    // positive + neutral: tie, so Mixed, matching the claim.
    let chips = &stored.briefing.narrative_clusters[1];
    assert_eq!(chips.consensus_sentiment, ConsensusSentiment::Mixed);
    assert!(!chips.sentiment_breakdown.override_applied);

    assert!(stored.briefing.quality_issues.is_empty());
    assert_eq!(stored.model_version, "extract=extract-v1;synthesize=synth-v1");
    assert!(stored.id.starts_with("brf-"));

    let fetched = pipeline.store().get_briefing(&stored.id).await.unwrap().unwrap();
    assert_eq!(fetched, stored);
}

#[tokio::test]
async fn failed_extractions_still_reach_synthesis_one_to_one() {
    let docs: Vec<Document> = (0..7)
        .map(|i| document(&format!("f{i}"), at(1, 1 + i), "this will fail"))
        .collect();
    let db = store_with(&docs).await;
    let pipeline = pipeline(db, ScriptedSynthesizer::replying(CONFORMING_REPLY));

    let stored = pipeline.run_at(&RunOptions::default(), at(1, 12)).await.unwrap();

    assert_eq!(stored.email_count, 7);
    let context = &pipeline.synthesizer_contexts()[0];
    assert_eq!(context.lines().count(), 7);
    assert!(context.lines().all(|line| line.contains("[extraction failed]")));
    for doc in &docs {
        assert!(context.contains(&format!("\"{}\"", doc.id)));
    }
}

#[tokio::test]
async fn truncated_synthesis_is_repaired_and_flagged() {
    let truncated = &CONFORMING_REPLY[..CONFORMING_REPLY.find("\"Chips\"").unwrap()];
    let db = store_with(&four_documents()).await;
    let pipeline = pipeline(db, ScriptedSynthesizer::replying(truncated));

    let stored = pipeline.run_at(&RunOptions::default(), at(1, 12)).await.unwrap();

    assert_eq!(stored.briefing.executive_summary.len(), 3);
    assert_eq!(stored.briefing.narrative_clusters.len(), 1);
    assert!(stored.briefing.serendipity_corner.is_empty());
    assert!(stored.briefing.radar_signals.is_empty());
    let kinds: Vec<QualityIssueKind> = stored.briefing.quality_issues.iter().map(|i| i.kind).collect();
    assert_eq!(
        kinds,
        vec![
            QualityIssueKind::ClusterCount,
            QualityIssueKind::SerendipityCount,
            QualityIssueKind::RadarSignalCount,
        ]
    );
}

#[tokio::test]
async fn unusable_synthesis_stores_placeholder() {
    let db = store_with(&four_documents()).await;
    let pipeline = pipeline(db, ScriptedSynthesizer::replying("I'm sorry, I can't do that."));

    let stored = pipeline.run_at(&RunOptions::default(), at(1, 12)).await.unwrap();

    assert_eq!(stored.email_count, 4);
    assert_eq!(stored.briefing.executive_summary, PLACEHOLDER_BULLETS);
    assert!(stored.briefing.narrative_clusters.is_empty());
    assert!(stored.briefing.quality_issues.is_empty());
}

#[tokio::test]
async fn enforce_policy_drops_undersourced_clusters() {
    let reply = CONFORMING_REPLY.replace(r#"["m2", "m4"]"#, r#"["m2", "ghost"]"#);
    let db = store_with(&four_documents()).await;
    let mut settings = settings();
    settings.contract_policy = ContractPolicy::Enforce;
    let pipeline = BriefingPipeline::new(
        db,
        BodyExtractor,
        ScriptedSynthesizer::replying(&reply),
        settings,
    );

    let stored = pipeline.run_at(&RunOptions::default(), at(1, 12)).await.unwrap();

    let titles: Vec<&str> = stored
        .briefing
        .narrative_clusters
        .iter()
        .map(|c| c.title.as_str())
        .collect();
    assert_eq!(titles, vec!["Rates", "Oil"]);
    assert_eq!(
        stored.briefing.quality_issues[0].kind,
        QualityIssueKind::UndersourcedCluster
    );
}

// ---------------------------------------------------------------------------
// Fatal paths and the lease
// ---------------------------------------------------------------------------

#[tokio::test]
async fn synthesis_failure_stores_nothing_and_releases_lease() {
    let db = store_with(&four_documents()).await;
    let pipeline = BriefingPipeline::new(db, BodyExtractor, ScriptedSynthesizer::failing(), settings());

    let err = pipeline.run_at(&RunOptions::default(), at(1, 12)).await.unwrap_err();

    assert!(matches!(err, PipelineError::Synthesis(LlmError::RateLimited { .. })));
    assert!(pipeline.store().latest_briefing().await.unwrap().is_none());
    assert!(pipeline.store().lease_holder(PIPELINE_LEASE).await.unwrap().is_none());
}

#[tokio::test]
async fn store_failure_is_fatal() {
    let db = store_with(&four_documents()).await;
    let pipeline = BriefingPipeline::new(
        ReadOnlyStore(db),
        BodyExtractor,
        ScriptedSynthesizer::replying(CONFORMING_REPLY),
        settings(),
    );

    let err = pipeline.run_at(&RunOptions::default(), at(1, 12)).await.unwrap_err();

    assert!(matches!(err, PipelineError::Store(DatabaseError::Query(_))));
    let inner = &pipeline.store().0;
    assert!(inner.latest_briefing().await.unwrap().is_none());
    assert!(inner.lease_holder(PIPELINE_LEASE).await.unwrap().is_none());
}

#[tokio::test]
async fn concurrent_run_is_refused_while_lease_is_live() {
    let db = store_with(&four_documents()).await;
    db.try_acquire_lease(PIPELINE_LEASE, "run-elsewhere", at(1, 11), chrono::Duration::hours(2))
        .await
        .unwrap();
    let pipeline = pipeline(db, ScriptedSynthesizer::replying(CONFORMING_REPLY));

    let err = pipeline.run_at(&RunOptions::default(), at(1, 12)).await.unwrap_err();

    match err {
        PipelineError::RunInProgress { holder } => assert_eq!(holder, "run-elsewhere"),
        other => panic!("expected RunInProgress, got {other:?}"),
    }
    assert_eq!(pipeline.synthesizer_calls(), 0);
    assert!(pipeline.store().latest_briefing().await.unwrap().is_none());

    // Once the other holder's lease expires, the run proceeds.
    let stored = pipeline.run_at(&RunOptions::default(), at(1, 13)).await.unwrap();
    assert_eq!(stored.email_count, 4);
}

#[tokio::test]
async fn overlapping_run_that_lost_its_lease_stores_nothing() {
    let db = store_with(&[document("slow", at(1, 11), "sentiment=positive")]).await;
    let started = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let stalled = BriefingPipeline::new(
        &db,
        GatedExtractor {
            started: Arc::clone(&started),
            release: Arc::clone(&release),
        },
        ScriptedSynthesizer::replying(CONFORMING_REPLY),
        settings(),
    );
    let takeover = BriefingPipeline::new(
        &db,
        BodyExtractor,
        ScriptedSynthesizer::replying(CONFORMING_REPLY),
        settings(),
    );

    // The stalled run's 30 minute lease has expired by the time the second run starts.
    let reclaim_at = at(1, 12) + chrono::Duration::minutes(31);
    let stalled_options = RunOptions::default();
    let (stalled_result, takeover_result) = tokio::join!(
        stalled.run_at(&stalled_options, at(1, 12)),
        async {
            started.notified().await;
            let result = takeover.run_at(&RunOptions::default(), reclaim_at).await;
            release.notify_one();
            result
        }
    );

    let winner = takeover_result.unwrap();
    assert!(matches!(
        stalled_result,
        Err(PipelineError::LeaseLost { .. })
    ));
    assert_eq!(stalled.synthesizer_calls(), 0);
    assert_eq!(db.list_archive(10).await.unwrap().len(), 1);
    assert_eq!(db.latest_briefing().await.unwrap().unwrap().id, winner.id);
    assert!(db.lease_holder(PIPELINE_LEASE).await.unwrap().is_none());
}

#[tokio::test]
async fn invalid_options_fail_before_touching_the_store() {
    let db = store_with(&[]).await;
    let pipeline = pipeline(db, ScriptedSynthesizer::replying(CONFORMING_REPLY));
    let options = RunOptions {
        window_start: Some(at(1, 0)),
        ..RunOptions::default()
    };

    let err = pipeline.run_at(&options, at(1, 12)).await.unwrap_err();

    assert!(matches!(err, PipelineError::InvalidOptions(_)));
    assert!(pipeline.store().lease_holder(PIPELINE_LEASE).await.unwrap().is_none());
}

// ---------------------------------------------------------------------------
// Accessors over the fake synthesizer
// ---------------------------------------------------------------------------

trait SynthesizerRecord {
    fn synthesizer_contexts(&self) -> Vec<String>;
    fn synthesizer_calls(&self) -> usize;
}

impl<S, E> SynthesizerRecord for BriefingPipeline<S, E, ScriptedSynthesizer>
where
    S: BriefingStore + DocumentSource,
    E: InsightExtractor,
{
    fn synthesizer_contexts(&self) -> Vec<String> {
        self.synthesizer().contexts.lock().unwrap().clone()
    }

    fn synthesizer_calls(&self) -> usize {
        self.synthesizer().calls()
    }
}
