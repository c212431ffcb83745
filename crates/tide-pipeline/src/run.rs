//! Pipeline entry point: lease → window → documents → map → reduce →
//! verify → validate → store.

use std::future::Future;
use std::time::{Duration, Instant};

use chrono::{DateTime, SubsecRound, Utc};
use tide_config::PipelineConfig;
use tide_core::entities::StoredBriefing;
use tide_core::ids::{PREFIX_BRIEFING, PREFIX_RUN};
use tide_db::error::DatabaseError;
use tide_llm::{InsightExtractor, NarrativeSynthesizer};

use crate::error::PipelineError;
use crate::map::{MapSettings, log_completion, map_batch};
use crate::ports::{BriefingStore, DocumentSource};
use crate::reduce::reduce;
use crate::validate::{ContractPolicy, validate_contracts};
use crate::verify::verify;
use crate::window::{RunOptions, resolve_window};

/// Lease name shared by every run against the same store.
pub const PIPELINE_LEASE: &str = "briefing-pipeline";

/// Resolved pipeline settings. Built once from configuration; inner stages
/// receive only the values they need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSettings {
    pub max_emails: u32,
    pub map_batch_size: u32,
    pub content_char_cap: u32,
    pub fallback_lookback: chrono::Duration,
    pub extraction_timeout: Duration,
    pub synthesis_timeout: Duration,
    pub store_timeout: Duration,
    pub lease_ttl: chrono::Duration,
    pub contract_policy: ContractPolicy,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self::from(&PipelineConfig::default())
    }
}

impl From<&PipelineConfig> for PipelineSettings {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            max_emails: config.max_emails,
            map_batch_size: config.map_batch_size,
            content_char_cap: config.content_char_cap,
            fallback_lookback: chrono::Duration::hours(i64::from(config.fallback_lookback_hours)),
            extraction_timeout: config.extraction_timeout(),
            synthesis_timeout: config.synthesis_timeout(),
            store_timeout: config.store_timeout(),
            lease_ttl: chrono::Duration::from_std(config.lease_ttl())
                .unwrap_or_else(|_| chrono::Duration::hours(1)),
            contract_policy: ContractPolicy::from_enforce(config.enforce_contracts),
        }
    }
}

/// The incremental briefing pipeline over a store and two model seams.
pub struct BriefingPipeline<S, E, N> {
    store: S,
    extractor: E,
    synthesizer: N,
    settings: PipelineSettings,
}

impl<S, E, N> BriefingPipeline<S, E, N>
where
    S: BriefingStore + DocumentSource,
    E: InsightExtractor,
    N: NarrativeSynthesizer,
{
    pub const fn new(store: S, extractor: E, synthesizer: N, settings: PipelineSettings) -> Self {
        Self {
            store,
            extractor,
            synthesizer,
            settings,
        }
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    pub const fn extractor(&self) -> &E {
        &self.extractor
    }

    pub const fn synthesizer(&self) -> &N {
        &self.synthesizer
    }

    pub const fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Provenance recorded on every stored briefing.
    pub fn model_version(&self) -> String {
        format!(
            "extract={};synthesize={}",
            self.extractor.model_id(),
            self.synthesizer.model_id()
        )
    }

    /// Run once with `now` as the clock.
    ///
    /// # Errors
    ///
    /// See [`BriefingPipeline::run_at`].
    pub async fn run(&self, options: &RunOptions) -> Result<StoredBriefing, PipelineError> {
        self.run_at(options, Utc::now()).await
    }

    /// Run once as of `now`, holding the pipeline lease for the duration.
    ///
    /// Nothing is stored unless every fatal step succeeds.
    ///
    /// # Errors
    ///
    /// - [`PipelineError::InvalidOptions`] for unusable overrides or an empty window.
    /// - [`PipelineError::RunInProgress`] if another live run holds the lease.
    /// - [`PipelineError::LeaseLost`] if the lease expired mid-run and another
    ///   run took it over; nothing is stored.
    /// - [`PipelineError::Synthesis`] / [`PipelineError::Timeout`] /
    ///   [`PipelineError::Store`] for fatal stage failures.
    pub async fn run_at(
        &self,
        options: &RunOptions,
        now: DateTime<Utc>,
    ) -> Result<StoredBriefing, PipelineError> {
        options.validate()?;
        // Stored timestamps carry microseconds; keep the cursor exact.
        let now = now.trunc_subsecs(6);

        let holder = self.store_call(self.store.generate_id(PREFIX_RUN)).await?;
        let acquired = self
            .store_call(self.store.try_acquire_lease(
                PIPELINE_LEASE,
                &holder,
                now,
                self.settings.lease_ttl,
            ))
            .await?;
        if !acquired {
            let current = self
                .store_call(self.store.lease_holder(PIPELINE_LEASE))
                .await?
                .unwrap_or_else(|| "unknown".to_string());
            return Err(PipelineError::RunInProgress { holder: current });
        }
        tracing::debug!(%holder, "acquired pipeline lease");

        let result = self.run_locked(options, now, &holder).await;

        match self
            .store_call(self.store.release_lease(PIPELINE_LEASE, &holder))
            .await
        {
            Ok(true) => tracing::debug!(%holder, "released pipeline lease"),
            Ok(false) => tracing::warn!(%holder, "pipeline lease was already gone at release"),
            Err(error) => tracing::warn!(%holder, %error, "failed to release pipeline lease"),
        }
        result
    }

    async fn run_locked(
        &self,
        options: &RunOptions,
        now: DateTime<Utc>,
        holder: &str,
    ) -> Result<StoredBriefing, PipelineError> {
        let started = Instant::now();
        let cursor = if options.uses_cursor() {
            self.store_call(self.store.max_window_end()).await?
        } else {
            None
        };
        let window = resolve_window(options, now, cursor, self.settings.fallback_lookback)?;

        let limit = options.max_emails.unwrap_or(self.settings.max_emails);
        let documents = self
            .store_call(self.store.documents_in_window(window.start, window.end, limit))
            .await?;
        tracing::info!(
            documents = documents.len(),
            start = %window.start,
            end = %window.end,
            source = %window.source,
            "starting briefing run"
        );

        let map_settings = MapSettings {
            batch_size: to_usize(options.map_batch_size.unwrap_or(self.settings.map_batch_size)),
            content_char_cap: to_usize(self.settings.content_char_cap),
            timeout: self.settings.extraction_timeout,
        };
        // Renewing after every batch also covers the synthesis call that follows the last one.
        let mut insights = Vec::with_capacity(documents.len());
        for batch in documents.chunks(map_settings.batch_size.max(1)) {
            insights.extend(map_batch(&self.extractor, batch, &map_settings).await);
            self.hold_lease(holder, now, started).await?;
        }
        log_completion(&insights);

        let (draft, outcome) =
            reduce(&self.synthesizer, &insights, self.settings.synthesis_timeout).await?;
        let mut briefing = verify(draft, &insights);
        validate_contracts(
            &mut briefing,
            &insights,
            self.settings.contract_policy,
            outcome.is_synthesized(),
        );

        // Another run may have reclaimed an expired lease meanwhile; never store next to it.
        self.hold_lease(holder, now, started).await?;
        let id = self
            .store_call(self.store.generate_id(PREFIX_BRIEFING))
            .await?;
        let stored = StoredBriefing {
            id,
            generated_at: now,
            time_window_start: window.start,
            time_window_end: window.end,
            briefing,
            email_count: u32::try_from(documents.len()).unwrap_or(u32::MAX),
            model_version: self.model_version(),
        };
        self.store_call(self.store.insert_briefing(&stored)).await?;

        tracing::info!(
            id = %stored.id,
            email_count = stored.email_count,
            clusters = stored.briefing.narrative_clusters.len(),
            quality_issues = stored.briefing.quality_issues.len(),
            ?outcome,
            "briefing run complete"
        );
        Ok(stored)
    }

    /// Extend this run's lease from the run clock (`now` plus elapsed time).
    async fn hold_lease(
        &self,
        holder: &str,
        now: DateTime<Utc>,
        started: Instant,
    ) -> Result<(), PipelineError> {
        let elapsed = chrono::Duration::from_std(started.elapsed()).unwrap_or_else(|_| chrono::Duration::zero());
        let renewed = self
            .store_call(self.store.renew_lease(
                PIPELINE_LEASE,
                holder,
                now + elapsed,
                self.settings.lease_ttl,
            ))
            .await?;
        if renewed {
            return Ok(());
        }
        tracing::warn!(%holder, "pipeline lease was reclaimed by another run; abandoning");
        Err(PipelineError::LeaseLost {
            holder: holder.to_string(),
        })
    }

    /// Await a store call under the store deadline.
    async fn store_call<T>(
        &self,
        call: impl Future<Output = Result<T, DatabaseError>>,
    ) -> Result<T, PipelineError> {
        match tokio::time::timeout(self.settings.store_timeout, call).await {
            Ok(result) => result.map_err(PipelineError::Store),
            Err(_) => Err(PipelineError::Timeout {
                stage: "store",
                secs: self.settings.store_timeout.as_secs(),
            }),
        }
    }
}

fn to_usize(value: u32) -> usize {
    usize::try_from(value).unwrap_or(usize::MAX)
}
