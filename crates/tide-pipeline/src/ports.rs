//! Storage seams used by the pipeline, implemented for [`TideDb`].
//!
//! The pipeline only needs a handful of store operations; keeping them behind
//! traits lets tests inject failing or slow stores.

use std::future::Future;

use chrono::{DateTime, Duration, Utc};
use tide_core::entities::{Document, StoredBriefing};
use tide_db::TideDb;
use tide_db::error::DatabaseError;

/// Append-only briefing persistence plus the run lease.
pub trait BriefingStore: Send + Sync {
    /// Maximum `time_window_end` over all stored briefings.
    fn max_window_end(
        &self,
    ) -> impl Future<Output = Result<Option<DateTime<Utc>>, DatabaseError>> + Send;

    fn insert_briefing(
        &self,
        stored: &StoredBriefing,
    ) -> impl Future<Output = Result<(), DatabaseError>> + Send;

    /// A fresh `{prefix}-{hex}` identifier.
    fn generate_id(&self, prefix: &str)
    -> impl Future<Output = Result<String, DatabaseError>> + Send;

    fn try_acquire_lease(
        &self,
        name: &str,
        holder: &str,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> impl Future<Output = Result<bool, DatabaseError>> + Send;

    /// Extend a lease still owned by `holder`; `false` once it was lost.
    fn renew_lease(
        &self,
        name: &str,
        holder: &str,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> impl Future<Output = Result<bool, DatabaseError>> + Send;

    fn lease_holder(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Option<String>, DatabaseError>> + Send;

    fn release_lease(
        &self,
        name: &str,
        holder: &str,
    ) -> impl Future<Output = Result<bool, DatabaseError>> + Send;
}

/// Documents by ingestion time.
pub trait DocumentSource: Send + Sync {
    /// Documents with `start < ingested_at <= end`, newest first, at most `limit`.
    fn documents_in_window(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        limit: u32,
    ) -> impl Future<Output = Result<Vec<Document>, DatabaseError>> + Send;
}

impl BriefingStore for TideDb {
    async fn max_window_end(&self) -> Result<Option<DateTime<Utc>>, DatabaseError> {
        Self::max_window_end(self).await
    }

    async fn insert_briefing(&self, stored: &StoredBriefing) -> Result<(), DatabaseError> {
        Self::insert_briefing(self, stored).await
    }

    async fn generate_id(&self, prefix: &str) -> Result<String, DatabaseError> {
        Self::generate_id(self, prefix).await
    }

    async fn try_acquire_lease(
        &self,
        name: &str,
        holder: &str,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<bool, DatabaseError> {
        Self::try_acquire_lease(self, name, holder, now, ttl).await
    }

    async fn renew_lease(
        &self,
        name: &str,
        holder: &str,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<bool, DatabaseError> {
        Self::renew_lease(self, name, holder, now, ttl).await
    }

    async fn lease_holder(&self, name: &str) -> Result<Option<String>, DatabaseError> {
        Self::lease_holder(self, name).await
    }

    async fn release_lease(&self, name: &str, holder: &str) -> Result<bool, DatabaseError> {
        Self::release_lease(self, name, holder).await
    }
}

impl DocumentSource for TideDb {
    async fn documents_in_window(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<Document>, DatabaseError> {
        Self::documents_in_window(self, &start, &end, limit).await
    }
}

impl<T: BriefingStore> BriefingStore for &T {
    fn max_window_end(
        &self,
    ) -> impl Future<Output = Result<Option<DateTime<Utc>>, DatabaseError>> + Send {
        (**self).max_window_end()
    }

    fn insert_briefing(
        &self,
        stored: &StoredBriefing,
    ) -> impl Future<Output = Result<(), DatabaseError>> + Send {
        (**self).insert_briefing(stored)
    }

    fn generate_id(
        &self,
        prefix: &str,
    ) -> impl Future<Output = Result<String, DatabaseError>> + Send {
        (**self).generate_id(prefix)
    }

    fn try_acquire_lease(
        &self,
        name: &str,
        holder: &str,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> impl Future<Output = Result<bool, DatabaseError>> + Send {
        (**self).try_acquire_lease(name, holder, now, ttl)
    }

    fn renew_lease(
        &self,
        name: &str,
        holder: &str,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> impl Future<Output = Result<bool, DatabaseError>> + Send {
        (**self).renew_lease(name, holder, now, ttl)
    }

    fn lease_holder(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Option<String>, DatabaseError>> + Send {
        (**self).lease_holder(name)
    }

    fn release_lease(
        &self,
        name: &str,
        holder: &str,
    ) -> impl Future<Output = Result<bool, DatabaseError>> + Send {
        (**self).release_lease(name, holder)
    }
}

impl<T: DocumentSource> DocumentSource for &T {
    fn documents_in_window(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        limit: u32,
    ) -> impl Future<Output = Result<Vec<Document>, DatabaseError>> + Send {
        (**self).documents_in_window(start, end, limit)
    }
}
