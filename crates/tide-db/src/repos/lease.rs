//! Run lease repository: at most one live pipeline run per lease name.
//!
//! A lease is a row keyed by name. Acquisition deletes an expired row for the
//! name, then conditionally inserts; whoever inserts holds the lease until
//! release or expiry. A long run renews its lease as it goes.

use chrono::{DateTime, Duration, Utc};

use crate::TideDb;
use crate::error::DatabaseError;
use crate::helpers::format_datetime;

impl TideDb {
    /// Try to take the lease `name` for `holder` until `now + ttl`.
    ///
    /// Returns `false` if another holder owns a lease that has not expired.
    pub async fn try_acquire_lease(
        &self,
        name: &str,
        holder: &str,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<bool, DatabaseError> {
        let reclaimed = self
            .conn()
            .execute(
                "DELETE FROM pipeline_leases WHERE name = ?1 AND expires_at <= ?2",
                libsql::params![name, format_datetime(&now)],
            )
            .await?;
        if reclaimed > 0 {
            tracing::warn!(lease = name, "reclaimed expired pipeline lease");
        }

        let inserted = self
            .conn()
            .execute(
                "INSERT OR IGNORE INTO pipeline_leases (name, holder, acquired_at, expires_at)
                 VALUES (?1, ?2, ?3, ?4)",
                libsql::params![
                    name,
                    holder,
                    format_datetime(&now),
                    format_datetime(&(now + ttl))
                ],
            )
            .await?;
        Ok(inserted == 1)
    }

    /// Push the expiry of `name` to `now + ttl`, but only while `holder` still
    /// owns the row. Returns `false` once the lease has been reclaimed by
    /// someone else or released.
    pub async fn renew_lease(
        &self,
        name: &str,
        holder: &str,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<bool, DatabaseError> {
        let updated = self
            .conn()
            .execute(
                "UPDATE pipeline_leases SET expires_at = ?3 WHERE name = ?1 AND holder = ?2",
                libsql::params![name, holder, format_datetime(&(now + ttl))],
            )
            .await?;
        Ok(updated == 1)
    }

    /// Current holder of `name`, expired or not.
    pub async fn lease_holder(&self, name: &str) -> Result<Option<String>, DatabaseError> {
        let mut rows = self
            .conn()
            .query("SELECT holder FROM pipeline_leases WHERE name = ?1", [name])
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row.get::<String>(0)?)),
            None => Ok(None),
        }
    }

    /// Release `name` if `holder` still owns it. Returns whether a row was removed.
    pub async fn release_lease(&self, name: &str, holder: &str) -> Result<bool, DatabaseError> {
        let removed = self
            .conn()
            .execute(
                "DELETE FROM pipeline_leases WHERE name = ?1 AND holder = ?2",
                [name, holder],
            )
            .await?;
        Ok(removed > 0)
    }
}
