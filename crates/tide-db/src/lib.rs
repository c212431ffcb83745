//! # tide-db
//!
//! libSQL storage for Tidings.
//!
//! Holds the append-only briefing table (the pipeline's cursor is derived
//! from it), the document table handed over by ingestion, and the lease row
//! that keeps pipeline runs single-flight. Repository methods are added to
//! [`TideDb`] by the modules under [`repos`].

pub mod error;
pub mod helpers;
mod migrations;
pub mod repos;

#[cfg(test)]
mod test_support;

use error::DatabaseError;
use libsql::Builder;

/// Central database handle for all Tidings state.
pub struct TideDb {
    #[allow(dead_code)]
    db: libsql::Database,
    conn: libsql::Connection,
}

impl TideDb {
    /// Open a local database at the given path, or `":memory:"` for tests.
    ///
    /// Runs migrations automatically on open.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened or
    /// migrations fail.
    pub async fn open_local(path: &str) -> Result<Self, DatabaseError> {
        let db = Builder::new_local(path).build().await?;
        let conn = db.connect()?;
        let tide_db = Self { db, conn };
        tide_db.run_migrations().await?;
        tracing::debug!(path, "opened local briefing store");
        Ok(tide_db)
    }

    /// Open a remote libSQL database (e.g. Turso) over HTTP.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the connection or migrations fail.
    pub async fn open_remote(url: &str, auth_token: &str) -> Result<Self, DatabaseError> {
        let db = Builder::new_remote(url.to_string(), auth_token.to_string())
            .build()
            .await?;
        let conn = db.connect()?;
        let tide_db = Self { db, conn };
        tide_db.run_migrations().await?;
        tracing::debug!(url, "opened remote briefing store");
        Ok(tide_db)
    }

    /// Access the underlying libSQL connection for direct queries.
    #[must_use]
    pub const fn conn(&self) -> &libsql::Connection {
        &self.conn
    }

    /// Generate a prefixed ID via libSQL. Returns e.g., `"brf-3f9a0c1de4b27a55"`.
    ///
    /// Uses `randomblob(8)` in SQL to produce 16-char hex, then prepends the prefix.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails or returns no rows.
    pub async fn generate_id(&self, prefix: &str) -> Result<String, DatabaseError> {
        let mut rows = self
            .conn
            .query(
                &format!("SELECT '{prefix}-' || lower(hex(randomblob(8)))"),
                (),
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        Ok(row.get::<String>(0)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::helpers::test_db;
    use std::collections::HashSet;

    #[tokio::test]
    async fn open_local_creates_schema() {
        let db = test_db().await;

        for table in &["briefings", "documents", "pipeline_leases"] {
            let mut rows = db
                .conn()
                .query(
                    "SELECT name FROM sqlite_master WHERE type='table' AND name=?1",
                    [*table],
                )
                .await
                .unwrap();
            let row = rows.next().await.unwrap();
            assert!(row.is_some(), "table '{table}' should exist");
        }
    }

    #[tokio::test]
    async fn generate_id_correct_format() {
        let db = test_db().await;
        let id = db.generate_id("brf").await.unwrap();
        assert!(id.starts_with("brf-"), "ID should start with 'brf-': {id}");
        assert_eq!(id.len(), 20, "ID should be 3 prefix + 1 dash + 16 hex: {id}");

        let hex_part = &id[4..];
        assert!(
            hex_part.chars().all(|c| c.is_ascii_hexdigit()),
            "Random part should be hex: {hex_part}"
        );
    }

    #[tokio::test]
    async fn generate_id_all_prefixes() {
        let db = test_db().await;
        for prefix in tide_core::ids::ALL_PREFIXES {
            let id = db.generate_id(prefix).await.unwrap();
            assert!(id.starts_with(&format!("{prefix}-")));
        }
    }

    #[tokio::test]
    async fn generate_id_uniqueness() {
        let db = test_db().await;
        let mut ids = HashSet::new();
        for _ in 0..100 {
            let id = db.generate_id("tst").await.unwrap();
            assert!(ids.insert(id.clone()), "Duplicate ID generated: {id}");
        }
    }

    #[tokio::test]
    async fn idempotent_migrations() {
        let db = test_db().await;
        db.run_migrations().await.unwrap();
    }

    #[tokio::test]
    async fn on_disk_database_persists_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tidings.db");
        let path = path.to_string_lossy();

        {
            let db = TideDb::open_local(&path).await.unwrap();
            db.conn()
                .execute(
                    "INSERT INTO pipeline_leases (name, holder, acquired_at, expires_at) VALUES ('p', 'h', 'a', 'b')",
                    (),
                )
                .await
                .unwrap();
        }

        let db = TideDb::open_local(&path).await.unwrap();
        let mut rows = db
            .conn()
            .query("SELECT holder FROM pipeline_leases WHERE name = 'p'", ())
            .await
            .unwrap();
        let row = rows.next().await.unwrap().unwrap();
        assert_eq!(row.get::<String>(0).unwrap(), "h");
    }
}
