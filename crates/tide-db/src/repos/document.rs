//! Document repository: the pipeline's view of ingested newsletters.

use chrono::{DateTime, Utc};

use tide_core::entities::Document;

use crate::TideDb;
use crate::error::DatabaseError;
use crate::helpers::{format_datetime, get_opt_string, parse_datetime};

fn row_to_document(row: &libsql::Row) -> Result<Document, DatabaseError> {
    Ok(Document {
        id: row.get::<String>(0)?,
        publisher: row.get::<String>(1)?,
        subject: row.get::<String>(2)?,
        sent_at: parse_datetime(&row.get::<String>(3)?)?,
        ingested_at: parse_datetime(&row.get::<String>(4)?)?,
        html: get_opt_string(row, 5)?,
        text: get_opt_string(row, 6)?,
    })
}

impl TideDb {
    /// Store a document handed over by ingestion.
    ///
    /// Returns `false` when a document with the same id already exists; the
    /// existing row is left untouched.
    pub async fn insert_document(&self, document: &Document) -> Result<bool, DatabaseError> {
        document.validate()?;

        let changed = self
            .conn()
            .execute(
                "INSERT OR IGNORE INTO documents (id, publisher, subject, sent_at, ingested_at, html, text)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                libsql::params![
                    document.id.as_str(),
                    document.publisher.as_str(),
                    document.subject.as_str(),
                    format_datetime(&document.sent_at),
                    format_datetime(&document.ingested_at),
                    document.html.as_deref(),
                    document.text.as_deref()
                ],
            )
            .await?;

        if changed == 0 {
            tracing::debug!(id = %document.id, "document already ingested; skipped");
        }
        Ok(changed > 0)
    }

    /// Documents with `start < ingested_at <= end`, newest first, at most `limit`.
    pub async fn documents_in_window(
        &self,
        start: &DateTime<Utc>,
        end: &DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<Document>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                "SELECT id, publisher, subject, sent_at, ingested_at, html, text
                 FROM documents
                 WHERE ingested_at > ?1 AND ingested_at <= ?2
                 ORDER BY ingested_at DESC, id ASC
                 LIMIT ?3",
                libsql::params![
                    format_datetime(start),
                    format_datetime(end),
                    i64::from(limit)
                ],
            )
            .await?;

        let mut documents = Vec::new();
        while let Some(row) = rows.next().await? {
            documents.push(row_to_document(&row)?);
        }
        Ok(documents)
    }
}
