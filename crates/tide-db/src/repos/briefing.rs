//! Briefing repository: append-only insert plus the read paths and the delta cursor.

use chrono::{DateTime, Utc};

use tide_core::entities::{ArchiveEntry, StoredBriefing};

use crate::TideDb;
use crate::error::DatabaseError;
use crate::helpers::{format_datetime, get_count, get_opt_string, parse_datetime};

const BRIEFING_COLUMNS: &str =
    "id, generated_at, time_window_start, time_window_end, briefing_json, email_count, model_version";

fn row_to_briefing(row: &libsql::Row) -> Result<StoredBriefing, DatabaseError> {
    let briefing_json = row.get::<String>(4)?;
    Ok(StoredBriefing {
        id: row.get::<String>(0)?,
        generated_at: parse_datetime(&row.get::<String>(1)?)?,
        time_window_start: parse_datetime(&row.get::<String>(2)?)?,
        time_window_end: parse_datetime(&row.get::<String>(3)?)?,
        briefing: serde_json::from_str(&briefing_json)
            .map_err(|e| DatabaseError::Query(format!("Invalid briefing JSON: {e}")))?,
        email_count: get_count(row, 5)?,
        model_version: row.get::<String>(6)?,
    })
}

fn row_to_archive_entry(row: &libsql::Row) -> Result<ArchiveEntry, DatabaseError> {
    Ok(ArchiveEntry {
        id: row.get::<String>(0)?,
        generated_at: parse_datetime(&row.get::<String>(1)?)?,
        time_window_start: parse_datetime(&row.get::<String>(2)?)?,
        time_window_end: parse_datetime(&row.get::<String>(3)?)?,
        email_count: get_count(row, 4)?,
        headline: get_opt_string(row, 5)?,
    })
}

impl TideDb {
    /// Append a briefing. An existing id is an error, never an overwrite.
    pub async fn insert_briefing(&self, stored: &StoredBriefing) -> Result<(), DatabaseError> {
        let briefing_json =
            serde_json::to_string(&stored.briefing).map_err(|e| DatabaseError::Other(e.into()))?;

        self.conn()
            .execute(
                &format!(
                    "INSERT INTO briefings ({BRIEFING_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"
                ),
                libsql::params![
                    stored.id.as_str(),
                    format_datetime(&stored.generated_at),
                    format_datetime(&stored.time_window_start),
                    format_datetime(&stored.time_window_end),
                    briefing_json,
                    i64::from(stored.email_count),
                    stored.model_version.as_str()
                ],
            )
            .await?;

        tracing::info!(
            id = %stored.id,
            email_count = stored.email_count,
            window_end = %stored.time_window_end,
            "stored briefing"
        );
        Ok(())
    }

    /// The briefing with the latest `generated_at`, if any exists.
    pub async fn latest_briefing(&self) -> Result<Option<StoredBriefing>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!(
                    "SELECT {BRIEFING_COLUMNS} FROM briefings ORDER BY generated_at DESC, rowid DESC LIMIT 1"
                ),
                (),
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_briefing(&row)?)),
            None => Ok(None),
        }
    }

    pub async fn get_briefing(&self, id: &str) -> Result<Option<StoredBriefing>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!("SELECT {BRIEFING_COLUMNS} FROM briefings WHERE id = ?1"),
                [id],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_briefing(&row)?)),
            None => Ok(None),
        }
    }

    /// Most recent `limit` briefings, newest first, with only the headline bullet.
    pub async fn list_archive(&self, limit: u32) -> Result<Vec<ArchiveEntry>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                "SELECT id, generated_at, time_window_start, time_window_end, email_count,
                        json_extract(briefing_json, '$.executive_summary[0]')
                 FROM briefings ORDER BY generated_at DESC, rowid DESC LIMIT ?1",
                [i64::from(limit)],
            )
            .await?;

        let mut entries = Vec::new();
        while let Some(row) = rows.next().await? {
            entries.push(row_to_archive_entry(&row)?);
        }
        Ok(entries)
    }

    /// Maximum `time_window_end` across all stored briefings: the delta cursor.
    pub async fn max_window_end(&self) -> Result<Option<DateTime<Utc>>, DatabaseError> {
        let mut rows = self
            .conn()
            .query("SELECT MAX(time_window_end) FROM briefings", ())
            .await?;
        let Some(row) = rows.next().await? else {
            return Ok(None);
        };
        get_opt_string(&row, 0)?
            .as_deref()
            .map(parse_datetime)
            .transpose()
    }
}
