use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tide_core::entities::Document;
use tide_db::TideDb;
use tide_db::error::DatabaseError;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::IngestArgs;
use crate::context::AppContext;
use crate::output::output;

/// One line of an ingest file. `ingested_at` defaults to the time of import.
#[derive(Debug, Deserialize)]
struct IngestRecord {
    id: String,
    publisher: String,
    subject: String,
    sent_at: DateTime<Utc>,
    #[serde(default)]
    ingested_at: Option<DateTime<Utc>>,
    #[serde(default)]
    html: Option<String>,
    #[serde(default)]
    text: Option<String>,
}

impl IngestRecord {
    fn into_document(self, now: DateTime<Utc>) -> Document {
        Document {
            id: self.id,
            publisher: self.publisher,
            subject: self.subject,
            sent_at: self.sent_at,
            ingested_at: self.ingested_at.unwrap_or(now),
            html: self.html,
            text: self.text,
        }
    }
}

#[derive(Debug, Default, PartialEq, Eq, Serialize)]
struct IngestSummary {
    file: String,
    read: u32,
    inserted: u32,
    duplicates: u32,
    rejected: u32,
}

/// Handle `tdg ingest <file>`.
pub async fn handle(args: &IngestArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let summary = ingest_file(&ctx.db, Path::new(&args.file), Utc::now()).await?;
    output(&summary, flags.format)
}

async fn ingest_file(db: &TideDb, path: &Path, now: DateTime<Utc>) -> anyhow::Result<IngestSummary> {
    let records = serde_jsonlines::json_lines::<IngestRecord, _>(path)
        .with_context(|| format!("failed to open {}", path.display()))?;

    let mut summary = IngestSummary {
        file: path.display().to_string(),
        ..IngestSummary::default()
    };
    for (line, record) in records.enumerate() {
        let record = record.with_context(|| format!("{}:{}: malformed record", path.display(), line + 1))?;
        summary.read += 1;

        let document = record.into_document(now);
        match db.insert_document(&document).await {
            Ok(true) => summary.inserted += 1,
            Ok(false) => summary.duplicates += 1,
            Err(DatabaseError::Validation(error)) => {
                tracing::warn!(id = %document.id, line = line + 1, %error, "rejected document");
                summary.rejected += 1;
            }
            Err(error) => return Err(error.into()),
        }
    }

    tracing::info!(
        inserted = summary.inserted,
        duplicates = summary.duplicates,
        rejected = summary.rejected,
        "ingest complete"
    );
    Ok(summary)
}
