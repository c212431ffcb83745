//! Shared test utilities for tide-db unit tests.

pub(crate) mod helpers {
    use chrono::{DateTime, Utc};
    use tide_core::entities::Document;

    use crate::TideDb;

    /// Create an in-memory database with migrations applied.
    pub async fn test_db() -> TideDb {
        TideDb::open_local(":memory:").await.unwrap()
    }

    /// A plain-text document ingested at `ingested_at`.
    pub fn document(id: &str, ingested_at: DateTime<Utc>) -> Document {
        Document {
            id: id.to_string(),
            publisher: "Platformer".to_string(),
            subject: format!("Issue {id}"),
            sent_at: ingested_at,
            ingested_at,
            html: None,
            text: Some(format!("Body of {id}")),
        }
    }
}
