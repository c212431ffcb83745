use chrono::{DateTime, Utc};
use clap::{Args, Subcommand};

/// Top-level command tree.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Run the briefing pipeline once over the next window.
    Run(RunArgs),
    /// Show the most recent briefing.
    Latest,
    /// Show one briefing by id.
    Get(GetArgs),
    /// List recent briefings with their headline.
    Archive(ArchiveArgs),
    /// Load newsletters from a JSON Lines file.
    Ingest(IngestArgs),
}

#[derive(Clone, Debug, Args)]
pub struct RunArgs {
    /// Explicit window start (RFC 3339), exclusive.
    #[arg(long, requires = "window_end", conflicts_with = "window_hours")]
    pub window_start: Option<DateTime<Utc>>,
    /// Explicit window end (RFC 3339), inclusive.
    #[arg(long, requires = "window_start")]
    pub window_end: Option<DateTime<Utc>>,
    /// Process the last N hours instead of continuing from the previous briefing.
    #[arg(long)]
    pub window_hours: Option<u32>,
    /// Cap on newsletters processed (newest kept).
    #[arg(long)]
    pub max_emails: Option<u32>,
    /// Concurrent extraction calls per batch.
    #[arg(long)]
    pub batch_size: Option<u32>,
}

#[derive(Clone, Debug, Args)]
pub struct GetArgs {
    pub id: String,
}

#[derive(Clone, Debug, Args)]
pub struct ArchiveArgs {
    #[arg(long, default_value_t = 20)]
    pub limit: u32,
}

#[derive(Clone, Debug, Args)]
pub struct IngestArgs {
    /// One document JSON object per line.
    pub file: String,
}
