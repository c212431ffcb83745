//! Pipeline error types.
//!
//! Only fatal conditions appear here. Per-document extraction failures are
//! absorbed by the map stage, and malformed synthesis output degrades to a
//! placeholder briefing; neither surfaces as a [`PipelineError`].

use thiserror::Error;

use tide_db::error::DatabaseError;
use tide_llm::LlmError;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Run options that cannot produce a non-empty window or a usable batch.
    #[error("invalid run options: {0}")]
    InvalidOptions(String),

    /// The narrative synthesizer call failed outright.
    #[error("narrative synthesis failed: {0}")]
    Synthesis(#[source] LlmError),

    /// A synthesis or store call exceeded its deadline.
    #[error("{stage} timed out after {secs}s")]
    Timeout { stage: &'static str, secs: u64 },

    /// A store read or write failed.
    #[error("briefing store error: {0}")]
    Store(#[from] DatabaseError),

    /// Another live run holds the pipeline lease.
    #[error("another pipeline run is in progress (lease held by {holder})")]
    RunInProgress { holder: String },

    /// This run's lease expired and was taken over before it could store.
    #[error("pipeline lease {holder} was lost before the briefing was stored")]
    LeaseLost { holder: String },
}
