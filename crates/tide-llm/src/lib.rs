//! # tide-llm
//!
//! Generative model boundary for Tidings.
//!
//! The pipeline depends only on the [`InsightExtractor`] and
//! [`NarrativeSynthesizer`] traits, which return raw model text. Parsing,
//! repair and fallback live in `tide-pipeline`; this crate only moves text
//! in and out of an OpenAI-compatible chat completions endpoint.

use std::future::Future;

use chrono::{DateTime, Utc};

pub mod client;
pub mod error;
pub mod http;
pub mod model;
pub mod prompts;
pub mod response;

pub use client::{ChatCall, ChatClient};
pub use error::LlmError;
pub use model::{ModelExtractor, ModelSynthesizer};
pub use response::strip_code_fences;

/// Input to one per-document extraction call.
#[derive(Debug, Clone, Copy)]
pub struct ExtractionRequest<'a> {
    pub document_id: &'a str,
    pub publisher: &'a str,
    pub subject: &'a str,
    pub sent_at: DateTime<Utc>,
    /// Plain-text body, already truncated to the content cap.
    pub content: &'a str,
}

/// One text-generation call per document, expected to return an Insight JSON object.
pub trait InsightExtractor: Send + Sync {
    /// Model identifier recorded in briefing provenance.
    fn model_id(&self) -> &str;

    fn extract(
        &self,
        request: &ExtractionRequest<'_>,
    ) -> impl Future<Output = Result<String, LlmError>> + Send;
}

/// One text-generation call per run over the serialized Insight set,
/// expected to return a Briefing JSON object.
pub trait NarrativeSynthesizer: Send + Sync {
    /// Model identifier recorded in briefing provenance.
    fn model_id(&self) -> &str;

    fn synthesize(&self, context: &str) -> impl Future<Output = Result<String, LlmError>> + Send;
}
