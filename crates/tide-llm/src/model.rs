//! Model-backed implementations of the extraction and synthesis seams.

use tide_config::LlmConfig;

use crate::client::{ChatCall, ChatClient};
use crate::error::LlmError;
use crate::prompts;
use crate::{ExtractionRequest, InsightExtractor, NarrativeSynthesizer};

/// Per-document extraction through a chat model.
#[derive(Debug, Clone)]
pub struct ModelExtractor {
    client: ChatClient,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl ModelExtractor {
    pub fn new(client: ChatClient, config: &LlmConfig) -> Self {
        Self {
            client,
            model: config.extraction_model.clone(),
            max_tokens: config.extraction_max_tokens,
            temperature: config.temperature,
        }
    }
}

impl InsightExtractor for ModelExtractor {
    fn model_id(&self) -> &str {
        &self.model
    }

    async fn extract(&self, request: &ExtractionRequest<'_>) -> Result<String, LlmError> {
        let user = prompts::extraction_user(
            request.publisher,
            request.subject,
            request.sent_at,
            request.content,
        );
        self.client
            .complete(ChatCall {
                model: &self.model,
                system: prompts::EXTRACTION_SYSTEM,
                user: &user,
                max_tokens: self.max_tokens,
                temperature: self.temperature,
            })
            .await
    }
}

/// Whole-window synthesis through a (usually larger) chat model.
#[derive(Debug, Clone)]
pub struct ModelSynthesizer {
    client: ChatClient,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl ModelSynthesizer {
    pub fn new(client: ChatClient, config: &LlmConfig) -> Self {
        Self {
            client,
            model: config.synthesis_model.clone(),
            max_tokens: config.synthesis_max_tokens,
            temperature: config.temperature,
        }
    }
}

impl NarrativeSynthesizer for ModelSynthesizer {
    fn model_id(&self) -> &str {
        &self.model
    }

    async fn synthesize(&self, context: &str) -> Result<String, LlmError> {
        let user = prompts::synthesis_user(context);
        self.client
            .complete(ChatCall {
                model: &self.model,
                system: prompts::SYNTHESIS_SYSTEM,
                user: &user,
                max_tokens: self.max_tokens,
                temperature: self.temperature,
            })
            .await
    }
}
