//! Generative model (OpenAI-compatible chat completions) configuration.

use serde::{Deserialize, Serialize};

use crate::ConfigError;

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_extraction_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_synthesis_model() -> String {
    "gpt-4o".to_string()
}

const fn default_extraction_max_tokens() -> u32 {
    1024
}

const fn default_synthesis_max_tokens() -> u32 {
    8192
}

const fn default_temperature() -> f32 {
    0.2
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LlmConfig {
    /// API root; `/chat/completions` is appended.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default)]
    pub api_key: String,

    /// Model used once per document by the map stage.
    #[serde(default = "default_extraction_model")]
    pub extraction_model: String,

    /// Model used once per run by the reduce stage.
    #[serde(default = "default_synthesis_model")]
    pub synthesis_model: String,

    #[serde(default = "default_extraction_max_tokens")]
    pub extraction_max_tokens: u32,

    #[serde(default = "default_synthesis_max_tokens")]
    pub synthesis_max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: String::new(),
            extraction_model: default_extraction_model(),
            synthesis_model: default_synthesis_model(),
            extraction_max_tokens: default_extraction_max_tokens(),
            synthesis_max_tokens: default_synthesis_max_tokens(),
            temperature: default_temperature(),
        }
    }
}

impl LlmConfig {
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty() && !self.base_url.is_empty()
    }

    /// Fail early when a command needs the model but no key is set.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotConfigured` for section `llm`.
    pub fn ensure_configured(&self) -> Result<(), ConfigError> {
        if self.is_configured() {
            Ok(())
        } else {
            Err(ConfigError::NotConfigured {
                section: "llm".to_string(),
            })
        }
    }
}
