//! OpenAI-compatible chat completions client.
//!
//! One request shape for both stages: a system prompt, a user prompt, and a
//! JSON-object response format. Per-call deadlines are owned by the caller;
//! the client-level timeout is only a backstop for hung connections.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tide_config::LlmConfig;

use crate::error::LlmError;
use crate::http::check_response;

/// Backstop for a single HTTP exchange, above any pipeline stage timeout.
const CLIENT_TIMEOUT: Duration = Duration::from_secs(600);

/// One chat completion call.
#[derive(Debug, Clone, Copy)]
pub struct ChatCall<'a> {
    pub model: &'a str,
    pub system: &'a str,
    pub user: &'a str,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Async chat completions client. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ChatClient {
    http: Client,
    endpoint: String,
    api_key: String,
}

impl ChatClient {
    /// Build a client for `{base_url}/chat/completions`.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::Http`] if the HTTP client cannot be constructed.
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, LlmError> {
        let http = Client::builder().timeout(CLIENT_TIMEOUT).build()?;
        Ok(Self {
            http,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            api_key: api_key.trim().to_string(),
        })
    }

    /// # Errors
    ///
    /// Returns [`LlmError::Http`] if the HTTP client cannot be constructed.
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        Self::new(&config.base_url, &config.api_key)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send one completion request and return the first choice's text.
    ///
    /// # Errors
    ///
    /// - [`LlmError::RateLimited`] / [`LlmError::Api`] for non-success statuses.
    /// - [`LlmError::Parse`] if the response envelope is not a chat completion.
    /// - [`LlmError::EmptyResponse`] if no choice carries non-blank content.
    pub async fn complete(&self, call: ChatCall<'_>) -> Result<String, LlmError> {
        let body = ChatRequest {
            model: call.model,
            temperature: call.temperature,
            max_tokens: call.max_tokens,
            response_format: ResponseFormat {
                kind: "json_object",
            },
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: call.system,
                },
                ChatMessage {
                    role: "user",
                    content: call.user,
                },
            ],
        };

        tracing::debug!(model = call.model, prompt_chars = call.user.len(), "chat completion request");
        let resp = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        let resp = check_response(resp).await?;
        let text = resp.text().await?;
        parse_completion(&text, call.model)
    }
}

/// Extract the first non-blank choice from a raw chat completion body.
fn parse_completion(body: &str, model: &str) -> Result<String, LlmError> {
    let parsed: ChatResponse = serde_json::from_str(body)
        .map_err(|e| LlmError::Parse(format!("chat completion envelope: {e}")))?;
    parsed
        .choices
        .into_iter()
        .find_map(|choice| choice.message.content.filter(|c| !c.trim().is_empty()))
        .ok_or_else(|| LlmError::EmptyResponse {
            model: model.to_string(),
        })
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    max_tokens: u32,
    response_format: ResponseFormat,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn endpoint_joins_base_url() {
        let client = ChatClient::new("https://api.example.com/v1/", "  sk-test ").unwrap();
        assert_eq!(client.endpoint(), "https://api.example.com/v1/chat/completions");
        assert_eq!(client.api_key, "sk-test");
    }

    #[test]
    fn request_body_asks_for_json_object() {
        let body = ChatRequest {
            model: "gpt-4o-mini",
            temperature: 0.2,
            max_tokens: 1024,
            response_format: ResponseFormat {
                kind: "json_object",
            },
            messages: vec![ChatMessage {
                role: "user",
                content: "hi",
            }],
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["response_format"]["type"], "json_object");
        assert_eq!(value["max_tokens"], 1024);
        assert_eq!(value["messages"][0]["role"], "user");
    }

    #[test]
    fn parses_first_choice_content() {
        let body = r#"{
            "id": "chatcmpl-1",
            "choices": [
                {"index": 0, "message": {"role": "assistant", "content": "{\"summary\":\"ok\"}"}}
            ]
        }"#;
        assert_eq!(parse_completion(body, "m").unwrap(), r#"{"summary":"ok"}"#);
    }

    #[test]
    fn null_or_blank_content_is_empty_response() {
        let body = r#"{"choices": [
            {"message": {"role": "assistant", "content": null}},
            {"message": {"role": "assistant", "content": "   "}}
        ]}"#;
        assert!(matches!(
            parse_completion(body, "gpt-4o"),
            Err(LlmError::EmptyResponse { model }) if model == "gpt-4o"
        ));
    }

    #[test]
    fn no_choices_is_empty_response() {
        assert!(matches!(
            parse_completion(r#"{"choices": []}"#, "m"),
            Err(LlmError::EmptyResponse { .. })
        ));
    }

    #[test]
    fn non_envelope_body_is_parse_error() {
        assert!(matches!(
            parse_completion("<html>gateway</html>", "m"),
            Err(LlmError::Parse(_))
        ));
    }
}
