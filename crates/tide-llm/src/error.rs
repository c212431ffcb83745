//! Generative model error types.

use thiserror::Error;

/// Errors from a text-generation call.
#[derive(Debug, Error)]
pub enum LlmError {
    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The model API returned a non-success status code.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code returned by the API.
        status: u16,
        /// Error message or response body.
        message: String,
    },

    /// The model API returned a 429 Too Many Requests response.
    #[error("rate limited, retry after {retry_after_secs}s")]
    RateLimited {
        /// Seconds to wait before retrying.
        retry_after_secs: u64,
    },

    /// The call succeeded but produced no usable text.
    #[error("model {model} returned an empty completion")]
    EmptyResponse { model: String },

    /// Failed to parse the API response envelope.
    #[error("parse error: {0}")]
    Parse(String),
}
