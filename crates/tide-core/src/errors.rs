//! Cross-cutting error types for Tidings.
//!
//! Domain-specific errors (e.g., `DatabaseError`, `LlmError`) are defined in
//! their respective crates. Everything converges into `anyhow` in `tide-cli`.

use thiserror::Error;

/// Errors that can be raised by any Tidings crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Entity lookup returned no result.
    #[error("Entity not found: {entity_type} {id}")]
    NotFound { entity_type: String, id: String },

    /// Data failed validation (format, constraints).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
