//! Error types for the discovery crate.

use std::time::Duration;

use thiserror::Error;

/// Errors from the AI provider and its output parsing.
#[derive(Debug, Error)]
pub enum AiError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("AI provider error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("AI provider authentication failed: {0}")]
    Auth(String),

    /// The provider answered, but not with the JSON shape we asked for.
    #[error("failed to parse AI output: {0}")]
    Parse(String),

    /// The outer call budget elapsed. Kept separate from [`AiError::Parse`]
    /// so callers can tell a slow provider from a malformed one.
    #[error("AI call timed out after {0:?}")]
    Timeout(Duration),
}

/// Errors the search pipeline surfaces to the HTTP layer.
///
/// Catalog failures never appear here: they degrade the result instead of
/// failing the request. Only a missing keyword and a failed candidate
/// generation abort the pipeline.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("keyword must not be empty")]
    EmptyKeyword,

    #[error("candidate generation failed: {0}")]
    Candidates(#[from] AiError),

    #[error("failed to serialize result envelope: {0}")]
    Serialize(#[from] serde_json::Error),
}
