//! Error types for the library open-data client.

use thiserror::Error;

/// Errors that can occur when talking to the library open-data API.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned a non-success status
    #[error("library API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// API returned 200 but the payload carried an error field
    #[error("library API rejected the request: {0}")]
    Upstream(String),

    /// Response body could not be decoded
    #[error("failed to decode library API response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Invalid client configuration
    #[error("invalid configuration: {0}")]
    Config(String),
}
