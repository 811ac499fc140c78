//! Error types for engine operations.

use thiserror::Error;

/// Errors that can occur while talking to the search engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The HTTP request failed or timed out.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The engine answered with a non-success status.
    #[error("unexpected status {status}: {body}")]
    UnexpectedStatus {
        /// HTTP status code received.
        status: u16,
        /// Response body (truncated).
        body: String,
    },
    /// The response body could not be parsed.
    #[error("failed to parse response: {0}")]
    Parse(String),
}
