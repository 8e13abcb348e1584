//! Failure taxonomy for the generation collaborator
//!
//! These are the only recoverable errors in the system: callers are
//! expected to branch on them and fall back to the bundled demo template
//! rather than retry.

use thiserror::Error;

/// Error from a generation request
#[derive(Debug, Error)]
pub enum ProviderError {
    /// No API key configured for the selected provider
    #[error("no API key configured for {provider}")]
    MissingApiKey { provider: String },

    /// Transport-level failure
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status from the provider
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Provider replied but no HTML document could be extracted
    #[error("response contained no HTML document")]
    EmptyResponse,

    /// The request exceeded the generation deadline
    #[error("generation timed out")]
    Timeout,

    /// A newer generation request superseded this one; its result is
    /// discarded instead of racing into shared state
    #[error("superseded by a newer generation request")]
    Superseded,
}
