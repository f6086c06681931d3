//! Error types for the strategy-agent pipeline.
//!
//! Uses `thiserror` for typed errors surfaced through the orchestrator's
//! error channel. None of these is fatal: a failed query costs the affected
//! team one round of instructions and nothing else.

/// Errors that can occur while querying a team's strategy agent.
#[derive(Debug, thiserror::Error)]
pub enum EngineerError {
    /// No API key configured for the provider the team routes through.
    #[error("missing API key for provider {0}")]
    MissingKey(String),

    /// The model is not on the free-tier allow-list.
    #[error("model {0} is not available on the free tier")]
    ModelNotAllowed(String),

    /// The provider string in the team configuration is unknown.
    #[error("unsupported provider: {0}")]
    UnsupportedProvider(String),

    /// The HTTP request could not be sent or completed.
    #[error("inference request failed: {0}")]
    Transport(String),

    /// The provider answered with a non-success status code.
    #[error("inference provider returned {status}: {message}")]
    Status { status: u16, message: String },

    /// The response body did not contain an assistant message.
    #[error("malformed inference response: {0}")]
    MalformedResponse(String),
}
