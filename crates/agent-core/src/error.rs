//! Error Types

use thiserror::Error;

/// Result type alias for agent operations
pub type Result<T> = std::result::Result<T, AgentError>;

/// Agent error types
#[derive(Error, Debug)]
pub enum AgentError {
    /// LLM provider returned an error status
    #[error("Provider error: {0}")]
    Provider(String),

    /// Provider unreachable (connection refused, DNS, timeout)
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Provider answered but without usable message content
    #[error("Provider returned an empty response")]
    EmptyResponse,

    /// Response body could not be decoded
    #[error("Parse error: {0}")]
    Parse(String),

    /// Configuration error (missing API key, bad endpoint)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Rate limited by the provider
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Authentication failed
    #[error("Authentication failed: {0}")]
    Auth(String),
}
