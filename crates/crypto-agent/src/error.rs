//! Error Types for the Crypto Agent

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CryptoError>;

#[derive(Error, Debug)]
pub enum CryptoError {
    /// Upstream price call failed; carries the upstream error text
    #[error("Error fetching crypto price: {0}")]
    PriceFetch(String),

    #[error("Configuration error: {0}")]
    Config(String),

    /// Model call failed
    #[error(transparent)]
    Agent(#[from] agent_core::AgentError),
}
