//! # agent-runtime
//!
//! Hosted LLM providers for the crypto agent.
//!
//! ## Providers
//!
//! - **Together** (default): OpenAI-compatible chat completions at
//!   `api.together.xyz`, or any compatible endpoint via `TOGETHER_BASE_URL`
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agent_runtime::TogetherProvider;
//!
//! let provider = Arc::new(TogetherProvider::from_env()?);
//! let agent = CryptoAgent::new(provider, prices, config);
//! ```

pub mod together;

pub use together::{TogetherConfig, TogetherProvider};

// Re-export core types for convenience
pub use agent_core::{AgentError, LlmProvider, Message, Result, Role};
