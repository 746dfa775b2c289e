//! LLM Provider Strategy Pattern
//!
//! Defines a common interface for hosted chat-completion backends so the
//! agent can be driven by any of them (or by a scripted stub in tests).
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agent_core::provider::{GenerationOptions, LlmProvider};
//!
//! let provider = TogetherProvider::from_env()?;
//! let options = GenerationOptions::chat(provider.model());
//! let completion = provider.complete(&messages, &options).await?;
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::message::Message;

/// Sampling settings for conversational replies
pub const CHAT_MAX_TOKENS: u32 = 200;
pub const CHAT_TEMPERATURE: f32 = 0.7;

/// Sampling settings for language detection
pub const DETECTION_MAX_TOKENS: u32 = 10;
pub const DETECTION_TEMPERATURE: f32 = 0.1;

/// Configuration for LLM generation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Model identifier (e.g., "meta-llama/Meta-Llama-3.1-8B-Instruct-Turbo")
    pub model: String,

    /// Temperature for sampling (0.0 = deterministic, 1.0 = creative)
    pub temperature: f32,

    /// Maximum tokens to generate
    pub max_tokens: u32,
}

impl GenerationOptions {
    /// Options for a conversational reply
    pub fn chat(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            temperature: CHAT_TEMPERATURE,
            max_tokens: CHAT_MAX_TOKENS,
        }
    }

    /// Options for a short, near-deterministic classification answer
    pub fn language_detection(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            temperature: DETECTION_TEMPERATURE,
            max_tokens: DETECTION_MAX_TOKENS,
        }
    }
}

/// Response from an LLM completion
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Completion {
    /// The generated text
    pub content: String,

    /// Model that generated this response
    pub model: String,

    /// Token usage statistics (if available)
    pub usage: Option<TokenUsage>,

    /// Finish reason
    pub finish_reason: Option<FinishReason>,
}

impl Completion {
    /// Completion carrying only text, for providers that report nothing else
    pub fn text(content: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            model: model.into(),
            usage: None,
            finish_reason: None,
        }
    }
}

/// Token usage statistics
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Reason for completion finishing
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    ToolCalls,
    ContentFilter,
    #[serde(other)]
    Other,
}

/// Strategy trait for LLM providers
///
/// Implement this trait to add support for new LLM backends.
/// The agent works exclusively through this interface.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name (e.g., "Together")
    fn name(&self) -> &str;

    /// Check if the provider is reachable and accepts our credentials
    async fn health_check(&self) -> Result<bool>;

    /// Generate a completion from messages
    async fn complete(
        &self,
        messages: &[Message],
        options: &GenerationOptions,
    ) -> Result<Completion>;
}
