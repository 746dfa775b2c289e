//! # agent-core
//!
//! Provider-agnostic building blocks for a conversational agent.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Conversational agent                     │
//! │  ┌──────────────┐  ┌──────────────────┐  ┌───────────────┐  │
//! │  │ Conversation │  │ LanguageDetector │  │  LlmProvider  │  │
//! │  │ (turn log +  │──│  (bounded memo)  │──│  (Strategy)   │  │
//! │  │   window)    │  └──────────────────┘  └───────────────┘  │
//! │  └──────────────┘                                            │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The `LlmProvider` trait lets the agent run against Together, any other
//! OpenAI-compatible endpoint, or a scripted stub without code changes.

pub mod error;
pub mod language;
pub mod message;
pub mod provider;

pub use error::{AgentError, Result};
pub use language::LanguageDetector;
pub use message::{Conversation, Message, Role};
pub use provider::{Completion, GenerationOptions, LlmProvider};
