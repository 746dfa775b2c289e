//! # crypto-agent
//!
//! A multilingual cryptocurrency assistant: one hosted chat model for
//! conversation and language detection, one public price API for live
//! quotes.
//!
//! ## Pipeline
//!
//! ```text
//! user text ──▶ LanguageDetector ──▶ history (+ window of 5) ──▶ LlmProvider
//!                                                                   │
//!                    price question? ──▶ PriceCache ──▶ PriceSource │
//!                                            │                      ▼
//!                                            └──── "Current BTC Price: $X USD"
//! ```
//!
//! Failures never escape [`CryptoAgent::process_message`]: a failed price
//! lookup becomes an apology line, a failed model call becomes the reply.

pub mod agent;
pub mod config;
pub mod error;
pub mod format;
pub mod history;
pub mod price;
pub mod triggers;

pub use agent::{AgentConfig, AgentReply, CryptoAgent, TrackedAsset};
pub use config::Settings;
pub use error::{CryptoError, Result};
pub use history::{PriceHistory, PriceSample};
pub use price::{CoinGeckoClient, PriceCache, PriceSource, PriceTable};
pub use triggers::PriceTriggers;
