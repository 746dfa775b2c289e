//! Application State

use std::sync::Arc;

use agent_core::LlmProvider;
use crypto_agent::{AgentConfig, CryptoAgent, PriceCache};

use crate::session::SessionStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// LLM provider (Together, etc.)
    pub provider: Arc<dyn LlmProvider>,

    /// Price cache shared by every session
    pub prices: Arc<PriceCache>,

    /// Configuration each new session's agent starts from
    pub agent_config: Arc<AgentConfig>,

    /// Live chat sessions
    pub sessions: Arc<SessionStore>,
}

impl AppState {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        prices: Arc<PriceCache>,
        agent_config: AgentConfig,
    ) -> Self {
        Self {
            provider,
            prices,
            agent_config: Arc::new(agent_config),
            sessions: Arc::new(SessionStore::new()),
        }
    }

    /// A fresh agent for a new session
    pub fn new_agent(&self) -> CryptoAgent {
        CryptoAgent::new(
            self.provider.clone(),
            self.prices.clone(),
            (*self.agent_config).clone(),
        )
    }
}
