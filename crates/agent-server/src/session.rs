//! Chat Sessions
//!
//! One agent, transcript and price history per browser session. All
//! sessions share the process-wide price cache held by the agents.
//!
//! Sessions idle longer than the store's TTL are dropped when a new one is
//! created, and the store never holds more than its capacity.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use uuid::Uuid;

use agent_core::Message;
use crypto_agent::{AgentReply, CryptoAgent, PriceHistory};

/// Unique session identifier
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A browser conversation
pub struct ChatSession {
    agent: CryptoAgent,

    /// Everything shown in the chat window, error replies included
    transcript: Vec<Message>,

    /// Prices quoted in this session, for the chart
    prices: PriceHistory,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ChatSession {
    pub fn new(agent: CryptoAgent) -> Self {
        let now = Utc::now();
        Self {
            agent,
            transcript: Vec::new(),
            prices: PriceHistory::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Send a message through the agent and record the exchange
    pub async fn chat(&mut self, text: &str) -> AgentReply {
        self.transcript.push(Message::user(text));
        let reply = self.agent.respond(text).await;
        self.transcript.push(Message::assistant(reply.text.clone()));

        let now = Utc::now();
        if let Some(price) = reply.quoted_price {
            self.prices.record(now, price);
        }
        self.updated_at = now;
        reply
    }

    /// Clear conversation context, transcript and price history
    pub fn reset(&mut self) {
        self.agent.clear_context();
        self.transcript.clear();
        self.prices.clear();
        self.updated_at = Utc::now();
    }

    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    /// Quoted prices, with samples past retention dropped first
    pub fn price_history(&mut self) -> &PriceHistory {
        self.prices.prune(Utc::now());
        &self.prices
    }
}

/// Sessions idle this long are reclaimed
pub const DEFAULT_IDLE_TTL_MINUTES: i64 = 60;

/// Most sessions held at once
pub const DEFAULT_MAX_SESSIONS: usize = 1024;

/// In-memory session registry
pub struct SessionStore {
    sessions: RwLock<HashMap<SessionId, Arc<Mutex<ChatSession>>>>,
    idle_ttl: TimeDelta,
    max_sessions: usize,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_limits(TimeDelta::minutes(DEFAULT_IDLE_TTL_MINUTES), DEFAULT_MAX_SESSIONS)
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(idle_ttl: TimeDelta, max_sessions: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            idle_ttl,
            max_sessions: max_sessions.max(1),
        }
    }

    /// Look up a session
    pub fn get(&self, id: &SessionId) -> Option<Arc<Mutex<ChatSession>>> {
        let sessions = self.sessions.read().unwrap_or_else(PoisonError::into_inner);
        sessions.get(id).cloned()
    }

    /// Existing session for `id`, or a new one built with `make_agent`
    /// (under `id` when given, under a fresh id otherwise)
    pub fn get_or_create(
        &self,
        id: Option<SessionId>,
        make_agent: impl FnOnce() -> CryptoAgent,
    ) -> (SessionId, Arc<Mutex<ChatSession>>) {
        let id = id.unwrap_or_default();
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(session) = sessions.get(&id) {
            return (id, session.clone());
        }

        self.evict(&mut sessions);
        tracing::debug!(session = %id, "Creating chat session");
        let session = Arc::new(Mutex::new(ChatSession::new(make_agent())));
        sessions.insert(id.clone(), session.clone());
        (id, session)
    }

    /// Drop idle sessions, then the least recently used ones until there is
    /// room for one more. Sessions busy with a request are never dropped.
    fn evict(&self, sessions: &mut HashMap<SessionId, Arc<Mutex<ChatSession>>>) {
        let cutoff = Utc::now() - self.idle_ttl;
        let before = sessions.len();
        sessions.retain(|_, session| match session.try_lock() {
            Ok(session) => session.updated_at > cutoff,
            Err(_) => true,
        });

        while sessions.len() >= self.max_sessions {
            let oldest = sessions
                .iter()
                .filter_map(|(id, session)| {
                    let session = session.try_lock().ok()?;
                    Some((session.updated_at, id.clone()))
                })
                .min();
            match oldest {
                Some((_, id)) => {
                    sessions.remove(&id);
                }
                None => break,
            }
        }

        let dropped = before - sessions.len();
        if dropped > 0 {
            tracing::debug!(dropped, remaining = sessions.len(), "Evicted chat sessions");
        }
    }

    /// Number of sessions
    pub fn len(&self) -> usize {
        self.sessions.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
