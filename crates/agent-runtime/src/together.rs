//! Together LLM Provider
//!
//! Implementation of `LlmProvider` for Together's OpenAI-compatible
//! chat-completions API. Any endpoint speaking the same dialect works by
//! pointing `TOGETHER_BASE_URL` at it.

use std::time::Duration;

use agent_core::{
    error::{AgentError, Result},
    message::Message,
    provider::{Completion, FinishReason, GenerationOptions, LlmProvider, TokenUsage},
};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "https://api.together.xyz/v1";
pub const DEFAULT_MODEL: &str = "meta-llama/Meta-Llama-3.1-8B-Instruct-Turbo";

const API_KEY_VAR: &str = "TOGETHER_API_KEY";
const BASE_URL_VAR: &str = "TOGETHER_BASE_URL";
const MODEL_VAR: &str = "TOGETHER_MODEL";

/// Together provider configuration
#[derive(Clone, Debug)]
pub struct TogetherConfig {
    /// Bearer token
    pub api_key: String,

    /// API root, without trailing slash
    pub base_url: String,

    /// Model used for every request
    pub model: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl TogetherConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.into(),
            model: DEFAULT_MODEL.into(),
            timeout_secs: 120,
        }
    }

    /// Read `TOGETHER_API_KEY` (required), `TOGETHER_BASE_URL` and `TOGETHER_MODEL`
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`TogetherConfig::from_env`] over an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let non_empty = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let api_key = non_empty(API_KEY_VAR).ok_or_else(|| {
            AgentError::Config(format!("{API_KEY_VAR} not found in environment variables"))
        })?;

        let mut config = Self::new(api_key);
        if let Some(base_url) = non_empty(BASE_URL_VAR) {
            config.base_url = base_url;
        }
        if let Some(model) = non_empty(MODEL_VAR) {
            config.model = model;
        }
        Ok(config)
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

/// Together LLM provider
pub struct TogetherProvider {
    client: Client,
    config: TogetherConfig,
}

impl TogetherProvider {
    /// Create from configuration
    pub fn from_config(config: TogetherConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AgentError::Config(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            config: TogetherConfig {
                base_url: config.base_url.trim_end_matches('/').to_string(),
                ..config
            },
        })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_config(TogetherConfig::from_env()?)
    }

    /// Model configured for this provider
    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.config.base_url)
    }

    fn build_request<'a>(messages: &'a [Message], options: &'a GenerationOptions) -> ChatRequest<'a> {
        ChatRequest {
            model: &options.model,
            messages: messages
                .iter()
                .map(|m| ChatMessage {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
            max_tokens: options.max_tokens,
            temperature: options.temperature,
        }
    }

    fn status_error(status: StatusCode, body: &str) -> AgentError {
        let body: String = body.chars().take(400).collect();
        let detail = format!("API error {}: {}", status.as_u16(), body);
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AgentError::Auth(detail),
            StatusCode::TOO_MANY_REQUESTS => AgentError::RateLimited(detail),
            _ => AgentError::Provider(detail),
        }
    }

    /// Convert the wire response to an agent completion
    fn convert_completion(response: ChatResponse, requested_model: &str) -> Result<Completion> {
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or(AgentError::EmptyResponse)?;
        let content = choice.message.content.ok_or(AgentError::EmptyResponse)?;

        Ok(Completion {
            content,
            model: response.model.unwrap_or_else(|| requested_model.to_string()),
            usage: response.usage.map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            }),
            finish_reason: choice.finish_reason,
        })
    }
}

#[async_trait]
impl LlmProvider for TogetherProvider {
    fn name(&self) -> &str {
        "Together"
    }

    async fn health_check(&self) -> Result<bool> {
        match self
            .client
            .get(self.endpoint("models"))
            .bearer_auth(&self.config.api_key)
            .send()
            .await
        {
            Ok(resp) => Ok(resp.status().is_success()),
            Err(e) => {
                tracing::warn!("Together health check failed: {}", e);
                Ok(false)
            }
        }
    }

    async fn complete(
        &self,
        messages: &[Message],
        options: &GenerationOptions,
    ) -> Result<Completion> {
        let request = Self::build_request(messages, options);

        tracing::debug!(
            model = %options.model,
            messages = messages.len(),
            max_tokens = options.max_tokens,
            "Sending chat completion"
        );

        let response = self
            .client
            .post(self.endpoint("chat/completions"))
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AgentError::ProviderUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<failed to read body>".to_string());
            return Err(Self::status_error(status, &body));
        }

        let parsed = response
            .json::<ChatResponse>()
            .await
            .map_err(|e| AgentError::Parse(e.to_string()))?;

        let completion = Self::convert_completion(parsed, &options.model)?;
        if let Some(usage) = &completion.usage {
            tracing::debug!(total_tokens = usage.total_tokens, "Chat completion received");
        }
        Ok(completion)
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
    #[serde(default)]
    finish_reason: Option<FinishReason>,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}
