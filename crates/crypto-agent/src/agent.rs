//! Conversation Agent
//!
//! Language detection, a rolling history window, one chat completion per
//! user message, and a live price line when the user asks about prices.
//! Every failure is turned into displayable text: front ends can print
//! whatever [`CryptoAgent::process_message`] returns.

use std::sync::Arc;

use agent_core::{
    GenerationOptions, LanguageDetector, LlmProvider,
    message::{Conversation, Message},
};
use rust_decimal::Decimal;

use crate::config::Settings;
use crate::error::Result;
use crate::format::format_usd;
use crate::price::PriceCache;
use crate::triggers::PriceTriggers;

/// Turns sent with each chat request (the full log is kept)
pub const DEFAULT_HISTORY_WINDOW: usize = 5;

/// Asset quoted when a message triggers a price lookup
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrackedAsset {
    /// Upstream id, lower case (e.g. "bitcoin")
    pub id: String,

    /// Ticker shown to the user (e.g. "BTC")
    pub ticker: String,
}

impl Default for TrackedAsset {
    fn default() -> Self {
        Self {
            id: "bitcoin".into(),
            ticker: "BTC".into(),
        }
    }
}

/// Agent configuration
#[derive(Clone, Debug)]
pub struct AgentConfig {
    /// Options for conversational replies
    pub chat: GenerationOptions,

    /// Options for language detection
    pub detection: GenerationOptions,

    /// Trailing turns included in each request
    pub history_window: usize,

    /// Words that make a message a price question
    pub triggers: PriceTriggers,

    /// Asset quoted on price questions
    pub asset: TrackedAsset,

    /// Price cache settings
    pub settings: Settings,
}

impl AgentConfig {
    pub fn new(model: impl Into<String>, settings: Settings) -> Self {
        let model = model.into();
        Self {
            chat: GenerationOptions::chat(model.clone()),
            detection: GenerationOptions::language_detection(model),
            history_window: DEFAULT_HISTORY_WINDOW,
            triggers: PriceTriggers::default(),
            asset: TrackedAsset::default(),
            settings,
        }
    }
}

/// What the agent produced for one user message
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AgentReply {
    /// Text to display
    pub text: String,

    /// Detected language of the user's message, if the pipeline got that far
    pub language: Option<String>,

    /// Price appended to `text`, if any
    pub quoted_price: Option<Decimal>,
}

/// The multilingual crypto assistant
pub struct CryptoAgent {
    provider: Arc<dyn LlmProvider>,
    prices: Arc<PriceCache>,
    detector: LanguageDetector,
    conversation: Conversation,
    config: AgentConfig,
}

impl CryptoAgent {
    pub fn new(provider: Arc<dyn LlmProvider>, prices: Arc<PriceCache>, config: AgentConfig) -> Self {
        let detector = LanguageDetector::new(provider.clone(), config.detection.clone());
        Self {
            provider,
            prices,
            detector,
            conversation: Conversation::new(),
            config,
        }
    }

    /// Answer one user message. Never fails; errors become the reply text.
    pub async fn process_message(&mut self, user_text: &str) -> String {
        self.respond(user_text).await.text
    }

    /// Like [`CryptoAgent::process_message`], also reporting the detected
    /// language and the quoted price.
    pub async fn respond(&mut self, user_text: &str) -> AgentReply {
        let language = self.detector.detect(user_text).await;
        self.conversation
            .push(Message::user(user_text).with_language(language.clone()));

        match self.reply_to(user_text, &language).await {
            Ok((text, quoted_price)) => {
                self.conversation.push(Message::assistant(text.clone()));
                AgentReply {
                    text,
                    language: Some(language),
                    quoted_price,
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to answer message");
                AgentReply {
                    text: format!("An error occurred: {e}"),
                    language: Some(language),
                    quoted_price: None,
                }
            }
        }
    }

    async fn reply_to(
        &self,
        user_text: &str,
        language: &str,
    ) -> Result<(String, Option<Decimal>)> {
        let request = self.build_request(language);
        let completion = self.provider.complete(&request, &self.config.chat).await?;
        let mut text = completion.content;

        if !self.config.triggers.matches(user_text) {
            return Ok((text, None));
        }

        match self.current_price().await {
            Ok(price) => {
                text.push_str(&format!(
                    "\nCurrent {} Price: ${} USD",
                    self.config.asset.ticker,
                    format_usd(price)
                ));
                Ok((text, Some(price)))
            }
            Err(e) => {
                tracing::warn!(error = %e, "Price lookup failed");
                text.push_str(&format!(
                    "\nSorry, I couldn't fetch the current price. Error: {e}"
                ));
                Ok((text, None))
            }
        }
    }

    /// System instruction followed by the trailing history window
    pub fn build_request(&self, language: &str) -> Vec<Message> {
        let window = self.conversation.window(self.config.history_window);
        let mut messages = Vec::with_capacity(window.len() + 1);
        messages.push(Message::system(system_prompt(language)));
        messages.extend(window.iter().cloned());
        messages
    }

    /// USD price of the tracked asset, through the cache.
    /// A table without the asset reads as zero.
    pub async fn current_price(&self) -> Result<Decimal> {
        let settings = &self.config.settings;
        let table = self
            .prices
            .get_price(
                &self.config.asset.id,
                settings.cache_duration,
                settings.rate_limit_delay,
            )
            .await?;
        Ok(table
            .amount(&self.config.asset.id, "usd")
            .unwrap_or(Decimal::ZERO))
    }

    /// Forget the conversation
    pub fn clear_context(&mut self) {
        self.conversation.clear();
    }

    /// Every turn since the last reset
    pub fn history(&self) -> &[Message] {
        self.conversation.messages()
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }
}

fn system_prompt(language: &str) -> String {
    format!(
        "You are a helpful cryptocurrency assistant.\n\
         The user is writing in {language}.\n\
         Always respond in English, but acknowledge their language.\n\
         You have access to real-time crypto prices.\n\
         Keep responses concise and focused on cryptocurrency information."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CryptoError;
    use crate::price::{CoinGeckoClient, PriceSource, PriceTable};
    use agent_core::{AgentError, Completion, Role};
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Answers detection with `language` and chat with `reply`,
    /// recording every chat request
    struct ScriptedProvider {
        language: &'static str,
        reply: std::result::Result<&'static str, &'static str>,
        chat_requests: Mutex<Vec<Vec<Message>>>,
        detections: AtomicUsize,
    }

    impl ScriptedProvider {
        fn replying(reply: &'static str) -> Arc<Self> {
            Arc::new(Self {
                language: "en",
                reply: Ok(reply),
                chat_requests: Mutex::new(Vec::new()),
                detections: AtomicUsize::new(0),
            })
        }

        fn failing(error: &'static str) -> Arc<Self> {
            Arc::new(Self {
                language: "en",
                reply: Err(error),
                chat_requests: Mutex::new(Vec::new()),
                detections: AtomicUsize::new(0),
            })
        }

        fn last_request(&self) -> Vec<Message> {
            self.chat_requests.lock().unwrap().last().cloned().unwrap()
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn health_check(&self) -> agent_core::Result<bool> {
            Ok(true)
        }

        async fn complete(
            &self,
            messages: &[Message],
            options: &GenerationOptions,
        ) -> agent_core::Result<Completion> {
            if options.max_tokens == agent_core::provider::DETECTION_MAX_TOKENS {
                self.detections.fetch_add(1, Ordering::SeqCst);
                return Ok(Completion::text(self.language, &options.model));
            }
            self.chat_requests.lock().unwrap().push(messages.to_vec());
            match self.reply {
                Ok(reply) => Ok(Completion::text(reply, &options.model)),
                Err(error) => Err(AgentError::Provider(error.into())),
            }
        }
    }

    /// Price source that counts calls and returns a fixed table or error
    struct StubPrices {
        table: Option<PriceTable>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl PriceSource for StubPrices {
        async fn fetch(&self, _asset_id: &str) -> Result<PriceTable> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.table
                .clone()
                .ok_or_else(|| CryptoError::PriceFetch("connection refused".into()))
        }

        fn name(&self) -> &str {
            "stub"
        }
    }

    fn stub_prices(table: Option<PriceTable>) -> Arc<StubPrices> {
        Arc::new(StubPrices {
            table,
            calls: AtomicUsize::new(0),
        })
    }

    fn agent(provider: Arc<ScriptedProvider>, prices: Arc<StubPrices>) -> CryptoAgent {
        let config = AgentConfig::new("test-model", Settings::default());
        CryptoAgent::new(provider, Arc::new(PriceCache::new(prices)), config)
    }

    fn btc(amount: Decimal) -> Option<PriceTable> {
        Some(PriceTable::new().with("bitcoin", "usd", amount))
    }

    #[tokio::test]
    async fn test_plain_question_has_no_price_line() {
        let provider = ScriptedProvider::replying("A blockchain is a ledger.");
        let prices = stub_prices(btc(dec!(1)));
        let mut agent = agent(provider, prices.clone());

        let reply = agent.process_message("blockchain").await;

        assert_eq!(reply, "A blockchain is a ledger.");
        assert_eq!(prices.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_price_keywords_trigger_lookup() {
        for question in ["what's the price?", "¿Cuál es el precio?", "what is it worth"] {
            let provider = ScriptedProvider::replying("Let me check.");
            let prices = stub_prices(btc(dec!(65000.5)));
            let mut agent = agent(provider, prices.clone());

            let reply = agent.respond(question).await;

            assert!(
                reply.text.ends_with("Current BTC Price: $65,000.50 USD"),
                "{question}: {}",
                reply.text
            );
            assert_eq!(reply.quoted_price, Some(dec!(65000.5)));
            assert_eq!(prices.calls.load(Ordering::SeqCst), 1);
        }
    }

    #[tokio::test]
    async fn test_price_failure_appends_apology() {
        let provider = ScriptedProvider::replying("Bitcoin is volatile.");
        let mut agent = agent(provider, stub_prices(None));

        let reply = agent.respond("bitcoin price?").await;

        assert!(reply.text.starts_with("Bitcoin is volatile.\n"));
        assert!(reply.text.contains("Sorry, I couldn't fetch the current price."));
        assert!(reply.text.contains("connection refused"));
        assert_eq!(reply.quoted_price, None);
        assert_eq!(agent.history().last().unwrap().content, reply.text);
    }

    #[tokio::test]
    async fn test_missing_asset_in_table_reads_as_zero() {
        let provider = ScriptedProvider::replying("ok");
        let mut agent = agent(provider, stub_prices(Some(PriceTable::new())));

        let reply = agent.process_message("price").await;
        assert!(reply.ends_with("Current BTC Price: $0.00 USD"));
    }

    #[tokio::test]
    async fn test_model_failure_becomes_text() {
        let provider = ScriptedProvider::failing("API error 500: boom");
        let mut agent = agent(provider, stub_prices(btc(dec!(1))));

        let reply = agent.process_message("hello").await;

        assert_eq!(reply, "An error occurred: Provider error: API error 500: boom");
        // the user turn stays, no assistant turn is added
        assert_eq!(agent.history().len(), 1);
        assert_eq!(agent.history()[0].role, Role::User);
    }

    #[tokio::test]
    async fn test_history_records_language_and_reply() {
        let provider = Arc::new(ScriptedProvider {
            language: "es",
            reply: Ok("Hola!"),
            chat_requests: Mutex::new(Vec::new()),
            detections: AtomicUsize::new(0),
        });
        let mut agent = agent(provider.clone(), stub_prices(None));

        agent.process_message("hola").await;

        let history = agent.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].detected_language.as_deref(), Some("es"));
        assert_eq!(history[1].role, Role::Assistant);
        assert_eq!(history[1].content, "Hola!");

        let request = provider.last_request();
        assert_eq!(request[0].role, Role::System);
        assert!(request[0].content.contains("The user is writing in es."));
        assert!(request[0].content.contains("Always respond in English"));
    }

    #[tokio::test]
    async fn test_request_window_is_last_five_turns() {
        let provider = ScriptedProvider::replying("ok");
        let mut agent = agent(provider.clone(), stub_prices(None));

        // three exchanges put six turns in the log; the fourth question is the seventh
        for i in 0..4 {
            agent.process_message(&format!("question {i}")).await;
        }

        let request = provider.last_request();
        assert_eq!(request.len(), 1 + DEFAULT_HISTORY_WINDOW);
        let turns: Vec<&str> = request[1..].iter().map(|m| m.content.as_str()).collect();
        assert_eq!(turns, ["question 1", "ok", "question 2", "ok", "question 3"]);
        assert_eq!(agent.history().len(), 8);
    }

    #[tokio::test]
    async fn test_build_request_after_seven_turns() {
        let provider = ScriptedProvider::replying("ok");
        let mut agent = agent(provider, stub_prices(None));
        for i in 0..7 {
            agent.conversation.push(Message::user(format!("turn {i}")));
        }

        let request = agent.build_request("en");
        assert_eq!(request.len(), 6);
        assert_eq!(request[1].content, "turn 2");
        assert_eq!(request[5].content, "turn 6");
    }

    #[tokio::test]
    async fn test_clear_context_empties_next_request() {
        let provider = ScriptedProvider::replying("ok");
        let mut agent = agent(provider.clone(), stub_prices(None));

        agent.process_message("first").await;
        agent.process_message("second").await;
        agent.clear_context();
        assert!(agent.history().is_empty());
        assert_eq!(agent.build_request("en").len(), 1);

        agent.process_message("third").await;
        let request = provider.last_request();
        assert_eq!(request.len(), 2);
        assert_eq!(request[1].content, "third");
    }

    #[tokio::test]
    async fn test_language_detected_once_per_text() {
        let provider = ScriptedProvider::replying("ok");
        let mut agent = agent(provider.clone(), stub_prices(None));

        agent.process_message("same").await;
        agent.process_message("same").await;
        agent.process_message("different").await;

        assert_eq!(provider.detections.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_repeat_price_questions_hit_cache() {
        let provider = ScriptedProvider::replying("ok");
        let prices = stub_prices(btc(dec!(65000.5)));
        let mut agent = agent(provider, prices.clone());

        agent.process_message("price?").await;
        agent.process_message("price again?").await;

        assert_eq!(prices.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_end_to_end_with_mock_price_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/simple/price"))
            .and(query_param("ids", "bitcoin"))
            .and(query_param("vs_currencies", "usd"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(r#"{"bitcoin":{"usd":65000.5}}"#, "application/json"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let settings =
            Settings::from_json(r#"{"cache_duration": 300, "rate_limit_delay": 1}"#).unwrap();
        let source = CoinGeckoClient::with_base_url(server.uri()).unwrap();
        let prices = Arc::new(PriceCache::new(Arc::new(source)));
        let mut agent = CryptoAgent::new(
            ScriptedProvider::replying("Bitcoin is trading actively."),
            prices,
            AgentConfig::new("test-model", settings),
        );

        let reply = agent.process_message("what's the bitcoin price?").await;
        assert!(reply.ends_with("Current BTC Price: $65,000.50 USD"), "{reply}");
    }

    #[tokio::test]
    async fn test_end_to_end_price_endpoint_down() {
        // nothing listens here, so the transport fails
        let source = CoinGeckoClient::with_base_url("http://127.0.0.1:9").unwrap();
        let prices = Arc::new(PriceCache::new(Arc::new(source)));
        let mut agent = CryptoAgent::new(
            ScriptedProvider::replying("Here is what I know."),
            prices,
            AgentConfig::new("test-model", Settings::default()),
        );

        let reply = agent.process_message("bitcoin price").await;
        assert!(reply.contains("Sorry, I couldn't fetch the current price"), "{reply}");
        assert!(reply.contains("Error fetching crypto price"), "{reply}");
    }
}
