//! Language Detection
//!
//! Asks the model which language a text is written in and memoizes the
//! answer per distinct input in a bounded, insertion-ordered table.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use crate::message::Message;
use crate::provider::{GenerationOptions, LlmProvider};

/// Code returned whenever detection fails
pub const FALLBACK_LANGUAGE: &str = "en";

/// Distinct inputs remembered before the oldest is evicted
pub const DEFAULT_MEMO_CAPACITY: usize = 128;

const DETECTION_PROMPT: &str =
    "You are a language detection tool. Respond with only the ISO language code.";

/// Bounded memoization table with first-in, first-out eviction
#[derive(Clone, Debug)]
pub struct MemoTable {
    entries: HashMap<String, String>,
    order: VecDeque<String>,
    capacity: usize,
}

impl MemoTable {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Insert a value, evicting the earliest inserted key when full
    pub fn insert(&mut self, key: String, value: String) {
        if self.capacity == 0 {
            return;
        }
        if let Some(existing) = self.entries.get_mut(&key) {
            *existing = value;
            return;
        }
        while self.order.len() >= self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            }
        }
        self.order.push_back(key.clone());
        self.entries.insert(key, value);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Model-backed language detector, owned by a single agent
pub struct LanguageDetector {
    provider: Arc<dyn LlmProvider>,
    options: GenerationOptions,
    memo: MemoTable,
}

impl LanguageDetector {
    pub fn new(provider: Arc<dyn LlmProvider>, options: GenerationOptions) -> Self {
        Self::with_capacity(provider, options, DEFAULT_MEMO_CAPACITY)
    }

    pub fn with_capacity(
        provider: Arc<dyn LlmProvider>,
        options: GenerationOptions,
        capacity: usize,
    ) -> Self {
        Self {
            provider,
            options,
            memo: MemoTable::new(capacity),
        }
    }

    /// ISO code of the language `text` is written in.
    ///
    /// Never fails: any provider error or blank answer yields
    /// [`FALLBACK_LANGUAGE`], which is memoized like a real answer.
    pub async fn detect(&mut self, text: &str) -> String {
        if let Some(code) = self.memo.get(text) {
            tracing::debug!(language = code, "Language memo hit");
            return code.to_owned();
        }

        let messages = [
            Message::system(DETECTION_PROMPT),
            Message::user(format!("What language is this text in: {text}")),
        ];

        let code = match self.provider.complete(&messages, &self.options).await {
            Ok(completion) => {
                let answer = completion.content.trim();
                if answer.is_empty() {
                    tracing::warn!("Language detection returned blank answer");
                    FALLBACK_LANGUAGE.to_owned()
                } else {
                    answer.to_owned()
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Language detection failed, assuming English");
                FALLBACK_LANGUAGE.to_owned()
            }
        };

        self.memo.insert(text.to_owned(), code.clone());
        code
    }

    /// Number of memoized inputs
    pub fn memoized(&self) -> usize {
        self.memo.len()
    }
}
