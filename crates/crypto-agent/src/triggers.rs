//! Price Triggers
//!
//! Words that mark a message as a price question, in several languages.

/// Default trigger words, already lower-cased
pub const DEFAULT_PRICE_TRIGGERS: [&str; 6] = ["price", "valor", "precio", "worth", "cost", "価格"];

/// Normalized set of trigger substrings
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PriceTriggers {
    words: Vec<String>,
}

impl Default for PriceTriggers {
    fn default() -> Self {
        Self::new(DEFAULT_PRICE_TRIGGERS)
    }
}

impl PriceTriggers {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut words: Vec<String> = words
            .into_iter()
            .map(|w| w.as_ref().trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();
        words.sort();
        words.dedup();
        Self { words }
    }

    /// Whether `text` contains any trigger, ignoring case
    pub fn matches(&self, text: &str) -> bool {
        let text = text.to_lowercase();
        self.words.iter().any(|w| text.contains(w.as_str()))
    }

    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.words.iter().map(String::as_str)
    }
}
