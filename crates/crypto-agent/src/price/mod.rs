//! Price Data
//!
//! Upstream price sources and the cache/throttle in front of them.

mod cache;
mod coingecko;

pub use cache::PriceCache;
pub use coingecko::CoinGeckoClient;

use std::collections::HashMap;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Prices keyed by asset id, then by currency code:
/// `{"bitcoin": {"usd": 65000.5}}`
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PriceTable(HashMap<String, HashMap<String, Decimal>>);

impl PriceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set one price
    #[must_use]
    pub fn with(mut self, asset: &str, currency: &str, amount: Decimal) -> Self {
        self.0
            .entry(asset.to_string())
            .or_default()
            .insert(currency.to_string(), amount);
        self
    }

    /// Price of `asset` in `currency`, if present
    pub fn amount(&self, asset: &str, currency: &str) -> Option<Decimal> {
        self.0.get(asset)?.get(currency).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Upstream price API (Strategy pattern)
///
/// Implement this for each price provider: CoinGecko, an exchange, a stub.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Current USD price table for a lower-case asset id
    async fn fetch(&self, asset_id: &str) -> Result<PriceTable>;

    /// Source name
    fn name(&self) -> &str;
}
