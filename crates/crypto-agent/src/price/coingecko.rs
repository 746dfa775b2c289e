//! CoinGecko Price Client
//!
//! `GET /simple/price?ids=<asset>&vs_currencies=usd`, no API key required.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use super::{PriceSource, PriceTable};
use crate::error::{CryptoError, Result};

pub const DEFAULT_BASE_URL: &str = "https://api.coingecko.com/api/v3";

/// Upper bound on one upstream request, connect included
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Quote currency requested from the upstream API
const VS_CURRENCY: &str = "usd";

/// CoinGecko-backed price source
pub struct CoinGeckoClient {
    client: Client,
    base_url: String,
}

impl CoinGeckoClient {
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Point at another API root (a proxy, or a mock server in tests)
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CryptoError::Config(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl PriceSource for CoinGeckoClient {
    async fn fetch(&self, asset_id: &str) -> Result<PriceTable> {
        let asset_id = asset_id.to_lowercase();
        let url = format!("{}/simple/price", self.base_url);

        tracing::debug!(asset = %asset_id, "Requesting CoinGecko price");

        let response = self
            .client
            .get(url)
            .query(&[("ids", asset_id.as_str()), ("vs_currencies", VS_CURRENCY)])
            .header("accept", "application/json")
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| CryptoError::PriceFetch(e.to_string()))?;

        response
            .json::<PriceTable>()
            .await
            .map_err(|e| CryptoError::PriceFetch(e.to_string()))
    }

    fn name(&self) -> &str {
        "CoinGecko"
    }
}
