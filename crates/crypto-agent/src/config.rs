//! Configuration
//!
//! The JSON settings file read once at startup:
//!
//! ```json
//! { "cache_duration": 300, "rate_limit_delay": 1 }
//! ```

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{CryptoError, Result};

/// Where front ends look for the settings file by default
pub const DEFAULT_CONFIG_PATH: &str = "config/config.json";

const DEFAULT_CACHE_DURATION_SECS: f64 = 300.0;
const DEFAULT_RATE_LIMIT_DELAY_SECS: f64 = 1.0;

/// Price cache settings, immutable after load
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Settings {
    /// How long a fetched price stays fresh
    pub cache_duration: Duration,

    /// Minimum spacing between upstream price calls
    pub rate_limit_delay: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cache_duration: Duration::from_secs_f64(DEFAULT_CACHE_DURATION_SECS),
            rate_limit_delay: Duration::from_secs_f64(DEFAULT_RATE_LIMIT_DELAY_SECS),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawSettings {
    cache_duration: Option<f64>,
    rate_limit_delay: Option<f64>,
}

impl Settings {
    /// Load from a JSON file. A missing file is an error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            CryptoError::Config(format!("cannot read {}: {e}", path.display()))
        })?;

        Self::from_json(&text)
            .map_err(|e| CryptoError::Config(format!("{}: {e}", path.display())))
    }

    /// Parse settings, applying defaults for absent keys
    pub fn from_json(text: &str) -> Result<Self> {
        let raw: RawSettings = serde_json::from_str(text)
            .map_err(|e| CryptoError::Config(format!("invalid JSON: {e}")))?;

        Ok(Self {
            cache_duration: seconds(
                "cache_duration",
                raw.cache_duration.unwrap_or(DEFAULT_CACHE_DURATION_SECS),
            )?,
            rate_limit_delay: seconds(
                "rate_limit_delay",
                raw.rate_limit_delay.unwrap_or(DEFAULT_RATE_LIMIT_DELAY_SECS),
            )?,
        })
    }
}

fn seconds(key: &str, value: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(value).map_err(|_| {
        CryptoError::Config(format!(
            "{key} must be a non-negative number of seconds, got {value}"
        ))
    })
}
