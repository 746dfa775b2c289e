//! Price History
//!
//! Samples collected whenever a reply quotes a price, kept for 24 hours.
//! Front ends chart these.

use std::collections::VecDeque;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One observed price
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceSample {
    pub at: DateTime<Utc>,
    pub price: Decimal,
}

/// Rolling window of price samples
#[derive(Clone, Debug)]
pub struct PriceHistory {
    samples: VecDeque<PriceSample>,
    retention: Duration,
}

impl Default for PriceHistory {
    fn default() -> Self {
        Self::with_retention(Duration::hours(24))
    }
}

impl PriceHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_retention(retention: Duration) -> Self {
        Self {
            samples: VecDeque::new(),
            retention,
        }
    }

    /// Append a sample, then drop samples not newer than `at - retention`
    pub fn record(&mut self, at: DateTime<Utc>, price: Decimal) {
        self.samples.push_back(PriceSample { at, price });
        self.prune(at);
    }

    /// Drop samples not newer than `now - retention`
    pub fn prune(&mut self, now: DateTime<Utc>) {
        let cutoff = now - self.retention;
        self.samples.retain(|s| s.at > cutoff);
    }

    pub fn samples(&self) -> impl Iterator<Item = &PriceSample> {
        self.samples.iter()
    }

    pub fn latest(&self) -> Option<&PriceSample> {
        self.samples.back()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
