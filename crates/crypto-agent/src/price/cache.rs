//! Price Cache and Throttle
//!
//! Serves a symbol's price from memory while it is younger than the cache
//! duration; otherwise waits until the next upstream call is allowed and
//! calls through. Entries and the throttle instant sit behind one async
//! mutex that is held across the wait and the upstream call, so concurrent
//! callers queue instead of racing past the throttle.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

use super::{PriceSource, PriceTable};
use crate::error::Result;

/// Longest throttle interval honored; larger delays are clamped to it
pub const MAX_RATE_LIMIT_DELAY: Duration = Duration::from_secs(86_400 * 365 * 30);

struct CacheEntry {
    fetched_at: Instant,
    table: PriceTable,
}

#[derive(Default)]
struct CacheState {
    /// One entry per lower-case symbol; stale entries are replaced, not purged
    entries: HashMap<String, CacheEntry>,

    /// Earliest instant the next upstream call may start
    next_call_at: Option<Instant>,
}

/// Caching, rate-limited front for a [`PriceSource`]
pub struct PriceCache {
    source: Arc<dyn PriceSource>,
    state: Mutex<CacheState>,
}

impl PriceCache {
    pub fn new(source: Arc<dyn PriceSource>) -> Self {
        Self {
            source,
            state: Mutex::new(CacheState::default()),
        }
    }

    /// Price table for `symbol`.
    ///
    /// A cached table is returned while `now - fetched_at < cache_duration`.
    /// Otherwise the call waits out whatever remains of `rate_limit_delay`
    /// since the last successful upstream call, then fetches. Failures leave
    /// both the cache and the throttle untouched.
    pub async fn get_price(
        &self,
        symbol: &str,
        cache_duration: Duration,
        rate_limit_delay: Duration,
    ) -> Result<PriceTable> {
        let key = symbol.to_lowercase();
        let mut state = self.state.lock().await;

        if let Some(entry) = state.entries.get(&key) {
            let age = entry.fetched_at.elapsed();
            if age < cache_duration {
                tracing::debug!(symbol = %key, age_ms = age.as_millis(), "Price cache hit");
                return Ok(entry.table.clone());
            }
        }

        if let Some(next_call_at) = state.next_call_at {
            let now = Instant::now();
            if next_call_at > now {
                tracing::debug!(
                    wait_ms = (next_call_at - now).as_millis(),
                    "Throttling price request"
                );
                tokio::time::sleep_until(next_call_at).await;
            }
        }

        let called_at = Instant::now();
        tracing::debug!(symbol = %key, source = self.source.name(), "Fetching price");
        let table = self.source.fetch(&key).await?;

        state.entries.insert(
            key,
            CacheEntry {
                fetched_at: called_at,
                table: table.clone(),
            },
        );
        state.next_call_at = Some(called_at + rate_limit_delay.min(MAX_RATE_LIMIT_DELAY));

        Ok(table)
    }

    /// Drop every cached entry. The throttle keeps its schedule.
    pub async fn clear(&self) {
        self.state.lock().await.entries.clear();
    }

    /// Number of cached symbols, fresh or stale
    pub async fn len(&self) -> usize {
        self.state.lock().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CryptoError;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::sync::Mutex as StdMutex;

    const TTL: Duration = Duration::from_secs(300);
    const DELAY: Duration = Duration::from_secs(1);

    /// Records every upstream call; fails while `failing` is set
    #[derive(Default)]
    struct CountingSource {
        calls: StdMutex<Vec<(String, Instant)>>,
        failing: StdMutex<bool>,
    }

    impl CountingSource {
        fn calls(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        fn call_times(&self) -> Vec<Instant> {
            self.calls.lock().unwrap().iter().map(|(_, at)| *at).collect()
        }

        fn set_failing(&self, failing: bool) {
            *self.failing.lock().unwrap() = failing;
        }
    }

    #[async_trait]
    impl PriceSource for CountingSource {
        async fn fetch(&self, asset_id: &str) -> Result<PriceTable> {
            self.calls
                .lock()
                .unwrap()
                .push((asset_id.to_string(), Instant::now()));
            if *self.failing.lock().unwrap() {
                return Err(CryptoError::PriceFetch("connection reset".into()));
            }
            Ok(PriceTable::new().with(asset_id, "usd", dec!(65000.5)))
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    fn cache() -> (Arc<CountingSource>, PriceCache) {
        let source = Arc::new(CountingSource::default());
        let cache = PriceCache::new(source.clone());
        (source, cache)
    }

    #[tokio::test(start_paused = true)]
    async fn test_fresh_entry_served_from_cache() {
        let (source, cache) = cache();

        let first = cache.get_price("bitcoin", TTL, DELAY).await.unwrap();
        tokio::time::advance(Duration::from_secs(299)).await;
        let second = cache.get_price("bitcoin", TTL, DELAY).await.unwrap();

        assert_eq!(source.calls(), 1);
        assert_eq!(first, second);
        assert_eq!(second.amount("bitcoin", "usd"), Some(dec!(65000.5)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_entry_refetched() {
        let (source, cache) = cache();

        cache.get_price("bitcoin", TTL, DELAY).await.unwrap();
        tokio::time::advance(TTL).await;
        cache.get_price("bitcoin", TTL, DELAY).await.unwrap();

        assert_eq!(source.calls(), 2);
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_duration_never_caches() {
        let (source, cache) = cache();

        cache.get_price("bitcoin", Duration::ZERO, Duration::ZERO).await.unwrap();
        cache.get_price("bitcoin", Duration::ZERO, Duration::ZERO).await.unwrap();

        assert_eq!(source.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_back_to_back_calls_are_spaced() {
        let (source, cache) = cache();

        cache.get_price("bitcoin", TTL, DELAY).await.unwrap();
        cache.get_price("ethereum", TTL, DELAY).await.unwrap();

        let times = source.call_times();
        assert_eq!(times.len(), 2);
        assert!(times[1] - times[0] >= DELAY);
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_only_the_remaining_interval() {
        let (source, cache) = cache();

        cache.get_price("bitcoin", TTL, DELAY).await.unwrap();
        tokio::time::advance(Duration::from_millis(600)).await;

        let started = Instant::now();
        cache.get_price("ethereum", TTL, DELAY).await.unwrap();
        let waited = started.elapsed();

        assert!(waited >= Duration::from_millis(400));
        assert!(waited < DELAY);
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_wait_after_interval_passed() {
        let (_source, cache) = cache();

        cache.get_price("bitcoin", TTL, DELAY).await.unwrap();
        tokio::time::advance(Duration::from_secs(2)).await;

        let started = Instant::now();
        cache.get_price("ethereum", TTL, DELAY).await.unwrap();
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_huge_delay_is_clamped() {
        let settings = crate::Settings::from_json(r#"{"rate_limit_delay": 1e19}"#).unwrap();

        let (source, parsed) = cache();
        parsed.get_price("bitcoin", TTL, settings.rate_limit_delay).await.unwrap();
        let table = parsed.get_price("bitcoin", TTL, Duration::MAX).await.unwrap();

        let (other_source, max) = cache();
        max.get_price("bitcoin", TTL, Duration::MAX).await.unwrap();

        assert_eq!(source.calls(), 1);
        assert_eq!(other_source.calls(), 1);
        assert_eq!(table.amount("bitcoin", "usd"), Some(dec!(65000.5)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_updates_nothing() {
        let (source, cache) = cache();
        source.set_failing(true);

        let err = cache.get_price("bitcoin", TTL, DELAY).await.unwrap_err();
        assert!(matches!(err, CryptoError::PriceFetch(_)));
        assert!(cache.is_empty().await);

        // no successful call yet, so no throttle wait either
        source.set_failing(false);
        let started = Instant::now();
        cache.get_price("bitcoin", TTL, DELAY).await.unwrap();
        assert_eq!(started.elapsed(), Duration::ZERO);
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_entry_with_failed_refresh_returns_error() {
        let (source, cache) = cache();

        cache.get_price("bitcoin", TTL, DELAY).await.unwrap();
        tokio::time::advance(TTL).await;
        source.set_failing(true);

        assert!(cache.get_price("bitcoin", TTL, DELAY).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_symbols_are_case_insensitive() {
        let (source, cache) = cache();

        cache.get_price("Bitcoin", TTL, DELAY).await.unwrap();
        let table = cache.get_price("BITCOIN", TTL, DELAY).await.unwrap();

        assert_eq!(source.calls(), 1);
        assert_eq!(table.amount("bitcoin", "usd"), Some(dec!(65000.5)));
        assert_eq!(source.calls.lock().unwrap()[0].0, "bitcoin");
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_forces_refetch() {
        let (source, cache) = cache();

        cache.get_price("bitcoin", TTL, DELAY).await.unwrap();
        cache.clear().await;
        cache.get_price("bitcoin", TTL, DELAY).await.unwrap();

        assert_eq!(source.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_share_one_fetch() {
        let (source, cache) = cache();
        let cache = Arc::new(cache);

        let a = tokio::spawn({
            let cache = cache.clone();
            async move { cache.get_price("bitcoin", TTL, DELAY).await }
        });
        let b = tokio::spawn({
            let cache = cache.clone();
            async move { cache.get_price("bitcoin", TTL, DELAY).await }
        });

        a.await.unwrap().unwrap();
        b.await.unwrap().unwrap();
        assert_eq!(source.calls(), 1);
    }
}
