use std::future::Future;
use std::sync::{Arc, RwLock};
use std::time::Duration as StdDuration;

use chrono::Duration;
use dashmap::DashMap;
use kabufolio_market_data::{FetchError, Market, Price, QuoteProvider, Rate, StockCandidate};
use log::{debug, warn};

use super::cache_model::{CacheEntry, CachedValue, Freshness, PriceKey};
use crate::settings::ValuationSettings;
use crate::utils::time_utils::{to_chrono, Clock};

/// In-memory, TTL-bounded cache for prices and the USD/JPY rate.
///
/// Freshness is checked lazily on read; there is no background eviction.
/// Concurrent misses for the same key may each hit the provider; the last
/// writer wins.
pub struct PriceCache {
    provider: Arc<dyn QuoteProvider>,
    clock: Arc<dyn Clock>,
    price_ttl: Duration,
    fx_ttl: Duration,
    fetch_timeout: StdDuration,
    prices: DashMap<PriceKey, CacheEntry<Price>>,
    rate: RwLock<Option<CacheEntry<Rate>>>,
}

impl PriceCache {
    pub fn new(
        provider: Arc<dyn QuoteProvider>,
        settings: &ValuationSettings,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            provider,
            clock,
            price_ttl: to_chrono(settings.price_ttl()),
            fx_ttl: to_chrono(settings.fx_ttl()),
            fetch_timeout: settings.fetch_timeout(),
            prices: DashMap::new(),
            rate: RwLock::new(None),
        }
    }

    pub fn provider_id(&self) -> &'static str {
        self.provider.id()
    }

    /// Returns the price for `symbol` on `market`.
    ///
    /// A fresh entry is returned without touching the provider. Otherwise the
    /// provider is called; on failure the previous entry is served as stale,
    /// and the error is propagated only when nothing was ever cached.
    pub async fn get_price(
        &self,
        symbol: &str,
        market: Market,
    ) -> Result<CachedValue<Price>, FetchError> {
        let key = PriceKey::new(symbol, market);
        if key.symbol.is_empty() {
            return Err(FetchError::InvalidRequest(
                "symbol must not be empty".to_string(),
            ));
        }

        let previous = self.prices.get(&key).map(|entry| entry.value().clone());
        if let Some(entry) = &previous {
            if entry.is_fresh(self.clock.now(), self.price_ttl) {
                return Ok(entry.read(Freshness::Cached));
            }
        }

        let fetched = self
            .with_timeout(self.provider.get_price(&key.symbol, market))
            .await;

        match fetched {
            Ok(price) => {
                let entry = CacheEntry::new(price, self.clock.now());
                let value = entry.read(Freshness::Live);
                self.prices.insert(key, entry);
                Ok(value)
            }
            Err(err) => match previous {
                Some(entry) => {
                    warn!(
                        "Price fetch for {} failed, serving value from {}: {}",
                        key.symbol, entry.fetched_at, err
                    );
                    Ok(entry.read_stale(err))
                }
                None => {
                    if err.is_transient() {
                        debug!("Price fetch for {} failed, nothing cached: {}", key.symbol, err);
                    } else {
                        warn!("Price fetch for {} rejected: {}", key.symbol, err);
                    }
                    Err(err)
                }
            },
        }
    }

    /// Returns the USD/JPY rate with the same fresh / live / stale policy as
    /// prices.
    pub async fn get_exchange_rate(&self) -> Result<CachedValue<Rate>, FetchError> {
        let previous = self.cached_rate();
        if let Some(entry) = &previous {
            if entry.is_fresh(self.clock.now(), self.fx_ttl) {
                return Ok(entry.read(Freshness::Cached));
            }
        }

        match self.with_timeout(self.provider.get_exchange_rate()).await {
            Ok(rate) => {
                let entry = CacheEntry::new(rate, self.clock.now());
                let value = entry.read(Freshness::Live);
                self.store_rate(Some(entry));
                Ok(value)
            }
            Err(err) => match previous {
                Some(entry) => {
                    warn!(
                        "Exchange rate fetch failed, serving value from {}: {}",
                        entry.fetched_at, err
                    );
                    Ok(entry.read_stale(err))
                }
                None => Err(err),
            },
        }
    }

    /// Symbol search; results are not cached.
    pub async fn search(
        &self,
        query: &str,
        market: Market,
    ) -> Result<Vec<StockCandidate>, FetchError> {
        self.with_timeout(self.provider.search(query, market)).await
    }

    /// Drops every cached price and the cached rate.
    pub fn invalidate_all(&self) {
        self.prices.clear();
        self.store_rate(None);
        debug!("Price cache invalidated");
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    async fn with_timeout<T>(
        &self,
        call: impl Future<Output = Result<T, FetchError>>,
    ) -> Result<T, FetchError> {
        match tokio::time::timeout(self.fetch_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::unreachable(
                self.provider.id(),
                format!("no response within {}s", self.fetch_timeout.as_secs()),
            )),
        }
    }

    fn cached_rate(&self) -> Option<CacheEntry<Rate>> {
        self.rate
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn store_rate(&self, entry: Option<CacheEntry<Rate>>) {
        *self
            .rate
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = entry;
    }
}
