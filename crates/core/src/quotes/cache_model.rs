use chrono::{DateTime, Duration, Utc};
use kabufolio_market_data::{normalize_symbol, FetchError, Market};
use serde::{Deserialize, Serialize};

/// How a cached value was obtained for the current read.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Freshness {
    /// Fetched from the provider by this call
    Live,
    /// Served from cache within its TTL
    Cached,
    /// The fetch failed; this is the last value that was ever fetched
    Stale,
}

/// A value read through the cache, tagged with where it came from.
#[derive(Clone, Debug, PartialEq)]
pub struct CachedValue<T> {
    pub value: T,
    pub fetched_at: DateTime<Utc>,
    pub freshness: Freshness,
    /// The fetch error that forced a stale read
    pub error: Option<FetchError>,
}

impl<T> CachedValue<T> {
    pub fn is_stale(&self) -> bool {
        self.freshness == Freshness::Stale
    }
}

/// Cache key: provider-normalized symbol plus its market.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PriceKey {
    pub symbol: String,
    pub market: Market,
}

impl PriceKey {
    pub fn new(symbol: &str, market: Market) -> Self {
        Self {
            symbol: normalize_symbol(symbol, market),
            market,
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct CacheEntry<T> {
    pub value: T,
    pub fetched_at: DateTime<Utc>,
}

impl<T: Clone> CacheEntry<T> {
    pub fn new(value: T, fetched_at: DateTime<Utc>) -> Self {
        Self { value, fetched_at }
    }

    /// An entry is fresh while less than `ttl` has elapsed since it was stored.
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.fetched_at < ttl
    }

    pub fn read(&self, freshness: Freshness) -> CachedValue<T> {
        CachedValue {
            value: self.value.clone(),
            fetched_at: self.fetched_at,
            freshness,
            error: None,
        }
    }

    pub fn read_stale(&self, error: FetchError) -> CachedValue<T> {
        CachedValue {
            error: Some(error),
            ..self.read(Freshness::Stale)
        }
    }
}
