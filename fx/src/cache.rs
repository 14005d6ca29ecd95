//! FX rate caching with TTL support.
//!
//! Entries are never evicted; a stale entry simply stops being returned by
//! [`RateCache::get`] until a refetch overwrites it. Concurrent tasks may
//! write the same pair at once; the last write wins, which is harmless
//! because both values come from the same provider response shape.

use cambio_common::{constants, CurrencyPair};
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use rust_decimal::Decimal;
use tracing::debug;

/// A rate and the moment it was fetched.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CachedRate {
    pub rate: Decimal,
    pub fetched_at: DateTime<Utc>,
}

impl CachedRate {
    /// Fresh while `now - fetched_at < ttl`.
    pub fn is_fresh(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.fetched_at) < ttl
    }
}

/// Configuration for rate cache.
#[derive(Debug, Clone)]
pub struct RateCacheConfig {
    /// How long a fetched rate is trusted.
    pub ttl: Duration,
}

impl Default for RateCacheConfig {
    fn default() -> Self {
        Self {
            ttl: constants::default_cache_ttl(),
        }
    }
}

/// Thread-safe rate cache keyed by case-insensitive currency pair.
pub struct RateCache {
    cache: DashMap<CurrencyPair, CachedRate>,
    config: RateCacheConfig,
}

impl RateCache {
    /// Create a new rate cache with default configuration.
    pub fn new() -> Self {
        Self::with_config(RateCacheConfig::default())
    }

    /// Create a new rate cache with custom configuration.
    pub fn with_config(config: RateCacheConfig) -> Self {
        Self {
            cache: DashMap::new(),
            config,
        }
    }

    /// Get a rate from cache if it is still fresh.
    pub fn get(&self, pair: &CurrencyPair) -> Option<Decimal> {
        self.get_at(pair, Utc::now())
    }

    /// Freshness-checked lookup against an explicit clock reading.
    pub fn get_at(&self, pair: &CurrencyPair, now: DateTime<Utc>) -> Option<Decimal> {
        match self.cache.get(pair) {
            Some(entry) if entry.is_fresh(self.config.ttl, now) => {
                debug!(pair = %pair, "Cache hit");
                Some(entry.rate)
            }
            Some(_) => {
                debug!(pair = %pair, "Cache entry stale");
                None
            }
            None => {
                debug!(pair = %pair, "Cache miss");
                None
            }
        }
    }

    /// Get an entry regardless of its age.
    pub fn peek(&self, pair: &CurrencyPair) -> Option<CachedRate> {
        self.cache.get(pair).map(|entry| *entry)
    }

    /// Insert a rate fetched now.
    pub fn insert(&self, pair: CurrencyPair, rate: Decimal) {
        self.insert_at(pair, rate, Utc::now());
    }

    /// Insert a rate with an explicit fetch time.
    pub fn insert_at(&self, pair: CurrencyPair, rate: Decimal, fetched_at: DateTime<Utc>) {
        self.cache.insert(pair, CachedRate { rate, fetched_at });
    }

    /// Get the number of entries in cache, fresh or not.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Check if cache is empty.
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

impl Default for RateCache {
    fn default() -> Self {
        Self::new()
    }
}
