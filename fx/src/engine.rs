//! Cached rate lookup.

use std::sync::Arc;

use cambio_common::CurrencyPair;
use rust_decimal::Decimal;
use tracing::{debug, instrument};

use crate::cache::RateCache;
use crate::error::{FxError, FxResult};
use crate::source::RateSource;

/// Answers rate queries from the cache, refilling it from a [`RateSource`]
/// on miss or staleness.
pub struct RateService {
    source: Arc<dyn RateSource>,
    cache: Arc<RateCache>,
}

impl RateService {
    /// Create a new rate service over `source`, sharing `cache`.
    pub fn new(source: Arc<dyn RateSource>, cache: Arc<RateCache>) -> Self {
        Self { source, cache }
    }

    /// The cache this service reads and fills.
    pub fn cache(&self) -> &RateCache {
        &self.cache
    }

    /// Where users can look up valid currency codes.
    pub fn reference_url(&self) -> &str {
        self.source.reference_url()
    }

    /// Get the current rate for a currency pair.
    ///
    /// A miss fetches the whole rate table for `pair.base` and caches
    /// every entry, so later lookups from the same base are served locally.
    #[instrument(skip(self), fields(pair = %pair))]
    pub async fn get_rate(&self, pair: &CurrencyPair) -> FxResult<Decimal> {
        if let Some(rate) = self.cache.get(pair) {
            return Ok(rate);
        }

        let table = self.source.fetch_rates(&pair.base).await?;

        let count = table.len();
        for (quote, rate) in table {
            self.cache
                .insert(CurrencyPair::new(pair.base.clone(), quote), rate);
        }
        debug!(source = self.source.name(), entries = count, "Cached rate table");

        self.cache
            .peek(pair)
            .map(|cached| cached.rate)
            .ok_or_else(|| FxError::InvalidCurrency(pair.quote.clone()))
    }
}
