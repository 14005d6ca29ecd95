//! Cambio FX Engine
//!
//! Exchange rate lookup for the currency converter.
//!
//! # Features
//!
//! - Rate caching with a configurable TTL
//! - Bulk cache population from one provider response
//! - Primary/fallback endpoints per provider, tried in order
//! - Two providers with distinct response shapes
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use cambio_common::CurrencyPair;
//! use cambio_fx::{CurrencyApi, HttpRateSource, RateCache, RateService};
//!
//! let source = HttpRateSource::new(Arc::new(CurrencyApi::new()), Default::default())?;
//! let service = RateService::new(Arc::new(source), Arc::new(RateCache::new()));
//!
//! let rate = service.get_rate(&CurrencyPair::new("usd", "inr")).await?;
//! ```

pub mod cache;
pub mod engine;
pub mod error;
pub mod provider;
pub mod source;

pub use cache::{CachedRate, RateCache, RateCacheConfig};
pub use engine::RateService;
pub use error::{FxError, FxResult};
pub use provider::{CurrencyApi, ExchangeRateApi, RateProvider, RateTable};
pub use source::{HttpRateSource, HttpSourceConfig, RateSource};

#[cfg(any(test, feature = "test-utils"))]
pub use source::MockRateSource;
