//! Rate sources: where rate tables come from.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use cambio_common::Currency;
use reqwest::{Client, StatusCode};
use tracing::{debug, warn};

use crate::error::{FxError, FxResult};
use crate::provider::{RateProvider, RateTable};

/// Trait for anything that can produce a source currency's rate table.
#[async_trait]
pub trait RateSource: Send + Sync {
    /// Get the source name.
    fn name(&self) -> &str;

    /// Where users can look up valid currency codes.
    fn reference_url(&self) -> &str;

    /// Fetch every known rate from `from`.
    async fn fetch_rates(&self, from: &Currency) -> FxResult<RateTable>;
}

/// HTTP client settings.
#[derive(Debug, Clone)]
pub struct HttpSourceConfig {
    /// Per-request timeout.
    pub timeout: Duration,
    /// Honour `HTTP(S)_PROXY` from the environment.
    pub use_system_proxy: bool,
}

impl Default for HttpSourceConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            use_system_proxy: true,
        }
    }
}

/// Outcome of one failed HTTP attempt.
#[derive(Debug)]
enum AttemptError {
    NotFound,
    Failed(String),
}

/// Fetches rate tables over HTTP: primary endpoint first, then exactly one
/// fallback request when the primary fails for any reason but 404.
pub struct HttpRateSource {
    client: Client,
    provider: Arc<dyn RateProvider>,
}

impl HttpRateSource {
    /// Create a source for `provider`.
    pub fn new(provider: Arc<dyn RateProvider>, config: HttpSourceConfig) -> FxResult<Self> {
        let mut builder = Client::builder().timeout(config.timeout);
        if !config.use_system_proxy {
            builder = builder.no_proxy();
        }

        let client = builder.build().map_err(|e| FxError::ProviderError {
            provider: provider.name().to_string(),
            reason: format!("failed to build HTTP client: {}", e),
        })?;

        Ok(Self { client, provider })
    }

    async fn attempt(&self, url: &str) -> Result<String, AttemptError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AttemptError::Failed(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(AttemptError::NotFound);
        }
        if !status.is_success() {
            return Err(AttemptError::Failed(format!("HTTP {}", status)));
        }

        response
            .text()
            .await
            .map_err(|e| AttemptError::Failed(e.to_string()))
    }
}

#[async_trait]
impl RateSource for HttpRateSource {
    fn name(&self) -> &str {
        self.provider.name()
    }

    fn reference_url(&self) -> &str {
        self.provider.reference_url()
    }

    async fn fetch_rates(&self, from: &Currency) -> FxResult<RateTable> {
        let primary = self.provider.primary_url(from);
        debug!(provider = self.name(), currency = %from, "Fetching rate table");

        let body = match self.attempt(&primary).await {
            Ok(body) => body,
            Err(AttemptError::NotFound) => return Err(FxError::InvalidCurrency(from.clone())),
            Err(AttemptError::Failed(reason)) => {
                warn!(
                    provider = self.name(),
                    currency = %from,
                    error = %reason,
                    "Primary endpoint failed, trying fallback"
                );

                let fallback = self.provider.fallback_url(from);
                match self.attempt(&fallback).await {
                    Ok(body) => body,
                    Err(AttemptError::NotFound) => {
                        return Err(FxError::InvalidCurrency(from.clone()))
                    }
                    Err(AttemptError::Failed(reason)) => {
                        warn!(
                            provider = self.name(),
                            currency = %from,
                            error = %reason,
                            "Fallback endpoint failed"
                        );
                        return Err(FxError::ProviderError {
                            provider: self.name().to_string(),
                            reason,
                        });
                    }
                }
            }
        };

        self.provider.parse_rates(&body, from).map_err(|e| {
            if let FxError::ProviderError { reason, .. } = &e {
                warn!(
                    provider = self.name(),
                    currency = %from,
                    error = %reason,
                    "Unusable rate response"
                );
            }
            e
        })
    }
}

/// Mock rate source for testing.
#[cfg(any(test, feature = "test-utils"))]
pub struct MockRateSource {
    name: String,
    tables: dashmap::DashMap<Currency, MockResponse>,
    calls: dashmap::DashMap<Currency, usize>,
}

#[cfg(any(test, feature = "test-utils"))]
#[derive(Clone)]
enum MockResponse {
    Rates {
        table: RateTable,
        delay: Duration,
    },
    Fail(FxError),
}

#[cfg(any(test, feature = "test-utils"))]
impl MockRateSource {
    /// Create a new mock source.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tables: dashmap::DashMap::new(),
            calls: dashmap::DashMap::new(),
        }
    }

    /// Serve `rates` for `from`.
    pub fn set_rates(&self, from: &str, rates: &[(&str, rust_decimal::Decimal)]) {
        self.set_rates_with_delay(from, rates, Duration::ZERO);
    }

    /// Serve `rates` for `from` after sleeping for `delay`.
    pub fn set_rates_with_delay(
        &self,
        from: &str,
        rates: &[(&str, rust_decimal::Decimal)],
        delay: Duration,
    ) {
        let table = rates
            .iter()
            .map(|(code, rate)| (Currency::new(code), *rate))
            .collect();
        self.tables
            .insert(Currency::new(from), MockResponse::Rates { table, delay });
    }

    /// Fail every fetch for `from` with `error`.
    pub fn set_error(&self, from: &str, error: FxError) {
        self.tables.insert(Currency::new(from), MockResponse::Fail(error));
    }

    /// Number of fetches made for `from`.
    pub fn calls(&self, from: &str) -> usize {
        self.calls
            .get(&Currency::new(from))
            .map(|c| *c)
            .unwrap_or(0)
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl RateSource for MockRateSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn reference_url(&self) -> &str {
        "https://example.com/currencies"
    }

    async fn fetch_rates(&self, from: &Currency) -> FxResult<RateTable> {
        *self.calls.entry(from.clone()).or_insert(0) += 1;

        let response = self.tables.get(from).map(|r| r.clone());
        match response {
            Some(MockResponse::Rates { table, delay }) => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                Ok(table)
            }
            Some(MockResponse::Fail(error)) => Err(error),
            None => Err(FxError::InvalidCurrency(from.clone())),
        }
    }
}
