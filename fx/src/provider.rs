//! Rate provider endpoints and response shapes.
//!
//! A provider knows where to ask for a source currency's rate table (a
//! primary and a fallback URL) and how to read the table out of the
//! response body. Transport lives in [`crate::source`].

use std::str::FromStr;

use cambio_common::Currency;
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{FxError, FxResult};

/// Target currency → rate, scoped to one source currency.
pub type RateTable = Vec<(Currency, Decimal)>;

/// Describes one exchange-rate API.
pub trait RateProvider: Send + Sync {
    /// Get the provider name.
    fn name(&self) -> &str;

    /// URL of the primary endpoint for `from`'s rate table.
    fn primary_url(&self, from: &Currency) -> String;

    /// URL tried once when the primary endpoint fails.
    fn fallback_url(&self, from: &Currency) -> String;

    /// Where users can look up the currency codes this provider accepts.
    fn reference_url(&self) -> &str;

    /// Extract the rate table for `from` from a successful response body.
    fn parse_rates(&self, body: &str, from: &Currency) -> FxResult<RateTable>;
}

/// The free, key-less currency API published on jsDelivr.
///
/// Response: `{"date": "2024-03-01", "usd": {"eur": 0.92, "inr": 83.1}}`.
#[derive(Debug, Clone)]
pub struct CurrencyApi {
    primary_base: String,
    fallback_base: String,
}

impl CurrencyApi {
    pub const PRIMARY_BASE_URL: &'static str =
        "https://cdn.jsdelivr.net/npm/@fawazahmed0/currency-api@latest/v1";
    pub const FALLBACK_BASE_URL: &'static str = "https://latest.currency-api.pages.dev/v1";
    pub const REFERENCE_URL: &'static str =
        "https://cdn.jsdelivr.net/npm/@fawazahmed0/currency-api@latest/v1/currencies.json";

    pub fn new() -> Self {
        Self::with_base_urls(Self::PRIMARY_BASE_URL, Self::FALLBACK_BASE_URL)
    }

    /// Point the provider at other hosts (mirrors, test servers).
    pub fn with_base_urls(primary: impl Into<String>, fallback: impl Into<String>) -> Self {
        Self {
            primary_base: primary.into(),
            fallback_base: fallback.into(),
        }
    }
}

impl Default for CurrencyApi {
    fn default() -> Self {
        Self::new()
    }
}

impl RateProvider for CurrencyApi {
    fn name(&self) -> &str {
        "currency-api"
    }

    fn primary_url(&self, from: &Currency) -> String {
        format!("{}/currencies/{}.json", self.primary_base, from.code())
    }

    fn fallback_url(&self, from: &Currency) -> String {
        format!("{}/currencies/{}.json", self.fallback_base, from.code())
    }

    fn reference_url(&self) -> &str {
        Self::REFERENCE_URL
    }

    fn parse_rates(&self, body: &str, from: &Currency) -> FxResult<RateTable> {
        let root = parse_object(self.name(), body)?;
        let table = root
            .get(from.code())
            .and_then(Value::as_object)
            .ok_or_else(|| FxError::ProviderError {
                provider: self.name().to_string(),
                reason: format!("no rate table for {}", from),
            })?;

        Ok(collect_rates(self.name(), table))
    }
}

/// ExchangeRate-API. The v6 endpoint needs a key; the open endpoint is
/// used as the fallback.
///
/// Response: `{"result": "success", "conversion_rates": {"EUR": 0.92}}`
/// (the open endpoint names the table `rates`).
#[derive(Debug, Clone)]
pub struct ExchangeRateApi {
    api_key: String,
    primary_base: String,
    fallback_base: String,
}

impl ExchangeRateApi {
    pub const PRIMARY_BASE_URL: &'static str = "https://v6.exchangerate-api.com/v6";
    pub const FALLBACK_BASE_URL: &'static str = "https://open.er-api.com/v6";
    pub const REFERENCE_URL: &'static str =
        "https://www.exchangerate-api.com/docs/supported-currencies";

    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_urls(api_key, Self::PRIMARY_BASE_URL, Self::FALLBACK_BASE_URL)
    }

    pub fn with_base_urls(
        api_key: impl Into<String>,
        primary: impl Into<String>,
        fallback: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            primary_base: primary.into(),
            fallback_base: fallback.into(),
        }
    }
}

impl RateProvider for ExchangeRateApi {
    fn name(&self) -> &str {
        "exchangerate-api"
    }

    fn primary_url(&self, from: &Currency) -> String {
        format!("{}/{}/latest/{}", self.primary_base, self.api_key, from.upper())
    }

    fn fallback_url(&self, from: &Currency) -> String {
        format!("{}/latest/{}", self.fallback_base, from.upper())
    }

    fn reference_url(&self) -> &str {
        Self::REFERENCE_URL
    }

    fn parse_rates(&self, body: &str, from: &Currency) -> FxResult<RateTable> {
        let root = parse_object(self.name(), body)?;

        if root.get("result").and_then(Value::as_str) == Some("error") {
            let kind = root
                .get("error-type")
                .and_then(Value::as_str)
                .unwrap_or("unknown");
            if kind == "unsupported-code" {
                return Err(FxError::InvalidCurrency(from.clone()));
            }
            return Err(FxError::ProviderError {
                provider: self.name().to_string(),
                reason: kind.to_string(),
            });
        }

        let table = root
            .get("conversion_rates")
            .or_else(|| root.get("rates"))
            .and_then(Value::as_object)
            .ok_or_else(|| FxError::ProviderError {
                provider: self.name().to_string(),
                reason: "missing conversion_rates".to_string(),
            })?;

        Ok(collect_rates(self.name(), table))
    }
}

fn parse_object(provider: &str, body: &str) -> FxResult<Map<String, Value>> {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(FxError::ProviderError {
            provider: provider.to_string(),
            reason: "expected a JSON object".to_string(),
        }),
        Err(e) => Err(FxError::ProviderError {
            provider: provider.to_string(),
            reason: e.to_string(),
        }),
    }
}

fn collect_rates(provider: &str, table: &Map<String, Value>) -> RateTable {
    table
        .iter()
        .filter_map(|(code, value)| match decimal_from_json(value) {
            Some(rate) => Some((Currency::new(code), rate)),
            None => {
                debug!(provider, code = %code, "Skipping non-numeric rate");
                None
            }
        })
        .collect()
}

/// Read a JSON number as a decimal, keeping the digits the provider sent.
fn decimal_from_json(value: &Value) -> Option<Decimal> {
    let Value::Number(number) = value else {
        return None;
    };
    let text = number.to_string();
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}
