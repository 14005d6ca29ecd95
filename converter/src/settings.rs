//! Converter configuration.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use cambio_common::{cache_ttl_from_hours, Currency, NumberFormat};
use cambio_fx::{CurrencyApi, ExchangeRateApi, HttpSourceConfig, RateProvider};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::SettingsError;

/// Which side the local currency takes when a query leaves tokens open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConversionDirection {
    /// Convert the local currency into the favourites first.
    #[default]
    LocalToOther,
    /// Convert the favourites into the local currency first.
    OtherToLocal,
}

/// Result title layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputStyle {
    /// `"<to> <TO>"`
    Compact,
    /// `"<amount> <FROM> = <to> <TO>"`
    #[default]
    Expanded,
}

/// Decimal and group separators for input and output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SeparatorStyle {
    /// `1,234.56`
    #[default]
    Dot,
    /// `1.234,56`
    Comma,
}

impl SeparatorStyle {
    pub fn number_format(self) -> NumberFormat {
        match self {
            SeparatorStyle::Dot => NumberFormat::dot_decimal(),
            SeparatorStyle::Comma => NumberFormat::comma_decimal(),
        }
    }
}

/// Exchange-rate API to query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProviderKind {
    #[default]
    #[serde(rename = "currency-api")]
    CurrencyApi,
    #[serde(rename = "exchangerate-api")]
    ExchangeRateApi,
}

impl ProviderKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderKind::CurrencyApi => "currency-api",
            ProviderKind::ExchangeRateApi => "exchangerate-api",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn invalid(field: &'static str, value: &str) -> SettingsError {
    SettingsError::InvalidValue {
        field,
        reason: format!("unrecognized value '{}'", value),
    }
}

impl FromStr for ConversionDirection {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "local-to-other" => Ok(Self::LocalToOther),
            "other-to-local" => Ok(Self::OtherToLocal),
            _ => Err(invalid("direction", s)),
        }
    }
}

impl FromStr for OutputStyle {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "expanded" => Ok(Self::Expanded),
            _ => Err(invalid("output_style", s)),
        }
    }
}

impl FromStr for SeparatorStyle {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "dot" => Ok(Self::Dot),
            "comma" => Ok(Self::Comma),
            _ => Err(invalid("separator", s)),
        }
    }
}

impl FromStr for ProviderKind {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "currency-api" => Ok(Self::CurrencyApi),
            "exchangerate-api" => Ok(Self::ExchangeRateApi),
            _ => Err(invalid("provider", s)),
        }
    }
}

/// Main converter configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterSettings {
    /// Currency used when a query leaves a side open.
    pub local_currency: Currency,
    /// Favourite currencies, in display order.
    pub currencies: Vec<Currency>,
    /// Fan-out ordering preference.
    pub direction: ConversionDirection,
    /// Result title layout.
    pub output_style: OutputStyle,
    /// Separators for parsing and display.
    pub separator: SeparatorStyle,
    /// How long fetched rates stay fresh, in hours.
    pub cache_ttl_hours: f64,
    /// Rate API.
    pub provider: ProviderKind,
    /// Key for providers that need one.
    pub api_key: Option<String>,
    /// Per-request HTTP timeout, in seconds.
    pub http_timeout_secs: u64,
}

impl Default for ConverterSettings {
    fn default() -> Self {
        Self {
            local_currency: Currency::new("usd"),
            currencies: vec![Currency::new("eur"), Currency::new("gbp")],
            direction: ConversionDirection::default(),
            output_style: OutputStyle::default(),
            separator: SeparatorStyle::default(),
            cache_ttl_hours: 1.0,
            provider: ProviderKind::default(),
            api_key: None,
            http_timeout_secs: 10,
        }
    }
}

impl ConverterSettings {
    /// Load configuration from `CAMBIO_*` environment variables.
    ///
    /// Unparseable values are logged and left at their defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(local) = lookup("CAMBIO_LOCAL_CURRENCY") {
            config.local_currency = Currency::new(local);
        }

        if let Some(list) = lookup("CAMBIO_CURRENCIES") {
            config.currencies = parse_currency_list(&list);
        }

        if let Some(value) = lookup("CAMBIO_DIRECTION") {
            parse_into(&value, &mut config.direction);
        }

        if let Some(value) = lookup("CAMBIO_OUTPUT_STYLE") {
            parse_into(&value, &mut config.output_style);
        }

        if let Some(value) = lookup("CAMBIO_SEPARATOR") {
            parse_into(&value, &mut config.separator);
        }

        if let Some(hours) = lookup("CAMBIO_CACHE_TTL_HOURS") {
            match hours.trim().parse() {
                Ok(hours) => config.cache_ttl_hours = hours,
                Err(_) => warn!(value = %hours, "Ignoring invalid CAMBIO_CACHE_TTL_HOURS"),
            }
        }

        if let Some(value) = lookup("CAMBIO_PROVIDER") {
            parse_into(&value, &mut config.provider);
        }

        if let Some(key) = lookup("CAMBIO_API_KEY") {
            let key = key.trim();
            if !key.is_empty() {
                config.api_key = Some(key.to_string());
            }
        }

        if let Some(secs) = lookup("CAMBIO_HTTP_TIMEOUT_SECS") {
            match secs.trim().parse() {
                Ok(secs) => config.http_timeout_secs = secs,
                Err(_) => warn!(value = %secs, "Ignoring invalid CAMBIO_HTTP_TIMEOUT_SECS"),
            }
        }

        config
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.provider == ProviderKind::ExchangeRateApi
            && self.api_key.as_deref().map_or(true, |k| k.trim().is_empty())
        {
            return Err(SettingsError::MissingApiKey);
        }

        if self.local_currency.is_empty() {
            return Err(SettingsError::MissingLocalCurrency);
        }

        Ok(())
    }

    /// Separators for parsing and display.
    pub fn number_format(&self) -> NumberFormat {
        self.separator.number_format()
    }

    /// Rate freshness window, clamped to the supported range.
    pub fn cache_ttl(&self) -> chrono::Duration {
        cache_ttl_from_hours(self.cache_ttl_hours)
    }

    /// HTTP client settings for the rate source.
    pub fn http_config(&self) -> HttpSourceConfig {
        HttpSourceConfig {
            timeout: Duration::from_secs(self.http_timeout_secs.max(1)),
            ..Default::default()
        }
    }

    /// The configured rate API.
    pub fn rate_provider(&self) -> Arc<dyn RateProvider> {
        match self.provider {
            ProviderKind::CurrencyApi => Arc::new(CurrencyApi::new()),
            ProviderKind::ExchangeRateApi => Arc::new(ExchangeRateApi::new(
                self.api_key.clone().unwrap_or_default(),
            )),
        }
    }
}

/// Split a comma-separated currency list, dropping blanks.
pub fn parse_currency_list(list: &str) -> Vec<Currency> {
    list.split(',')
        .map(Currency::new)
        .filter(|c| !c.is_empty())
        .collect()
}

fn parse_into<T>(value: &str, slot: &mut T)
where
    T: FromStr<Err = SettingsError>,
{
    match value.parse() {
        Ok(parsed) => *slot = parsed,
        Err(e) => warn!(error = %e, "Ignoring invalid setting"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_vars(vars: &[(&str, &str)]) -> ConverterSettings {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ConverterSettings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_default_config() {
        let config = ConverterSettings::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.output_style, OutputStyle::Expanded);
        assert_eq!(config.cache_ttl(), chrono::Duration::hours(1));
    }

    #[test]
    fn test_from_env_overrides() {
        let config = from_vars(&[
            ("CAMBIO_LOCAL_CURRENCY", "INR"),
            ("CAMBIO_CURRENCIES", "usd, EUR,, jpy"),
            ("CAMBIO_DIRECTION", "other-to-local"),
            ("CAMBIO_OUTPUT_STYLE", "compact"),
            ("CAMBIO_SEPARATOR", "comma"),
            ("CAMBIO_CACHE_TTL_HOURS", "6"),
            ("CAMBIO_PROVIDER", "exchangerate-api"),
            ("CAMBIO_API_KEY", "secret"),
        ]);

        assert_eq!(config.local_currency.code(), "inr");
        assert_eq!(
            config.currencies,
            vec![Currency::new("usd"), Currency::new("eur"), Currency::new("jpy")]
        );
        assert_eq!(config.direction, ConversionDirection::OtherToLocal);
        assert_eq!(config.output_style, OutputStyle::Compact);
        assert_eq!(config.number_format(), NumberFormat::comma_decimal());
        assert_eq!(config.cache_ttl(), chrono::Duration::hours(6));
        assert_eq!(config.provider, ProviderKind::ExchangeRateApi);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_env_values_keep_defaults() {
        let config = from_vars(&[
            ("CAMBIO_DIRECTION", "sideways"),
            ("CAMBIO_CACHE_TTL_HOURS", "soon"),
            ("CAMBIO_API_KEY", "   "),
        ]);

        assert_eq!(config, ConverterSettings::default());
    }

    #[test]
    fn test_exchangerate_api_requires_key() {
        let mut config = ConverterSettings {
            provider: ProviderKind::ExchangeRateApi,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(SettingsError::MissingApiKey)));

        config.api_key = Some(" ".to_string());
        assert!(matches!(config.validate(), Err(SettingsError::MissingApiKey)));

        config.api_key = Some("key".to_string());
        assert!(config.validate().is_ok());
        assert_eq!(config.rate_provider().name(), "exchangerate-api");
    }

    #[test]
    fn test_empty_local_currency_is_invalid() {
        let config = ConverterSettings {
            local_currency: Currency::new(" "),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(SettingsError::MissingLocalCurrency)
        ));
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_value(ConverterSettings::default()).unwrap();
        assert_eq!(json["local_currency"], "usd");
        assert_eq!(json["direction"], "local-to-other");
        assert_eq!(json["provider"], "currency-api");

        let parsed: ConverterSettings =
            serde_json::from_str(r#"{"provider": "exchangerate-api", "api_key": "k"}"#).unwrap();
        assert_eq!(parsed.provider, ProviderKind::ExchangeRateApi);
        assert_eq!(parsed.currencies, ConverterSettings::default().currencies);
    }
}
