//! Query orchestration.

use std::collections::HashSet;
use std::sync::Arc;

use cambio_common::{CurrencyPair, NumberFormat, NUMBER_DECIMAL_DIGITS};
use cambio_fx::{HttpRateSource, RateCache, RateCacheConfig, RateService};
use cambio_query::{evaluate, resolve_currency, AliasLookup, QueryParser};
use rust_decimal::Decimal;
use tracing::{debug, error, instrument, warn};

use crate::amount::converted_amount;
use crate::error::ConverterError;
use crate::result::{ConversionResult, CURRENCY_LIST_HINT, README_URL, SETUP_HINT};
use crate::settings::{ConversionDirection, ConverterSettings, OutputStyle};

const TASK_FAILED: &str = "Something went wrong while converting";
const AMOUNT_TOO_LARGE: &str = "Amount is too large to convert";

/// One planned conversion. Tokens are as typed; aliases are resolved when
/// the task runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionTask {
    /// Position of the task's result in the output.
    pub index: usize,
    pub amount: Decimal,
    pub from: String,
    pub to: String,
}

/// Turns queries into result items.
///
/// Cloning is cheap; clones share the rate cache and alias store.
#[derive(Clone)]
pub struct Converter {
    rates: Arc<RateService>,
    aliases: Arc<dyn AliasLookup>,
    settings: Arc<ConverterSettings>,
    parser: QueryParser,
    format: NumberFormat,
}

impl Converter {
    /// Create a converter over an existing rate service.
    pub fn new(
        settings: ConverterSettings,
        aliases: Arc<dyn AliasLookup>,
        rates: Arc<RateService>,
    ) -> Result<Self, ConverterError> {
        let format = settings.number_format();
        let parser = QueryParser::new(&format)?;

        Ok(Self {
            rates,
            aliases,
            settings: Arc::new(settings),
            parser,
            format,
        })
    }

    /// Create a converter that fetches rates over HTTP from the configured
    /// provider.
    pub fn from_settings(
        settings: ConverterSettings,
        aliases: Arc<dyn AliasLookup>,
    ) -> Result<Self, ConverterError> {
        let source = HttpRateSource::new(settings.rate_provider(), settings.http_config())?;
        let cache = RateCache::with_config(RateCacheConfig {
            ttl: settings.cache_ttl(),
        });
        let rates = RateService::new(Arc::new(source), Arc::new(cache));

        Self::new(settings, aliases, Arc::new(rates))
    }

    /// Answer free text typed by the user.
    ///
    /// Text that does not look like a query yields nothing; an amount that
    /// does not evaluate yields a single invalid-expression item.
    #[instrument(skip(self))]
    pub async fn search(&self, text: &str) -> Vec<ConversionResult> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        if let Err(e) = self.settings.validate() {
            warn!(error = %e, "Converter is not configured");
            return vec![ConversionResult::warning(
                e.to_string(),
                SETUP_HINT,
                Some(README_URL),
            )];
        }

        let Some(query) = self.parser.parse(text) else {
            debug!("Text is not a query");
            return Vec::new();
        };

        let amount = match evaluate(&query.amount, &self.format) {
            Ok(amount) => amount,
            Err(e) => {
                debug!(expression = %query.amount, error = %e, "Invalid amount expression");
                return vec![ConversionResult::invalid_expression()];
            }
        };

        self.convert(amount, &query.from, &query.to).await
    }

    /// Convert `amount` between two tokens, expanding empty tokens using
    /// the local and favourite currencies.
    ///
    /// Conversions run concurrently; results come back in plan order with
    /// skipped conversions dropped and duplicates removed.
    pub async fn convert(&self, amount: Decimal, from: &str, to: &str) -> Vec<ConversionResult> {
        let tasks = self.plan(amount, from, to);
        debug!(tasks = tasks.len(), "Planned conversions");

        let handles: Vec<_> = tasks
            .into_iter()
            .map(|task| {
                let converter = self.clone();
                (task.index, tokio::spawn(async move { converter.run(task).await }))
            })
            .collect();

        let mut slots: Vec<Option<ConversionResult>> = vec![None; handles.len()];
        for (index, handle) in handles {
            slots[index] = match handle.await {
                Ok(item) => item,
                Err(e) => {
                    error!(index, error = %e, "Conversion task failed");
                    Some(ConversionResult::warning(
                        TASK_FAILED,
                        CURRENCY_LIST_HINT,
                        Some(self.rates.reference_url()),
                    ))
                }
            };
        }

        dedupe(slots.into_iter().flatten())
    }

    /// Expand a query into conversion tasks.
    pub fn plan(&self, amount: Decimal, from: &str, to: &str) -> Vec<ConversionTask> {
        let local = self.settings.local_currency.code();
        let favourites: Vec<&str> = self.settings.currencies.iter().map(|c| c.code()).collect();
        let local_first = self.settings.direction == ConversionDirection::LocalToOther;

        let from = from.trim();
        let to = to.trim();

        let mut pairs: Vec<(&str, &str)> = Vec::new();
        match (from.is_empty(), to.is_empty()) {
            (true, true) => {
                let outward = favourites.iter().map(|&c| (local, c));
                let inward = favourites.iter().map(|&c| (c, local));
                if local_first {
                    pairs.extend(outward);
                    pairs.extend(inward);
                } else {
                    pairs.extend(inward);
                    pairs.extend(outward);
                }
            }
            (false, true) => {
                if local_first {
                    pairs.push((from, local));
                }
                pairs.extend(favourites.iter().map(|&c| (from, c)));
                if !local_first {
                    pairs.push((from, local));
                }
            }
            (true, false) => {
                if local_first {
                    pairs.push((local, to));
                }
                pairs.extend(favourites.iter().map(|&c| (c, to)));
                if !local_first {
                    pairs.push((local, to));
                }
            }
            (false, false) => pairs.push((from, to)),
        }

        pairs
            .into_iter()
            .enumerate()
            .map(|(index, (from, to))| ConversionTask {
                index,
                amount,
                from: from.to_string(),
                to: to.to_string(),
            })
            .collect()
    }

    #[instrument(skip(self, task), fields(index = task.index, from = %task.from, to = %task.to))]
    async fn run(&self, task: ConversionTask) -> Option<ConversionResult> {
        let pair = CurrencyPair::new(
            resolve_currency(&*self.aliases, &task.from),
            resolve_currency(&*self.aliases, &task.to),
        );

        if !pair.is_convertible() {
            debug!(pair = %pair, "Skipping conversion");
            return None;
        }

        let item = match self.rates.get_rate(&pair).await {
            Ok(rate) => self.render(task.amount, &pair, rate),
            Err(e) => {
                warn!(pair = %pair, error = %e, "Conversion failed");
                ConversionResult::warning(
                    e.to_string(),
                    CURRENCY_LIST_HINT,
                    Some(self.rates.reference_url()),
                )
            }
        };
        Some(item)
    }

    fn render(&self, amount: Decimal, pair: &CurrencyPair, rate: Decimal) -> ConversionResult {
        let Some((converted, precision)) = converted_amount(amount, rate) else {
            return ConversionResult::warning(
                AMOUNT_TOO_LARGE,
                CURRENCY_LIST_HINT,
                Some(self.rates.reference_url()),
            );
        };

        let signed = if amount < Decimal::ZERO {
            -converted
        } else {
            converted
        };
        let to_text = self.format.format(signed, precision);

        let title = match self.settings.output_style {
            OutputStyle::Compact => format!("{} {}", to_text, pair.quote),
            OutputStyle::Expanded => format!(
                "{} {} = {} {}",
                self.format.format(amount, NUMBER_DECIMAL_DIGITS),
                pair.base,
                to_text,
                pair.quote
            ),
        };
        let subtitle = format!("Currency conversion from {} to {}", pair.base, pair.quote);

        ConversionResult::conversion(title, subtitle, to_text)
    }
}

/// Keep the first item for each (title, subtitle).
fn dedupe(items: impl IntoIterator<Item = ConversionResult>) -> Vec<ConversionResult> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert((item.title.clone(), item.subtitle.clone())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::{ResultAction, ResultKind, INVALID_EXPRESSION_TITLE};
    use crate::settings::{ProviderKind, SeparatorStyle};
    use cambio_common::Currency;
    use cambio_fx::{FxError, MockRateSource};
    use cambio_query::AliasBook;
    use rust_decimal_macros::dec;
    use std::time::Duration;

    fn settings(local: &str, favourites: &[&str]) -> ConverterSettings {
        ConverterSettings {
            local_currency: Currency::new(local),
            currencies: favourites.iter().map(Currency::new).collect(),
            ..Default::default()
        }
    }

    fn converter_with(settings: ConverterSettings) -> (Arc<MockRateSource>, Converter) {
        let source = Arc::new(MockRateSource::new("mock"));
        source.set_rates("usd", &[("inr", dec!(83.1)), ("eur", dec!(0.92))]);
        source.set_rates("inr", &[("usd", dec!(0.012)), ("eur", dec!(0.011))]);
        source.set_rates("eur", &[("usd", dec!(1.087)), ("inr", dec!(90.3))]);

        let rates = RateService::new(source.clone(), Arc::new(RateCache::new()));
        let aliases = Arc::new(AliasBook::with_defaults().unwrap());
        let converter = Converter::new(settings, aliases, Arc::new(rates)).unwrap();
        (source, converter)
    }

    fn subtitles(items: &[ConversionResult]) -> Vec<&str> {
        items.iter().map(|i| i.subtitle.as_str()).collect()
    }

    fn pairs(tasks: &[ConversionTask]) -> Vec<(&str, &str)> {
        tasks
            .iter()
            .map(|t| (t.from.as_str(), t.to.as_str()))
            .collect()
    }

    #[test]
    fn test_plan_both_open() {
        let (_, converter) = converter_with(settings("usd", &["inr", "eur"]));
        assert_eq!(
            pairs(&converter.plan(dec!(1), "", "")),
            vec![("usd", "inr"), ("usd", "eur"), ("inr", "usd"), ("eur", "usd")]
        );

        let (_, converter) = converter_with(ConverterSettings {
            direction: ConversionDirection::OtherToLocal,
            ..settings("usd", &["inr", "eur"])
        });
        assert_eq!(
            pairs(&converter.plan(dec!(1), "", "")),
            vec![("inr", "usd"), ("eur", "usd"), ("usd", "inr"), ("usd", "eur")]
        );
    }

    #[test]
    fn test_plan_one_side_open() {
        let (_, converter) = converter_with(settings("usd", &["inr", "eur"]));
        assert_eq!(
            pairs(&converter.plan(dec!(1), "gbp", "")),
            vec![("gbp", "usd"), ("gbp", "inr"), ("gbp", "eur")]
        );
        assert_eq!(
            pairs(&converter.plan(dec!(1), "", "gbp")),
            vec![("usd", "gbp"), ("inr", "gbp"), ("eur", "gbp")]
        );

        let (_, converter) = converter_with(ConverterSettings {
            direction: ConversionDirection::OtherToLocal,
            ..settings("usd", &["inr", "eur"])
        });
        assert_eq!(
            pairs(&converter.plan(dec!(1), "gbp", "")),
            vec![("gbp", "inr"), ("gbp", "eur"), ("gbp", "usd")]
        );
        assert_eq!(
            pairs(&converter.plan(dec!(1), "", "gbp")),
            vec![("inr", "gbp"), ("eur", "gbp"), ("usd", "gbp")]
        );
    }

    #[test]
    fn test_plan_both_given() {
        let (_, converter) = converter_with(settings("usd", &["inr", "eur"]));
        let tasks = converter.plan(dec!(5), "gbp", "jpy");

        assert_eq!(
            tasks,
            vec![ConversionTask {
                index: 0,
                amount: dec!(5),
                from: "gbp".to_string(),
                to: "jpy".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_fan_out_keeps_plan_order() {
        let (source, converter) = converter_with(settings("usd", &["inr", "eur"]));
        // The first task's table arrives last.
        source.set_rates_with_delay(
            "usd",
            &[("inr", dec!(83.1)), ("eur", dec!(0.92))],
            Duration::from_millis(50),
        );

        let items = converter.convert(dec!(100), "", "").await;

        assert_eq!(
            subtitles(&items),
            vec![
                "Currency conversion from USD to INR",
                "Currency conversion from USD to EUR",
                "Currency conversion from INR to USD",
                "Currency conversion from EUR to USD",
            ]
        );
    }

    #[tokio::test]
    async fn test_same_currency_is_skipped() {
        let (source, converter) = converter_with(settings("usd", &["inr"]));

        assert!(converter.convert(dec!(100), "usd", "usd").await.is_empty());
        assert!(converter.convert(dec!(100), "$", "dollar").await.is_empty());
        assert_eq!(source.calls("usd"), 0);
    }

    #[tokio::test]
    async fn test_local_currency_in_favourites_is_skipped() {
        let (_, converter) = converter_with(settings("usd", &["usd", "inr"]));

        let items = converter.convert(dec!(1), "", "").await;

        assert_eq!(
            subtitles(&items),
            vec![
                "Currency conversion from USD to INR",
                "Currency conversion from INR to USD",
            ]
        );
    }

    #[tokio::test]
    async fn test_expanded_title() {
        let (_, converter) = converter_with(settings("usd", &[]));

        let items = converter.convert(dec!(1234.5), "$", "inr").await;

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "1,234.50 USD = 102,586.95 INR");
        assert_eq!(items[0].subtitle, "Currency conversion from USD to INR");
        assert_eq!(items[0].kind, ResultKind::Conversion);
        assert_eq!(items[0].copy_text(), Some("102,586.95"));
    }

    #[tokio::test]
    async fn test_compact_title_with_comma_separator() {
        let (_, converter) = converter_with(ConverterSettings {
            output_style: OutputStyle::Compact,
            separator: SeparatorStyle::Comma,
            ..settings("usd", &[])
        });

        let items = converter.convert(dec!(1234.5), "usd", "inr").await;

        assert_eq!(items[0].title, "102.586,95 INR");
    }

    #[tokio::test]
    async fn test_small_amount_precision() {
        let (source, converter) = converter_with(ConverterSettings {
            output_style: OutputStyle::Compact,
            ..settings("usd", &[])
        });
        source.set_rates("jpy", &[("btc", dec!(0.00000034))]);

        let items = converter.convert(dec!(1000), "jpy", "btc").await;

        assert_eq!(items[0].title, "0.00034 BTC");
    }

    #[tokio::test]
    async fn test_negative_amount_keeps_sign() {
        let (_, converter) = converter_with(settings("usd", &[]));

        let items = converter.convert(dec!(-10), "usd", "inr").await;

        assert_eq!(items[0].title, "-10.00 USD = -831.00 INR");
        assert_eq!(items[0].copy_text(), Some("-831.00"));
    }

    #[tokio::test]
    async fn test_failure_is_isolated_to_its_task() {
        let (source, converter) = converter_with(settings("usd", &["inr", "zzz", "eur"]));
        source.set_error(
            "eur",
            FxError::ProviderError {
                provider: "mock".to_string(),
                reason: "HTTP 503".to_string(),
            },
        );

        let items = converter.convert(dec!(1), "usd", "").await;

        assert_eq!(items.len(), 3);
        assert_eq!(items[0].subtitle, "Currency conversion from USD to INR");
        assert_eq!(items[1].title, "ZZZ is not a valid currency");
        assert_eq!(items[1].subtitle, CURRENCY_LIST_HINT);
        assert_eq!(
            items[1].action,
            ResultAction::OpenUrl("https://example.com/currencies".to_string())
        );
        assert_eq!(items[2].subtitle, "Currency conversion from USD to EUR");

        let items = converter.convert(dec!(1), "eur", "usd").await;
        assert_eq!(
            items[0].title,
            "Something went wrong while fetching the conversion rate"
        );
        assert!(items[0].is_warning());
    }

    #[tokio::test]
    async fn test_duplicate_items_are_removed() {
        let (source, converter) = converter_with(settings("usd", &["zzz", "yyy"]));

        // Both fail with the same message and subtitle.
        let items = converter.convert(dec!(1), "qqq", "").await;

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "QQQ is not a valid currency");
        assert!(source.calls("qqq") >= 1);
    }

    #[tokio::test]
    async fn test_rates_are_cached_across_queries() {
        let (source, converter) = converter_with(settings("usd", &["inr", "eur"]));

        converter.convert(dec!(1), "usd", "inr").await;
        converter.convert(dec!(2), "usd", "eur").await;

        assert_eq!(source.calls("usd"), 1);
    }

    #[tokio::test]
    async fn test_search() {
        let (_, converter) = converter_with(ConverterSettings {
            output_style: OutputStyle::Compact,
            ..settings("usd", &["eur"])
        });

        assert!(converter.search("").await.is_empty());
        assert!(converter.search("   ").await.is_empty());
        assert!(converter.search("hello").await.is_empty());

        let items = converter.search("2 * 50 $ to ₹").await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "8,310.00 INR");

        let items = converter.search(",5 usd to inr").await;
        assert_eq!(items[0].title, "415.50 INR");

        let items = converter.search("100 usd").await;
        assert_eq!(
            subtitles(&items),
            vec!["Currency conversion from USD to EUR"]
        );
    }

    #[tokio::test]
    async fn test_search_invalid_expression() {
        let (_, converter) = converter_with(settings("usd", &["eur"]));

        for text in ["10/0 usd", "usd to inr", "(1+2 usd"] {
            let items = converter.search(text).await;
            assert_eq!(items.len(), 1, "{}", text);
            assert_eq!(items[0].title, INVALID_EXPRESSION_TITLE);
            assert_eq!(items[0].action, ResultAction::None);
        }
    }

    #[tokio::test]
    async fn test_search_reports_missing_api_key() {
        let (source, converter) = converter_with(ConverterSettings {
            provider: ProviderKind::ExchangeRateApi,
            ..settings("usd", &["eur"])
        });

        let items = converter.search("100 usd").await;

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "ExchangeRate-API requires an API key");
        assert_eq!(items[0].subtitle, SETUP_HINT);
        assert_eq!(items[0].action, ResultAction::OpenUrl(README_URL.to_string()));
        assert_eq!(source.calls("usd"), 0);
    }

    struct PanickingAliases;

    impl AliasLookup for PanickingAliases {
        fn has_alias(&self, token: &str) -> bool {
            self.get_alias(token).is_some()
        }

        fn get_alias(&self, token: &str) -> Option<String> {
            if token == "boom" {
                panic!("alias store unavailable");
            }
            None
        }
    }

    #[tokio::test]
    async fn test_panicking_task_becomes_warning_at_its_index() {
        let source = Arc::new(MockRateSource::new("mock"));
        source.set_rates("usd", &[("inr", dec!(83.1)), ("eur", dec!(0.92))]);
        let rates = RateService::new(source, Arc::new(RateCache::new()));
        let converter = Converter::new(
            settings("usd", &["inr", "boom", "eur"]),
            Arc::new(PanickingAliases),
            Arc::new(rates),
        )
        .unwrap();

        let items = converter.convert(dec!(1), "usd", "").await;

        assert_eq!(items.len(), 3);
        assert_eq!(items[0].subtitle, "Currency conversion from USD to INR");
        assert_eq!(items[1].title, TASK_FAILED);
        assert_eq!(items[1].kind, ResultKind::Warning);
        assert_eq!(
            items[1].action,
            ResultAction::OpenUrl("https://example.com/currencies".to_string())
        );
        assert_eq!(items[2].subtitle, "Currency conversion from USD to EUR");
    }

    #[test]
    fn test_dedupe_keeps_first() {
        let a = ConversionResult::conversion("t", "s", "1");
        let b = ConversionResult::conversion("t", "s", "2");
        let c = ConversionResult::conversion("t", "other", "3");

        assert_eq!(dedupe(vec![a.clone(), b, c.clone()]), vec![a, c]);
    }
}
