//! Cambio CLI
//!
//! Converts currency queries typed as free text, e.g. `cambio 100 usd to inr`.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use cambio_common::Currency;
use cambio_converter::{
    ConversionDirection, ConversionResult, Converter, ConverterSettings, OutputStyle,
    ProviderKind, SeparatorStyle,
};
use cambio_query::AliasBook;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Cambio CLI
#[derive(Parser, Debug)]
#[command(name = "cambio")]
#[command(about = "Free-text currency converter")]
struct Args {
    /// Query, e.g. `100 usd to inr`, `$20`, `2*(3+4) eur`
    query: Vec<String>,

    /// Local currency used when the query leaves a side open
    #[arg(short, long)]
    local: Option<String>,

    /// Favourite currencies (comma-separated or repeated)
    #[arg(short, long, value_delimiter = ',')]
    currencies: Vec<String>,

    /// Fan-out ordering: local-to-other or other-to-local
    #[arg(long)]
    direction: Option<ConversionDirection>,

    /// Result layout: compact or expanded
    #[arg(long)]
    style: Option<OutputStyle>,

    /// Number separators: dot (1,234.5) or comma (1.234,5)
    #[arg(long)]
    separator: Option<SeparatorStyle>,

    /// Rate API: currency-api or exchangerate-api
    #[arg(long)]
    provider: Option<ProviderKind>,

    /// API key for providers that need one
    #[arg(long)]
    api_key: Option<String>,

    /// How long fetched rates stay fresh, in hours
    #[arg(long)]
    cache_ttl_hours: Option<f64>,

    /// JSON file of alias → currency code (defaults to the built-in set)
    #[arg(long)]
    aliases: Option<PathBuf>,

    /// Print the active aliases as JSON and exit
    #[arg(long)]
    list_aliases: bool,

    /// Read one query per line from stdin
    #[arg(short, long)]
    interactive: bool,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

impl Args {
    /// Layer command-line overrides on top of `settings`.
    fn apply(&self, settings: &mut ConverterSettings) {
        if let Some(local) = &self.local {
            settings.local_currency = Currency::new(local);
        }
        if !self.currencies.is_empty() {
            settings.currencies = self
                .currencies
                .iter()
                .map(Currency::new)
                .filter(|c| !c.is_empty())
                .collect();
        }
        if let Some(direction) = self.direction {
            settings.direction = direction;
        }
        if let Some(style) = self.style {
            settings.output_style = style;
        }
        if let Some(separator) = self.separator {
            settings.separator = separator;
        }
        if let Some(provider) = self.provider {
            settings.provider = provider;
        }
        if let Some(key) = &self.api_key {
            settings.api_key = Some(key.clone());
        }
        if let Some(hours) = self.cache_ttl_hours {
            settings.cache_ttl_hours = hours;
        }
    }

    fn load_aliases(&self) -> anyhow::Result<AliasBook> {
        match &self.aliases {
            Some(path) => {
                let json = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read aliases from {}", path.display()))?;
                Ok(AliasBook::from_json(&json)?)
            }
            None => Ok(AliasBook::with_defaults()?),
        }
    }
}

fn init_logging(json: bool) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
    );
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn print_results(items: &[ConversionResult], json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(items)?);
        return Ok(());
    }

    for item in items {
        let marker = if item.is_warning() { "!" } else { " " };
        println!("{} {}", marker, item.title);
        println!("    {}", item.subtitle);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.log_json);

    let aliases = args.load_aliases()?;
    if args.list_aliases {
        println!("{}", aliases.export_json()?);
        return Ok(());
    }

    let mut settings = ConverterSettings::from_env();
    args.apply(&mut settings);
    debug!(
        provider = %settings.provider,
        local = %settings.local_currency,
        "Loaded settings"
    );

    let converter = Converter::from_settings(settings, Arc::new(aliases))?;

    if args.interactive {
        info!("Reading queries from stdin");

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await? {
            let items = converter.search(&line).await;
            print_results(&items, args.json)?;
        }
        return Ok(());
    }

    let query = args.query.join(" ");
    if query.trim().is_empty() {
        anyhow::bail!("no query given; try `cambio 100 usd to eur` or `--interactive`");
    }

    let items = converter.search(&query).await;
    print_results(&items, args.json)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_words_are_collected() {
        let args = Args::try_parse_from(["cambio", "100", "usd", "to", "inr"]).unwrap();
        assert_eq!(args.query.join(" "), "100 usd to inr");
        assert!(!args.interactive);
    }

    #[test]
    fn test_flags_override_settings() {
        let args = Args::try_parse_from([
            "cambio",
            "--local",
            "INR",
            "--currencies",
            "usd,eur",
            "-c",
            "jpy",
            "--style",
            "compact",
            "--direction",
            "other-to-local",
            "--provider",
            "exchangerate-api",
            "--api-key",
            "k",
            "5",
        ])
        .unwrap();

        let mut settings = ConverterSettings::default();
        args.apply(&mut settings);

        assert_eq!(settings.local_currency.code(), "inr");
        assert_eq!(
            settings.currencies,
            vec![Currency::new("usd"), Currency::new("eur"), Currency::new("jpy")]
        );
        assert_eq!(settings.output_style, OutputStyle::Compact);
        assert_eq!(settings.direction, ConversionDirection::OtherToLocal);
        assert_eq!(settings.provider, ProviderKind::ExchangeRateApi);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_unknown_style_is_rejected() {
        assert!(Args::try_parse_from(["cambio", "--style", "fancy", "1"]).is_err());
    }

    #[test]
    fn test_no_flags_keep_settings() {
        let args = Args::try_parse_from(["cambio", "1"]).unwrap();
        let mut settings = ConverterSettings::default();
        args.apply(&mut settings);
        assert_eq!(settings, ConverterSettings::default());
    }
}
