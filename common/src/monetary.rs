//! Currency codes and pairs.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A currency code as understood by the rate providers.
///
/// Codes are stored lowercase, so two codes that differ only by case are
/// the same currency. `Display` renders the upper-case form used in
/// result titles.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Currency(String);

impl Currency {
    /// Create a new currency from a code or resolved token.
    pub fn new(code: impl AsRef<str>) -> Self {
        Self(code.as_ref().trim().to_lowercase())
    }

    /// Get the normalized (lowercase) code.
    pub fn code(&self) -> &str {
        &self.0
    }

    /// Upper-case form, as used in display strings and some provider URLs.
    pub fn upper(&self) -> String {
        self.0.to_uppercase()
    }

    /// True when the code is empty (the token was left unspecified).
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.upper())
    }
}

impl From<&str> for Currency {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Currency {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<Currency> for String {
    fn from(c: Currency) -> Self {
        c.0
    }
}

/// A (from, to) currency pair. Used as the rate cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CurrencyPair {
    /// Currency being converted from.
    pub base: Currency,
    /// Currency being converted to.
    pub quote: Currency,
}

impl CurrencyPair {
    /// Create a new currency pair.
    pub fn new(base: impl Into<Currency>, quote: impl Into<Currency>) -> Self {
        Self {
            base: base.into(),
            quote: quote.into(),
        }
    }

    /// A pair is convertible only when both sides are set and differ.
    pub fn is_convertible(&self) -> bool {
        !self.base.is_empty() && !self.quote.is_empty() && self.base != self.quote
    }
}

impl fmt::Display for CurrencyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}
