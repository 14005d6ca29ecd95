//! Free-text query parser.
//!
//! Accepted shapes, after trimming:
//!
//! ```text
//! <amount> <from> [to|in] <to>
//! <from> <amount> [to|in] <to>
//! ```
//!
//! where `<amount>` is digits, whitespace, the configured separators and
//! `+ - * / ( )`, and the currency tokens are letters, currency symbols or
//! underscores. Either token may be empty.

use cambio_common::NumberFormat;
use regex::{Captures, Regex};

use crate::alias::TOKEN_CLASS;

/// Tokens extracted from a query. Currency tokens are trimmed and
/// lowercased; the amount is left for [`crate::evaluate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedQuery {
    pub amount: String,
    pub from: String,
    pub to: String,
}

/// Matches queries against the composite pattern for one number format.
#[derive(Debug, Clone)]
pub struct QueryParser {
    pattern: Regex,
}

impl QueryParser {
    /// Build the pattern for `format`'s separators.
    pub fn new(format: &NumberFormat) -> Result<Self, regex::Error> {
        let decimal = regex::escape(&format.decimal_separator.to_string());
        let group = regex::escape(&format.group_separator.to_string());

        let amount = |name: &str| {
            format!(r"(?P<{name}>(?:\d+|\s+|{decimal}|{group}|[+\-*/()])+)")
        };
        let token = |name: &str| format!(r"(?P<{name}>{TOKEN_CLASS}*)");

        let pattern = format!(
            r"^\s*(?:(?:{a1}\s*{f1})|(?:{f2}\s*{a2}))\s*(?:(?:to|in)\b)?\s*{to}\s*$",
            a1 = amount("amount_first"),
            f1 = token("from_second"),
            f2 = token("from_first"),
            a2 = amount("amount_second"),
            to = token("to"),
        );

        Ok(Self {
            pattern: Regex::new(&pattern)?,
        })
    }

    /// Parse `text`; `None` means the text does not look like a query yet.
    pub fn parse(&self, text: &str) -> Option<ParsedQuery> {
        let caps = self.pattern.captures(text.trim())?;

        let to = group(&caps, "to");
        let (amount, from) = match caps.name("amount_first") {
            Some(amount) => {
                let from = group(&caps, "from_second");
                // "100 to inr": the keyword was taken as the source token.
                let from = if is_keyword(&from) { String::new() } else { from };
                (amount.as_str().to_string(), from)
            }
            None => (group(&caps, "amount_second"), group(&caps, "from_first")),
        };

        Some(ParsedQuery {
            amount: amount.trim().to_string(),
            from,
            to,
        })
    }
}

fn group(caps: &Captures<'_>, name: &str) -> String {
    caps.name(name)
        .map(|m| m.as_str().trim().to_lowercase())
        .unwrap_or_default()
}

fn is_keyword(token: &str) -> bool {
    token == "to" || token == "in"
}
