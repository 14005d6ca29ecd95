//! Separator-aware number format.
//!
//! Only two conventions are supported: `1,234.56` and `1.234,56`. The same
//! format drives amount parsing and result display.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Fraction digits used for currency amounts before precision expansion.
pub const CURRENCY_DECIMAL_DIGITS: u32 = 2;

/// Fraction digits used when echoing the source amount.
pub const NUMBER_DECIMAL_DIGITS: u32 = 2;

/// Decimal and group separators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberFormat {
    pub decimal_separator: char,
    pub group_separator: char,
}

impl NumberFormat {
    /// `1,234.56`
    pub const fn dot_decimal() -> Self {
        Self {
            decimal_separator: '.',
            group_separator: ',',
        }
    }

    /// `1.234,56`
    pub const fn comma_decimal() -> Self {
        Self {
            decimal_separator: ',',
            group_separator: '.',
        }
    }

    /// Format `value` with exactly `precision` fraction digits and grouped
    /// thousands. Midpoints round away from zero.
    pub fn format(&self, value: Decimal, precision: u32) -> String {
        let mut rounded =
            value.round_dp_with_strategy(precision, RoundingStrategy::MidpointAwayFromZero);
        rounded.rescale(precision);

        let digits = rounded.abs().to_string();
        let (integer, fraction) = match digits.split_once('.') {
            Some((integer, fraction)) => (integer, Some(fraction)),
            None => (digits.as_str(), None),
        };

        let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 2);
        if rounded.is_sign_negative() && !rounded.is_zero() {
            out.push('-');
        }
        out.push_str(&self.group(integer));
        if let Some(fraction) = fraction {
            out.push(self.decimal_separator);
            out.push_str(fraction);
        }
        out
    }

    fn group(&self, integer: &str) -> String {
        let len = integer.len();
        let mut grouped = String::with_capacity(len + len / 3);
        for (i, ch) in integer.chars().enumerate() {
            if i > 0 && (len - i) % 3 == 0 {
                grouped.push(self.group_separator);
            }
            grouped.push(ch);
        }
        grouped
    }
}

impl Default for NumberFormat {
    fn default() -> Self {
        Self::dot_decimal()
    }
}
