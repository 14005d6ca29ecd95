//! Converted-amount arithmetic.

use cambio_common::CURRENCY_DECIMAL_DIGITS;
use rust_decimal::{Decimal, RoundingStrategy};

/// Fraction digits inspected when counting leading zeros of a small amount.
const SMALL_AMOUNT_DIGITS: u32 = 10;

/// `|amount × rate|` rounded half-to-even, with the number of fraction
/// digits it should be shown with. `None` on overflow.
///
/// Amounts below one get extra digits so their first significant digit
/// stays visible: `0.00034` is shown with five digits, not two.
pub fn converted_amount(amount: Decimal, rate: Decimal) -> Option<(Decimal, u32)> {
    let raw = amount.checked_mul(rate)?.abs();

    let mut precision = CURRENCY_DECIMAL_DIGITS;
    if raw < Decimal::ONE {
        precision += leading_fraction_zeros(raw);
    }

    Some((raw.round_dp(precision), precision))
}

/// Zeros between the decimal point and the first significant digit,
/// looking at most [`SMALL_AMOUNT_DIGITS`] digits deep.
fn leading_fraction_zeros(value: Decimal) -> u32 {
    let mut value =
        value.round_dp_with_strategy(SMALL_AMOUNT_DIGITS, RoundingStrategy::MidpointAwayFromZero);

    let mut zeros = 0;
    while zeros < SMALL_AMOUNT_DIGITS {
        value *= Decimal::TEN;
        if value >= Decimal::ONE {
            break;
        }
        zeros += 1;
    }
    zeros
}
