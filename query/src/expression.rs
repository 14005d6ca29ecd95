//! Amount expression evaluator.
//!
//! A two-stack (operands, operators) scan over `+ - * /` and parentheses.
//! Group separators of the active [`NumberFormat`] are removed before
//! scanning, wherever they appear. Numeric literals may contain whitespace
//! and the decimal separator, which marks the fraction. Operators of equal
//! precedence evaluate left to right.

use std::str::FromStr;

use cambio_common::NumberFormat;
use rust_decimal::Decimal;

use crate::error::ExpressionError;

/// Evaluate `expression` using the separators in `format`.
pub fn evaluate(expression: &str, format: &NumberFormat) -> Result<Decimal, ExpressionError> {
    let chars: Vec<char> = expression
        .chars()
        .filter(|&c| c != format.group_separator)
        .collect();
    let mut values: Vec<Decimal> = Vec::new();
    let mut ops: Vec<char> = Vec::new();

    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];

        if c.is_whitespace() {
            i += 1;
            continue;
        }

        if c.is_ascii_digit() || c == format.decimal_separator {
            let mut literal = String::new();
            while i < chars.len() {
                let c = chars[i];
                if c.is_ascii_digit() {
                    literal.push(c);
                } else if c == format.decimal_separator {
                    literal.push('.');
                } else if !c.is_whitespace() {
                    break;
                }
                i += 1;
            }
            values.push(parse_literal(&literal)?);
            continue;
        }

        match c {
            '(' => ops.push(c),
            ')' => loop {
                match ops.pop() {
                    Some('(') => break,
                    Some(op) => apply(op, &mut values)?,
                    None => return Err(ExpressionError::Malformed),
                }
            },
            '+' | '-' | '*' | '/' => {
                while let Some(&top) = ops.last() {
                    if !has_precedence(c, top) {
                        break;
                    }
                    ops.pop();
                    apply(top, &mut values)?;
                }
                ops.push(c);
            }
            other => return Err(ExpressionError::UnexpectedCharacter(other)),
        }
        i += 1;
    }

    while let Some(op) = ops.pop() {
        apply(op, &mut values)?;
    }

    match (values.pop(), values.is_empty()) {
        (Some(result), true) => Ok(result),
        _ => Err(ExpressionError::Malformed),
    }
}

/// Whether the operator on top of the stack (`top`) should be applied
/// before pushing `incoming`.
fn has_precedence(incoming: char, top: char) -> bool {
    if top == '(' || top == ')' {
        return false;
    }
    !(matches!(incoming, '*' | '/') && matches!(top, '+' | '-'))
}

fn apply(op: char, values: &mut Vec<Decimal>) -> Result<(), ExpressionError> {
    if !matches!(op, '+' | '-' | '*' | '/') {
        return Err(ExpressionError::InvalidOperator(op));
    }

    let b = values.pop().ok_or(ExpressionError::Malformed)?;
    let a = values.pop().ok_or(ExpressionError::Malformed)?;

    let result = match op {
        '+' => a.checked_add(b),
        '-' => a.checked_sub(b),
        '*' => a.checked_mul(b),
        _ if b.is_zero() => return Err(ExpressionError::DivisionByZero),
        _ => a.checked_div(b),
    };

    values.push(result.ok_or(ExpressionError::Overflow)?);
    Ok(())
}

fn parse_literal(literal: &str) -> Result<Decimal, ExpressionError> {
    let normalized = if literal.starts_with('.') {
        format!("0{}", literal)
    } else {
        literal.to_string()
    };

    Decimal::from_str(&normalized).map_err(|_| ExpressionError::InvalidNumber(literal.to_string()))
}
