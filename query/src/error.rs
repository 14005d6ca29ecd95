//! Query error types.

use thiserror::Error;

/// Errors from evaluating an amount expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpressionError {
    #[error("Cannot divide by zero")]
    DivisionByZero,

    #[error("Invalid operator '{0}'")]
    InvalidOperator(char),

    #[error("Invalid number '{0}'")]
    InvalidNumber(String),

    #[error("Unexpected character '{0}'")]
    UnexpectedCharacter(char),

    #[error("Malformed expression")]
    Malformed,

    #[error("Amount is too large")]
    Overflow,
}

/// Errors from editing the alias book.
#[derive(Debug, Error)]
pub enum AliasError {
    #[error("Alias cannot be empty")]
    EmptyKey,

    #[error("Alias '{0}' may only contain letters, currency symbols and underscores")]
    InvalidKey(String),

    #[error("Alias '{0}' must map to a currency code")]
    EmptyCurrency(String),

    #[error("Invalid alias JSON: {0}")]
    Json(#[from] serde_json::Error),
}
