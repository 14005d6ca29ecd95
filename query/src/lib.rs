//! Cambio Query
//!
//! Turns free text such as `"100 usd to inr"` or `"₽ 2*(40+2)"` into an
//! amount and a pair of currency tokens:
//!
//! - [`QueryParser`] splits the text into amount expression, source token
//!   and target token.
//! - [`evaluate`] computes the amount expression with the configured
//!   separators.
//! - [`AliasBook`] and [`resolve_currency`] map tokens such as `$` or
//!   `euro` to provider currency codes.

pub mod alias;
pub mod error;
pub mod expression;
pub mod parser;

pub use alias::{resolve_currency, AliasBook, AliasLookup};
pub use error::{AliasError, ExpressionError};
pub use expression::evaluate;
pub use parser::{ParsedQuery, QueryParser};
