//! FX engine error types.

use cambio_common::Currency;
use thiserror::Error;

/// Errors that can occur while obtaining a rate.
#[derive(Debug, Clone, Error)]
pub enum FxError {
    /// The provider does not know this currency (either side of a pair).
    #[error("{0} is not a valid currency")]
    InvalidCurrency(Currency),

    /// Both endpoints failed, or the response held no rate table. The
    /// reason is for logs only.
    #[error("Something went wrong while fetching the conversion rate")]
    ProviderError {
        provider: String,
        reason: String,
    },
}

/// Result type for FX operations.
pub type FxResult<T> = Result<T, FxError>;
