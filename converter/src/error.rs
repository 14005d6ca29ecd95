//! Converter error types.

use cambio_fx::FxError;
use thiserror::Error;

/// Invalid or incomplete settings.
#[derive(Debug, Clone, Error)]
pub enum SettingsError {
    #[error("Local currency cannot be empty")]
    MissingLocalCurrency,

    #[error("ExchangeRate-API requires an API key")]
    MissingApiKey,

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Errors building a [`crate::Converter`].
#[derive(Debug, Error)]
pub enum ConverterError {
    #[error("failed to build query pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error(transparent)]
    Fx(#[from] FxError),
}
