//! Cambio Converter
//!
//! Turns a parsed query into an ordered list of display-ready results.
//! A query that leaves the source or target currency open is expanded
//! into several conversions using the configured local and favourite
//! currencies; those conversions run concurrently and one failing pair
//! never hides the others.

pub mod amount;
pub mod converter;
pub mod error;
pub mod result;
pub mod settings;

pub use converter::{ConversionTask, Converter};
pub use error::{ConverterError, SettingsError};
pub use result::{ConversionResult, ResultAction, ResultKind};
pub use settings::{
    ConversionDirection, ConverterSettings, OutputStyle, ProviderKind, SeparatorStyle,
};
