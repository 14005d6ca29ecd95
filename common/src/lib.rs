//! Cambio Common Types
//!
//! This crate contains the value types shared by the Cambio crates:
//! currency codes and pairs, the separator-aware number format used for
//! parsing and display, and the timing limits for cached rates.

pub mod format;
pub mod monetary;
pub mod time;

pub use format::*;
pub use monetary::*;
pub use time::*;
