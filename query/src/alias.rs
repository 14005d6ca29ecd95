//! Currency aliases.
//!
//! An alias maps a user token (`$`, `euro`, `rupee`) to a provider currency
//! code. Tokens without an alias are used as codes directly.

use std::collections::BTreeMap;

use cambio_common::Currency;
use lazy_static::lazy_static;
use parking_lot::RwLock;
use regex::Regex;
use tracing::debug;

use crate::error::AliasError;

/// Characters allowed in currency tokens: letters, currency symbols and
/// underscore. Shared with the query pattern.
pub const TOKEN_CLASS: &str = r"[\p{L}\p{Sc}_]";

const DEFAULT_ALIASES: &str = include_str!("../assets/alias.default.json");

lazy_static! {
    /// Whole-key match over [`TOKEN_CLASS`].
    static ref KEY_FORMAT: Regex =
        Regex::new(&format!("^{}*$", TOKEN_CLASS)).expect("Invalid alias key pattern");
}

/// Read access to an alias store.
pub trait AliasLookup: Send + Sync {
    /// Whether `token` has an alias. Lookups ignore case.
    fn has_alias(&self, token: &str) -> bool;

    /// The currency code `token` stands for, if any. Lookups ignore case.
    fn get_alias(&self, token: &str) -> Option<String>;
}

/// Resolve a user token to a currency, passing unknown tokens through
/// (lowercased) as literal codes.
pub fn resolve_currency(aliases: &dyn AliasLookup, token: &str) -> Currency {
    let token = token.trim().to_lowercase();
    match aliases.get_alias(&token) {
        Some(code) => {
            debug!(token = %token, code = %code, "Resolved alias");
            Currency::new(code)
        }
        None => Currency::new(token),
    }
}

/// In-memory alias store.
///
/// Loading from and saving to disk is left to the caller; use
/// [`AliasBook::from_json`] and [`AliasBook::export_json`].
pub struct AliasBook {
    aliases: RwLock<BTreeMap<String, String>>,
}

impl AliasBook {
    /// An empty alias book.
    pub fn new() -> Self {
        Self {
            aliases: RwLock::new(BTreeMap::new()),
        }
    }

    /// An alias book holding the built-in aliases.
    pub fn with_defaults() -> Result<Self, AliasError> {
        Self::from_json(DEFAULT_ALIASES)
    }

    /// Load aliases from a JSON object of `token → code`.
    pub fn from_json(json: &str) -> Result<Self, AliasError> {
        Ok(Self {
            aliases: RwLock::new(parse_aliases(json)?),
        })
    }

    /// Whether `key` consists only of letters, currency symbols and
    /// underscores. The empty string passes; [`AliasBook::set`] rejects it
    /// separately.
    pub fn validate_key_format(key: &str) -> bool {
        KEY_FORMAT.is_match(key)
    }

    /// Snapshot of every alias, sorted by token.
    pub fn all_aliases(&self) -> BTreeMap<String, String> {
        self.aliases.read().clone()
    }

    /// Add or replace an alias.
    pub fn set(&self, key: &str, code: &str) -> Result<(), AliasError> {
        let key = key.trim().to_lowercase();
        let code = code.trim().to_lowercase();

        if key.is_empty() {
            return Err(AliasError::EmptyKey);
        }
        if !Self::validate_key_format(&key) {
            return Err(AliasError::InvalidKey(key));
        }
        if code.is_empty() {
            return Err(AliasError::EmptyCurrency(key));
        }

        self.aliases.write().insert(key, code);
        Ok(())
    }

    /// Remove an alias. Returns whether it existed.
    pub fn remove(&self, key: &str) -> bool {
        self.aliases
            .write()
            .remove(&key.trim().to_lowercase())
            .is_some()
    }

    /// Replace every alias with the built-in set.
    pub fn reset_to_default(&self) -> Result<(), AliasError> {
        let defaults = parse_aliases(DEFAULT_ALIASES)?;
        *self.aliases.write() = defaults;
        Ok(())
    }

    /// Serialize the aliases as a JSON object sorted by token.
    pub fn export_json(&self) -> Result<String, AliasError> {
        Ok(serde_json::to_string_pretty(&*self.aliases.read())?)
    }
}

impl Default for AliasBook {
    fn default() -> Self {
        Self::new()
    }
}

impl AliasLookup for AliasBook {
    fn has_alias(&self, token: &str) -> bool {
        self.aliases.read().contains_key(&token.to_lowercase())
    }

    fn get_alias(&self, token: &str) -> Option<String> {
        self.aliases.read().get(&token.to_lowercase()).cloned()
    }
}

fn parse_aliases(json: &str) -> Result<BTreeMap<String, String>, AliasError> {
    let raw: BTreeMap<String, String> = serde_json::from_str(json)?;
    Ok(raw
        .into_iter()
        .map(|(k, v)| (k.trim().to_lowercase(), v.trim().to_lowercase()))
        .collect())
}
