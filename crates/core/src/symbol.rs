//! Action and object names.

use std::borrow::Cow;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ConfigError;

/// Name of an action (`view`, `delete`) or an object kind (`invoice`, `report`).
///
/// The special symbol `"*"` is the wildcard: as a matcher it accepts anything.
/// Symbols are compared exactly (case-sensitive).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Symbol(Cow<'static, str>);

impl Symbol {
    pub const WILDCARD: Symbol = Symbol(Cow::Borrowed("*"));

    /// Build a symbol from a compile-time name.
    ///
    /// Unchecked; use [`Symbol::parse`] for names coming from configuration.
    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    /// Validate and build a symbol: non-empty, no whitespace.
    pub fn parse(name: impl Into<Cow<'static, str>>) -> Result<Self, ConfigError> {
        let name = name.into();
        if name.is_empty() || name.chars().any(char::is_whitespace) {
            return Err(ConfigError::InvalidSymbol(name.into_owned()));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_wildcard(&self) -> bool {
        self.as_str() == "*"
    }
}

impl core::fmt::Display for Symbol {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for Symbol {
    fn from(value: &'static str) -> Self {
        Self::from_static(value)
    }
}

impl<'de> Deserialize<'de> for Symbol {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Symbol::parse(raw).map_err(serde::de::Error::custom)
    }
}
