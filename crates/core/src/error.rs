//! Configuration error model.

use thiserror::Error;

/// Result type used by setup-time APIs (rule registration, login configuration).
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Setup-time misconfiguration.
///
/// These are programming errors: they surface while the host wires its rules and
/// settings, before any request is served, and must never reach an end user.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An option key that is not part of the recognised set.
    #[error("unsupported option '{0}'")]
    UnsupportedOption(String),

    /// A required matcher (subject, action or object) was not provided.
    #[error("missing matcher: {0}")]
    MissingMatcher(&'static str),

    /// A symbol was empty or contained whitespace.
    #[error("invalid symbol '{0}'")]
    InvalidSymbol(String),

    /// A setting has a value outside its allowed shape.
    #[error("invalid value for '{key}': {reason}")]
    InvalidValue { key: &'static str, reason: String },

    /// A declaration document could not be parsed.
    #[error("malformed declaration: {0}")]
    Malformed(String),
}

impl ConfigError {
    pub fn invalid_value(key: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            key,
            reason: reason.into(),
        }
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }
}
