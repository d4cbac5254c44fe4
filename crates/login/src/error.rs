use thiserror::Error;

use warden_core::ConfigError;

/// Failure reported by a host-provided store.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("lock poisoned")]
    LockPoisoned,
}

impl StoreError {
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }
}

/// Errors that abort the current request.
///
/// Being anonymous or unauthorized is not an error; see [`crate::Outcome`].
#[derive(Debug, Error)]
pub enum LoginError {
    /// The credential store could not answer. Not masked as "not authenticated".
    #[error("credential lookup failed: {0}")]
    CredentialLookup(#[source] StoreError),

    #[error("session store failed: {0}")]
    Session(#[source] StoreError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
