//! Collaborators owned by the host application.

use std::sync::Arc;

use async_trait::async_trait;

use warden_auth::Subject;
use warden_core::IdentityRef;

use crate::StoreError;

/// An identity record the credential store can resolve.
pub trait Account: Subject + Clone + Send + Sync + 'static {
    /// Reference persisted in the session (typically the primary key).
    fn identity_ref(&self) -> IdentityRef;
}

/// How a credential lookup identifies the caller.
#[derive(Clone, PartialEq, Eq)]
pub enum Criteria {
    Password { email: String, password: String },
    SessionToken(IdentityRef),
    Bypass,
}

impl core::fmt::Debug for Criteria {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Password { email, .. } => f
                .debug_struct("Password")
                .field("email", email)
                .field("password", &"<redacted>")
                .finish(),
            Self::SessionToken(token) => f.debug_tuple("SessionToken").field(token).finish(),
            Self::Bypass => f.write_str("Bypass"),
        }
    }
}

/// Resolves identities. Verification (password hashing and the like) is entirely
/// the implementation's business.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    type Account: Account;

    /// Name of the identity type this store resolves; must equal the configured
    /// `login_model`.
    fn model(&self) -> &str;

    /// `Ok(None)` when nothing matches; `Err` only when the store itself failed.
    async fn authenticate(&self, criteria: &Criteria) -> Result<Option<Self::Account>, StoreError>;
}

#[async_trait]
impl<S> CredentialStore for Arc<S>
where
    S: CredentialStore + ?Sized,
{
    type Account = S::Account;

    fn model(&self) -> &str {
        (**self).model()
    }

    async fn authenticate(&self, criteria: &Criteria) -> Result<Option<Self::Account>, StoreError> {
        (**self).authenticate(criteria).await
    }
}

/// Key/value session state of the current caller.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    async fn set(&mut self, key: &str, value: String) -> Result<(), StoreError>;

    /// Remove and return the value.
    async fn delete(&mut self, key: &str) -> Result<Option<String>, StoreError>;
}
