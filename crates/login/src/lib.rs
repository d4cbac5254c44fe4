//! Authentication session state machine.
//!
//! Resolves the caller's identity (request, session, bypass), gates the request
//! through the permission engine, and runs the save-location / redirect-to-login /
//! restore-location flow. Credential verification and session persistence belong to
//! the host, behind [`CredentialStore`] and [`SessionStore`].

pub mod config;
pub mod controller;
pub mod error;
pub mod location;
pub mod request;
pub mod store;

pub use config::LoginConfig;
pub use controller::{
    open_login_rule, AuthState, AuthenticationController, Halt, LoginOutcome, Outcome, LOGIN_OBJECT, RETURN_TO_KEY,
};
pub use error::{LoginError, StoreError};
pub use request::{LoginForm, RequestContext};
pub use store::{Account, CredentialStore, Criteria, SessionStore};
