//! Primitives shared by the permission engine and the login flow.
//!
//! Nothing in here performs IO.

pub mod error;
pub mod id;
pub mod symbol;

pub use error::{ConfigError, ConfigResult};
pub use id::IdentityRef;
pub use symbol::Symbol;
