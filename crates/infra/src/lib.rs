//! Infrastructure adapters: stores and configuration files.

pub mod credentials;
pub mod rules_file;
pub mod session;

pub use credentials::InMemoryCredentialStore;
pub use rules_file::{RulesFile, RulesFileError};
pub use session::{InMemorySessionStore, MemorySession, SessionId};
