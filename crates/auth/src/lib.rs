//! Rule-based permission engine.
//!
//! Grant-only: any matching rule grants, there is no deny rule. Decoupled from HTTP
//! and storage; the host supplies the subject, the action and the object.

pub mod authorize;
pub mod declaration;
pub mod object;
pub mod permissions;
pub mod roles;
pub mod rule;
pub mod shared;
pub mod subject;

pub use authorize::{authorize, AccessDecision, AccessGate, AuthzError};
pub use declaration::RuleDeclaration;
pub use object::AccessObject;
pub use permissions::{AccessibleObjects, PermissionSet, RuleOptions};
pub use roles::Role;
pub use rule::{Predicate, Rule, SubjectMatcher};
pub use shared::SharedPermissions;
pub use subject::{Anonymous, Subject, SubjectSnapshot};

pub use warden_core::{ConfigError, IdentityRef, Symbol};
