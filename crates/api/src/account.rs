use serde::Serialize;

use warden_auth::{Role, Subject};
use warden_core::IdentityRef;
use warden_login::Account;

/// Identity record served by the demo credential store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserAccount {
    id: IdentityRef,
    email: String,
    name: String,
    roles: Vec<Role>,
}

impl UserAccount {
    pub fn new(id: impl Into<String>, email: impl Into<String>, name: impl Into<String>, roles: Vec<Role>) -> Self {
        Self {
            id: IdentityRef::new(id),
            email: email.into(),
            name: name.into(),
            roles,
        }
    }

    pub fn id(&self) -> &IdentityRef {
        &self.id
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Subject for UserAccount {
    fn identity(&self) -> Option<&IdentityRef> {
        Some(&self.id)
    }

    fn roles(&self) -> &[Role] {
        &self.roles
    }
}

impl Account for UserAccount {
    fn identity_ref(&self) -> IdentityRef {
        self.id.clone()
    }
}
