use serde::Serialize;

use warden_core::IdentityRef;

use crate::Role;

/// The caller being authorized.
///
/// Implemented by the host's identity type. An anonymous caller has no identity
/// reference and no roles, so only wildcard subject matchers accept it.
pub trait Subject: Send + Sync {
    fn identity(&self) -> Option<&IdentityRef>;

    fn roles(&self) -> &[Role];

    fn has_role(&self, role: &Role) -> bool {
        self.roles().iter().any(|r| r == role)
    }
}

impl<S> Subject for &S
where
    S: Subject + ?Sized,
{
    fn identity(&self) -> Option<&IdentityRef> {
        (**self).identity()
    }

    fn roles(&self) -> &[Role] {
        (**self).roles()
    }
}

/// Placeholder subject for callers that have not authenticated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Anonymous;

impl Subject for Anonymous {
    fn identity(&self) -> Option<&IdentityRef> {
        None
    }

    fn roles(&self) -> &[Role] {
        &[]
    }
}

/// Owned copy of a subject's matchable attributes, kept for diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SubjectSnapshot {
    pub identity: Option<IdentityRef>,
    pub roles: Vec<Role>,
}

impl SubjectSnapshot {
    pub fn of(subject: &dyn Subject) -> Self {
        Self {
            identity: subject.identity().cloned(),
            roles: subject.roles().to_vec(),
        }
    }

    pub fn is_anonymous(&self) -> bool {
        self.identity.is_none()
    }
}

impl core::fmt::Display for SubjectSnapshot {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match &self.identity {
            Some(id) => write!(f, "{id}"),
            None => f.write_str("anonymous"),
        }
    }
}
