use serde::Serialize;

use warden_core::{IdentityRef, Symbol};

/// The resource a request acts upon.
///
/// Rules match on `kind` only. `id` and `owner` describe a concrete record and are
/// there for predicates (e.g. "owner of record").
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessObject {
    kind: Symbol,
    id: Option<String>,
    owner: Option<IdentityRef>,
}

impl AccessObject {
    pub fn new(kind: impl Into<Symbol>) -> Self {
        Self {
            kind: kind.into(),
            id: None,
            owner: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn owned_by(mut self, owner: IdentityRef) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn kind(&self) -> &Symbol {
        &self.kind
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn owner(&self) -> Option<&IdentityRef> {
        self.owner.as_ref()
    }
}

impl From<Symbol> for AccessObject {
    fn from(kind: Symbol) -> Self {
        Self::new(kind)
    }
}

impl From<&'static str> for AccessObject {
    fn from(kind: &'static str) -> Self {
        Self::new(kind)
    }
}

impl core::fmt::Display for AccessObject {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match &self.id {
            Some(id) => write!(f, "{}#{}", self.kind, id),
            None => write!(f, "{}", self.kind),
        }
    }
}
