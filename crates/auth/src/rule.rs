use std::sync::Arc;

use serde::{Deserialize, Serialize};

use warden_core::{ConfigError, IdentityRef, Symbol};

use crate::{AccessObject, Role, Subject};

/// Who a rule applies to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectMatcher {
    /// Any caller, including anonymous ones.
    Any,
    /// One specific identity.
    Identity(IdentityRef),
    /// Any caller holding the role.
    Role(Role),
}

impl SubjectMatcher {
    pub fn role(name: impl Into<Role>) -> Self {
        Self::Role(name.into())
    }

    pub fn identity(id: IdentityRef) -> Self {
        Self::Identity(id)
    }

    /// Parse the textual form used in rule declarations.
    ///
    /// `*` is any subject, `id:<ref>` an exact identity, anything else a role name.
    pub fn parse(spec: &str) -> Result<Self, ConfigError> {
        let spec = spec.trim();
        if spec.is_empty() {
            return Err(ConfigError::MissingMatcher("subject"));
        }
        if spec == "*" {
            return Ok(Self::Any);
        }
        if let Some(id) = spec.strip_prefix("id:") {
            return Ok(Self::Identity(id.parse()?));
        }
        if spec.chars().any(char::is_whitespace) {
            return Err(ConfigError::InvalidSymbol(spec.to_string()));
        }
        Ok(Self::Role(Role::new(spec.to_string())))
    }

    pub fn is_any(&self) -> bool {
        matches!(self, Self::Any)
    }

    pub fn matches(&self, subject: &dyn Subject) -> bool {
        match self {
            Self::Any => true,
            Self::Identity(id) => subject.identity() == Some(id),
            Self::Role(role) => subject.has_role(role),
        }
    }
}

impl core::fmt::Display for SubjectMatcher {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Any => f.write_str("*"),
            Self::Identity(id) => write!(f, "id:{id}"),
            Self::Role(role) => write!(f, "{role}"),
        }
    }
}

/// Exact-or-wildcard comparison used for both action and object matchers.
pub(crate) fn symbol_matches(matcher: &Symbol, value: &Symbol) -> bool {
    matcher.is_wildcard() || matcher == value
}

type PredicateFn = dyn Fn(&dyn Subject, &Symbol, &AccessObject) -> bool + Send + Sync;

/// Dynamic condition attached to a rule, evaluated only once its matchers agree.
///
/// Takes everything it needs as arguments; it must not reach for request state.
#[derive(Clone)]
pub struct Predicate(Arc<PredicateFn>);

impl Predicate {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&dyn Subject, &Symbol, &AccessObject) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Holds when the object's owner is the subject's identity.
    pub fn owner() -> Self {
        Self::new(|subject, _action, object| match (subject.identity(), object.owner()) {
            (Some(who), Some(owner)) => who == owner,
            _ => false,
        })
    }

    pub fn evaluate(&self, subject: &dyn Subject, action: &Symbol, object: &AccessObject) -> bool {
        (self.0)(subject, action, object)
    }
}

impl core::fmt::Debug for Predicate {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("Predicate(..)")
    }
}

/// A single grant: subject matcher, action matcher, object matcher and an optional
/// predicate. All four must hold for the rule to grant.
#[derive(Debug, Clone)]
pub struct Rule {
    subject: SubjectMatcher,
    action: Symbol,
    object: Symbol,
    predicate: Option<Predicate>,
}

impl Rule {
    pub fn new(subject: SubjectMatcher, action: impl Into<Symbol>, object: impl Into<Symbol>) -> Self {
        Self {
            subject,
            action: action.into(),
            object: object.into(),
            predicate: None,
        }
    }

    pub fn when(mut self, predicate: Predicate) -> Self {
        self.predicate = Some(predicate);
        self
    }

    pub fn subject(&self) -> &SubjectMatcher {
        &self.subject
    }

    pub fn action(&self) -> &Symbol {
        &self.action
    }

    pub fn object(&self) -> &Symbol {
        &self.object
    }

    pub fn predicate(&self) -> Option<&Predicate> {
        self.predicate.as_ref()
    }

    /// Whether this rule grants `action` on `object` to `subject`.
    ///
    /// Evaluated subject, then object, then action; the predicate runs last.
    pub fn grants(&self, subject: &dyn Subject, action: &Symbol, object: &AccessObject) -> bool {
        self.subject.matches(subject)
            && symbol_matches(&self.object, object.kind())
            && symbol_matches(&self.action, action)
            && self
                .predicate
                .as_ref()
                .is_none_or(|p| p.evaluate(subject, action, object))
    }
}

impl core::fmt::Display for Rule {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} may {} {}", self.subject, self.action, self.object)?;
        if self.predicate.is_some() {
            f.write_str(" (conditional)")?;
        }
        Ok(())
    }
}
