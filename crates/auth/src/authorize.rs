//! Request-boundary access gate.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use warden_core::Symbol;

use crate::{AccessObject, AccessibleObjects, PermissionSet, Predicate, Role, Subject, SubjectSnapshot};

/// Outcome of one (subject, action, object) check.
///
/// Kept so the host can log or render why a request was refused. The response to
/// the caller must not expose it.
#[derive(Debug, Clone, Serialize)]
pub struct AccessDecision {
    pub subject: SubjectSnapshot,
    pub action: Symbol,
    pub object: AccessObject,
    pub granted: bool,
    /// Position of the granting rule in the set, when granted.
    pub granted_by: Option<usize>,
    pub decided_at: DateTime<Utc>,
}

impl AccessDecision {
    pub fn into_result(self) -> Result<AccessDecision, AuthzError> {
        if self.granted {
            Ok(self)
        } else {
            Err(AuthzError::Forbidden(Box::new(self)))
        }
    }
}

#[derive(Debug, Error, Clone)]
pub enum AuthzError {
    #[error("forbidden: {} may not {} {}", .0.subject, .0.action, .0.object)]
    Forbidden(Box<AccessDecision>),
}

impl AuthzError {
    pub fn decision(&self) -> &AccessDecision {
        match self {
            Self::Forbidden(decision) => decision,
        }
    }
}

/// Check a triple against a permission set and return the decision.
///
/// - No IO
/// - No panics
pub fn authorize(
    permissions: &PermissionSet,
    subject: &dyn Subject,
    action: &Symbol,
    object: &AccessObject,
) -> Result<AccessDecision, AuthzError> {
    decide(permissions, subject, action, object, None).into_result()
}

fn decide(
    permissions: &PermissionSet,
    subject: &dyn Subject,
    action: &Symbol,
    object: &AccessObject,
    extra: Option<&Predicate>,
) -> AccessDecision {
    let granted_by = permissions.find_grant(subject, action, object, extra);
    AccessDecision {
        subject: SubjectSnapshot::of(subject),
        action: action.clone(),
        object: object.clone(),
        granted: granted_by.is_some(),
        granted_by,
        decided_at: Utc::now(),
    }
}

/// Per-request wrapper around a permission snapshot.
///
/// Holds the last decision for diagnostics; create one per request rather than
/// sharing it.
#[derive(Debug)]
pub struct AccessGate {
    permissions: Arc<PermissionSet>,
    last: Option<AccessDecision>,
}

impl AccessGate {
    pub fn new(permissions: Arc<PermissionSet>) -> Self {
        Self {
            permissions,
            last: None,
        }
    }

    pub fn evaluate(&mut self, subject: &dyn Subject, action: &Symbol, object: &AccessObject) -> AccessDecision {
        self.evaluate_with(subject, action, object, None)
    }

    /// Evaluate with a caller-supplied predicate ANDed onto the rules.
    pub fn evaluate_with(
        &mut self,
        subject: &dyn Subject,
        action: &Symbol,
        object: &AccessObject,
        extra: Option<&Predicate>,
    ) -> AccessDecision {
        let decision = decide(&self.permissions, subject, action, object, extra);
        if !decision.granted {
            tracing::warn!(
                subject = %decision.subject,
                action = %decision.action,
                object = %decision.object,
                "access denied"
            );
        }
        self.last = Some(decision.clone());
        decision
    }

    /// The most recent decision, granted or not.
    pub fn last_decision(&self) -> Option<&AccessDecision> {
        self.last.as_ref()
    }

    /// The most recent decision if it was a denial.
    pub fn requirements(&self) -> Option<&AccessDecision> {
        self.last.as_ref().filter(|d| !d.granted)
    }

    pub fn check_role(&self, subject: &dyn Subject, roles: &[Role]) -> bool {
        self.permissions.check_role(subject, roles, None)
    }

    pub fn accessible_objects(&self, subject: &dyn Subject) -> AccessibleObjects {
        self.permissions.find_objects(subject)
    }
}
