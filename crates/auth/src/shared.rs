use std::sync::{Arc, PoisonError, RwLock};

use warden_core::ConfigResult;

use crate::{PermissionSet, RuleOptions, SubjectMatcher};

/// Published permission set of one application instance.
///
/// Readers take an immutable snapshot; writers build a new set and swap it in, so a
/// request never observes a half-applied reconfiguration.
#[derive(Debug, Default)]
pub struct SharedPermissions {
    current: RwLock<Arc<PermissionSet>>,
}

impl SharedPermissions {
    pub fn new(initial: PermissionSet) -> Self {
        Self {
            current: RwLock::new(Arc::new(initial)),
        }
    }

    /// The set in effect right now.
    pub fn snapshot(&self) -> Arc<PermissionSet> {
        // The guarded value is only ever replaced whole, so a poisoned lock still
        // holds a consistent set.
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Replace the set wholesale.
    pub fn publish(&self, set: PermissionSet) {
        let rules = set.len();
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Arc::new(set);
        tracing::info!(rules, "permission set published");
    }

    /// Apply `change` to a copy of the current set and publish it if it succeeds.
    ///
    /// Writers are serialised; readers keep the previous snapshot until the swap.
    pub fn update<F>(&self, change: F) -> ConfigResult<()>
    where
        F: FnOnce(&mut PermissionSet) -> ConfigResult<()>,
    {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = PermissionSet::clone(&guard);
        change(&mut next)?;
        tracing::info!(rules = next.len(), "permission set published");
        *guard = Arc::new(next);
        Ok(())
    }

    pub fn reset_rules(&self) {
        self.publish(PermissionSet::new());
    }

    pub fn register_rule<I>(&self, subjects: I, options: RuleOptions) -> ConfigResult<usize>
    where
        I: IntoIterator<Item = SubjectMatcher>,
    {
        let mut added = 0;
        self.update(|set| {
            added = set.add(subjects, options)?;
            Ok(())
        })?;
        Ok(added)
    }
}
