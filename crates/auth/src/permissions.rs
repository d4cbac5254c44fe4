use std::collections::BTreeSet;

use serde::Serialize;

use warden_core::{ConfigError, ConfigResult, Symbol};

use crate::{AccessObject, Predicate, Role, Rule, Subject, SubjectMatcher};

/// Options of one registration call: the action and object matchers, plus an
/// optional predicate shared by every rule the call produces.
///
/// An empty `allow` list means any action. An empty `with` list means the
/// registration scope when one is given, otherwise any object.
#[derive(Debug, Clone, Default)]
pub struct RuleOptions {
    allow: Vec<Symbol>,
    with: Vec<Symbol>,
    predicate: Option<Predicate>,
}

impl RuleOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allow(mut self, action: impl Into<Symbol>) -> Self {
        self.allow.push(action.into());
        self
    }

    pub fn with(mut self, object: impl Into<Symbol>) -> Self {
        self.with.push(object.into());
        self
    }

    pub fn when(mut self, predicate: Predicate) -> Self {
        self.predicate = Some(predicate);
        self
    }

    /// Build options from loosely typed key/value pairs.
    ///
    /// Only `allow` and `with` are recognised; anything else is rejected.
    pub fn from_pairs<'a, I>(pairs: I) -> ConfigResult<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut options = Self::new();
        for (key, value) in pairs {
            let symbol = Symbol::parse(value.to_string())?;
            match key {
                "allow" => options.allow.push(symbol),
                "with" => options.with.push(symbol),
                other => return Err(ConfigError::UnsupportedOption(other.to_string())),
            }
        }
        Ok(options)
    }

    fn actions(&self) -> Vec<Symbol> {
        if self.allow.is_empty() {
            vec![Symbol::WILDCARD]
        } else {
            self.allow.clone()
        }
    }

    fn objects(&self, scope: Option<&Symbol>) -> Vec<Symbol> {
        match (self.with.is_empty(), scope) {
            (false, _) => self.with.clone(),
            (true, Some(scope)) => vec![scope.clone()],
            (true, None) => vec![Symbol::WILDCARD],
        }
    }
}

/// Object kinds a subject can reach, as reported by [`PermissionSet::find_objects`].
///
/// `all_objects` is set when some matching rule uses the wildcard object matcher;
/// the wildcard itself never appears in `objects`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AccessibleObjects {
    pub objects: BTreeSet<Symbol>,
    pub all_objects: bool,
}

impl AccessibleObjects {
    pub fn contains(&self, kind: &Symbol) -> bool {
        self.all_objects || self.objects.contains(kind)
    }
}

/// Ordered, grant-only collection of rules.
///
/// Checking is a pure function of the rules and its arguments. Mutation happens at
/// configuration time only; see [`crate::SharedPermissions`] for reloading under
/// traffic.
#[derive(Debug, Clone, Default)]
pub struct PermissionSet {
    rules: Vec<Rule>,
}

impl PermissionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Discard every rule.
    pub fn clear(&mut self) {
        tracing::debug!(discarded = self.rules.len(), "permission rules cleared");
        self.rules.clear();
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Append a prebuilt rule.
    pub fn push(&mut self, rule: Rule) {
        tracing::debug!(rule = %rule, "permission rule added");
        self.rules.push(rule);
    }

    /// Register rules for each subject.
    ///
    /// Every (subject, action, object) combination becomes an independent rule
    /// sharing the options' predicate. Returns the number of rules appended.
    pub fn add<I>(&mut self, subjects: I, options: RuleOptions) -> ConfigResult<usize>
    where
        I: IntoIterator<Item = SubjectMatcher>,
    {
        self.register(subjects, options, None)
    }

    /// Like [`add`](Self::add), with `scope` as the object matcher when the options
    /// name none (the "controller being declared" of the host).
    pub fn add_in<I>(&mut self, scope: &Symbol, subjects: I, options: RuleOptions) -> ConfigResult<usize>
    where
        I: IntoIterator<Item = SubjectMatcher>,
    {
        self.register(subjects, options, Some(scope))
    }

    fn register<I>(&mut self, subjects: I, options: RuleOptions, scope: Option<&Symbol>) -> ConfigResult<usize>
    where
        I: IntoIterator<Item = SubjectMatcher>,
    {
        let subjects: Vec<SubjectMatcher> = subjects.into_iter().collect();
        if subjects.is_empty() {
            return Err(ConfigError::MissingMatcher("subject"));
        }

        let actions = options.actions();
        let objects = options.objects(scope);

        let mut added = 0;
        for subject in &subjects {
            for object in &objects {
                for action in &actions {
                    let mut rule = Rule::new(subject.clone(), action.clone(), object.clone());
                    if let Some(predicate) = &options.predicate {
                        rule = rule.when(predicate.clone());
                    }
                    self.push(rule);
                    added += 1;
                }
            }
        }

        Ok(added)
    }

    /// Whether any rule grants `action` on `object` to `subject`.
    ///
    /// `extra` is ANDed onto every candidate rule, in addition to the rule's own
    /// predicate. Unknown subjects, actions or objects simply match nothing.
    pub fn check(
        &self,
        subject: &dyn Subject,
        action: &Symbol,
        object: &AccessObject,
        extra: Option<&Predicate>,
    ) -> bool {
        self.find_grant(subject, action, object, extra).is_some()
    }

    /// Index of the first rule that grants, if any.
    pub fn find_grant(
        &self,
        subject: &dyn Subject,
        action: &Symbol,
        object: &AccessObject,
        extra: Option<&Predicate>,
    ) -> Option<usize> {
        let found = self.rules.iter().position(|rule| {
            rule.grants(subject, action, object)
                && extra.is_none_or(|p| p.evaluate(subject, action, object))
        });

        tracing::debug!(
            action = %action,
            object = %object,
            granted_by = ?found,
            "permission check"
        );

        found
    }

    /// Whether `subject` holds any of `roles` according to the rules.
    ///
    /// A rule counts when its subject matcher accepts `subject` and is one of the
    /// requested roles. Requesting `"*"` also counts wildcard subject rules. Action,
    /// object and rule predicates play no part; `extra` is evaluated against the
    /// rule's own action and object kind.
    ///
    /// An `Any` rule never answers for a named role: the open login rule every
    /// controller registers would otherwise make everyone hold every role.
    pub fn check_role(&self, subject: &dyn Subject, roles: &[Role], extra: Option<&Predicate>) -> bool {
        let wants_any = roles.iter().any(Role::is_wildcard);

        self.rules.iter().any(|rule| {
            let requested = match rule.subject() {
                SubjectMatcher::Any => wants_any,
                SubjectMatcher::Role(role) => wants_any || roles.contains(role),
                SubjectMatcher::Identity(_) => false,
            };

            requested
                && rule.subject().matches(subject)
                && extra.is_none_or(|p| {
                    p.evaluate(subject, rule.action(), &AccessObject::new(rule.object().clone()))
                })
        })
    }

    /// Distinct object kinds reachable by `subject`.
    pub fn find_objects(&self, subject: &dyn Subject) -> AccessibleObjects {
        let mut found = AccessibleObjects::default();
        for rule in self.rules.iter().filter(|r| r.subject().matches(subject)) {
            if rule.object().is_wildcard() {
                found.all_objects = true;
            } else {
                found.objects.insert(rule.object().clone());
            }
        }
        found
    }
}
