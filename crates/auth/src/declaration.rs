//! Declarative rule sets (JSON).
//!
//! ```json
//! [
//!   { "subjects": "admin", "allow": "*", "with": "*" },
//!   { "subjects": ["clerk", "id:42"], "allow": ["view", "export"], "with": "invoice" }
//! ]
//! ```
//!
//! Predicates cannot be declared; register those in code.

use serde::Deserialize;
use serde_json::Value as JsonValue;

use warden_core::{ConfigError, ConfigResult, Symbol};

use crate::{PermissionSet, RuleOptions, SubjectMatcher};

const RECOGNISED_KEYS: [&str; 3] = ["subjects", "allow", "with"];

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> Default for OneOrMany<T> {
    fn default() -> Self {
        Self::Many(Vec::new())
    }
}

impl<T> OneOrMany<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            Self::One(v) => vec![v],
            Self::Many(vs) => vs,
        }
    }
}

/// One entry of a rule document.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleDeclaration {
    subjects: OneOrMany<String>,
    #[serde(default)]
    allow: OneOrMany<Symbol>,
    #[serde(default)]
    with: OneOrMany<Symbol>,
}

impl RuleDeclaration {
    /// Parse a JSON array of declarations.
    ///
    /// Unrecognised keys are reported by name before any typed parsing happens.
    pub fn parse_all(json: &str) -> ConfigResult<Vec<Self>> {
        let doc: JsonValue =
            serde_json::from_str(json).map_err(|e| ConfigError::malformed(e.to_string()))?;

        let entries = doc
            .as_array()
            .ok_or_else(|| ConfigError::malformed("expected an array of rule declarations"))?;

        for entry in entries {
            let fields = entry
                .as_object()
                .ok_or_else(|| ConfigError::malformed("rule declaration must be an object"))?;
            if let Some(key) = fields.keys().find(|k| !RECOGNISED_KEYS.contains(&k.as_str())) {
                return Err(ConfigError::UnsupportedOption(key.clone()));
            }
            if !fields.contains_key("subjects") {
                return Err(ConfigError::MissingMatcher("subject"));
            }
        }

        serde_json::from_value(doc).map_err(|e| ConfigError::malformed(e.to_string()))
    }

    fn subjects(&self) -> ConfigResult<Vec<SubjectMatcher>> {
        self.subjects
            .clone()
            .into_vec()
            .iter()
            .map(|s| SubjectMatcher::parse(s))
            .collect()
    }

    fn options(&self) -> RuleOptions {
        let mut options = RuleOptions::new();
        for action in self.allow.clone().into_vec() {
            options = options.allow(action);
        }
        for object in self.with.clone().into_vec() {
            options = options.with(object);
        }
        options
    }
}

impl PermissionSet {
    /// Register one declaration. Returns the number of rules appended.
    pub fn declare(&mut self, declaration: &RuleDeclaration) -> ConfigResult<usize> {
        self.add(declaration.subjects()?, declaration.options())
    }

    /// Parse and register a whole JSON rule document.
    ///
    /// Nothing is registered unless every declaration is valid.
    pub fn load_json(&mut self, json: &str) -> ConfigResult<usize> {
        let declarations = RuleDeclaration::parse_all(json)?;

        let mut staged = self.clone();
        let mut added = 0;
        for declaration in &declarations {
            added += staged.declare(declaration)?;
        }
        *self = staged;

        tracing::info!(declarations = declarations.len(), rules = added, "rule document loaded");
        Ok(added)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AccessObject, Anonymous, Role, Subject};
    use warden_core::IdentityRef;

    struct Clerk(IdentityRef, Vec<Role>);

    impl Subject for Clerk {
        fn identity(&self) -> Option<&IdentityRef> {
            Some(&self.0)
        }

        fn roles(&self) -> &[Role] {
            &self.1
        }
    }

    #[test]
    fn loads_single_and_list_forms() {
        let mut set = PermissionSet::new();
        let added = set
            .load_json(
                r#"[
                    { "subjects": "*", "with": "login" },
                    { "subjects": ["clerk", "id:42"], "allow": ["view", "export"], "with": "invoice" }
                ]"#,
            )
            .unwrap();
        assert_eq!(added, 5);

        let clerk = Clerk(IdentityRef::new("1"), vec![Role::new("clerk")]);
        let forty_two = Clerk(IdentityRef::new("42"), vec![]);
        let invoice = AccessObject::new("invoice");

        assert!(set.check(&clerk, &Symbol::from("export"), &invoice, None));
        assert!(set.check(&forty_two, &Symbol::from("view"), &invoice, None));
        assert!(!set.check(&forty_two, &Symbol::from("delete"), &invoice, None));
        assert!(set.check(&Anonymous, &Symbol::from("submit"), &AccessObject::new("login"), None));
    }

    #[test]
    fn unknown_key_is_rejected_by_name() {
        let mut set = PermissionSet::new();
        let err = set
            .load_json(r#"[{ "subjects": "admin", "deny": "delete" }]"#)
            .unwrap_err();
        assert_eq!(err, ConfigError::UnsupportedOption("deny".to_string()));
        assert!(set.is_empty());
    }

    #[test]
    fn missing_subjects_and_bad_symbols_fail() {
        let mut set = PermissionSet::new();
        assert_eq!(
            set.load_json(r#"[{ "allow": "view" }]"#).unwrap_err(),
            ConfigError::MissingMatcher("subject")
        );
        assert!(set.load_json(r#"[{ "subjects": "admin", "allow": "" }]"#).is_err());
        assert!(set.load_json(r#"[{ "subjects": [] }]"#).is_err());
        assert!(set.load_json(r#"{ "subjects": "admin" }"#).is_err());
    }

    #[test]
    fn failed_document_leaves_set_untouched() {
        let mut set = PermissionSet::new();
        set.load_json(r#"[{ "subjects": "admin" }]"#).unwrap();

        let result = set.load_json(r#"[{ "subjects": "ops" }, { "subjects": "" }]"#);
        assert!(result.is_err());
        assert_eq!(set.len(), 1);
    }
}
