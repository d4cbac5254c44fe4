//! Wiring: credential store, session store, permission set and controller.

use std::collections::HashMap;
use std::sync::Arc;

use warden_auth::{PermissionSet, Predicate, Role, RuleOptions, SharedPermissions, SubjectMatcher};
use warden_core::{ConfigResult, IdentityRef, Symbol};
use warden_infra::{InMemoryCredentialStore, InMemorySessionStore};
use warden_login::{AuthenticationController, CredentialStore, LoginConfig};

use crate::account::UserAccount;

pub const REPORT_OBJECT: Symbol = Symbol::from_static("report");

pub type DemoCredentials = InMemoryCredentialStore<UserAccount>;
pub type Credentials = Arc<dyn CredentialStore<Account = UserAccount>>;
pub type Controller = AuthenticationController<Credentials>;

/// Report id to owner, for the ownership-gated report routes.
pub type ReportOwners = HashMap<String, IdentityRef>;

#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<Controller>,
    pub sessions: InMemorySessionStore,
    pub reports: Arc<ReportOwners>,
}

impl AppState {
    pub fn config(&self) -> &LoginConfig {
        self.controller.config()
    }
}

/// Rules the demo application starts with.
///
/// - everyone may view `health`
/// - `member` may view `home`, `whoami` and `reports`
/// - anyone may read a `report` they own
/// - `admin` may do anything
pub fn register_demo_rules(set: &mut PermissionSet) -> ConfigResult<usize> {
    let mut added = set.add([SubjectMatcher::Any], RuleOptions::new().allow("view").with("health"))?;
    added += set.add(
        [SubjectMatcher::role("member")],
        RuleOptions::new()
            .allow("view")
            .with("home")
            .with("whoami")
            .with("reports"),
    )?;
    added += set.add_in(
        &REPORT_OBJECT,
        [SubjectMatcher::Any],
        RuleOptions::new().allow("read").when(Predicate::owner()),
    )?;
    added += set.add([SubjectMatcher::role("admin")], RuleOptions::new())?;
    Ok(added)
}

/// Demo accounts: `ada@example.com` (admin) and `gus@example.com` (member), both
/// with password `secret`. Ada is the bypass account.
pub fn demo_credentials(model: &str) -> anyhow::Result<DemoCredentials> {
    let store = DemoCredentials::new(model);
    store.insert(
        "ada@example.com",
        "secret",
        UserAccount::new("u1", "ada@example.com", "Ada", vec![Role::new("admin"), Role::new("member")]),
    )?;
    store.insert(
        "gus@example.com",
        "secret",
        UserAccount::new("u2", "gus@example.com", "Gus", vec![Role::new("member")]),
    )?;
    store.set_bypass_account("ada@example.com")?;
    Ok(store)
}

pub fn demo_reports() -> ReportOwners {
    HashMap::from([
        ("1".to_string(), IdentityRef::new("u1")),
        ("2".to_string(), IdentityRef::new("u2")),
    ])
}

pub fn build_services(config: LoginConfig) -> anyhow::Result<AppState> {
    let credentials = Arc::new(demo_credentials(&config.login_model)?);
    build_services_with(config, credentials)
}

/// Same wiring as [`build_services`] over a caller-supplied credential store.
pub fn build_services_with(config: LoginConfig, credentials: Credentials) -> anyhow::Result<AppState> {
    let mut rules = PermissionSet::new();
    let count = register_demo_rules(&mut rules)?;
    let permissions = Arc::new(SharedPermissions::new(rules));

    let controller = Controller::new(config, permissions, credentials)?;

    tracing::info!(rules = count, app = %controller.config().session_key, "services ready");

    Ok(AppState {
        controller: Arc::new(controller),
        sessions: InMemorySessionStore::new(),
        reports: Arc::new(demo_reports()),
    })
}
