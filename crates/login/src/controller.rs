//! Authentication session state machine.
//!
//! Host lifecycle:
//! - before every request: [`AuthenticationController::gate`]
//! - on login submission: [`AuthenticationController::submit_login`] (or
//!   [`authenticate`](AuthenticationController::authenticate) followed by
//!   [`restore_location`](AuthenticationController::restore_location))
//!
//! Each step finishes before the next one starts; nothing here retries.

use std::sync::Arc;

use serde::Serialize;

use warden_auth::{
    AccessDecision, AccessGate, Anonymous, PermissionSet, RuleOptions, SharedPermissions, SubjectMatcher,
};
use warden_core::{ConfigError, ConfigResult, IdentityRef, Symbol};

use crate::location::navigational_target;
use crate::{Account, CredentialStore, Criteria, LoginConfig, LoginError, LoginForm, RequestContext, SessionStore};

/// Object symbol of the login controller; registered as open to everyone.
pub const LOGIN_OBJECT: Symbol = Symbol::from_static("login");

/// Session key of the saved return-to location.
pub const RETURN_TO_KEY: &str = "return_to";

/// Add the rule that keeps the login controller reachable by anyone.
pub fn open_login_rule(set: &mut PermissionSet) -> ConfigResult<usize> {
    set.add([SubjectMatcher::Any], RuleOptions::new().allow("*").with(LOGIN_OBJECT))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthState {
    Anonymous,
    Authenticated,
    AuthenticatedButUnauthorized,
}

/// Why a request stops at the gate.
#[derive(Debug, Clone)]
pub enum Halt {
    /// 401: anonymous caller on a gated target. The host redirects to `location`.
    AuthenticationRequired {
        location: String,
        decision: AccessDecision,
    },
    /// 403: valid credentials, insufficient permissions. Never redirected.
    AuthorizationDenied(AccessDecision),
}

impl Halt {
    pub fn status(&self) -> u16 {
        match self {
            Self::AuthenticationRequired { .. } => 401,
            Self::AuthorizationDenied(_) => 403,
        }
    }

    pub fn redirect_location(&self) -> Option<&str> {
        match self {
            Self::AuthenticationRequired { location, .. } => Some(location),
            Self::AuthorizationDenied(_) => None,
        }
    }

    pub fn decision(&self) -> &AccessDecision {
        match self {
            Self::AuthenticationRequired { decision, .. } => decision,
            Self::AuthorizationDenied(decision) => decision,
        }
    }

    pub fn state(&self) -> AuthState {
        match self {
            Self::AuthenticationRequired { .. } => AuthState::Anonymous,
            Self::AuthorizationDenied(_) => AuthState::AuthenticatedButUnauthorized,
        }
    }
}

/// Result of running the gate for one request.
#[derive(Debug, Clone)]
pub enum Outcome {
    Proceed {
        state: AuthState,
        decision: AccessDecision,
    },
    Halt(Halt),
}

impl Outcome {
    pub fn state(&self) -> AuthState {
        match self {
            Self::Proceed { state, .. } => *state,
            Self::Halt(halt) => halt.state(),
        }
    }

    pub fn is_proceed(&self) -> bool {
        matches!(self, Self::Proceed { .. })
    }

    pub fn halt(&self) -> Option<&Halt> {
        match self {
            Self::Proceed { .. } => None,
            Self::Halt(halt) => Some(halt),
        }
    }
}

/// Result of a login submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// Authenticated; send the caller here.
    Redirect(String),
    /// Credentials not accepted; the session was not touched.
    Rejected,
}

/// Orchestrates identity resolution, gating and the login redirect flow for one
/// application instance.
pub struct AuthenticationController<C> {
    config: LoginConfig,
    permissions: Arc<SharedPermissions>,
    credentials: C,
}

impl<C> AuthenticationController<C>
where
    C: CredentialStore,
{
    /// Validate the configuration and open the login controller to everyone.
    pub fn new(config: LoginConfig, permissions: Arc<SharedPermissions>, credentials: C) -> ConfigResult<Self> {
        config.validate()?;
        if credentials.model() != config.login_model {
            return Err(ConfigError::invalid_value(
                "login_model",
                format!(
                    "configured '{}' but the credential store resolves '{}'",
                    config.login_model,
                    credentials.model()
                ),
            ));
        }

        let controller = Self {
            config,
            permissions,
            credentials,
        };
        controller.open_login()?;
        Ok(controller)
    }

    /// Register `* may * login` on the shared set. Called again by hosts after
    /// resetting rules.
    pub fn open_login(&self) -> ConfigResult<()> {
        self.permissions.update(|set| open_login_rule(set).map(|_| ()))
    }

    pub fn config(&self) -> &LoginConfig {
        &self.config
    }

    pub fn permissions(&self) -> &Arc<SharedPermissions> {
        &self.permissions
    }

    pub fn credential_store(&self) -> &C {
        &self.credentials
    }

    /// Resolve the caller, first hit wins: identity already on the request, then the
    /// session token, then (bypass mode only) an explicit bypass request.
    pub async fn resolve_identity<S>(
        &self,
        ctx: &mut RequestContext<C::Account>,
        session: &mut S,
    ) -> Result<Option<C::Account>, LoginError>
    where
        S: SessionStore + ?Sized,
    {
        if let Some(account) = ctx.credentials() {
            return Ok(Some(account.clone()));
        }

        if let Some(account) = self.restore_credentials(ctx, session).await? {
            return Ok(Some(account));
        }

        if self.config.login_bypass && ctx.bypass_requested() {
            if let Some(account) = self.lookup(&Criteria::Bypass).await? {
                tracing::warn!(identity = %account.identity_ref(), "identity resolved through login bypass");
                self.save_credentials(&account, ctx, session).await?;
                return Ok(Some(account));
            }
        }

        Ok(None)
    }

    pub async fn logged_in<S>(&self, ctx: &mut RequestContext<C::Account>, session: &mut S) -> Result<bool, LoginError>
    where
        S: SessionStore + ?Sized,
    {
        Ok(self.resolve_identity(ctx, session).await?.is_some())
    }

    /// Look up the identity referenced by the session and attach it to the request.
    pub async fn restore_credentials<S>(
        &self,
        ctx: &mut RequestContext<C::Account>,
        session: &mut S,
    ) -> Result<Option<C::Account>, LoginError>
    where
        S: SessionStore + ?Sized,
    {
        let Some(token) = session
            .get(&self.config.session_key)
            .await
            .map_err(LoginError::Session)?
        else {
            return Ok(None);
        };

        let account = self.lookup(&Criteria::SessionToken(IdentityRef::new(token))).await?;
        if let Some(account) = &account {
            ctx.set_credentials(account.clone());
        }
        Ok(account)
    }

    /// Store the identity reference in the session and expose the identity on the
    /// request.
    pub async fn save_credentials<S>(
        &self,
        account: &C::Account,
        ctx: &mut RequestContext<C::Account>,
        session: &mut S,
    ) -> Result<(), LoginError>
    where
        S: SessionStore + ?Sized,
    {
        let identity = account.identity_ref();
        session
            .set(&self.config.session_key, identity.to_string())
            .await
            .map_err(LoginError::Session)?;
        ctx.set_credentials(account.clone());

        tracing::info!(
            identity = %identity,
            accessor = %self.config.credentials_accessor,
            "credentials saved"
        );
        Ok(())
    }

    /// Verify a login submission: password first, then bypass when enabled and
    /// requested. Only a success mutates the session.
    pub async fn authenticate<S>(
        &self,
        form: &LoginForm,
        ctx: &mut RequestContext<C::Account>,
        session: &mut S,
    ) -> Result<Option<C::Account>, LoginError>
    where
        S: SessionStore + ?Sized,
    {
        let mut account = self
            .lookup(&Criteria::Password {
                email: form.email.clone(),
                password: form.password.clone(),
            })
            .await?;

        if account.is_none() && self.config.login_bypass && form.bypass_requested() {
            account = self.lookup(&Criteria::Bypass).await?;
            if account.is_some() {
                tracing::warn!("login accepted through bypass");
            }
        }

        match account {
            Some(account) => {
                self.save_credentials(&account, ctx, session).await?;
                Ok(Some(account))
            }
            None => {
                tracing::info!(email = %form.email, "login rejected");
                Ok(None)
            }
        }
    }

    /// Consume the saved return-to location, falling back to the landing URL.
    pub async fn restore_location<S>(&self, session: &mut S) -> Result<String, LoginError>
    where
        S: SessionStore + ?Sized,
    {
        let saved = session.delete(RETURN_TO_KEY).await.map_err(LoginError::Session)?;
        Ok(saved.unwrap_or_else(|| self.config.url(&self.config.landing_url)))
    }

    /// `authenticate`, then `restore_location` on success.
    pub async fn submit_login<S>(
        &self,
        form: &LoginForm,
        ctx: &mut RequestContext<C::Account>,
        session: &mut S,
    ) -> Result<LoginOutcome, LoginError>
    where
        S: SessionStore + ?Sized,
    {
        match self.authenticate(form, ctx, session).await? {
            Some(_) => Ok(LoginOutcome::Redirect(self.restore_location(session).await?)),
            None => Ok(LoginOutcome::Rejected),
        }
    }

    /// Before-request hook: resolve the caller, then ask the permission set.
    pub async fn gate<S>(&self, ctx: &mut RequestContext<C::Account>, session: &mut S) -> Result<Outcome, LoginError>
    where
        S: SessionStore + ?Sized,
    {
        let identity = self.resolve_identity(ctx, session).await?;

        let action = ctx.action();
        let object = ctx.object();
        let mut gate = AccessGate::new(self.permissions.snapshot());

        let Some(account) = identity else {
            let decision = gate.evaluate(&Anonymous, &action, &object);
            if decision.granted {
                return Ok(Outcome::Proceed {
                    state: AuthState::Anonymous,
                    decision,
                });
            }
            return Ok(self.log_in(ctx, session, decision).await);
        };

        let decision = gate.evaluate(&account, &action, &object);
        if decision.granted {
            Ok(Outcome::Proceed {
                state: AuthState::Authenticated,
                decision,
            })
        } else {
            Ok(Outcome::Halt(Halt::AuthorizationDenied(decision)))
        }
    }

    /// Anonymous denial: remember where the caller was going and send them to the
    /// login page. Requests for the login page itself pass through.
    pub async fn log_in<S>(
        &self,
        ctx: &RequestContext<C::Account>,
        session: &mut S,
        decision: AccessDecision,
    ) -> Outcome
    where
        S: SessionStore + ?Sized,
    {
        if ctx.path() == self.config.login_url {
            return Outcome::Proceed {
                state: AuthState::Anonymous,
                decision,
            };
        }

        self.save_location(ctx, session).await;
        Outcome::Halt(Halt::AuthenticationRequired {
            location: self.config.url(&self.config.login_url),
            decision,
        })
    }

    /// Best effort: any failure is logged and swallowed.
    pub async fn save_location<S>(&self, ctx: &RequestContext<C::Account>, session: &mut S)
    where
        S: SessionStore + ?Sized,
    {
        let target = ctx
            .request_uri()
            .filter(|uri| !uri.trim().is_empty())
            .unwrap_or(ctx.path());
        if target.trim().is_empty() {
            return;
        }

        let location = match navigational_target(target) {
            Ok(Some(location)) => self.config.url(&location),
            Ok(None) => return,
            Err(e) => {
                tracing::warn!(error = %e, "saving return-to location skipped");
                return;
            }
        };

        if let Err(e) = session.set(RETURN_TO_KEY, location).await {
            tracing::warn!(error = %e, "saving return-to location failed");
        }
    }

    async fn lookup(&self, criteria: &Criteria) -> Result<Option<C::Account>, LoginError> {
        self.credentials
            .authenticate(criteria)
            .await
            .map_err(LoginError::CredentialLookup)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use warden_auth::{AccessObject, Role, Subject};

    use super::*;
    use crate::StoreError;

    #[derive(Debug, Clone, PartialEq)]
    struct Member {
        id: IdentityRef,
        email: String,
        roles: Vec<Role>,
    }

    impl Subject for Member {
        fn identity(&self) -> Option<&IdentityRef> {
            Some(&self.id)
        }

        fn roles(&self) -> &[Role] {
            &self.roles
        }
    }

    impl Account for Member {
        fn identity_ref(&self) -> IdentityRef {
            self.id.clone()
        }
    }

    #[derive(Default)]
    struct Members {
        accounts: Vec<(Member, String)>,
        bypass: Option<Member>,
        fail: bool,
        lookups: Mutex<Vec<Criteria>>,
    }

    #[async_trait]
    impl CredentialStore for Members {
        type Account = Member;

        fn model(&self) -> &str {
            "account"
        }

        async fn authenticate(&self, criteria: &Criteria) -> Result<Option<Member>, StoreError> {
            self.lookups.lock().unwrap().push(criteria.clone());
            if self.fail {
                return Err(StoreError::unavailable("database down"));
            }
            Ok(match criteria {
                Criteria::Password { email, password } => self
                    .accounts
                    .iter()
                    .find(|(m, p)| &m.email == email && p == password)
                    .map(|(m, _)| m.clone()),
                Criteria::SessionToken(id) => self
                    .accounts
                    .iter()
                    .find(|(m, _)| &m.id == id)
                    .map(|(m, _)| m.clone()),
                Criteria::Bypass => self.bypass.clone(),
            })
        }
    }

    #[derive(Default)]
    struct Session {
        values: HashMap<String, String>,
        writes: Vec<String>,
        fail_writes: bool,
    }

    #[async_trait]
    impl SessionStore for Session {
        async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
            Ok(self.values.get(key).cloned())
        }

        async fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
            if self.fail_writes {
                return Err(StoreError::unavailable("session backend down"));
            }
            self.writes.push(key.to_string());
            self.values.insert(key.to_string(), value);
            Ok(())
        }

        async fn delete(&mut self, key: &str) -> Result<Option<String>, StoreError> {
            Ok(self.values.remove(key))
        }
    }

    fn member(id: &str, roles: &[&'static str]) -> Member {
        Member {
            id: IdentityRef::new(id),
            email: format!("{id}@example.com"),
            roles: roles.iter().map(|r| Role::new(*r)).collect(),
        }
    }

    fn store() -> Members {
        Members {
            accounts: vec![
                (member("ada", &["admin"]), "secret".to_string()),
                (member("gus", &["guest"]), "hunter2".to_string()),
            ],
            bypass: Some(member("dev", &["admin"])),
            ..Members::default()
        }
    }

    fn controller_with(config: LoginConfig, store: Members) -> AuthenticationController<Members> {
        let permissions = Arc::new(SharedPermissions::default());
        permissions
            .register_rule(
                [SubjectMatcher::role("admin")],
                RuleOptions::new().allow("*").with("*"),
            )
            .unwrap();
        permissions
            .register_rule([SubjectMatcher::Any], RuleOptions::new().allow("view").with("news"))
            .unwrap();
        AuthenticationController::new(config, permissions, store).unwrap()
    }

    fn controller() -> AuthenticationController<Members> {
        controller_with(LoginConfig::new("shop"), store())
    }

    fn invoices_request() -> RequestContext<Member> {
        RequestContext::new("/invoices/7")
            .with_request_uri("/invoices/7?tab=lines")
            .with_action("delete")
            .with_object(AccessObject::new("invoice").with_id("7"))
    }

    #[test]
    fn model_mismatch_is_a_config_error() {
        let permissions = Arc::new(SharedPermissions::default());
        let config = LoginConfig::new("shop").with_login_model("user");
        let err = AuthenticationController::new(config, permissions, store()).err().unwrap();
        assert!(matches!(err, ConfigError::InvalidValue { key: "login_model", .. }));
    }

    #[tokio::test]
    async fn anonymous_denial_saves_location_once_and_redirects() {
        let controller = controller();
        let mut session = Session::default();
        let mut ctx = invoices_request();

        let outcome = controller.gate(&mut ctx, &mut session).await.unwrap();

        let halt = outcome.halt().unwrap();
        assert_eq!(halt.status(), 401);
        assert_eq!(halt.redirect_location(), Some("/login"));
        assert_eq!(outcome.state(), AuthState::Anonymous);
        assert_eq!(session.writes, vec![RETURN_TO_KEY.to_string()]);
        assert_eq!(session.values[RETURN_TO_KEY], "/invoices/7?tab=lines");
    }

    #[tokio::test]
    async fn static_asset_never_becomes_return_target() {
        let controller = controller();
        let mut session = Session::default();
        let mut ctx = RequestContext::new("/assets/site.css")
            .with_request_uri("/assets/site.css?v=12")
            .with_action("view")
            .with_object("assets");

        let outcome = controller.gate(&mut ctx, &mut session).await.unwrap();

        assert_eq!(outcome.halt().unwrap().redirect_location(), Some("/login"));
        assert!(session.values.get(RETURN_TO_KEY).is_none());
    }

    #[tokio::test]
    async fn dot_segment_targets_return_to_a_local_path() {
        let controller = controller();

        for (target, expected) in [
            ("/.//evil.example/phish", "/evil.example/phish"),
            ("/reports/..//evil.example", "/evil.example"),
        ] {
            let mut session = Session::default();
            let mut ctx = RequestContext::new(target)
                .with_request_uri(target)
                .with_action("view")
                .with_object("reports");

            controller.gate(&mut ctx, &mut session).await.unwrap();
            assert_eq!(session.values[RETURN_TO_KEY], expected);

            let form = LoginForm::new("gus@example.com", "hunter2");
            let mut login_ctx = RequestContext::new("/login");
            let outcome = controller
                .submit_login(&form, &mut login_ctx, &mut session)
                .await
                .unwrap();
            assert_eq!(outcome, LoginOutcome::Redirect(expected.to_string()));
        }
    }

    #[tokio::test]
    async fn malformed_location_or_failing_session_still_redirects() {
        let controller = controller();

        let mut session = Session::default();
        let mut ctx = RequestContext::new("/reports")
            .with_request_uri("/reports\u{7f}")
            .with_action("view")
            .with_object("report");
        let outcome = controller.gate(&mut ctx, &mut session).await.unwrap();
        assert_eq!(outcome.halt().unwrap().status(), 401);
        assert!(session.writes.is_empty());

        let mut session = Session {
            fail_writes: true,
            ..Session::default()
        };
        let mut ctx = invoices_request();
        let outcome = controller.gate(&mut ctx, &mut session).await.unwrap();
        assert_eq!(outcome.halt().unwrap().redirect_location(), Some("/login"));
    }

    #[tokio::test]
    async fn missing_request_uri_falls_back_to_path() {
        let controller = controller_with(LoginConfig::new("shop").with_base_uri("/shop"), store());
        let mut session = Session::default();
        let mut ctx = RequestContext::new("/reports/2").with_action("view").with_object("report");

        let outcome = controller.gate(&mut ctx, &mut session).await.unwrap();

        assert_eq!(outcome.halt().unwrap().redirect_location(), Some("/shop/login"));
        assert_eq!(session.values[RETURN_TO_KEY], "/shop/reports/2");
    }

    #[tokio::test]
    async fn login_page_is_always_reachable() {
        let controller = controller();
        let mut session = Session::default();
        let mut ctx = RequestContext::new("/login").with_action("view").with_object(LOGIN_OBJECT);

        let outcome = controller.gate(&mut ctx, &mut session).await.unwrap();

        assert!(outcome.is_proceed());
        assert_eq!(outcome.state(), AuthState::Anonymous);
        assert!(session.writes.is_empty());
    }

    #[tokio::test]
    async fn login_path_passes_even_when_unclassified() {
        let controller = controller();
        let mut session = Session::default();
        let mut ctx = RequestContext::new("/login").with_action("create").with_object("sessions");

        let outcome = controller.gate(&mut ctx, &mut session).await.unwrap();

        assert!(outcome.is_proceed());
        assert!(session.writes.is_empty());
    }

    #[tokio::test]
    async fn open_targets_pass_anonymously() {
        let controller = controller();
        let mut session = Session::default();
        let mut ctx = RequestContext::new("/news").with_action("view").with_object("news");

        let outcome = controller.gate(&mut ctx, &mut session).await.unwrap();
        assert!(outcome.is_proceed());
        assert!(session.writes.is_empty());
    }

    #[tokio::test]
    async fn login_then_restore_location_round_trip() {
        let controller = controller();
        let mut session = Session::default();

        let mut ctx = RequestContext::new("/dashboard").with_action("view").with_object("dashboard");
        controller.gate(&mut ctx, &mut session).await.unwrap();
        assert_eq!(session.values[RETURN_TO_KEY], "/dashboard");

        let mut login_ctx = RequestContext::new("/login");
        let outcome = controller
            .submit_login(&LoginForm::new("ada@example.com", "secret"), &mut login_ctx, &mut session)
            .await
            .unwrap();

        assert_eq!(outcome, LoginOutcome::Redirect("/dashboard".to_string()));
        assert!(!session.values.contains_key(RETURN_TO_KEY));
        assert_eq!(session.values["shop"], "ada");
        assert_eq!(login_ctx.credentials().unwrap().email, "ada@example.com");

        let again = controller.restore_location(&mut session).await.unwrap();
        assert_eq!(again, "/");
    }

    #[tokio::test]
    async fn rejected_login_leaves_session_untouched() {
        let controller = controller();
        let mut session = Session::default();
        let mut ctx = RequestContext::new("/login");

        let outcome = controller
            .submit_login(&LoginForm::new("ada@example.com", "wrong"), &mut ctx, &mut session)
            .await
            .unwrap();

        assert_eq!(outcome, LoginOutcome::Rejected);
        assert!(session.writes.is_empty());
        assert!(ctx.credentials().is_none());
    }

    #[tokio::test]
    async fn session_restores_identity_on_later_requests() {
        let controller = controller();
        let mut session = Session::default();
        session.values.insert("shop".to_string(), "ada".to_string());

        let mut ctx = invoices_request();
        let outcome = controller.gate(&mut ctx, &mut session).await.unwrap();

        assert_eq!(outcome.state(), AuthState::Authenticated);
        assert_eq!(ctx.credentials().unwrap().id, IdentityRef::new("ada"));
        assert!(session.writes.is_empty());
    }

    #[tokio::test]
    async fn authenticated_but_unauthorized_is_403_without_redirect() {
        let controller = controller();
        let mut session = Session::default();
        session.values.insert("shop".to_string(), "gus".to_string());

        let mut ctx = invoices_request();
        let outcome = controller.gate(&mut ctx, &mut session).await.unwrap();

        let halt = outcome.halt().unwrap();
        assert_eq!(halt.status(), 403);
        assert_eq!(halt.redirect_location(), None);
        assert_eq!(outcome.state(), AuthState::AuthenticatedButUnauthorized);
        assert_eq!(halt.decision().action, Symbol::from("delete"));
        assert!(!session.values.contains_key(RETURN_TO_KEY));
    }

    #[tokio::test]
    async fn cached_request_identity_skips_lookups() {
        let controller = controller();
        let mut session = Session::default();
        let mut ctx = invoices_request();
        ctx.set_credentials(member("ada", &["admin"]));

        let outcome = controller.gate(&mut ctx, &mut session).await.unwrap();

        assert_eq!(outcome.state(), AuthState::Authenticated);
        assert!(controller.credential_store().lookups.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn bypass_is_inert_when_disabled() {
        let controller = controller();
        let mut session = Session::default();

        let mut ctx = invoices_request().with_bypass(true);
        let outcome = controller.gate(&mut ctx, &mut session).await.unwrap();
        assert_eq!(outcome.halt().unwrap().status(), 401);

        let mut login_ctx = RequestContext::new("/login");
        let outcome = controller
            .submit_login(&LoginForm::bypass(), &mut login_ctx, &mut session)
            .await
            .unwrap();
        assert_eq!(outcome, LoginOutcome::Rejected);

        let lookups = controller.credential_store().lookups.lock().unwrap();
        assert!(!lookups.contains(&Criteria::Bypass));
    }

    #[tokio::test]
    async fn bypass_authenticates_when_enabled_and_requested() {
        let controller = controller_with(LoginConfig::new("shop").with_bypass(true), store());

        let mut session = Session::default();
        let mut ctx = invoices_request();
        let outcome = controller.gate(&mut ctx, &mut session).await.unwrap();
        assert_eq!(outcome.halt().unwrap().status(), 401);

        let mut session = Session::default();
        let mut ctx = invoices_request().with_bypass(true);
        let outcome = controller.gate(&mut ctx, &mut session).await.unwrap();
        assert_eq!(outcome.state(), AuthState::Authenticated);
        assert_eq!(session.values["shop"], "dev");

        let mut session = Session::default();
        let mut login_ctx = RequestContext::new("/login");
        let outcome = controller
            .submit_login(&LoginForm::bypass(), &mut login_ctx, &mut session)
            .await
            .unwrap();
        assert_eq!(outcome, LoginOutcome::Redirect("/".to_string()));
    }

    #[tokio::test]
    async fn credential_store_failure_propagates() {
        let failing = Members {
            fail: true,
            ..store()
        };
        let controller = controller_with(LoginConfig::new("shop"), failing);
        let mut session = Session::default();
        session.values.insert("shop".to_string(), "ada".to_string());

        let mut ctx = invoices_request();
        let err = controller.gate(&mut ctx, &mut session).await.unwrap_err();
        assert!(matches!(err, LoginError::CredentialLookup(StoreError::Unavailable(_))));
    }

    #[tokio::test]
    async fn unknown_session_token_stays_anonymous() {
        let controller = controller();
        let mut session = Session::default();
        session.values.insert("shop".to_string(), "deleted-user".to_string());

        let mut ctx = RequestContext::new("/news").with_action("view").with_object("news");
        assert!(!controller.logged_in(&mut ctx, &mut session).await.unwrap());
    }

    #[tokio::test]
    async fn hot_reset_takes_effect_on_next_request() {
        let controller = controller();
        let mut session = Session::default();
        session.values.insert("shop".to_string(), "ada".to_string());

        controller.permissions().reset_rules();
        controller.open_login().unwrap();

        let mut ctx = invoices_request();
        let outcome = controller.gate(&mut ctx, &mut session).await.unwrap();
        assert_eq!(outcome.halt().unwrap().status(), 403);
    }
}
