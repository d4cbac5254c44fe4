use serde::Deserialize;

use warden_auth::AccessObject;
use warden_core::Symbol;

/// What the gate needs to know about the current request.
///
/// The host maps its routing onto `action` and `object`; requests it leaves
/// unclassified only match wildcard rules.
#[derive(Debug, Clone)]
pub struct RequestContext<A> {
    path: String,
    request_uri: Option<String>,
    action: Option<Symbol>,
    object: Option<AccessObject>,
    bypass_requested: bool,
    credentials: Option<A>,
}

impl<A> RequestContext<A> {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            request_uri: None,
            action: None,
            object: None,
            bypass_requested: false,
            credentials: None,
        }
    }

    /// Raw request target, query string included.
    pub fn with_request_uri(mut self, uri: impl Into<String>) -> Self {
        self.request_uri = Some(uri.into());
        self
    }

    pub fn with_action(mut self, action: impl Into<Symbol>) -> Self {
        self.action = Some(action.into());
        self
    }

    pub fn with_object(mut self, object: impl Into<AccessObject>) -> Self {
        self.object = Some(object.into());
        self
    }

    pub fn with_bypass(mut self, requested: bool) -> Self {
        self.bypass_requested = requested;
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn request_uri(&self) -> Option<&str> {
        self.request_uri.as_deref()
    }

    pub fn action(&self) -> Symbol {
        self.action.clone().unwrap_or(Symbol::WILDCARD)
    }

    pub fn object(&self) -> AccessObject {
        self.object
            .clone()
            .unwrap_or_else(|| AccessObject::new(Symbol::WILDCARD))
    }

    pub fn bypass_requested(&self) -> bool {
        self.bypass_requested
    }

    /// Identity resolved for this request, if any.
    pub fn credentials(&self) -> Option<&A> {
        self.credentials.as_ref()
    }

    pub fn set_credentials(&mut self, account: A) {
        self.credentials = Some(account);
    }
}

/// Login submission.
#[derive(Clone, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub bypass: Option<String>,
}

impl LoginForm {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            bypass: None,
        }
    }

    pub fn bypass() -> Self {
        Self {
            bypass: Some("1".to_string()),
            ..Self::default()
        }
    }

    pub fn bypass_requested(&self) -> bool {
        self.bypass
            .as_deref()
            .is_some_and(|v| !matches!(v.trim(), "" | "0" | "false"))
    }
}

impl core::fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LoginForm")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("bypass", &self.bypass)
            .finish()
    }
}
