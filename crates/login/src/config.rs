//! Login settings: a fixed set of named keys, each defaulted independently.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use warden_core::{ConfigError, ConfigResult};

const RECOGNISED_KEYS: [&str; 7] = [
    "credentials_accessor",
    "session_key",
    "login_url",
    "login_model",
    "login_bypass",
    "landing_url",
    "base_uri",
];

/// Per-application login configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginConfig {
    /// Name under which the resolved identity is exposed to handlers.
    pub credentials_accessor: String,
    /// Session key holding the identity reference. Defaults to the application
    /// name so co-hosted applications do not share logins by accident.
    pub session_key: String,
    /// Path that stays reachable without authentication.
    pub login_url: String,
    /// Name of the identity type the credential store resolves.
    pub login_model: String,
    /// Accept a request-supplied bypass flag instead of a password.
    /// Development and test environments only.
    pub login_bypass: bool,
    /// Where a successful login lands when no return-to location was saved.
    pub landing_url: String,
    /// Prefix for generated locations when the application is mounted below a
    /// path or behind a proxy.
    pub base_uri: Option<String>,
}

impl LoginConfig {
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            credentials_accessor: "credentials".to_string(),
            session_key: app_name.into(),
            login_url: "/login".to_string(),
            login_model: "account".to_string(),
            login_bypass: false,
            landing_url: "/".to_string(),
            base_uri: None,
        }
    }

    pub fn with_login_url(mut self, url: impl Into<String>) -> Self {
        self.login_url = url.into();
        self
    }

    pub fn with_session_key(mut self, key: impl Into<String>) -> Self {
        self.session_key = key.into();
        self
    }

    pub fn with_credentials_accessor(mut self, name: impl Into<String>) -> Self {
        self.credentials_accessor = name.into();
        self
    }

    pub fn with_login_model(mut self, model: impl Into<String>) -> Self {
        self.login_model = model.into();
        self
    }

    pub fn with_bypass(mut self, enabled: bool) -> Self {
        self.login_bypass = enabled;
        self
    }

    pub fn with_landing_url(mut self, url: impl Into<String>) -> Self {
        self.landing_url = url.into();
        self
    }

    pub fn with_base_uri(mut self, base: impl Into<String>) -> Self {
        self.base_uri = Some(base.into());
        self
    }

    /// Defaults for `app_name`, overlaid with the keys present in a JSON object.
    pub fn from_json(app_name: &str, json: &str) -> ConfigResult<Self> {
        let overrides: JsonValue =
            serde_json::from_str(json).map_err(|e| ConfigError::malformed(e.to_string()))?;
        let overrides = overrides
            .as_object()
            .ok_or_else(|| ConfigError::malformed("login configuration must be an object"))?;

        if let Some(key) = overrides.keys().find(|k| !RECOGNISED_KEYS.contains(&k.as_str())) {
            return Err(ConfigError::UnsupportedOption(key.clone()));
        }

        let mut merged = serde_json::to_value(Self::new(app_name))
            .map_err(|e| ConfigError::malformed(e.to_string()))?;
        if let Some(fields) = merged.as_object_mut() {
            for (key, value) in overrides {
                fields.insert(key.clone(), value.clone());
            }
        }

        let config: Self =
            serde_json::from_value(merged).map_err(|e| ConfigError::malformed(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults for `app_name`, overlaid with `WARDEN_*` environment variables.
    pub fn from_env(app_name: &str) -> ConfigResult<Self> {
        Self::from_lookup(app_name, |key| std::env::var(key).ok())
    }

    fn from_lookup<F>(app_name: &str, lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::new(app_name);

        if let Some(v) = lookup("WARDEN_CREDENTIALS_ACCESSOR") {
            config.credentials_accessor = v;
        }
        if let Some(v) = lookup("WARDEN_SESSION_KEY") {
            config.session_key = v;
        }
        if let Some(v) = lookup("WARDEN_LOGIN_URL") {
            config.login_url = v;
        }
        if let Some(v) = lookup("WARDEN_LOGIN_MODEL") {
            config.login_model = v;
        }
        if let Some(v) = lookup("WARDEN_LOGIN_BYPASS") {
            config.login_bypass = parse_flag("login_bypass", &v)?;
        }
        if let Some(v) = lookup("WARDEN_LANDING_URL") {
            config.landing_url = v;
        }
        if let Some(v) = lookup("WARDEN_BASE_URI") {
            config.base_uri = Some(v).filter(|s| !s.is_empty());
        }

        config.validate()?;
        if config.login_bypass {
            tracing::warn!("login bypass enabled; do not use outside development");
        }
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if !self.login_url.starts_with('/') {
            return Err(ConfigError::invalid_value("login_url", "must be an absolute path"));
        }
        if !self.landing_url.starts_with('/') {
            return Err(ConfigError::invalid_value("landing_url", "must be an absolute path"));
        }
        if self.session_key.trim().is_empty() {
            return Err(ConfigError::invalid_value("session_key", "must not be empty"));
        }
        if self.credentials_accessor.trim().is_empty() {
            return Err(ConfigError::invalid_value("credentials_accessor", "must not be empty"));
        }
        if self.login_model.trim().is_empty() {
            return Err(ConfigError::invalid_value("login_model", "must not be empty"));
        }
        Ok(())
    }

    /// `path` prefixed with the base URI, if any.
    pub fn url(&self, path: &str) -> String {
        match self.base_uri.as_deref() {
            Some(base) => format!("{}{}", base.trim_end_matches('/'), path),
            None => path.to_string(),
        }
    }
}

fn parse_flag(key: &'static str, raw: &str) -> ConfigResult<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(ConfigError::invalid_value(key, format!("not a boolean: {other}"))),
    }
}
