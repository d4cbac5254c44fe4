use std::sync::Arc;

use anyhow::Context;

use warden_api::app::{self, AppState};
use warden_infra::RulesFile;
use warden_login::{open_login_rule, LoginConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG still wins; WARDEN_LOG only replaces the built-in default.
    match std::env::var("WARDEN_LOG") {
        Ok(filter) => warden_observability::init_with_default(&filter),
        Err(_) => warden_observability::init(),
    }

    let config = LoginConfig::from_env("warden").context("invalid login configuration")?;
    let state = app::services::build_services(config)?;

    if let Ok(path) = std::env::var("WARDEN_RULES_FILE") {
        let rules = Arc::new(RulesFile::new(path));
        rules
            .reload(state.controller.permissions(), open_login_rule)
            .context("loading rules file")?;
        watch_for_reload(&state, rules);
    }

    let bind = std::env::var("WARDEN_BIND").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("failed to bind {bind}"))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app::build_app(state)).await?;
    Ok(())
}

/// Re-read the rules file on SIGHUP. A broken file leaves the current rules in place.
#[cfg(unix)]
fn watch_for_reload(state: &AppState, rules: Arc<RulesFile>) {
    use tokio::signal::unix::{signal, SignalKind};

    let permissions = Arc::clone(state.controller.permissions());
    tokio::spawn(async move {
        let mut hangups = match signal(SignalKind::hangup()) {
            Ok(stream) => stream,
            Err(e) => {
                tracing::warn!(error = %e, "rules reload on SIGHUP unavailable");
                return;
            }
        };
        while hangups.recv().await.is_some() {
            if let Err(e) = rules.reload(&permissions, open_login_rule) {
                tracing::error!(error = %e, "rules reload failed; keeping current rules");
            }
        }
    });
}

#[cfg(not(unix))]
fn watch_for_reload(_state: &AppState, _rules: Arc<RulesFile>) {}
