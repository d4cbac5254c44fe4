use axum::{
    extract::{Extension, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Form, Json,
};
use serde_json::json;

use warden_infra::MemorySession;
use warden_login::{LoginForm, LoginOutcome, RequestContext};

use crate::app::errors::{json_error, login_error_to_response};
use crate::app::AppState;
use crate::context::CurrentAccount;

pub async fn login_page(
    State(state): State<AppState>,
    Extension(CurrentAccount(account)): Extension<CurrentAccount>,
) -> impl IntoResponse {
    let config = state.config();
    Json(json!({
        "action": config.url(&config.login_url),
        "fields": ["email", "password"],
        "bypass": config.login_bypass,
        "signed_in": account.is_some(),
    }))
}

/// Verify the submission; on success redirect to the saved location (or the
/// landing page).
pub async fn submit_login(
    State(state): State<AppState>,
    Extension(mut session): Extension<MemorySession>,
    Form(form): Form<LoginForm>,
) -> Response {
    let mut ctx = RequestContext::new(state.config().login_url.clone());

    match state.controller.submit_login(&form, &mut ctx, &mut session).await {
        Ok(LoginOutcome::Redirect(location)) => Redirect::to(&location).into_response(),
        Ok(LoginOutcome::Rejected) => json_error(
            StatusCode::UNAUTHORIZED,
            "invalid_credentials",
            "email or password not recognised",
        ),
        Err(e) => {
            tracing::error!(error = %e, "login submission failed");
            login_error_to_response(e)
        }
    }
}
