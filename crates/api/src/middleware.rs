use axum::{
    extract::State,
    http::{header, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use warden_infra::MemorySession;
use warden_login::{Halt, Outcome};

use crate::app::errors::{json_error, login_error_to_response};
use crate::app::services::AppState;
use crate::context::{self, CurrentAccount, SESSION_COOKIE};

/// Runs the login state machine before every routed request.
///
/// Proceeding requests get [`CurrentAccount`], the [`MemorySession`] and the
/// grant's [`warden_auth::AccessDecision`] as extensions. A session first written
/// during this request is handed to the client in a cookie, whatever the outcome.
pub async fn access_middleware(
    State(state): State<AppState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let cookie = context::session_cookie(req.headers());
    let mut session = match state.sessions.open(cookie.as_deref()) {
        Ok(session) => session,
        Err(e) => {
            tracing::error!(error = %e, "opening session failed");
            return json_error(StatusCode::INTERNAL_SERVER_ERROR, "session_error", "session unavailable");
        }
    };

    let mut ctx = context::request_context(req.method(), req.uri(), &state.config().login_url);

    let response = match state.controller.gate(&mut ctx, &mut session).await {
        Ok(Outcome::Proceed { decision, .. }) => {
            let extensions = req.extensions_mut();
            extensions.insert(CurrentAccount(ctx.credentials().cloned()));
            extensions.insert(session.clone());
            extensions.insert(decision);
            next.run(req).await
        }
        Ok(Outcome::Halt(halt)) => halt_response(&halt),
        Err(e) => {
            tracing::error!(error = %e, path = %ctx.path(), "request gate failed");
            login_error_to_response(e)
        }
    };

    with_session_cookie(response, &session)
}

fn halt_response(halt: &Halt) -> Response {
    let status = StatusCode::from_u16(halt.status()).unwrap_or(StatusCode::FORBIDDEN);

    match halt {
        Halt::AuthenticationRequired { location, .. } => {
            (status, [(header::LOCATION, location.clone())], "401 Unauthorized").into_response()
        }
        Halt::AuthorizationDenied(decision) => {
            tracing::info!(
                subject = %decision.subject,
                action = %decision.action,
                object = %decision.object,
                "request forbidden"
            );
            (status, "403 Forbidden").into_response()
        }
    }
}

fn with_session_cookie(mut response: Response, session: &MemorySession) -> Response {
    if !session.needs_cookie() {
        return response;
    }

    let cookie = format!("{SESSION_COOKIE}={}; Path=/; HttpOnly; SameSite=Lax", session.id());
    match HeaderValue::from_str(&cookie) {
        Ok(value) => {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
        Err(e) => tracing::warn!(error = %e, "session cookie not set"),
    }
    response
}
