use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use warden_login::LoginError;

/// Client-facing rendering of a login failure. Callers log the detail; the body
/// never carries it.
pub fn login_error_to_response(err: LoginError) -> axum::response::Response {
    match err {
        LoginError::CredentialLookup(_) => json_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "credential_store_unavailable",
            "credential store unavailable",
        ),
        LoginError::Session(_) => json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "session_error",
            "session unavailable",
        ),
        LoginError::Config(_) => json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "config_error",
            "login is misconfigured",
        ),
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
