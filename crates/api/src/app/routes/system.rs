use axum::{
    extract::{Extension, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::{json, Map, Value};

use crate::app::errors::json_error;
use crate::app::AppState;
use crate::context::CurrentAccount;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn home(Extension(CurrentAccount(account)): Extension<CurrentAccount>) -> impl IntoResponse {
    Json(json!({
        "welcome": account.as_ref().map(|a| a.name()),
    }))
}

/// The resolved identity under the configured accessor name, plus the object kinds
/// it can reach.
pub async fn whoami(
    State(state): State<AppState>,
    Extension(CurrentAccount(account)): Extension<CurrentAccount>,
) -> impl IntoResponse {
    let reachable = match &account {
        Some(account) => state.controller.permissions().snapshot().find_objects(account),
        None => Default::default(),
    };

    let mut body = Map::new();
    body.insert(
        state.config().credentials_accessor.clone(),
        serde_json::to_value(&account).unwrap_or(Value::Null),
    );
    body.insert("objects".to_string(), json!(reachable));
    Json(Value::Object(body))
}

pub async fn not_found() -> axum::response::Response {
    json_error(StatusCode::NOT_FOUND, "not_found", "not found")
}
