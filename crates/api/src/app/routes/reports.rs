use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;

use warden_auth::{authorize, AccessObject, Anonymous, Subject};
use warden_core::Symbol;

use crate::app::errors::json_error;
use crate::app::services::REPORT_OBJECT;
use crate::app::AppState;
use crate::context::CurrentAccount;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/reports", get(list))
        .route("/reports/:id", get(show))
}

pub async fn list(
    State(state): State<AppState>,
    Extension(CurrentAccount(account)): Extension<CurrentAccount>,
) -> impl IntoResponse {
    let Some(account) = account else {
        return Json(json!({ "reports": [] }));
    };

    let permissions = state.controller.permissions().snapshot();
    let read = Symbol::from_static("read");
    let mut visible: Vec<&str> = state
        .reports
        .iter()
        .filter(|(id, owner)| {
            let report = AccessObject::new(REPORT_OBJECT).with_id(id.as_str()).owned_by((*owner).clone());
            permissions.check(&account, &read, &report, None)
        })
        .map(|(id, _)| id.as_str())
        .collect();
    visible.sort_unstable();

    Json(json!({ "reports": visible }))
}

/// A single report: the route is open to members, the instance only to its owner
/// (or an admin).
pub async fn show(
    State(state): State<AppState>,
    Extension(CurrentAccount(account)): Extension<CurrentAccount>,
    Path(id): Path<String>,
) -> Response {
    let Some(owner) = state.reports.get(&id) else {
        return json_error(StatusCode::NOT_FOUND, "not_found", "no such report");
    };

    let report = AccessObject::new(REPORT_OBJECT).with_id(id.clone()).owned_by(owner.clone());
    let subject: &dyn Subject = match &account {
        Some(account) => account,
        None => &Anonymous,
    };
    let permissions = state.controller.permissions().snapshot();

    match authorize(&permissions, subject, &Symbol::from_static("read"), &report) {
        Ok(decision) => Json(json!({
            "id": id,
            "owner": owner,
            "granted_by": decision.granted_by,
        }))
        .into_response(),
        Err(e) => {
            tracing::info!(error = %e, "report withheld");
            json_error(StatusCode::FORBIDDEN, "forbidden", "forbidden")
        }
    }
}
