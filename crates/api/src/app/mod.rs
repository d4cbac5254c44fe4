//! Router wiring.
//!
//! - `services.rs`: stores, rules and the authentication controller
//! - `routes/`: handlers, one file per area
//! - `errors.rs`: consistent error responses

use axum::{
    routing::get,
    Router,
};
use tower::ServiceBuilder;

use crate::middleware;

pub mod errors;
pub mod routes;
pub mod services;

pub use services::AppState;

/// Build the full HTTP router (used by `main.rs` and the black-box tests).
///
/// Every route, the login page included, sits behind the access middleware; the
/// permission set decides what anonymous callers may reach.
pub fn build_app(state: AppState) -> Router {
    let login_url = state.config().login_url.clone();

    Router::new()
        .route("/", get(routes::system::home))
        .route("/health", get(routes::system::health))
        .route("/whoami", get(routes::system::whoami))
        .route(
            &login_url,
            get(routes::login::login_page).post(routes::login::submit_login),
        )
        .merge(routes::reports::router())
        .fallback(routes::system::not_found)
        .layer(
            ServiceBuilder::new().layer(axum::middleware::from_fn_with_state(
                state.clone(),
                middleware::access_middleware,
            )),
        )
        .with_state(state)
}
