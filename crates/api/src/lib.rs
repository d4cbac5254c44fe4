//! HTTP host binding: session cookie, request classification and the login routes.

pub mod account;
pub mod app;
pub mod context;
pub mod middleware;
