//! Demo endpoints.

use axum::http::Method;
use axum::{Extension, Json};
use crust::{CrustError, RouteTable, SecurityContext};
use serde_json::{Value, json};

async fn login_page() -> &'static str {
    "login"
}

async fn ping() -> &'static str {
    "pong"
}

async fn me(Extension(ctx): Extension<SecurityContext>) -> Json<Value> {
    Json(json!({
        "subject_id": ctx.subject_id(),
        "principal": ctx.principal(),
        "authorities": ctx.authorities(),
    }))
}

/// # Errors
/// Returns an error if a route cannot be registered.
pub fn table() -> Result<RouteTable, CrustError> {
    RouteTable::new()
        .route(Method::GET, "/login", login_page)?
        .anonymous(Method::GET, "/anon/ping", ping)?
        .route(Method::GET, "/secure/me", me)
}
