//! Logout handling.
//!
//! Stateless mode answers a bare `200 OK`. Session mode destroys the server
//! session, expires the cookie and redirects to the login path. Both invoke
//! the context-invalidation hook first.

use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};

use crust_security::SecurityContext;

use crate::auth::AuthState;
use crate::failure::found;
use crate::policy::Mode;
use crate::session::SessionCookie;
use crate::verifier::{Credential, extract_bearer_token};

/// Clears whatever request-scoped or process-level state holds the current
/// identity. Called once per logout, with the identity if it could be resolved.
pub trait ContextInvalidator: Send + Sync {
    fn invalidate(&self, ctx: Option<&SecurityContext>);
}

impl<F> ContextInvalidator for F
where
    F: Fn(Option<&SecurityContext>) + Send + Sync,
{
    fn invalidate(&self, ctx: Option<&SecurityContext>) {
        self(ctx);
    }
}

/// Default hook: nothing to clear, the context lives in request extensions only.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopInvalidator;

impl ContextInvalidator for NoopInvalidator {
    fn invalidate(&self, _ctx: Option<&SecurityContext>) {}
}

pub(crate) async fn handle_logout(state: &AuthState, headers: &HeaderMap) -> Response {
    match state.policy.mode() {
        Mode::Stateless => logout_stateless(state, headers).await,
        Mode::Session => logout_session(state, headers).await,
    }
}

async fn logout_stateless(state: &AuthState, headers: &HeaderMap) -> Response {
    // The token only identifies who is logging out; an invalid one does not block logout.
    let ctx = match extract_bearer_token(headers) {
        Some(token) => state.verifier.verify(Credential::Bearer(token)).await.ok(),
        None => None,
    };

    state.invalidator.invalidate(ctx.as_ref());
    tracing::info!(
        subject_id = ?ctx.as_ref().map(SecurityContext::subject_id),
        "Logged out (stateless)"
    );
    StatusCode::OK.into_response()
}

async fn logout_session(state: &AuthState, headers: &HeaderMap) -> Response {
    let cookie_name = &state.config.session_cookie_name;
    let cookie = SessionCookie::from_headers(headers, cookie_name);

    let ctx = match (&cookie, &state.sessions) {
        (Some(cookie), Some(store)) => match store.load(&cookie.session_id).await {
            Ok(ctx) => ctx,
            Err(err) => {
                tracing::warn!(%err, "Could not load session being logged out");
                None
            }
        },
        _ => None,
    };

    state.invalidator.invalidate(ctx.as_ref());

    if let (Some(cookie), Some(store)) = (&cookie, &state.sessions) {
        if let Err(err) = store.destroy(&cookie.session_id).await {
            tracing::error!(%err, "Failed to destroy session on logout");
        }
    }

    tracing::info!(
        subject_id = ?ctx.as_ref().map(SecurityContext::subject_id),
        "Logged out (session)"
    );

    let mut response = found(&state.config.login_url);
    if let Some(expired) = SessionCookie::delete_header_value(cookie_name) {
        response.headers_mut().append(header::SET_COOKIE, expired);
    }
    response
}
