use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{Method, StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crust_security::SecurityContext;

use crate::config::CrustConfig;
use crate::error::CrustError;
use crate::failure::{AuthFailureHandler, FailureContext, found};
use crate::logout::{ContextInvalidator, handle_logout};
use crate::policy::{AuthorizationPolicy, Decision, Mode};
use crate::request_data::request_data;
use crate::session::{SessionCookie, SessionStore, new_session_id};
use crate::verifier::{
    Credential, CredentialVerifier, VerifyError, extract_basic_credentials, extract_bearer_token,
};

/// Shared state for [`crust_middleware`].
#[derive(Clone)]
pub struct AuthState {
    pub(crate) config: Arc<CrustConfig>,
    pub(crate) policy: AuthorizationPolicy,
    pub(crate) verifier: Arc<dyn CredentialVerifier>,
    pub(crate) sessions: Option<Arc<dyn SessionStore>>,
    pub(crate) failure_handler: Arc<dyn AuthFailureHandler>,
    pub(crate) invalidator: Arc<dyn ContextInvalidator>,
}

/// Authorization middleware.
///
/// For each request:
/// 1. The logout path (any method but OPTIONS) is answered here
/// 2. The policy decides PERMIT or AUTHENTICATE
/// 3. PERMIT inserts an anonymous `SecurityContext` and continues
/// 4. AUTHENTICATE verifies a bearer token (stateless) or restores/creates a
///    server session (session mode), inserting the resulting `SecurityContext`
pub async fn crust_middleware(
    State(state): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Response {
    if req.method() != Method::OPTIONS && req.uri().path() == state.config.logout_url {
        return handle_logout(&state, req.headers()).await;
    }

    match state.policy.resolve(req.method(), req.uri().path()) {
        Decision::Permit => {
            req.extensions_mut().insert(SecurityContext::anonymous());
            next.run(req).await
        }
        Decision::Authenticate => match state.policy.mode() {
            Mode::Stateless => authenticate_token(&state, req, next).await,
            Mode::Session => authenticate_session(&state, req, next).await,
        },
    }
}

async fn authenticate_token(state: &AuthState, mut req: Request, next: Next) -> Response {
    let Some(token) = extract_bearer_token(req.headers()).map(str::to_owned) else {
        return reject(
            state,
            &req,
            CrustError::Unauthorized("missing or invalid Authorization header".to_owned()),
        );
    };

    match state.verifier.verify(Credential::Bearer(&token)).await {
        Ok(ctx) => {
            req.extensions_mut().insert(ctx);
            next.run(req).await
        }
        Err(VerifyError::Unavailable(msg)) => {
            tracing::error!("Credential verifier unavailable: {msg}");
            StatusCode::SERVICE_UNAVAILABLE.into_response()
        }
        Err(err) => reject(state, &req, CrustError::Unauthorized(err.to_string())),
    }
}

async fn authenticate_session(state: &AuthState, mut req: Request, next: Next) -> Response {
    let Some(store) = state.sessions.clone() else {
        tracing::error!("Session mode request without a session store");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    };

    let cookie = SessionCookie::from_headers(req.headers(), &state.config.session_cookie_name);
    if let Some(cookie) = &cookie {
        match store.load(&cookie.session_id).await {
            Ok(Some(ctx)) => {
                req.extensions_mut().insert(ctx);
                return next.run(req).await;
            }
            Ok(None) => tracing::debug!("Session cookie does not match a live session"),
            Err(err) => {
                tracing::error!(%err, "Session lookup failed");
                return StatusCode::INTERNAL_SERVER_ERROR.into_response();
            }
        }
    }

    if let Some((principal, secret)) = extract_basic_credentials(req.headers()) {
        return login_with_basic(state, store.as_ref(), req, next, &principal, &secret).await;
    }

    if cookie.is_some() {
        return reject(
            state,
            &req,
            CrustError::SessionAuthenticationFailure("unknown or expired session".to_owned()),
        );
    }

    // Entry point: unauthenticated browser traffic goes to the login page.
    tracing::debug!(path = req.uri().path(), "No session, redirecting to login");
    found(&state.config.login_url)
}

async fn login_with_basic(
    state: &AuthState,
    store: &dyn SessionStore,
    mut req: Request,
    next: Next,
    principal: &str,
    secret: &str,
) -> Response {
    let ctx = match state
        .verifier
        .verify(Credential::Basic { principal, secret })
        .await
    {
        Ok(ctx) => ctx,
        Err(VerifyError::Unavailable(msg)) => {
            tracing::error!("Credential verifier unavailable: {msg}");
            return StatusCode::SERVICE_UNAVAILABLE.into_response();
        }
        Err(err) => {
            return reject(
                state,
                &req,
                CrustError::SessionAuthenticationFailure(err.to_string()),
            );
        }
    };

    // Always a fresh id, never the one the client presented.
    let session_id = new_session_id();
    if let Err(err) = store.save(&session_id, ctx.clone()).await {
        tracing::error!(%err, "Failed to persist session");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    tracing::info!(subject_id = %ctx.subject_id(), "Session established");

    req.extensions_mut().insert(ctx);
    let mut response = next.run(req).await;
    if let Some(value) =
        SessionCookie::new(session_id).to_header_value(&state.config.session_cookie_name)
    {
        response.headers_mut().append(header::SET_COOKIE, value);
    }
    response
}

fn reject(state: &AuthState, req: &Request, error: CrustError) -> Response {
    tracing::debug!(
        method = %req.method(),
        path = req.uri().path(),
        params = %request_data(req.uri().query(), None),
        %error,
        "Request rejected"
    );
    let ctx = FailureContext {
        method: req.method(),
        path: req.uri().path(),
        mode: state.policy.mode(),
        login_error_url: state.config.login_error_url(),
    };
    state.failure_handler.on_failure(&error, &ctx)
}
