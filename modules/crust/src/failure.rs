//! Authentication failure handling.

use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::response::{IntoResponse, Response};

use crate::error::CrustError;
use crate::policy::Mode;

/// Request details handed to an [`AuthFailureHandler`].
#[derive(Debug, Clone, Copy)]
pub struct FailureContext<'a> {
    pub method: &'a Method,
    pub path: &'a str,
    pub mode: Mode,
    /// Where session-mode failures redirect to.
    pub login_error_url: &'a str,
}

/// Produces the response for a rejected request. The request pipeline stops
/// after this; nothing is retried.
pub trait AuthFailureHandler: Send + Sync {
    fn on_failure(&self, error: &CrustError, ctx: &FailureContext<'_>) -> Response;
}

impl<F> AuthFailureHandler for F
where
    F: Fn(&CrustError, &FailureContext<'_>) -> Response + Send + Sync,
{
    fn on_failure(&self, error: &CrustError, ctx: &FailureContext<'_>) -> Response {
        self(error, ctx)
    }
}

/// Default handler.
///
/// - `Unauthorized`: status 401, empty body
/// - `SessionAuthenticationFailure`: `302 Found` to the login-error path
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusFailureHandler;

impl AuthFailureHandler for StatusFailureHandler {
    fn on_failure(&self, error: &CrustError, ctx: &FailureContext<'_>) -> Response {
        match error {
            CrustError::Unauthorized(_) => StatusCode::UNAUTHORIZED.into_response(),
            CrustError::SessionAuthenticationFailure(_) => found(ctx.login_error_url),
            CrustError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        }
    }
}

/// `302 Found` redirect.
pub(crate) fn found(location: &str) -> Response {
    match HeaderValue::from_str(location) {
        Ok(value) => (StatusCode::FOUND, [(header::LOCATION, value)]).into_response(),
        Err(_) => {
            tracing::error!(location, "Redirect target is not a valid header value");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    static GET: Method = Method::GET;

    fn ctx(mode: Mode) -> FailureContext<'static> {
        FailureContext {
            method: &GET,
            path: "/secure",
            mode,
            login_error_url: "/login?error",
        }
    }

    #[test]
    fn unauthorized_is_bare_401() {
        let response = StatusFailureHandler.on_failure(
            &CrustError::Unauthorized("missing token".to_owned()),
            &ctx(Mode::Stateless),
        );
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().get(header::LOCATION).is_none());
    }

    #[test]
    fn session_failure_redirects_to_login_error_url() {
        let response = StatusFailureHandler.on_failure(
            &CrustError::SessionAuthenticationFailure("expired".to_owned()),
            &ctx(Mode::Session),
        );
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[header::LOCATION], "/login?error");
    }

    #[test]
    fn closures_are_handlers() {
        let handler =
            |_: &CrustError, _: &FailureContext<'_>| StatusCode::FORBIDDEN.into_response();
        let response = handler.on_failure(
            &CrustError::Unauthorized(String::new()),
            &ctx(Mode::Stateless),
        );
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
