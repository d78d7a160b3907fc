//! Cross-origin policy.
//!
//! One policy bound to every path: any origin, any request header, the
//! methods below, and the refresh-token header exposed so browser clients can
//! read a rotated token.

use axum::http::{HeaderName, Method};
use tower_http::cors::{Any, CorsLayer};

use crate::config::CrustConfig;
use crate::error::CrustError;

/// Path pattern the policy is registered for.
pub const CORS_PATH_PATTERN: &str = "/**";

/// Pure-data description of the cross-origin policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsPolicy {
    pub path_pattern: &'static str,
    pub allowed_methods: Vec<Method>,
    pub exposed_header: HeaderName,
}

impl CorsPolicy {
    /// # Errors
    /// Returns `CrustError::Configuration` if `refresh_token_name` is not a valid header name.
    pub fn from_config(cfg: &CrustConfig) -> Result<Self, CrustError> {
        let exposed_header = HeaderName::from_bytes(cfg.refresh_token_name.as_bytes()).map_err(|e| {
            CrustError::Configuration(format!(
                "refresh_token_name '{}' is not a valid header name: {e}",
                cfg.refresh_token_name
            ))
        })?;

        Ok(Self {
            path_pattern: CORS_PATH_PATTERN,
            allowed_methods: vec![
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::HEAD,
                Method::OPTIONS,
            ],
            exposed_header,
        })
    }

    /// Build the tower layer enforcing this policy.
    #[must_use]
    pub fn layer(&self) -> CorsLayer {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(self.allowed_methods.clone())
            .allow_headers(Any)
            .expose_headers([self.exposed_header.clone()])
    }
}
