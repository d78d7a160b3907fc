//! Credential verification collaborator.

use std::fmt;

use async_trait::async_trait;
use axum::http::{HeaderMap, header};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use thiserror::Error;

use crust_security::SecurityContext;

/// A credential presented with a request.
#[derive(Clone, Copy)]
pub enum Credential<'a> {
    /// Stateless mode: `Authorization: Bearer <token>`.
    Bearer(&'a str),
    /// Session mode login: `Authorization: Basic <base64(principal:secret)>`.
    Basic { principal: &'a str, secret: &'a str },
}

impl fmt::Debug for Credential<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bearer(_) => f.debug_tuple("Bearer").field(&"<redacted>").finish(),
            Self::Basic { principal, .. } => f
                .debug_struct("Basic")
                .field("principal", principal)
                .field("secret", &"<redacted>")
                .finish(),
        }
    }
}

/// Errors returned by a [`CredentialVerifier`].
#[derive(Debug, Error)]
pub enum VerifyError {
    /// The credential is invalid, expired, or unknown.
    #[error("credential rejected: {0}")]
    Rejected(String),

    /// This verifier does not handle the presented kind of credential.
    #[error("unsupported credential kind")]
    Unsupported,

    /// The verifier's backing service is not reachable.
    #[error("verifier unavailable: {0}")]
    Unavailable(String),
}

/// Verifies credentials and returns the authenticated identity.
///
/// Implementations own password hashing and token validation; the
/// authorization layer only decides whether verification is needed.
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    /// Verify `credential`.
    ///
    /// # Errors
    /// - `Rejected` if the credential is not valid
    /// - `Unsupported` if this verifier cannot check this kind of credential
    /// - `Unavailable` if verification could not be performed
    async fn verify(&self, credential: Credential<'_>) -> Result<SecurityContext, VerifyError>;
}

/// Extract Bearer token from Authorization header
pub(crate) fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer ").map(str::trim))
        .filter(|token| !token.is_empty())
}

/// Extract `(principal, secret)` from a Basic Authorization header.
pub(crate) fn extract_basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let encoded = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Basic "))?;
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (principal, secret) = decoded.split_once(':')?;
    Some((principal.to_owned(), secret.to_owned()))
}
