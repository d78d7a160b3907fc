//! Error types for the Crust authorization layer.

use thiserror::Error;

/// Errors raised by the authorization layer.
///
/// `Configuration` is fatal and only produced while building the layer.
/// The other variants describe per-request outcomes; they terminate the
/// request and are reported through the configured failure handler.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CrustError {
    /// Malformed or missing startup configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// No credential, or an invalid one, on a protected path.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Session mode only: the session could not be established or restored.
    #[error("session authentication failure: {0}")]
    SessionAuthenticationFailure(String),
}

impl CrustError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }
}
