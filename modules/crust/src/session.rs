//! Server-side session collaborator and session cookie handling (session mode).

use async_trait::async_trait;
use axum::http::{HeaderMap, HeaderValue, header};
use thiserror::Error;
use uuid::Uuid;

use crust_security::SecurityContext;

#[derive(Debug, Error)]
pub enum SessionStoreError {
    #[error("session store unavailable: {0}")]
    Unavailable(String),

    #[error("session store error: {0}")]
    Internal(String),
}

/// Storage for server-side sessions, keyed by session id.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Restore the identity bound to `session_id`; `None` if unknown or expired.
    ///
    /// # Errors
    /// Returns an error if the store cannot be queried.
    async fn load(&self, session_id: &str) -> Result<Option<SecurityContext>, SessionStoreError>;

    /// Bind `ctx` to a new session id.
    ///
    /// # Errors
    /// Returns an error if the session cannot be persisted.
    async fn save(&self, session_id: &str, ctx: SecurityContext) -> Result<(), SessionStoreError>;

    /// Remove the session. Unknown ids are not an error.
    ///
    /// # Errors
    /// Returns an error if the store cannot be updated.
    async fn destroy(&self, session_id: &str) -> Result<(), SessionStoreError>;
}

/// A fresh, unguessable session id. A new id is issued on every successful
/// authentication, so a pre-set id can never become authenticated.
#[must_use]
pub fn new_session_id() -> String {
    Uuid::new_v4().simple().to_string()
}

#[derive(Clone, Debug)]
pub struct SessionCookie {
    pub session_id: String,
}

impl SessionCookie {
    #[must_use]
    pub fn new(session_id: String) -> Self {
        Self { session_id }
    }

    #[must_use]
    pub fn from_headers(headers: &HeaderMap, cookie_name: &str) -> Option<Self> {
        headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(';'))
            .filter_map(|cookie| cookie.trim().split_once('='))
            .find(|(name, value)| *name == cookie_name && !value.is_empty())
            .map(|(_, value)| Self::new(value.to_owned()))
    }

    /// `Set-Cookie` value binding this session.
    #[must_use]
    pub fn to_header_value(&self, cookie_name: &str) -> Option<HeaderValue> {
        HeaderValue::from_str(&format!(
            "{cookie_name}={}; HttpOnly; SameSite=Lax; Path=/",
            self.session_id
        ))
        .ok()
    }

    /// `Set-Cookie` value expiring the session cookie.
    #[must_use]
    pub fn delete_header_value(cookie_name: &str) -> Option<HeaderValue> {
        HeaderValue::from_str(&format!(
            "{cookie_name}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0"
        ))
        .ok()
    }
}
