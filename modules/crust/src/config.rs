use std::path::Path;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use serde::{Deserialize, Serialize};

use crate::error::CrustError;
use crate::policy::Mode;

/// Prefix for environment overrides, e.g. `CRUST__LOGIN_URL=/signin`.
///
/// The double underscore keeps application prefixes such as `CRUST_SERVER__`
/// out of this namespace.
pub const ENV_PREFIX: &str = "CRUST__";

fn default_stateless() -> bool {
    true
}

fn default_login_url() -> String {
    "/login".to_owned()
}

fn default_logout_url() -> String {
    "/logout".to_owned()
}

fn default_refresh_token_name() -> String {
    "Authorization".to_owned()
}

fn default_session_cookie_name() -> String {
    "CRUST_SESSION".to_owned()
}

fn default_cors_enabled() -> bool {
    true
}

/// Startup configuration of the authorization layer.
///
/// Constructed once, validated, then shared read-only for the process lifetime.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CrustConfig {
    /// Token-per-request authentication (`true`) or server-side sessions (`false`).
    #[serde(default = "default_stateless")]
    pub stateless: bool,

    /// Login endpoint; always reachable without authentication.
    #[serde(default = "default_login_url")]
    pub login_url: String,

    /// Logout endpoint; handled by the middleware itself.
    #[serde(default = "default_logout_url")]
    pub logout_url: String,

    /// Redirect target after a failed session authentication. Defaults to `login_url`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login_error_url: Option<String>,

    /// Path patterns reachable without authentication.
    #[serde(default)]
    pub permit_urls: Vec<String>,

    /// Additional path patterns reachable without authentication.
    #[serde(default)]
    pub addition_permit_urls: Vec<String>,

    /// Static resource patterns reachable with GET without authentication.
    #[serde(default)]
    pub allow_static_urls: Vec<String>,

    /// Response header exposed to cross-origin clients for refresh-token retrieval.
    #[serde(default = "default_refresh_token_name")]
    pub refresh_token_name: String,

    /// Cookie carrying the session id in session mode.
    #[serde(default = "default_session_cookie_name")]
    pub session_cookie_name: String,

    #[serde(default = "default_cors_enabled")]
    pub cors_enabled: bool,
}

impl Default for CrustConfig {
    fn default() -> Self {
        Self {
            stateless: default_stateless(),
            login_url: default_login_url(),
            logout_url: default_logout_url(),
            login_error_url: None,
            permit_urls: Vec::new(),
            addition_permit_urls: Vec::new(),
            allow_static_urls: Vec::new(),
            refresh_token_name: default_refresh_token_name(),
            session_cookie_name: default_session_cookie_name(),
            cors_enabled: default_cors_enabled(),
        }
    }
}

impl CrustConfig {
    /// Load configuration from defaults, an optional YAML file and `CRUST__*`
    /// environment variables (nested keys separated by `__`), in that order.
    ///
    /// A missing file contributes nothing.
    ///
    /// # Errors
    /// Returns `CrustError::Configuration` if a source cannot be parsed or the
    /// merged configuration fails validation.
    pub fn load(path: Option<&Path>) -> Result<Self, CrustError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        let cfg: Self = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(|e| CrustError::config(e.to_string()))?;

        cfg.validate()?;
        Ok(cfg)
    }

    /// Check the invariants the rule set and middleware rely on.
    ///
    /// # Errors
    /// Returns `CrustError::Configuration` describing the first violation.
    pub fn validate(&self) -> Result<(), CrustError> {
        require_path("login_url", &self.login_url)?;
        require_path("logout_url", &self.logout_url)?;
        if let Some(url) = &self.login_error_url {
            require_path("login_error_url", url)?;
        }
        if self.login_url == self.logout_url {
            return Err(CrustError::config(format!(
                "login_url and logout_url must differ (both are '{}')",
                self.login_url
            )));
        }
        if http::HeaderName::from_bytes(self.refresh_token_name.as_bytes()).is_err() {
            return Err(CrustError::config(format!(
                "refresh_token_name '{}' is not a valid header name",
                self.refresh_token_name
            )));
        }
        if self.session_cookie_name.is_empty()
            || self
                .session_cookie_name
                .chars()
                .any(|c| c == '=' || c == ';' || c == ',' || c.is_whitespace())
        {
            return Err(CrustError::config(format!(
                "session_cookie_name '{}' is not a valid cookie name",
                self.session_cookie_name
            )));
        }
        Ok(())
    }

    #[must_use]
    pub fn mode(&self) -> Mode {
        if self.stateless {
            Mode::Stateless
        } else {
            Mode::Session
        }
    }

    /// Redirect target after a failed session authentication.
    #[must_use]
    pub fn login_error_url(&self) -> &str {
        self.login_error_url.as_deref().unwrap_or(&self.login_url)
    }
}

fn require_path(field: &str, value: &str) -> Result<(), CrustError> {
    if value.trim().is_empty() {
        return Err(CrustError::config(format!("{field} must not be empty")));
    }
    if !value.starts_with('/') {
        return Err(CrustError::config(format!(
            "{field} must start with '/', got '{value}'"
        )));
    }
    Ok(())
}
