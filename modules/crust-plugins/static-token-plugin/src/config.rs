//! Configuration for the static token plugin.

use secrecy::SecretString;
use serde::Deserialize;
use uuid::{Uuid, uuid};

/// Subject returned in `accept_all` mode unless configured otherwise.
pub const DEFAULT_SUBJECT_ID: Uuid = uuid!("11111111-6a88-4768-9dfc-6bcd5187d9ed");

/// Plugin configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StaticTokenPluginConfig {
    /// Verification mode.
    pub mode: VerifyMode,

    /// Identity returned in `accept_all` mode.
    pub default_identity: IdentityConfig,

    /// Bearer token mappings for `static_credentials` mode.
    pub tokens: Vec<TokenMapping>,

    /// Basic-auth accounts for `static_credentials` mode.
    pub accounts: Vec<AccountMapping>,
}

impl Default for StaticTokenPluginConfig {
    fn default() -> Self {
        Self {
            mode: VerifyMode::AcceptAll,
            default_identity: IdentityConfig::default(),
            tokens: Vec::new(),
            accounts: Vec::new(),
        }
    }
}

/// Verification mode.
#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VerifyMode {
    /// Accept any non-empty credential and return the default identity.
    #[default]
    AcceptAll,
    /// Only accept the configured tokens and accounts.
    StaticCredentials,
}

/// Identity configuration for a subject.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IdentityConfig {
    pub subject_id: Uuid,

    /// Login name. Basic logins in `accept_all` mode use the presented name instead.
    pub principal: Option<String>,

    /// Granted authorities.
    pub authorities: Vec<String>,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            subject_id: DEFAULT_SUBJECT_ID,
            principal: None,
            authorities: vec!["ROLE_USER".to_owned()],
        }
    }
}

/// Maps a static bearer token to an identity.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TokenMapping {
    /// The bearer token value to match.
    pub token: SecretString,
    pub identity: IdentityConfig,
}

/// A Basic-auth account.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AccountMapping {
    pub principal: String,
    pub secret: SecretString,
    pub identity: IdentityConfig,
}
