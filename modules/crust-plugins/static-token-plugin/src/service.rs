//! Static credential verification service.

use std::collections::HashMap;

use secrecy::{ExposeSecret, SecretString};

use crust_security::SecurityContext;

use crate::config::{IdentityConfig, StaticTokenPluginConfig, VerifyMode};

struct Account {
    secret: SecretString,
    identity: IdentityConfig,
}

/// Static credential service.
///
/// - `accept_all`: any non-empty token or account maps to the default identity
/// - `static_credentials`: only configured tokens and accounts are accepted
pub struct Service {
    mode: VerifyMode,
    default_identity: IdentityConfig,
    token_map: HashMap<String, IdentityConfig>,
    accounts: HashMap<String, Account>,
}

impl Service {
    /// Create a service from plugin configuration.
    #[must_use]
    pub fn from_config(cfg: &StaticTokenPluginConfig) -> Self {
        match cfg.mode {
            VerifyMode::AcceptAll => tracing::warn!(
                "Static token plugin is running in `accept_all` mode: every non-empty \
                 credential is accepted. Do NOT use this mode in production."
            ),
            VerifyMode::StaticCredentials => tracing::warn!(
                tokens = cfg.tokens.len(),
                accounts = cfg.accounts.len(),
                "Static token plugin compares plaintext secrets. Do NOT use it in production."
            ),
        }

        let token_map = cfg
            .tokens
            .iter()
            .map(|m| (m.token.expose_secret().to_owned(), m.identity.clone()))
            .collect();

        let accounts = cfg
            .accounts
            .iter()
            .map(|a| {
                (
                    a.principal.clone(),
                    Account {
                        secret: a.secret.clone(),
                        identity: a.identity.clone(),
                    },
                )
            })
            .collect();

        Self {
            mode: cfg.mode,
            default_identity: cfg.default_identity.clone(),
            token_map,
            accounts,
        }
    }

    /// Authenticate a bearer token.
    ///
    /// Returns `None` if the token is empty or, in `static_credentials` mode,
    /// not configured.
    #[must_use]
    pub fn authenticate_token(&self, bearer_token: &str) -> Option<SecurityContext> {
        if bearer_token.is_empty() {
            return None;
        }

        let identity = match self.mode {
            VerifyMode::AcceptAll => &self.default_identity,
            VerifyMode::StaticCredentials => self.token_map.get(bearer_token)?,
        };

        Some(
            context_builder(identity, None)
                .bearer_token(bearer_token.to_owned())
                .build(),
        )
    }

    /// Authenticate a Basic-auth login against the configured plaintext secret.
    #[must_use]
    pub fn authenticate_account(&self, principal: &str, secret: &str) -> Option<SecurityContext> {
        if principal.is_empty() || secret.is_empty() {
            return None;
        }

        match self.mode {
            VerifyMode::AcceptAll => {
                Some(context_builder(&self.default_identity, Some(principal)).build())
            }
            VerifyMode::StaticCredentials => {
                let account = self.accounts.get(principal)?;
                (account.secret.expose_secret() == secret)
                    .then(|| context_builder(&account.identity, Some(principal)).build())
            }
        }
    }
}

fn context_builder(
    identity: &IdentityConfig,
    principal: Option<&str>,
) -> crust_security::SecurityContextBuilder {
    let builder = SecurityContext::builder()
        .subject_id(identity.subject_id)
        .authorities(identity.authorities.clone());

    match identity.principal.as_deref().or(principal) {
        Some(name) => builder.principal(name),
        None => builder,
    }
}
