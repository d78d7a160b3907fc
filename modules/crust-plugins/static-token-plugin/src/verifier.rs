//! `CredentialVerifier` implementation backed by the static service.

use async_trait::async_trait;
use crust::{Credential, CredentialVerifier, VerifyError};
use crust_security::SecurityContext;

use crate::service::Service;

#[async_trait]
impl CredentialVerifier for Service {
    async fn verify(&self, credential: Credential<'_>) -> Result<SecurityContext, VerifyError> {
        let ctx = match credential {
            Credential::Bearer(token) => self.authenticate_token(token),
            Credential::Basic { principal, secret } => self.authenticate_account(principal, secret),
        };
        ctx.ok_or_else(|| {
            tracing::debug!(?credential, "Static credential rejected");
            VerifyError::Rejected("invalid credentials".to_owned())
        })
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::config::StaticTokenPluginConfig;

    #[tokio::test]
    async fn accept_all_verifies_bearer_tokens() {
        let service = Service::from_config(&StaticTokenPluginConfig::default());
        let verifier: &dyn CredentialVerifier = &service;

        let ctx = verifier.verify(Credential::Bearer("any-token")).await.unwrap();
        assert!(!ctx.is_anonymous());
    }

    #[tokio::test]
    async fn empty_credentials_are_rejected() {
        let service = Service::from_config(&StaticTokenPluginConfig::default());
        let verifier: &dyn CredentialVerifier = &service;

        match verifier.verify(Credential::Bearer("")).await {
            Err(VerifyError::Rejected(_)) => {}
            other => panic!("Expected Rejected, got: {other:?}"),
        }

        let result = verifier
            .verify(Credential::Basic {
                principal: "",
                secret: "x",
            })
            .await;
        assert!(matches!(result, Err(VerifyError::Rejected(_))));
    }
}
