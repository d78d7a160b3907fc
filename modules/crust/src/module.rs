//! Crust definition
//!
//! Contains the `Crust` struct, which owns the authorization policy and wires
//! it into an axum router.

use std::sync::Arc;

use axum::Router;
use axum::middleware::from_fn_with_state;

use crate::auth::{self, AuthState};
use crate::config::CrustConfig;
use crate::cors::CorsPolicy;
use crate::error::CrustError;
use crate::failure::{AuthFailureHandler, StatusFailureHandler};
use crate::logout::{ContextInvalidator, NoopInvalidator};
use crate::policy::{AuthorizationPolicy, Mode};
use crate::routes::{RouteRegistry, RouteSpec};
use crate::rules::{RuleContributor, RuleSet, RuleSetBuilder};
use crate::session::SessionStore;
use crate::verifier::CredentialVerifier;

/// The configured authorization layer. Immutable once built; cloning is cheap.
#[derive(Clone)]
pub struct Crust {
    state: AuthState,
    cors: Option<CorsPolicy>,
}

impl Crust {
    #[must_use]
    pub fn builder(config: CrustConfig) -> CrustBuilder {
        CrustBuilder::new(config)
    }

    #[must_use]
    pub fn config(&self) -> &CrustConfig {
        &self.state.config
    }

    #[must_use]
    pub fn policy(&self) -> &AuthorizationPolicy {
        &self.state.policy
    }

    /// `None` when CORS is disabled in configuration.
    #[must_use]
    pub fn cors_policy(&self) -> Option<&CorsPolicy> {
        self.cors.as_ref()
    }

    /// Apply the middleware stack to `router`.
    ///
    /// `axum::Router::layer` makes the last added layer the outermost one, so
    /// layers are added innermost first: auth, then CORS, then tracing.
    #[must_use]
    pub fn apply<S>(&self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        let mut router = router.layer(from_fn_with_state(
            self.state.clone(),
            auth::crust_middleware,
        ));

        // CORS wraps auth so rejected responses still carry CORS headers.
        if let Some(cors) = &self.cors {
            router = router.layer(cors.layer());
        }

        router.layer({
            use tower_http::trace::TraceLayer;
            use tracing::field::Empty;

            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<axum::body::Body>| {
                    tracing::info_span!(
                        "http_request",
                        method = %req.method(),
                        uri = %req.uri().path(),
                        version = ?req.version(),
                        status = Empty,
                        latency_ms = Empty
                    )
                })
                .on_response(
                    |res: &axum::http::Response<axum::body::Body>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        span.record("status", res.status().as_u16());
                        span.record("latency_ms", latency.as_millis());
                    },
                )
        })
    }
}

/// Collects collaborators and extension points for a [`Crust`].
pub struct CrustBuilder {
    config: CrustConfig,
    verifier: Option<Arc<dyn CredentialVerifier>>,
    sessions: Option<Arc<dyn SessionStore>>,
    failure_handler: Arc<dyn AuthFailureHandler>,
    invalidator: Arc<dyn ContextInvalidator>,
    routes: Vec<RouteSpec>,
    contributors: Vec<Arc<dyn RuleContributor>>,
}

impl CrustBuilder {
    fn new(config: CrustConfig) -> Self {
        Self {
            config,
            verifier: None,
            sessions: None,
            failure_handler: Arc::new(StatusFailureHandler),
            invalidator: Arc::new(NoopInvalidator),
            routes: Vec::new(),
            contributors: Vec::new(),
        }
    }

    #[must_use]
    pub fn verifier(mut self, verifier: Arc<dyn CredentialVerifier>) -> Self {
        self.verifier = Some(verifier);
        self
    }

    /// Required in session mode, ignored otherwise.
    #[must_use]
    pub fn session_store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.sessions = Some(store);
        self
    }

    #[must_use]
    pub fn failure_handler(mut self, handler: impl AuthFailureHandler + 'static) -> Self {
        self.failure_handler = Arc::new(handler);
        self
    }

    #[must_use]
    pub fn context_invalidator(mut self, invalidator: impl ContextInvalidator + 'static) -> Self {
        self.invalidator = Arc::new(invalidator);
        self
    }

    /// Register routes; those flagged anonymous become PERMIT rules.
    /// May be called more than once.
    #[must_use]
    pub fn routes(mut self, registry: &dyn RouteRegistry) -> Self {
        self.routes.extend(registry.routes());
        self
    }

    /// Add rules after all built-in ones.
    #[must_use]
    pub fn additional_rules<F>(self, contribute: F) -> Self
    where
        F: Fn(&mut RuleSetBuilder) -> Result<(), CrustError> + Send + Sync + 'static,
    {
        self.rule_contributor(Arc::new(contribute))
    }

    #[must_use]
    pub fn rule_contributor(mut self, contributor: Arc<dyn RuleContributor>) -> Self {
        self.contributors.push(contributor);
        self
    }

    /// Validate configuration and freeze the rule set.
    ///
    /// # Errors
    /// Returns `CrustError::Configuration` for invalid configuration, a
    /// missing collaborator, or a malformed rule pattern.
    pub fn build(self) -> Result<Crust, CrustError> {
        self.config.validate()?;
        let mode = self.config.mode();

        let verifier = self
            .verifier
            .ok_or_else(|| CrustError::config("a credential verifier is required"))?;
        if mode == Mode::Session && self.sessions.is_none() {
            return Err(CrustError::config("session mode requires a session store"));
        }

        let rules = RuleSet::from_config(
            &self.config,
            Some(&self.routes as &dyn RouteRegistry),
            &self.contributors,
        )?;
        let cors = if self.config.cors_enabled {
            Some(CorsPolicy::from_config(&self.config)?)
        } else {
            None
        };

        tracing::info!(
            ?mode,
            rules = rules.len(),
            cors = cors.is_some(),
            login_url = %self.config.login_url,
            logout_url = %self.config.logout_url,
            "Authorization policy built"
        );

        Ok(Crust {
            state: AuthState {
                config: Arc::new(self.config),
                policy: AuthorizationPolicy::new(rules, mode),
                verifier,
                sessions: self.sessions,
                failure_handler: self.failure_handler,
                invalidator: self.invalidator,
            },
            cors,
        })
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::http::Method;
    use crust_security::SecurityContext;

    use crate::policy::Decision;
    use crate::verifier::{Credential, VerifyError};

    struct RejectAll;

    #[async_trait]
    impl CredentialVerifier for RejectAll {
        async fn verify(&self, _: Credential<'_>) -> Result<SecurityContext, VerifyError> {
            Err(VerifyError::Rejected("nope".to_owned()))
        }
    }

    fn config() -> CrustConfig {
        CrustConfig {
            permit_urls: vec!["/public/**".to_owned()],
            ..CrustConfig::default()
        }
    }

    #[test]
    fn builds_with_routes_and_additional_rules() {
        let routes = vec![RouteSpec::new(Method::GET, "/anon/ping", true)];
        let crust = Crust::builder(config())
            .verifier(Arc::new(RejectAll))
            .routes(&routes)
            .additional_rules(|rules: &mut RuleSetBuilder| -> Result<(), CrustError> {
                rules.permit("/health")?;
                Ok(())
            })
            .build()
            .unwrap();

        let policy = crust.policy();
        assert_eq!(policy.resolve(&Method::GET, "/anon/ping"), Decision::Permit);
        assert_eq!(policy.resolve(&Method::GET, "/health"), Decision::Permit);
        assert_eq!(policy.resolve(&Method::GET, "/public/a"), Decision::Permit);
        assert_eq!(policy.resolve(&Method::GET, "/secure"), Decision::Authenticate);
        assert!(crust.cors_policy().is_some());
    }

    #[test]
    fn verifier_is_required() {
        let err = Crust::builder(config()).build().err().unwrap();
        assert!(matches!(err, CrustError::Configuration(_)));
    }

    #[test]
    fn session_mode_requires_store() {
        let cfg = CrustConfig {
            stateless: false,
            ..config()
        };
        let err = Crust::builder(cfg)
            .verifier(Arc::new(RejectAll))
            .build()
            .err()
            .unwrap();
        assert!(err.to_string().contains("session store"));
    }

    #[test]
    fn cors_can_be_disabled() {
        let cfg = CrustConfig {
            cors_enabled: false,
            ..config()
        };
        let crust = Crust::builder(cfg)
            .verifier(Arc::new(RejectAll))
            .build()
            .unwrap();
        assert!(crust.cors_policy().is_none());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let cfg = CrustConfig {
            permit_urls: vec!["no-slash".to_owned()],
            ..config()
        };
        assert!(
            Crust::builder(cfg)
                .verifier(Arc::new(RejectAll))
                .build()
                .is_err()
        );
    }
}
