use http::Method;

use crate::rules::RuleSet;

/// How authentication state is carried between requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Every request proves its identity with a bearer token.
    Stateless,
    /// Identity is kept server-side, keyed by a session cookie.
    Session,
}

/// Outcome of the authorization policy for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The request proceeds without authentication.
    Permit,
    /// The request must carry a valid credential, token or session.
    Authenticate,
}

/// The part of a request the policy looks at.
#[derive(Debug, Clone, Copy)]
pub struct RequestDescriptor<'a> {
    pub method: &'a Method,
    pub path: &'a str,
}

impl<'a> RequestDescriptor<'a> {
    #[must_use]
    pub fn new(method: &'a Method, path: &'a str) -> Self {
        Self { method, path }
    }
}

/// Resolve the decision for `request`.
///
/// The first matching PERMIT rule wins; the AUTHENTICATE catch-all applies only
/// when no rule matches. `OPTIONS` requests always match the leading preflight
/// rule. Pure: the same inputs always give the same decision.
#[must_use]
pub fn resolve(request: &RequestDescriptor<'_>, rules: &RuleSet, mode: Mode) -> Decision {
    match rules.matching_rule(request.method, request.path) {
        Some(rule) => {
            tracing::trace!(
                method = %request.method,
                path = request.path,
                ?mode,
                source = %rule.source(),
                pattern = %rule.pattern(),
                "Request permitted"
            );
            Decision::Permit
        }
        None => Decision::Authenticate,
    }
}

/// The frozen `(RuleSet, Mode)` pair used by the middleware.
#[derive(Debug, Clone)]
pub struct AuthorizationPolicy {
    rules: RuleSet,
    mode: Mode,
}

impl AuthorizationPolicy {
    #[must_use]
    pub fn new(rules: RuleSet, mode: Mode) -> Self {
        Self { rules, mode }
    }

    /// Resolve the decision for a given (method, path).
    #[must_use]
    pub fn resolve(&self, method: &Method, path: &str) -> Decision {
        resolve(&RequestDescriptor::new(method, path), &self.rules, self.mode)
    }

    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    #[must_use]
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::CrustConfig;
    use crate::error::CrustError;
    use crate::routes::{RouteRegistry, RouteSpec};
    use crate::rules::{RuleContributor, RuleSetBuilder};

    struct FixedRoutes(Vec<RouteSpec>);

    impl RouteRegistry for FixedRoutes {
        fn routes(&self) -> Vec<RouteSpec> {
            self.0.clone()
        }
    }

    fn policy_from(
        config: &CrustConfig,
        routes: Option<&dyn RouteRegistry>,
    ) -> AuthorizationPolicy {
        let rules = RuleSet::from_config(config, routes, &[]).unwrap();
        AuthorizationPolicy::new(rules, config.mode())
    }

    fn scenario_config() -> CrustConfig {
        CrustConfig {
            login_url: "/login".to_owned(),
            permit_urls: vec!["/public/**".to_owned()],
            ..CrustConfig::default()
        }
    }

    #[test]
    fn options_is_always_permitted() {
        for stateless in [true, false] {
            let config = CrustConfig {
                stateless,
                ..CrustConfig::default()
            };
            let policy = policy_from(&config, None);
            for path in ["/", "/secure", "/admin/users/1", "/logout"] {
                assert_eq!(policy.resolve(&Method::OPTIONS, path), Decision::Permit);
            }
        }
    }

    #[test]
    fn login_path_is_permitted_for_any_method() {
        let policy = policy_from(&scenario_config(), None);
        assert_eq!(policy.resolve(&Method::GET, "/login"), Decision::Permit);
        assert_eq!(policy.resolve(&Method::POST, "/login"), Decision::Permit);
    }

    #[test]
    fn permit_and_secure_paths() {
        let policy = policy_from(&scenario_config(), None);
        assert_eq!(policy.mode(), Mode::Stateless);
        assert_eq!(policy.resolve(&Method::GET, "/public/x"), Decision::Permit);
        assert_eq!(policy.resolve(&Method::GET, "/secure"), Decision::Authenticate);
    }

    #[test]
    fn addition_permit_urls_are_permitted() {
        let config = CrustConfig {
            addition_permit_urls: vec!["/webhooks/{provider}".to_owned()],
            ..CrustConfig::default()
        };
        let policy = policy_from(&config, None);
        assert_eq!(policy.resolve(&Method::POST, "/webhooks/stripe"), Decision::Permit);
        assert_eq!(policy.resolve(&Method::POST, "/webhooks"), Decision::Authenticate);
    }

    #[test]
    fn anonymous_route_is_permitted_without_permit_entry() {
        let routes = FixedRoutes(vec![
            RouteSpec::new(Method::GET, "/anon/ping", true),
            RouteSpec::new(Method::GET, "/private/ping", false),
        ]);
        let policy = policy_from(&CrustConfig::default(), Some(&routes));

        assert_eq!(policy.resolve(&Method::GET, "/anon/ping"), Decision::Permit);
        // the marker covers the pattern, not the method it was registered with
        assert_eq!(policy.resolve(&Method::DELETE, "/anon/ping"), Decision::Permit);
        assert_eq!(
            policy.resolve(&Method::GET, "/private/ping"),
            Decision::Authenticate
        );
    }

    #[test]
    fn extension_rules_precede_catch_all() {
        let hook: Arc<dyn RuleContributor> =
            Arc::new(|rules: &mut RuleSetBuilder| -> Result<(), CrustError> {
                rules.permit_method(Method::GET, "/metrics")?;
                Ok(())
            });
        let rules = RuleSet::from_config(&CrustConfig::default(), None, &[hook]).unwrap();
        let policy = AuthorizationPolicy::new(rules, Mode::Stateless);

        assert_eq!(policy.resolve(&Method::GET, "/metrics"), Decision::Permit);
        assert_eq!(policy.resolve(&Method::POST, "/metrics"), Decision::Authenticate);
    }

    #[test]
    fn logout_path_is_not_a_permit_rule() {
        let policy = policy_from(&CrustConfig::default(), None);
        assert_eq!(policy.resolve(&Method::POST, "/logout"), Decision::Authenticate);
    }

    #[test]
    fn resolve_is_idempotent() {
        let config = scenario_config();
        let rules = RuleSet::from_config(&config, None, &[]).unwrap();
        for (method, path) in [
            (Method::GET, "/public/a"),
            (Method::GET, "/secure"),
            (Method::OPTIONS, "/secure"),
        ] {
            let request = RequestDescriptor::new(&method, path);
            let first = resolve(&request, &rules, Mode::Stateless);
            let second = resolve(&request, &rules, Mode::Stateless);
            assert_eq!(first, second);
        }
    }

    #[test]
    fn mode_does_not_change_decision() {
        let rules = RuleSet::from_config(&scenario_config(), None, &[]).unwrap();
        for path in ["/public/a", "/secure", "/login"] {
            let request = RequestDescriptor::new(&Method::GET, path);
            assert_eq!(
                resolve(&request, &rules, Mode::Stateless),
                resolve(&request, &rules, Mode::Session)
            );
        }
    }
}
