//! The PERMIT rule set.
//!
//! Rules are collected once at startup, in a fixed order, and frozen into a
//! [`RuleSet`]. Anything not matched by a rule falls through to the implicit
//! AUTHENTICATE catch-all, which therefore always runs last.

use std::fmt;
use std::sync::Arc;

use http::Method;

use crate::config::CrustConfig;
use crate::error::CrustError;
use crate::pattern::PathPattern;
use crate::routes::RouteRegistry;

/// Where a rule came from. Only used for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleSource {
    /// `OPTIONS /**`, always the first rule.
    Preflight,
    /// `allow_static_urls`, GET only.
    StaticResource,
    Login,
    Permit,
    AdditionPermit,
    /// Route registered as anonymous in the route table.
    Anonymous,
    /// Added by a [`RuleContributor`].
    Extension,
}

impl fmt::Display for RuleSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Preflight => "preflight",
            Self::StaticResource => "static_resource",
            Self::Login => "login",
            Self::Permit => "permit",
            Self::AdditionPermit => "addition_permit",
            Self::Anonymous => "anonymous",
            Self::Extension => "extension",
        };
        f.write_str(name)
    }
}

/// A single PERMIT rule: a path pattern and an optional method restriction.
#[derive(Debug, Clone)]
pub struct PermitRule {
    pattern: PathPattern,
    method: Option<Method>,
    source: RuleSource,
}

impl PermitRule {
    #[must_use]
    pub fn matches(&self, method: &Method, path: &str) -> bool {
        self.method.as_ref().is_none_or(|m| m == method) && self.pattern.matches(path)
    }

    #[must_use]
    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    /// Method restriction; `None` means any method.
    #[must_use]
    pub fn method(&self) -> Option<&Method> {
        self.method.as_ref()
    }

    #[must_use]
    pub fn source(&self) -> RuleSource {
        self.source
    }
}

/// Immutable, ordered collection of PERMIT rules. Cheap to clone.
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Arc<[PermitRule]>,
}

impl RuleSet {
    /// Build the rule set in its canonical order: preflight, static resources,
    /// login path, permit URLs, addition permit URLs, anonymous routes, then
    /// extension rules in contribution order.
    ///
    /// # Errors
    /// Returns `CrustError::Configuration` if any pattern is invalid or a
    /// contributor fails.
    pub fn from_config(
        config: &CrustConfig,
        registry: Option<&dyn RouteRegistry>,
        contributors: &[Arc<dyn RuleContributor>],
    ) -> Result<Self, CrustError> {
        let mut builder = RuleSetBuilder::new();

        for url in &config.allow_static_urls {
            builder.push(RuleSource::StaticResource, Some(Method::GET), url)?;
        }
        builder.push(RuleSource::Login, None, &config.login_url)?;
        for url in &config.permit_urls {
            builder.push(RuleSource::Permit, None, url)?;
        }
        for url in &config.addition_permit_urls {
            builder.push(RuleSource::AdditionPermit, None, url)?;
        }
        if let Some(registry) = registry {
            builder.anonymous_routes(registry)?;
        }
        for contributor in contributors {
            contributor.contribute(&mut builder)?;
        }

        Ok(builder.build())
    }

    #[must_use]
    pub fn builder() -> RuleSetBuilder {
        RuleSetBuilder::new()
    }

    /// First rule matching the request, in rule order.
    #[must_use]
    pub fn matching_rule(&self, method: &Method, path: &str) -> Option<&PermitRule> {
        self.rules.iter().find(|rule| rule.matches(method, path))
    }

    #[must_use]
    pub fn rules(&self) -> &[PermitRule] {
        &self.rules
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Never true in practice: the preflight rule is always present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Collects rules before they are frozen into a [`RuleSet`].
///
/// Extension hooks receive a `&mut RuleSetBuilder`; everything they add is
/// appended after the configured rules and before the catch-all.
pub struct RuleSetBuilder {
    rules: Vec<PermitRule>,
}

impl Default for RuleSetBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleSetBuilder {
    /// Start a builder seeded with the `OPTIONS /**` preflight rule.
    #[must_use]
    pub fn new() -> Self {
        let preflight = PermitRule {
            pattern: PathPattern::any(),
            method: Some(Method::OPTIONS),
            source: RuleSource::Preflight,
        };
        Self {
            rules: vec![preflight],
        }
    }

    /// Permit `pattern` for any method.
    ///
    /// # Errors
    /// Returns `CrustError::Configuration` if the pattern is invalid.
    pub fn permit(&mut self, pattern: &str) -> Result<&mut Self, CrustError> {
        self.push(RuleSource::Extension, None, pattern)?;
        Ok(self)
    }

    /// Permit `pattern` for `method` only.
    ///
    /// # Errors
    /// Returns `CrustError::Configuration` if the pattern is invalid.
    pub fn permit_method(
        &mut self,
        method: Method,
        pattern: &str,
    ) -> Result<&mut Self, CrustError> {
        self.push(RuleSource::Extension, Some(method), pattern)?;
        Ok(self)
    }

    /// Permit every path pattern the registry reports as anonymous, any method.
    ///
    /// A pattern registered for several methods is added once.
    ///
    /// # Errors
    /// Returns `CrustError::Configuration` if a route pattern is invalid.
    pub fn anonymous_routes(
        &mut self,
        registry: &dyn RouteRegistry,
    ) -> Result<&mut Self, CrustError> {
        let mut seen = std::collections::BTreeSet::new();
        for spec in registry.routes() {
            if spec.anonymous && seen.insert(spec.path.clone()) {
                self.push(RuleSource::Anonymous, None, &spec.path)?;
            }
        }
        Ok(self)
    }

    pub(crate) fn push(
        &mut self,
        source: RuleSource,
        method: Option<Method>,
        pattern: &str,
    ) -> Result<(), CrustError> {
        let pattern = PathPattern::parse(pattern)?;
        tracing::trace!(%source, pattern = %pattern, method = ?method, "Adding permit rule");
        self.rules.push(PermitRule {
            pattern,
            method,
            source,
        });
        Ok(())
    }

    #[must_use]
    pub fn build(self) -> RuleSet {
        RuleSet {
            rules: self.rules.into(),
        }
    }
}

/// Extension hook contributing extra PERMIT rules at build time.
pub trait RuleContributor: Send + Sync {
    /// Add rules to `rules`.
    ///
    /// # Errors
    /// Any error aborts startup.
    fn contribute(&self, rules: &mut RuleSetBuilder) -> Result<(), CrustError>;
}

impl<F> RuleContributor for F
where
    F: Fn(&mut RuleSetBuilder) -> Result<(), CrustError> + Send + Sync,
{
    fn contribute(&self, rules: &mut RuleSetBuilder) -> Result<(), CrustError> {
        self(rules)
    }
}
