//! Route table with anonymous-access markers.
//!
//! Routes are registered through [`RouteTable`], which records a [`RouteSpec`]
//! for each of them. The authorization layer queries the table once at startup
//! through [`RouteRegistry`] and turns every anonymous path into a PERMIT rule.

use std::collections::{HashMap, HashSet};

use axum::Router;
use axum::handler::Handler;
use axum::routing::{MethodFilter, on};
use http::Method;

use crate::error::CrustError;

/// Metadata of one registered route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteSpec {
    pub method: Method,
    /// Path pattern as registered with the router, e.g. `/users/{id}`.
    pub path: String,
    /// Reachable without authentication.
    pub anonymous: bool,
}

impl RouteSpec {
    #[must_use]
    pub fn new(method: Method, path: &str, anonymous: bool) -> Self {
        Self {
            method,
            path: path.to_owned(),
            anonymous,
        }
    }
}

/// Route metadata query.
pub trait RouteRegistry: Send + Sync {
    /// All registered routes.
    fn routes(&self) -> Vec<RouteSpec>;
}

impl RouteRegistry for Vec<RouteSpec> {
    fn routes(&self) -> Vec<RouteSpec> {
        self.clone()
    }
}

/// An axum [`Router`] that remembers which routes are anonymous.
///
/// ```ignore
/// let table = RouteTable::new()
///     .anonymous(Method::GET, "/anon/ping", ping)?
///     .route(Method::GET, "/orders/{id}", get_order)?;
/// ```
pub struct RouteTable<S = ()> {
    router: Router<S>,
    specs: Vec<RouteSpec>,
    registered: HashSet<(Method, String)>,
    /// Parameter-agnostic path shape -> path as first registered.
    shapes: HashMap<String, String>,
}

impl<S> Default for RouteTable<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<S> RouteTable<S>
where
    S: Clone + Send + Sync + 'static,
{
    #[must_use]
    pub fn new() -> Self {
        Self {
            router: Router::new(),
            specs: Vec::new(),
            registered: HashSet::new(),
            shapes: HashMap::new(),
        }
    }

    /// Register a route that requires authentication unless a configured
    /// permit rule covers it.
    ///
    /// # Errors
    /// Returns `CrustError::Configuration` for methods axum cannot route,
    /// malformed paths, and duplicate or conflicting registrations.
    pub fn route<H, T>(self, method: Method, path: &str, handler: H) -> Result<Self, CrustError>
    where
        H: Handler<T, S>,
        T: 'static,
    {
        self.add(method, path, handler, false)
    }

    /// Register a route reachable without authentication.
    ///
    /// # Errors
    /// Same as [`RouteTable::route`].
    pub fn anonymous<H, T>(
        self,
        method: Method,
        path: &str,
        handler: H,
    ) -> Result<Self, CrustError>
    where
        H: Handler<T, S>,
        T: 'static,
    {
        self.add(method, path, handler, true)
    }

    fn add<H, T>(
        mut self,
        method: Method,
        path: &str,
        handler: H,
        anonymous: bool,
    ) -> Result<Self, CrustError>
    where
        H: Handler<T, S>,
        T: 'static,
    {
        let filter = MethodFilter::try_from(method.clone()).map_err(|e| {
            CrustError::Configuration(format!("cannot route {method} {path}: {e}"))
        })?;
        let shape = validate_path(path)?;
        self.check_duplicate_route(&method, path, shape)?;

        tracing::debug!(%method, path, anonymous, "Registering route");
        self.router = self.router.route(path, on(filter, handler));
        self.specs.push(RouteSpec::new(method, path, anonymous));
        Ok(self)
    }

    /// axum panics on these, so they are caught before reaching the router.
    fn check_duplicate_route(
        &mut self,
        method: &Method,
        path: &str,
        shape: String,
    ) -> Result<(), CrustError> {
        if let Some(existing) = self.shapes.get(&shape).filter(|existing| *existing != path) {
            return Err(CrustError::Configuration(format!(
                "route {path} conflicts with {existing}"
            )));
        }
        if !self.registered.insert((method.clone(), path.to_owned())) {
            tracing::error!(%method, path, "Duplicate (method, path) detected");
            return Err(CrustError::Configuration(format!(
                "route {method} {path} registered twice"
            )));
        }
        self.shapes.entry(shape).or_insert_with(|| path.to_owned());
        Ok(())
    }

    /// Merge a router whose routes are not tracked; they are treated as
    /// non-anonymous.
    #[must_use]
    pub fn merge(mut self, router: Router<S>) -> Self {
        self.router = self.router.merge(router);
        self
    }

    #[must_use]
    pub fn specs(&self) -> &[RouteSpec] {
        &self.specs
    }

    #[must_use]
    pub fn into_router(self) -> Router<S> {
        self.router
    }

    #[must_use]
    pub fn into_parts(self) -> (Router<S>, Vec<RouteSpec>) {
        (self.router, self.specs)
    }
}

/// Check `path` against axum's route syntax and return its shape, with
/// parameter names erased.
fn validate_path(path: &str) -> Result<String, CrustError> {
    if !path.starts_with('/') {
        return Err(CrustError::Configuration(format!(
            "route path must start with '/': {path}"
        )));
    }
    let mut shape = String::with_capacity(path.len());
    for segment in path.split('/').skip(1) {
        shape.push('/');
        if let Some(name) = segment.strip_prefix(':') {
            return Err(CrustError::Configuration(format!(
                "route {path}: use {{{name}}} instead of :{name}"
            )));
        }
        match segment
            .strip_prefix('{')
            .and_then(|rest| rest.strip_suffix('}'))
        {
            Some(param) if param.starts_with('*') => shape.push_str("{*}"),
            Some(_) => shape.push_str("{}"),
            None => shape.push_str(segment),
        }
    }
    Ok(shape)
}

impl<S> RouteRegistry for RouteTable<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn routes(&self) -> Vec<RouteSpec> {
        self.specs.clone()
    }
}
