//! The ordered route registry.
//!
//! [`RouteRegistry`] keeps routes in registration order, which is also match
//! order. Names are indexed separately by [`RouteRegistry::prepare_named`];
//! adding or renaming a route drops the index until it is prepared again.
//!
//! The registry is generic over the handler type so that this crate does not
//! depend on the dispatch engine.

use std::collections::HashMap;
use std::fmt;

use switchyard_core::{SwitchyardError, SwitchyardResult};

use super::pattern::RoutePattern;

/// A route's unique identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RouteId(String);

impl RouteId {
    /// Wraps an explicit identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a fresh random identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    /// Returns the identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RouteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a route is matched against.
#[derive(Debug, Clone)]
pub enum RouteTarget {
    /// A request path pattern.
    Path(RoutePattern),
    /// A status code. Only error escalation invokes these routes.
    Status(u16),
}

/// A registered route.
pub struct Route<H> {
    id: RouteId,
    target: RouteTarget,
    methods: Vec<String>,
    name: Option<String>,
    handler: H,
}

impl<H> fmt::Debug for Route<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("id", &self.id)
            .field("target", &self.target)
            .field("methods", &self.methods)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl<H> Route<H> {
    /// Creates a path route.
    ///
    /// `methods` are matched case-insensitively; an empty list or one
    /// containing `*` accepts every method.
    pub fn new(methods: &[&str], pattern: RoutePattern, handler: H) -> Self {
        Self {
            id: RouteId::generate(),
            target: RouteTarget::Path(pattern),
            methods: normalize_methods(methods),
            name: None,
            handler,
        }
    }

    /// Creates a status-code route.
    pub fn for_status(code: u16, handler: H) -> Self {
        Self {
            id: RouteId::generate(),
            target: RouteTarget::Status(code),
            methods: Vec::new(),
            name: None,
            handler,
        }
    }

    /// Replaces the generated identifier with an explicit one.
    #[must_use]
    pub fn with_id(mut self, id: RouteId) -> Self {
        self.id = id;
        self
    }

    /// Sets the route's name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Returns the identifier.
    pub const fn id(&self) -> &RouteId {
        &self.id
    }

    /// Returns what the route matches against.
    pub const fn target(&self) -> &RouteTarget {
        &self.target
    }

    /// Returns the path pattern, or `None` for a status-code route.
    pub const fn pattern(&self) -> Option<&RoutePattern> {
        match &self.target {
            RouteTarget::Path(p) => Some(p),
            RouteTarget::Status(_) => None,
        }
    }

    /// Returns the status code for a status-code route.
    pub const fn status_code(&self) -> Option<u16> {
        match self.target {
            RouteTarget::Status(code) => Some(code),
            RouteTarget::Path(_) => None,
        }
    }

    /// Returns `true` for status-code routes.
    pub const fn is_status_route(&self) -> bool {
        matches!(self.target, RouteTarget::Status(_))
    }

    /// Returns the accepted methods, upper-cased. Empty means any.
    pub fn methods(&self) -> &[String] {
        &self.methods
    }

    /// Returns the route's name.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the handler.
    pub const fn handler(&self) -> &H {
        &self.handler
    }

    /// Returns `true` if a request with `method` may invoke this route.
    ///
    /// `HEAD` requests are also accepted by `GET` routes.
    pub fn accepts_method(&self, method: &str) -> bool {
        self.methods.is_empty()
            || self.methods.iter().any(|m| {
                m.eq_ignore_ascii_case(method)
                    || (m == "GET" && method.eq_ignore_ascii_case("HEAD"))
            })
    }

    /// Returns `true` for a catch-all path route with no method restriction.
    ///
    /// Such a route matches everything, so it says nothing about whether a
    /// request was routable and is left out of not-found tracking.
    pub fn is_unrestricted_catch_all(&self) -> bool {
        self.methods.is_empty() && self.pattern().is_some_and(RoutePattern::is_catch_all)
    }
}

fn normalize_methods(methods: &[&str]) -> Vec<String> {
    if methods.iter().any(|m| *m == "*") {
        return Vec::new();
    }
    let mut normalized: Vec<String> = Vec::with_capacity(methods.len());
    for method in methods {
        let upper = method.trim().to_ascii_uppercase();
        if !upper.is_empty() && !normalized.contains(&upper) {
            normalized.push(upper);
        }
    }
    normalized
}

/// A mutable handle to a route that was just registered.
///
/// Renaming through the handle keeps the registry's name index honest.
pub struct RouteMut<'a, H> {
    registry: &'a mut RouteRegistry<H>,
    index: usize,
}

impl<H> fmt::Debug for RouteMut<'_, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RouteMut").field(self.route()).finish()
    }
}

impl<H> RouteMut<'_, H> {
    /// Returns the route.
    pub fn route(&self) -> &Route<H> {
        &self.registry.routes[self.index]
    }

    /// Returns the route's identifier.
    pub fn id(&self) -> &RouteId {
        self.route().id()
    }

    /// Names the route, invalidating the name index.
    pub fn set_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.registry.routes[self.index].name = Some(name.into());
        self.registry.named = None;
        self
    }
}

/// Routes in registration order, plus an on-demand name index.
pub struct RouteRegistry<H> {
    routes: Vec<Route<H>>,
    named: Option<HashMap<String, usize>>,
}

impl<H> Default for RouteRegistry<H> {
    fn default() -> Self {
        Self {
            routes: Vec::new(),
            named: None,
        }
    }
}

impl<H> fmt::Debug for RouteRegistry<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteRegistry")
            .field("routes", &self.routes)
            .field("prepared", &self.named.is_some())
            .finish()
    }
}

impl<H> RouteRegistry<H> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a route.
    ///
    /// # Errors
    ///
    /// [`SwitchyardError::DuplicateRouteId`] if the route's id is taken.
    pub fn add(&mut self, route: Route<H>) -> SwitchyardResult<RouteMut<'_, H>> {
        if self.exists(route.id()) {
            return Err(SwitchyardError::DuplicateRouteId(route.id().to_string()));
        }
        self.routes.push(route);
        self.named = None;
        let index = self.routes.len() - 1;
        Ok(RouteMut {
            registry: self,
            index,
        })
    }

    /// Looks a route up by identifier.
    pub fn get(&self, id: &RouteId) -> Option<&Route<H>> {
        self.routes.iter().find(|r| r.id() == id)
    }

    /// Returns a rename handle for the route with `id`.
    pub fn get_mut(&mut self, id: &RouteId) -> Option<RouteMut<'_, H>> {
        let index = self.routes.iter().position(|r| r.id() == id)?;
        Some(RouteMut {
            registry: self,
            index,
        })
    }

    /// Returns `true` if a route with `id` is registered.
    pub fn exists(&self, id: &RouteId) -> bool {
        self.get(id).is_some()
    }

    /// Returns every route in registration order.
    pub fn all(&self) -> &[Route<H>] {
        &self.routes
    }

    /// Iterates routes in registration order.
    pub fn iter(&self) -> std::slice::Iter<'_, Route<H>> {
        self.routes.iter()
    }

    /// Returns the number of routes.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns `true` if no route is registered.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Builds the name index.
    ///
    /// # Errors
    ///
    /// [`SwitchyardError::DuplicateRouteName`] if two routes share a name.
    pub fn prepare_named(&mut self) -> SwitchyardResult<()> {
        let mut index = HashMap::new();
        for (position, route) in self.routes.iter().enumerate() {
            if let Some(name) = route.name() {
                if index.insert(name.to_string(), position).is_some() {
                    return Err(SwitchyardError::DuplicateRouteName(name.to_string()));
                }
            }
        }
        tracing::debug!(named = index.len(), "prepared route names");
        self.named = Some(index);
        Ok(())
    }

    /// Returns `true` while the name index is current.
    pub const fn is_prepared(&self) -> bool {
        self.named.is_some()
    }

    /// Looks a route up by name.
    ///
    /// # Errors
    ///
    /// [`SwitchyardError::RouteNameNotPrepared`] before
    /// [`prepare_named`](Self::prepare_named), or
    /// [`SwitchyardError::UnknownRouteName`] for a name no route carries.
    pub fn find_by_name(&self, name: &str) -> SwitchyardResult<&Route<H>> {
        let index = self
            .named
            .as_ref()
            .ok_or(SwitchyardError::RouteNameNotPrepared)?;
        index
            .get(name)
            .map(|&position| &self.routes[position])
            .ok_or_else(|| SwitchyardError::UnknownRouteName(name.to_string()))
    }
}

impl<'a, H> IntoIterator for &'a RouteRegistry<H> {
    type Item = &'a Route<H>;
    type IntoIter = std::slice::Iter<'a, Route<H>>;

    fn into_iter(self) -> Self::IntoIter {
        self.routes.iter()
    }
}
