//! The router: route registration, namespacing, hooks, and reverse lookup.
//!
//! A [`Router`] is built with `&mut self` methods and dispatched with `&self`,
//! so a fully built router can be shared across threads while nothing can
//! register routes in the middle of a dispatch.
//!
//! ## Example
//!
//! ```
//! use switchyard_dispatch::{skip_next, Reply, Router};
//!
//! let mut router = Router::new();
//! router.respond("*", |_ctx| Ok(Reply::None)).unwrap();
//! router.get("/users/[i:id]", |ctx| {
//!     Ok(format!("user {}", ctx.param("id").unwrap_or_default()).into())
//! }).unwrap();
//! router
//!     .with("/admin", |admin| {
//!         admin.get("/?", |_ctx| skip_next(1))?;
//!         Ok(())
//!     })
//!     .unwrap();
//! assert_eq!(router.routes().len(), 3);
//! ```

use std::collections::HashMap;
use std::fmt;
use std::hash::BuildHasher;
use std::sync::Arc;

use switchyard_core::{App, Settings, SwitchyardResult, SETTINGS};
use switchyard_http::urls::reverse::reverse;
use switchyard_http::{Response, Route, RouteMut, RoutePattern, RouteRegistry};

use crate::context::{Handler, HandlerContext};
use crate::engine::DispatchOptions;
use crate::fault::DispatchFault;
use crate::hooks::{HttpErrorContext, Hooks};
use crate::signal::HandlerResult;

/// Routes, hooks, and services for one application.
pub struct Router {
    routes: RouteRegistry<Handler>,
    hooks: Hooks,
    services: App,
    namespace: Vec<String>,
    trailing_slash_tolerant: bool,
    defaults: DispatchOptions,
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("routes", &self.routes.len())
            .field("hooks", &self.hooks)
            .field("services", &self.services)
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::with_settings(&SETTINGS.try_get().cloned().unwrap_or_default())
    }
}

impl Router {
    /// Creates a router from the global [`SETTINGS`], or from
    /// [`Settings::default`] when they have not been configured.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a router configured from `settings`.
    pub fn with_settings(settings: &Settings) -> Self {
        Self {
            routes: RouteRegistry::new(),
            hooks: Hooks::new(),
            services: App::new(),
            namespace: Vec::new(),
            trailing_slash_tolerant: settings.trailing_slash_tolerant,
            defaults: DispatchOptions::from_settings(settings),
        }
    }

    /// The service container handlers see.
    pub const fn services(&self) -> &App {
        &self.services
    }

    /// The registered routes, in match order.
    pub const fn routes(&self) -> &RouteRegistry<Handler> {
        &self.routes
    }

    /// Mutable access to the routes, e.g. to rename one by id.
    pub fn routes_mut(&mut self) -> &mut RouteRegistry<Handler> {
        &mut self.routes
    }

    /// The registered hooks.
    pub const fn hooks(&self) -> &Hooks {
        &self.hooks
    }

    /// Dispatch options used when none are given.
    pub const fn default_options(&self) -> DispatchOptions {
        self.defaults
    }

    /// The active namespace prefix, empty at top level.
    pub fn namespace(&self) -> String {
        self.namespace.concat()
    }

    // ── Registration ────────────────────────────────────────────────

    /// Registers a path route.
    ///
    /// An empty `methods` slice, or one containing `"*"`, accepts every
    /// method. `pattern` is scoped by the active namespace.
    ///
    /// # Errors
    ///
    /// [`SwitchyardError::InvalidPattern`](switchyard_core::SwitchyardError::InvalidPattern)
    /// if the pattern does not compile.
    pub fn register<F>(
        &mut self,
        methods: &[&str],
        pattern: &str,
        handler: F,
    ) -> SwitchyardResult<RouteMut<'_, Handler>>
    where
        F: Fn(&mut HandlerContext<'_>) -> HandlerResult + Send + Sync + 'static,
    {
        let prefix = self.namespace();
        let compiled = if prefix.is_empty() {
            RoutePattern::compile(pattern)?
        } else {
            RoutePattern::compile_scoped(&prefix, pattern)?
        }
        .with_trailing_slash_tolerance(self.trailing_slash_tolerant);

        tracing::debug!(pattern = compiled.raw(), ?methods, "registered route");
        let handler: Handler = Arc::new(handler);
        self.routes.add(Route::new(methods, compiled, handler))
    }

    /// Registers a route for every method.
    pub fn respond<F>(&mut self, pattern: &str, handler: F) -> SwitchyardResult<RouteMut<'_, Handler>>
    where
        F: Fn(&mut HandlerContext<'_>) -> HandlerResult + Send + Sync + 'static,
    {
        self.register(&[], pattern, handler)
    }

    /// Registers a `GET` route. `HEAD` requests match it too.
    pub fn get<F>(&mut self, pattern: &str, handler: F) -> SwitchyardResult<RouteMut<'_, Handler>>
    where
        F: Fn(&mut HandlerContext<'_>) -> HandlerResult + Send + Sync + 'static,
    {
        self.register(&["GET"], pattern, handler)
    }

    /// Registers a `POST` route.
    pub fn post<F>(&mut self, pattern: &str, handler: F) -> SwitchyardResult<RouteMut<'_, Handler>>
    where
        F: Fn(&mut HandlerContext<'_>) -> HandlerResult + Send + Sync + 'static,
    {
        self.register(&["POST"], pattern, handler)
    }

    /// Registers a `PUT` route.
    pub fn put<F>(&mut self, pattern: &str, handler: F) -> SwitchyardResult<RouteMut<'_, Handler>>
    where
        F: Fn(&mut HandlerContext<'_>) -> HandlerResult + Send + Sync + 'static,
    {
        self.register(&["PUT"], pattern, handler)
    }

    /// Registers a `DELETE` route.
    pub fn delete<F>(&mut self, pattern: &str, handler: F) -> SwitchyardResult<RouteMut<'_, Handler>>
    where
        F: Fn(&mut HandlerContext<'_>) -> HandlerResult + Send + Sync + 'static,
    {
        self.register(&["DELETE"], pattern, handler)
    }

    /// Registers a `PATCH` route.
    pub fn patch<F>(&mut self, pattern: &str, handler: F) -> SwitchyardResult<RouteMut<'_, Handler>>
    where
        F: Fn(&mut HandlerContext<'_>) -> HandlerResult + Send + Sync + 'static,
    {
        self.register(&["PATCH"], pattern, handler)
    }

    /// Registers a `HEAD` route.
    pub fn head<F>(&mut self, pattern: &str, handler: F) -> SwitchyardResult<RouteMut<'_, Handler>>
    where
        F: Fn(&mut HandlerContext<'_>) -> HandlerResult + Send + Sync + 'static,
    {
        self.register(&["HEAD"], pattern, handler)
    }

    /// Registers an `OPTIONS` route.
    pub fn options<F>(&mut self, pattern: &str, handler: F) -> SwitchyardResult<RouteMut<'_, Handler>>
    where
        F: Fn(&mut HandlerContext<'_>) -> HandlerResult + Send + Sync + 'static,
    {
        self.register(&["OPTIONS"], pattern, handler)
    }

    /// Registers a route that only error escalation for `code` invokes.
    pub fn register_code<F>(&mut self, code: u16, handler: F) -> SwitchyardResult<RouteMut<'_, Handler>>
    where
        F: Fn(&mut HandlerContext<'_>) -> HandlerResult + Send + Sync + 'static,
    {
        tracing::debug!(code, "registered status route");
        let handler: Handler = Arc::new(handler);
        self.routes.add(Route::for_status(code, handler))
    }

    /// Registers the routes added by `routes` under `prefix`.
    ///
    /// Prefixes nest: a `with` inside a `with` concatenates both.
    ///
    /// # Errors
    ///
    /// Whatever `routes` returns. The prefix is removed either way.
    pub fn with<F>(&mut self, prefix: &str, routes: F) -> SwitchyardResult<()>
    where
        F: FnOnce(&mut Self) -> SwitchyardResult<()>,
    {
        self.namespace.push(prefix.to_string());
        let result = routes(self);
        self.namespace.pop();
        result
    }

    // ── Hooks ───────────────────────────────────────────────────────

    /// Adds a generic fault handler. It runs for faults without a declared
    /// HTTP status, after the 500 status routes.
    pub fn on_error<F>(&mut self, hook: F)
    where
        F: Fn(&Self, &DispatchFault, &mut Response) -> Result<(), DispatchFault> + Send + Sync + 'static,
    {
        self.hooks.push_error(Arc::new(hook));
    }

    /// Adds an HTTP error handler. It runs for every escalated status.
    pub fn on_http_error<F>(&mut self, hook: F)
    where
        F: Fn(&HttpErrorContext<'_>, &mut Response) -> Result<(), DispatchFault> + Send + Sync + 'static,
    {
        self.hooks.push_http_error(Arc::new(hook));
    }

    /// Adds a hook that runs at the end of every dispatch.
    pub fn after_dispatch<F>(&mut self, hook: F)
    where
        F: Fn(&Self, &mut Response) -> Result<(), DispatchFault> + Send + Sync + 'static,
    {
        self.hooks.push_after_dispatch(Arc::new(hook));
    }

    // ── Naming ──────────────────────────────────────────────────────

    /// Builds the route name index. Call after the last route is named.
    ///
    /// # Errors
    ///
    /// [`SwitchyardError::DuplicateRouteName`](switchyard_core::SwitchyardError::DuplicateRouteName).
    pub fn prepare_named(&mut self) -> SwitchyardResult<()> {
        self.routes.prepare_named()
    }

    /// Generates the path for the named route.
    ///
    /// See [`reverse`] for the substitution rules.
    ///
    /// # Errors
    ///
    /// The errors of [`reverse`].
    pub fn get_path_for<S: BuildHasher>(
        &self,
        name: &str,
        params: Option<&HashMap<&str, &str, S>>,
        substitute_regex: bool,
    ) -> SwitchyardResult<String> {
        reverse(&self.routes, name, params, substitute_regex)
    }
}
