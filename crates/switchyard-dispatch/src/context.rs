//! What a handler sees while it runs.

use std::sync::Arc;

use switchyard_core::{App, SwitchyardResult};
use switchyard_http::{Request, Response, Route, Transport};

use crate::capture::OutputCapture;
use crate::router::Router;
use crate::signal::HandlerResult;

/// A route handler.
pub type Handler = Arc<dyn Fn(&mut HandlerContext<'_>) -> HandlerResult + Send + Sync>;

/// The per-invocation view of a dispatch.
///
/// # Examples
///
/// ```
/// use switchyard_dispatch::{HandlerContext, HandlerResult, Reply, Router};
///
/// fn greet(ctx: &mut HandlerContext<'_>) -> HandlerResult {
///     let name = ctx.request.param_or("name", "stranger").to_string();
///     ctx.echo("Hello, ")?;
///     Ok(Reply::text(name))
/// }
///
/// let mut router = Router::new();
/// router.get("/hello/[:name]", greet).unwrap();
/// ```
pub struct HandlerContext<'a> {
    /// The request, with this route's placeholders already bound.
    pub request: &'a Request,
    /// The response being built.
    pub response: &'a mut Response,
    /// The router running the dispatch.
    pub router: &'a Router,
    /// Routes whose path matched so far, this one included.
    pub matched: &'a [&'a Route<Handler>],
    /// Methods of the matched routes, sorted and deduplicated.
    pub methods_matched: &'a [String],
    pub(crate) output: &'a mut OutputCapture,
    pub(crate) transport: &'a mut dyn Transport,
}

impl HandlerContext<'_> {
    /// The router's service container.
    pub const fn services(&self) -> &App {
        self.router.services()
    }

    /// Streams `text` according to the dispatch's capture mode.
    pub fn echo(&mut self, text: &str) -> SwitchyardResult<()> {
        self.output.write(text, &mut *self.transport)
    }

    /// Shorthand for `self.request.param(name)`.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.request.param(name)
    }
}
