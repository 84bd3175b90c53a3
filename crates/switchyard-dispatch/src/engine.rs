//! The dispatch loop.
//!
//! One call to [`Router::dispatch`] walks the registry in order, invokes every
//! route whose path and method match, and reacts to what each handler hands
//! back:
//!
//! 1. **Matching.** Every non-status route is tested against the path. Path
//!    matches are tracked for not-found and method-not-allowed decisions
//!    even when the method differs or the route is being skipped.
//! 2. **Invoking.** A route whose method also matches gets its placeholders
//!    bound into the request and its handler called. A control signal skips
//!    or stops; a fault or abort ends the loop.
//! 3. **Escalating.** Not-found, method-not-allowed, aborts and faults run
//!    the matching status routes and the error hooks.
//! 4. **After hooks.** Buffered output is folded into the response, the
//!    after-dispatch hooks run, and the response is optionally sent.
//!
//! Only a fault nothing could handle crosses the call boundary, as an
//! [`UnhandledDispatchFault`].

use http::{Method, StatusCode};

use switchyard_core::logging::dispatch_span;
use switchyard_core::{CaptureMode, Settings, SwitchyardResult};
use switchyard_http::{BufferedTransport, Request, Response, Route, RouteId, Transport};

use crate::capture::OutputCapture;
use crate::context::{Handler, HandlerContext};
use crate::fault::{DispatchFault, FaultStage, UnhandledDispatchFault};
use crate::router::Router;
use crate::signal::{ControlSignal, Invocation};

/// How a single dispatch call behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchOptions {
    /// Hand the response to the transport at the end.
    pub send: bool,
    /// How streamed output is combined with the body.
    pub capture: CaptureMode,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            send: true,
            capture: CaptureMode::Direct,
        }
    }
}

impl DispatchOptions {
    /// Creates options from explicit values.
    pub const fn new(send: bool, capture: CaptureMode) -> Self {
        Self { send, capture }
    }

    /// Reads the dispatch defaults from `settings`.
    pub const fn from_settings(settings: &Settings) -> Self {
        Self {
            send: settings.send_response,
            capture: settings.default_capture_mode,
        }
    }

    /// Sets whether the response is sent.
    #[must_use]
    pub const fn with_send(mut self, send: bool) -> Self {
        self.send = send;
        self
    }

    /// Sets the capture mode.
    #[must_use]
    pub const fn with_capture(mut self, capture: CaptureMode) -> Self {
        self.capture = capture;
        self
    }
}

/// What a completed dispatch reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatched {
    /// Buffered output, for [`CaptureMode::CaptureAndReturn`] only.
    pub captured: Option<String>,
    /// Ids of the routes whose path matched, in registration order.
    pub matched: Vec<RouteId>,
    /// Methods of those routes, sorted and deduplicated.
    pub methods_matched: Vec<String>,
    /// The final response status.
    pub status: u16,
}

/// A request handled end to end by [`Router::handle`].
#[derive(Debug)]
pub struct Exchange {
    /// The request, with bound parameters.
    pub request: Request,
    /// The final response.
    pub response: Response,
    /// The dispatch report.
    pub dispatched: Dispatched,
    /// The in-memory transport that received streamed output and the response.
    pub transport: BufferedTransport,
}

/// Why the matching loop stopped.
#[derive(Debug)]
enum LoopExit {
    Exhausted,
    SkippedRemaining,
    Aborted(u16),
    Faulted(DispatchFault),
}

/// State carried through one dispatch.
pub(crate) struct DispatchRun<'r> {
    pub(crate) router: &'r Router,
    pub(crate) matched: Vec<&'r Route<Handler>>,
    pub(crate) methods_matched: Vec<String>,
    pub(crate) output: OutputCapture,
}

impl<'r> DispatchRun<'r> {
    const fn new(router: &'r Router, output: OutputCapture) -> Self {
        Self {
            router,
            matched: Vec::new(),
            methods_matched: Vec::new(),
            output,
        }
    }

    fn execute(
        &mut self,
        request: &mut Request,
        response: &mut Response,
        options: DispatchOptions,
        transport: &mut dyn Transport,
    ) -> Result<Option<String>, UnhandledDispatchFault> {
        match self.run_routes(request, response, transport) {
            LoopExit::Exhausted => self.conclude_exhausted(request, response, transport)?,
            LoopExit::SkippedRemaining => tracing::debug!("remaining routes skipped"),
            LoopExit::Aborted(code) => self.abort(code, request, response, transport)?,
            LoopExit::Faulted(fault) => self.fault(fault, request, response, transport)?,
        }

        let captured = self
            .output
            .finish(response)
            .map_err(|err| UnhandledDispatchFault::new(err.into(), FaultStage::AfterDispatch))?;

        for hook in self.router.hooks().after_dispatch_hooks() {
            hook(self.router, response)
                .map_err(|fault| UnhandledDispatchFault::new(fault, FaultStage::AfterDispatch))?;
        }

        if request.is_head() {
            with_unlocked(response, |r| r.set_body(String::new()))
                .map_err(|err| UnhandledDispatchFault::new(err.into(), FaultStage::AfterDispatch))?;
        }

        if options.send {
            response
                .send(transport)
                .map_err(|err| UnhandledDispatchFault::new(err.into(), FaultStage::Send))?;
        }
        Ok(captured)
    }

    fn run_routes(
        &mut self,
        request: &mut Request,
        response: &mut Response,
        transport: &mut dyn Transport,
    ) -> LoopExit {
        let router = self.router;
        let method = request.method().as_str().to_string();
        let mut skip = 0usize;

        for route in router.routes().iter().filter(|r| !r.is_status_route()) {
            let Some(pattern) = route.pattern() else {
                continue;
            };
            let found = pattern.match_path(request.path());
            if found.is_some() {
                self.track(route);
            }
            if skip > 0 {
                skip -= 1;
                tracing::debug!(route = %route.id(), "route skipped");
                continue;
            }
            let Some(found) = found else {
                continue;
            };
            if !route.accepts_method(&method) {
                continue;
            }

            for (name, value) in found.into_params() {
                request.set_param(name, value);
            }
            tracing::debug!(route = %route.id(), pattern = pattern.raw(), "invoking route");

            match self.invoke(route, request, response, transport) {
                Invocation::Completed(reply) => {
                    if let Err(err) = self.output.absorb(reply, response) {
                        return LoopExit::Faulted(err.into());
                    }
                }
                Invocation::Signalled(ControlSignal::SkipThis) => self.untrack(route),
                Invocation::Signalled(ControlSignal::SkipNext(count)) => skip = count,
                Invocation::Signalled(ControlSignal::SkipRemaining) => {
                    return LoopExit::SkippedRemaining;
                }
                Invocation::Signalled(ControlSignal::Abort(code)) => return LoopExit::Aborted(code),
                Invocation::Faulted(fault) => return LoopExit::Faulted(fault),
            }
        }
        LoopExit::Exhausted
    }

    /// Calls a route's handler with a fresh context.
    pub(crate) fn invoke(
        &mut self,
        route: &'r Route<Handler>,
        request: &Request,
        response: &mut Response,
        transport: &mut dyn Transport,
    ) -> Invocation {
        let mut ctx = HandlerContext {
            request,
            response,
            router: self.router,
            matched: &self.matched,
            methods_matched: &self.methods_matched,
            output: &mut self.output,
            transport,
        };
        Invocation::from((route.handler())(&mut ctx))
    }

    fn track(&mut self, route: &'r Route<Handler>) {
        if route.is_unrestricted_catch_all() {
            return;
        }
        self.matched.push(route);
        self.refresh_methods();
    }

    fn untrack(&mut self, route: &Route<Handler>) {
        self.matched.retain(|r| r.id() != route.id());
        self.refresh_methods();
    }

    fn refresh_methods(&mut self) {
        let mut methods: Vec<String> = self
            .matched
            .iter()
            .flat_map(|r| r.methods().iter().cloned())
            .collect();
        methods.sort();
        methods.dedup();
        self.methods_matched = methods;
    }

    /// Decides what an exhausted loop means: not found, method not allowed,
    /// an `OPTIONS` answer, or nothing at all.
    fn conclude_exhausted(
        &mut self,
        request: &Request,
        response: &mut Response,
        transport: &mut dyn Transport,
    ) -> Result<(), UnhandledDispatchFault> {
        if self.matched.is_empty() {
            tracing::debug!("no route matched");
            return self.escalate_status(404, request, response, transport);
        }

        let method = request.method();
        if *method == Method::OPTIONS {
            if !self.methods_matched.is_empty() {
                self.set_allow(response)?;
            }
            return Ok(());
        }

        if !self.matched.iter().any(|r| r.accepts_method(method.as_str())) {
            tracing::debug!(methods = ?self.methods_matched, "method not allowed");
            self.set_allow(response)?;
            return self.escalate_status(405, request, response, transport);
        }
        Ok(())
    }

    fn set_allow(&self, response: &mut Response) -> Result<(), UnhandledDispatchFault> {
        let allow = self.methods_matched.join(", ");
        with_unlocked(response, |r| r.set_header("Allow", &allow))
            .map_err(|err| UnhandledDispatchFault::new(err.into(), FaultStage::Escalation))
    }
}

/// Runs `write` against `response` with the lock lifted, then restores it.
pub(crate) fn with_unlocked<T>(
    response: &mut Response,
    write: impl FnOnce(&mut Response) -> SwitchyardResult<T>,
) -> SwitchyardResult<T> {
    let was_locked = response.is_locked();
    response.unlock();
    let result = write(response);
    if was_locked {
        response.lock();
    }
    result
}

impl Router {
    /// Dispatches `request`, building `response` in place.
    ///
    /// Streamed output goes to `transport` or is captured per
    /// `options.capture`; the finished response is handed to `transport` when
    /// `options.send` is set.
    ///
    /// # Errors
    ///
    /// [`UnhandledDispatchFault`] when a fault escapes every handler, or an
    /// escalation handler or after-dispatch hook faults. The response status
    /// is 500 by then.
    ///
    /// # Examples
    ///
    /// ```
    /// use switchyard_dispatch::{DispatchOptions, Reply, Router};
    /// use switchyard_http::{BufferedTransport, Request, Response};
    ///
    /// let mut router = Router::new();
    /// router.get("/", |_ctx| Ok(Reply::text("home"))).unwrap();
    ///
    /// let mut request = Request::builder().path("/").build();
    /// let mut response = Response::default();
    /// let mut transport = BufferedTransport::new();
    /// let outcome = router
    ///     .dispatch(&mut request, &mut response, DispatchOptions::default(), &mut transport)
    ///     .unwrap();
    /// assert_eq!(outcome.status, 200);
    /// assert_eq!(transport.last_sent().unwrap().body(), "home");
    /// ```
    pub fn dispatch(
        &self,
        request: &mut Request,
        response: &mut Response,
        options: DispatchOptions,
        transport: &mut dyn Transport,
    ) -> Result<Dispatched, UnhandledDispatchFault> {
        let span = dispatch_span(request.method().as_str(), request.path());
        let _guard = span.enter();

        let output = OutputCapture::new(options.capture, request.is_head());
        let mut run = DispatchRun::new(self, output);
        match run.execute(request, response, options, transport) {
            Ok(captured) => {
                tracing::debug!(status = response.code(), matched = run.matched.len(), "dispatch finished");
                Ok(Dispatched {
                    captured,
                    matched: run.matched.iter().map(|r| r.id().clone()).collect(),
                    methods_matched: run.methods_matched,
                    status: response.code(),
                })
            }
            Err(unhandled) => {
                tracing::error!(stage = %unhandled.stage, fault = %unhandled.fault, "unhandled dispatch fault");
                if let Err(err) = with_unlocked(response, |r| r.set_status(StatusCode::INTERNAL_SERVER_ERROR)) {
                    tracing::warn!(error = %err, "could not set status 500");
                }
                Err(unhandled)
            }
        }
    }

    /// Dispatches `request` with a fresh response and an in-memory transport,
    /// using the router's default options.
    ///
    /// # Errors
    ///
    /// As for [`dispatch`](Self::dispatch).
    pub fn handle(&self, mut request: Request) -> Result<Exchange, UnhandledDispatchFault> {
        let mut response = Response::default();
        let mut transport = BufferedTransport::new();
        let dispatched = self.dispatch(&mut request, &mut response, self.default_options(), &mut transport)?;
        Ok(Exchange {
            request,
            response,
            dispatched,
            transport,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::{abort, skip_this, Reply};

    fn request(method: Method, path: &str) -> Request {
        Request::builder().method(method).path(path).build()
    }

    // ── Options ─────────────────────────────────────────────────────

    #[test]
    fn test_options_defaults_and_builders() {
        let options = DispatchOptions::default();
        assert!(options.send);
        assert_eq!(options.capture, CaptureMode::Direct);

        let options = options.with_send(false).with_capture(CaptureMode::CaptureAndAppend);
        assert_eq!(options, DispatchOptions::new(false, CaptureMode::CaptureAndAppend));

        let settings = Settings {
            send_response: false,
            default_capture_mode: CaptureMode::CaptureAndReturn,
            ..Settings::default()
        };
        assert_eq!(
            DispatchOptions::from_settings(&settings),
            DispatchOptions::new(false, CaptureMode::CaptureAndReturn)
        );
    }

    // ── Tracking ────────────────────────────────────────────────────

    #[test]
    fn test_matched_excludes_unrestricted_catch_all() {
        let mut router = Router::new();
        router.respond("*", |_| Ok(Reply::None)).unwrap();
        router.get("/a", |_| Ok(Reply::None)).unwrap();
        router.register(&["POST"], "*", |_| Ok(Reply::None)).unwrap();

        let exchange = router.handle(request(Method::GET, "/a")).unwrap();
        assert_eq!(exchange.dispatched.matched.len(), 2);
        assert_eq!(exchange.dispatched.methods_matched, vec!["GET", "POST"]);
    }

    #[test]
    fn test_skip_this_withdraws_route() {
        let mut router = Router::new();
        router.post("/a", |_| skip_this()).unwrap();
        let exchange = router.handle(request(Method::POST, "/a")).unwrap();
        assert!(exchange.dispatched.matched.is_empty());
        assert!(exchange.dispatched.methods_matched.is_empty());
        assert_eq!(exchange.dispatched.status, 404);
    }

    #[test]
    fn test_with_unlocked_restores_lock() {
        let mut response = Response::default();
        response.lock();
        with_unlocked(&mut response, |r| r.set_code(418)).unwrap();
        assert!(response.is_locked());
        assert_eq!(response.code(), 418);
    }

    #[test]
    fn test_abort_locks_and_sends() {
        let mut router = Router::new();
        router.respond("*", |_| abort(503)).unwrap();
        let exchange = router.handle(request(Method::GET, "/")).unwrap();
        assert_eq!(exchange.response.code(), 503);
        assert!(exchange.response.is_locked());
        assert!(exchange.response.is_sent());
        assert_eq!(exchange.transport.sent().len(), 1);
    }
}
