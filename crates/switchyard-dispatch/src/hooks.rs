//! Error and after-dispatch hooks.
//!
//! Hooks are kept in registration order and called in that order. Each kind
//! receives what it needs to inspect or finalize the response:
//!
//! - [`ErrorHook`] runs for faults that declare no HTTP status.
//! - [`HttpErrorHook`] runs for every HTTP error: not found, method not
//!   allowed, aborts, and faults.
//! - [`AfterDispatchHook`] runs once matching and escalation are over.

use std::fmt;
use std::sync::Arc;

use switchyard_http::{Response, Route};

use crate::context::Handler;
use crate::fault::DispatchFault;
use crate::router::Router;

/// A generic fault handler.
pub type ErrorHook =
    Arc<dyn Fn(&Router, &DispatchFault, &mut Response) -> Result<(), DispatchFault> + Send + Sync>;

/// An HTTP error handler.
pub type HttpErrorHook =
    Arc<dyn Fn(&HttpErrorContext<'_>, &mut Response) -> Result<(), DispatchFault> + Send + Sync>;

/// A post-dispatch hook.
pub type AfterDispatchHook =
    Arc<dyn Fn(&Router, &mut Response) -> Result<(), DispatchFault> + Send + Sync>;

/// What an [`HttpErrorHook`] is told about the error.
pub struct HttpErrorContext<'a> {
    /// The HTTP status being escalated.
    pub code: u16,
    /// The router running the dispatch.
    pub router: &'a Router,
    /// Routes whose path matched.
    pub matched: &'a [&'a Route<Handler>],
    /// Methods of the matched routes, sorted and deduplicated.
    pub methods_matched: &'a [String],
    /// The fault that caused the error. Not-found and method-not-allowed
    /// conditions are described by an HTTP fault with the same code.
    pub fault: &'a DispatchFault,
}

impl fmt::Debug for HttpErrorContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpErrorContext")
            .field("code", &self.code)
            .field("matched", &self.matched.len())
            .field("methods_matched", &self.methods_matched)
            .field("fault", &self.fault)
            .finish_non_exhaustive()
    }
}

/// The hooks registered on a router.
#[derive(Default, Clone)]
pub struct Hooks {
    on_error: Vec<ErrorHook>,
    on_http_error: Vec<HttpErrorHook>,
    after_dispatch: Vec<AfterDispatchHook>,
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("on_error", &self.on_error.len())
            .field("on_http_error", &self.on_http_error.len())
            .field("after_dispatch", &self.after_dispatch.len())
            .finish()
    }
}

impl Hooks {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a generic fault handler.
    pub fn push_error(&mut self, hook: ErrorHook) {
        self.on_error.push(hook);
    }

    /// Adds an HTTP error handler.
    pub fn push_http_error(&mut self, hook: HttpErrorHook) {
        self.on_http_error.push(hook);
    }

    /// Adds a post-dispatch hook.
    pub fn push_after_dispatch(&mut self, hook: AfterDispatchHook) {
        self.after_dispatch.push(hook);
    }

    /// Generic fault handlers in registration order.
    pub fn error_hooks(&self) -> &[ErrorHook] {
        &self.on_error
    }

    /// HTTP error handlers in registration order.
    pub fn http_error_hooks(&self) -> &[HttpErrorHook] {
        &self.on_http_error
    }

    /// Post-dispatch hooks in registration order.
    pub fn after_dispatch_hooks(&self) -> &[AfterDispatchHook] {
        &self.after_dispatch
    }

    /// Returns `true` if at least one fault or HTTP error handler exists.
    pub fn handles_errors(&self) -> bool {
        !self.on_error.is_empty() || !self.on_http_error.is_empty()
    }
}
