//! # switchyard-dispatch
//!
//! The dispatch engine for switchyard. A [`Router`] holds routes in
//! registration order; [`Router::dispatch`] runs every route whose path and
//! method match a request, honours the control signals handlers return, and
//! escalates not-found, method-not-allowed, aborts and faults to status
//! routes and error hooks.
//!
//! ## Modules
//!
//! - [`router`] - Registration, namespaces, hooks, and reverse lookup
//! - [`engine`] - The dispatch loop and its options
//! - [`signal`] - Handler results and control signals
//! - [`fault`] - Dispatch faults and the unhandled-fault error
//! - [`capture`] - Streamed output capture
//! - [`context`] - The handler context
//! - [`hooks`] - Error and after-dispatch hooks

pub mod capture;
pub mod context;
pub mod engine;
mod escalation;
pub mod fault;
pub mod hooks;
pub mod router;
pub mod signal;

pub use capture::OutputCapture;
pub use context::{Handler, HandlerContext};
pub use engine::{DispatchOptions, Dispatched, Exchange};
pub use fault::{DispatchFault, FaultStage, UnhandledDispatchFault};
pub use hooks::{AfterDispatchHook, ErrorHook, Hooks, HttpErrorContext, HttpErrorHook};
pub use router::Router;
pub use signal::{
    abort, fail, fail_http, skip_next, skip_remaining, skip_this, ControlSignal, HandlerResult,
    Interrupt, Invocation, Reply,
};
