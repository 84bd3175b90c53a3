//! Handler results and control signals.
//!
//! A handler returns a [`HandlerResult`]: `Ok` with a [`Reply`], or `Err` with
//! an [`Interrupt`] that is either a [`ControlSignal`] or a [`DispatchFault`].
//! The engine folds that into an [`Invocation`] and branches on its tag.
//!
//! Inside a handler, the control helpers read naturally with `return`:
//!
//! ```
//! use switchyard_dispatch::signal::{skip_next, HandlerResult, Reply};
//!
//! fn handler(authorized: bool) -> HandlerResult {
//!     if !authorized {
//!         return skip_next(2);
//!     }
//!     Ok(Reply::text("welcome"))
//! }
//! # assert!(handler(false).is_err());
//! ```

use switchyard_core::{GuardedError, SwitchyardError};
use switchyard_http::Response;

use crate::fault::DispatchFault;

/// Flow control requested by a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlSignal {
    /// Stop processing the current route and move on.
    SkipThis,
    /// Do not invoke the next `n` candidate routes.
    SkipNext(usize),
    /// Stop matching. No not-found or method-not-allowed handling follows.
    SkipRemaining,
    /// Set the status, lock the response, and escalate as that status.
    Abort(u16),
}

/// What a handler produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Reply {
    /// Nothing.
    #[default]
    None,
    /// Text appended to the response body.
    Text(String),
    /// A response that replaces the current one wholesale.
    Response(Response),
}

impl Reply {
    /// Shorthand for [`Reply::Text`].
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }
}

impl From<()> for Reply {
    fn from((): ()) -> Self {
        Self::None
    }
}

impl From<&str> for Reply {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for Reply {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Response> for Reply {
    fn from(response: Response) -> Self {
        Self::Response(response)
    }
}

/// Why a handler stopped early.
#[derive(Debug)]
pub enum Interrupt {
    /// A control signal.
    Control(ControlSignal),
    /// A fault.
    Fault(DispatchFault),
}

impl From<ControlSignal> for Interrupt {
    fn from(signal: ControlSignal) -> Self {
        Self::Control(signal)
    }
}

impl From<DispatchFault> for Interrupt {
    fn from(fault: DispatchFault) -> Self {
        Self::Fault(fault)
    }
}

impl From<SwitchyardError> for Interrupt {
    fn from(err: SwitchyardError) -> Self {
        Self::Fault(DispatchFault::Error(err))
    }
}

impl From<GuardedError> for Interrupt {
    fn from(err: GuardedError) -> Self {
        Self::Fault(err.into())
    }
}

/// The result type every handler returns.
pub type HandlerResult = Result<Reply, Interrupt>;

/// A handler result, tagged for the dispatch loop.
#[derive(Debug)]
pub enum Invocation {
    /// The handler returned normally.
    Completed(Reply),
    /// The handler raised a control signal.
    Signalled(ControlSignal),
    /// The handler faulted.
    Faulted(DispatchFault),
}

impl From<HandlerResult> for Invocation {
    fn from(result: HandlerResult) -> Self {
        match result {
            Ok(reply) => Self::Completed(reply),
            Err(Interrupt::Control(signal)) => Self::Signalled(signal),
            Err(Interrupt::Fault(fault)) => Self::Faulted(fault),
        }
    }
}

/// Skips the rest of the current route.
pub const fn skip_this() -> HandlerResult {
    Err(Interrupt::Control(ControlSignal::SkipThis))
}

/// Skips the next `count` candidate routes.
pub const fn skip_next(count: usize) -> HandlerResult {
    Err(Interrupt::Control(ControlSignal::SkipNext(count)))
}

/// Stops matching altogether.
pub const fn skip_remaining() -> HandlerResult {
    Err(Interrupt::Control(ControlSignal::SkipRemaining))
}

/// Aborts the dispatch with `code`.
pub const fn abort(code: u16) -> HandlerResult {
    Err(Interrupt::Control(ControlSignal::Abort(code)))
}

/// Fails the handler with an HTTP-status fault.
pub fn fail_http(code: u16, message: impl Into<String>) -> HandlerResult {
    Err(Interrupt::Fault(DispatchFault::http(code, message)))
}

/// Fails the handler with an application fault.
pub fn fail(message: impl Into<String>) -> HandlerResult {
    Err(Interrupt::Fault(DispatchFault::handler(message)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invocation_tags() {
        assert!(matches!(
            Invocation::from(Ok(Reply::text("x"))),
            Invocation::Completed(Reply::Text(t)) if t == "x"
        ));
        assert!(matches!(
            Invocation::from(skip_next(3)),
            Invocation::Signalled(ControlSignal::SkipNext(3))
        ));
        assert!(matches!(
            Invocation::from(abort(503)),
            Invocation::Signalled(ControlSignal::Abort(503))
        ));
        assert!(matches!(
            Invocation::from(fail("boom")),
            Invocation::Faulted(DispatchFault::Handler(_))
        ));
        assert!(matches!(
            Invocation::from(fail_http(418, "teapot")),
            Invocation::Faulted(DispatchFault::Http { code: 418, .. })
        ));
    }

    #[test]
    fn test_reply_conversions() {
        assert_eq!(Reply::from(()), Reply::None);
        assert_eq!(Reply::from("a"), Reply::text("a"));
        assert_eq!(Reply::from(String::from("b")), Reply::Text("b".into()));
        assert!(matches!(Reply::from(Response::ok("c")), Reply::Response(_)));
    }

    #[test]
    fn test_question_mark_converts_errors() {
        fn handler() -> HandlerResult {
            Err(SwitchyardError::UnknownService("db".into()))?;
            Ok(Reply::None)
        }
        assert!(matches!(
            handler(),
            Err(Interrupt::Fault(DispatchFault::Error(SwitchyardError::UnknownService(_))))
        ));
    }
}
