//! Faults raised while dispatching.
//!
//! A handler that fails returns a [`DispatchFault`]. The engine escalates it to
//! the registered error handlers; only when nothing can handle it does
//! [`Router::dispatch`](crate::Router::dispatch) return an
//! [`UnhandledDispatchFault`].

use std::fmt;

use thiserror::Error;

use switchyard_core::{GuardedError, SwitchyardError};

/// A failure raised by a handler or hook.
#[derive(Error, Debug)]
pub enum DispatchFault {
    /// A fault that carries its own HTTP status, e.g. 400 or 403.
    #[error("HTTP {code}: {message}")]
    Http {
        /// The status to escalate with.
        code: u16,
        /// A human-readable description.
        message: String,
    },

    /// An application fault with no declared status.
    #[error("{0}")]
    Handler(String),

    /// A framework error forwarded from a handler with `?`.
    #[error(transparent)]
    Error(#[from] SwitchyardError),
}

impl DispatchFault {
    /// Builds an HTTP-status fault.
    pub fn http(code: u16, message: impl Into<String>) -> Self {
        Self::Http {
            code,
            message: message.into(),
        }
    }

    /// Builds an application fault.
    pub fn handler(message: impl Into<String>) -> Self {
        Self::Handler(message.into())
    }

    /// The status the fault declares, if any.
    pub const fn declared_status(&self) -> Option<u16> {
        match self {
            Self::Http { code, .. } => Some(*code),
            Self::Handler(_) | Self::Error(_) => None,
        }
    }

    /// The status to respond with: the declared one, or 500.
    pub const fn status_code(&self) -> u16 {
        match self.declared_status() {
            Some(code) => code,
            None => 500,
        }
    }
}

impl From<GuardedError> for DispatchFault {
    fn from(err: GuardedError) -> Self {
        Self::Handler(err.to_string())
    }
}

/// Where an unhandled fault came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultStage {
    /// A handler faulted and nothing was registered to handle it.
    Handler,
    /// A status-code route or error hook faulted while escalating.
    Escalation,
    /// An after-dispatch hook faulted.
    AfterDispatch,
    /// A handler aborted with an unrecognized status and nothing handled it.
    Abort,
    /// The finished response could not be handed to the transport.
    Send,
}

impl fmt::Display for FaultStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Handler => "handler",
            Self::Escalation => "escalation",
            Self::AfterDispatch => "after-dispatch",
            Self::Abort => "abort",
            Self::Send => "send",
        })
    }
}

/// A fault that escaped every handler. The only error `dispatch` returns.
#[derive(Error, Debug)]
#[error("unhandled fault during {stage}: {fault}")]
pub struct UnhandledDispatchFault {
    /// The fault itself.
    pub fault: DispatchFault,
    /// The stage it escaped from.
    pub stage: FaultStage,
}

impl UnhandledDispatchFault {
    /// Wraps a fault.
    pub const fn new(fault: DispatchFault, stage: FaultStage) -> Self {
        Self { fault, stage }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(DispatchFault::http(403, "no").status_code(), 403);
        assert_eq!(DispatchFault::http(403, "no").declared_status(), Some(403));
        assert_eq!(DispatchFault::handler("boom").status_code(), 500);
        assert_eq!(DispatchFault::handler("boom").declared_status(), None);
        assert_eq!(
            DispatchFault::from(SwitchyardError::ResponseLocked).declared_status(),
            None
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(DispatchFault::http(400, "bad").to_string(), "HTTP 400: bad");
        assert_eq!(DispatchFault::handler("boom").to_string(), "boom");
        let unhandled = UnhandledDispatchFault::new(DispatchFault::handler("boom"), FaultStage::AfterDispatch);
        assert_eq!(unhandled.to_string(), "unhandled fault during after-dispatch: boom");
    }

    #[test]
    fn test_from_guarded_error() {
        let guarded = GuardedError::new("disk full").with_param("device", "sda");
        let fault = DispatchFault::from(guarded);
        assert!(matches!(&fault, DispatchFault::Handler(msg) if msg.contains("disk full") && msg.contains("sda")));
    }
}
