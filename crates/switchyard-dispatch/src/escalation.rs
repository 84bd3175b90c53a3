//! Error escalation.
//!
//! Not-found, method-not-allowed, aborts and faults are all escalated the same
//! way: the status routes registered for the code run in order, then the
//! error hooks. While that happens the response is unlocked. Afterwards it is
//! locked again if an abort was involved, and otherwise left as it was found.
//!
//! A fault without a declared status is special. It becomes a 500, and it is
//! only recoverable when a 500 status route or an error hook exists.

use http::StatusCode;

use switchyard_core::{SwitchyardError, SwitchyardResult};
use switchyard_http::{Request, Response, Transport};

use crate::engine::{with_unlocked, DispatchRun};
use crate::fault::{DispatchFault, FaultStage, UnhandledDispatchFault};
use crate::hooks::HttpErrorContext;
use crate::signal::{ControlSignal, Invocation};

/// What started an escalation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    /// The loop ran out with no match, or with no method match.
    Exhausted,
    /// A handler aborted.
    Abort,
    /// A handler faulted with a declared HTTP status.
    HttpFault,
    /// A handler faulted without a declared status.
    Fault,
}

fn reason(code: u16) -> &'static str {
    StatusCode::from_u16(code)
        .ok()
        .and_then(|status| status.canonical_reason())
        .unwrap_or("Unrecognized Status")
}

fn is_recognized(code: u16) -> bool {
    StatusCode::from_u16(code).is_ok_and(|status| status.canonical_reason().is_some())
}

/// Sets `code` regardless of the lock. A code that cannot go on a status line
/// leaves a 500 behind instead.
fn apply_code(response: &mut Response, code: u16) -> SwitchyardResult<()> {
    with_unlocked(response, |r| match r.set_code(code) {
        Err(SwitchyardError::InvalidStatusCode(_)) => {
            tracing::warn!(code, "status code out of range, responding with 500");
            r.set_status(StatusCode::INTERNAL_SERVER_ERROR)
        }
        other => other,
    })
}

impl DispatchRun<'_> {
    /// Sets `code` and escalates it as a not-found or method-not-allowed.
    pub(crate) fn escalate_status(
        &mut self,
        code: u16,
        request: &Request,
        response: &mut Response,
        transport: &mut dyn Transport,
    ) -> Result<(), UnhandledDispatchFault> {
        with_unlocked(response, |r| r.set_code(code))
            .map_err(|err| UnhandledDispatchFault::new(err.into(), FaultStage::Escalation))?;
        let fault = DispatchFault::http(code, reason(code));
        self.escalate(code, &fault, Trigger::Exhausted, request, response, transport)
    }

    /// Handles `Abort(code)`: sets the status, locks, and escalates.
    pub(crate) fn abort(
        &mut self,
        code: u16,
        request: &Request,
        response: &mut Response,
        transport: &mut dyn Transport,
    ) -> Result<(), UnhandledDispatchFault> {
        tracing::info!(code, "dispatch aborted");
        apply_code(response, code)
            .map_err(|err| UnhandledDispatchFault::new(err.into(), FaultStage::Abort))?;
        response.lock();

        let fault = DispatchFault::http(code, reason(code));
        if !is_recognized(code) && !self.can_escalate(code) {
            return Err(UnhandledDispatchFault::new(fault, FaultStage::Abort));
        }
        self.escalate(code, &fault, Trigger::Abort, request, response, transport)
    }

    /// Handles a handler fault.
    pub(crate) fn fault(
        &mut self,
        fault: DispatchFault,
        request: &Request,
        response: &mut Response,
        transport: &mut dyn Transport,
    ) -> Result<(), UnhandledDispatchFault> {
        if let Some(code) = fault.declared_status() {
            tracing::info!(code, %fault, "handler raised an HTTP fault");
            apply_code(response, code)
                .map_err(|err| UnhandledDispatchFault::new(err.into(), FaultStage::Handler))?;
            if !is_recognized(code) && !self.can_escalate(code) {
                return Err(UnhandledDispatchFault::new(fault, FaultStage::Handler));
            }
            return self.escalate(code, &fault, Trigger::HttpFault, request, response, transport);
        }

        tracing::warn!(%fault, "handler faulted");
        with_unlocked(response, |r| r.set_status(StatusCode::INTERNAL_SERVER_ERROR))
            .map_err(|err| UnhandledDispatchFault::new(err.into(), FaultStage::Handler))?;
        if !self.has_status_routes(500) && !self.router.hooks().handles_errors() {
            return Err(UnhandledDispatchFault::new(fault, FaultStage::Handler));
        }
        self.escalate(500, &fault, Trigger::Fault, request, response, transport)
    }

    fn has_status_routes(&self, code: u16) -> bool {
        self.router
            .routes()
            .iter()
            .any(|r| r.status_code() == Some(code))
    }

    fn can_escalate(&self, code: u16) -> bool {
        self.has_status_routes(code) || !self.router.hooks().http_error_hooks().is_empty()
    }

    fn escalate(
        &mut self,
        code: u16,
        fault: &DispatchFault,
        trigger: Trigger,
        request: &Request,
        response: &mut Response,
        transport: &mut dyn Transport,
    ) -> Result<(), UnhandledDispatchFault> {
        tracing::info!(code, ?trigger, "escalating");
        let was_locked = response.is_locked();
        response.unlock();

        let result = self.run_escalation(code, fault, trigger, request, response, transport);

        let aborted = matches!(result, Ok(true));
        if was_locked || aborted || trigger == Trigger::Abort {
            response.lock();
        }
        result.map(|_| ())
    }

    /// Runs status routes then hooks. Returns `true` if a status route aborted.
    fn run_escalation(
        &mut self,
        code: u16,
        fault: &DispatchFault,
        trigger: Trigger,
        request: &Request,
        response: &mut Response,
        transport: &mut dyn Transport,
    ) -> Result<bool, UnhandledDispatchFault> {
        let escalation = |err: DispatchFault| UnhandledDispatchFault::new(err, FaultStage::Escalation);
        let aborted = self.run_status_routes(code, request, response, transport)?;

        let router = self.router;
        if trigger == Trigger::Fault {
            for hook in router.hooks().error_hooks() {
                hook(router, fault, response).map_err(escalation)?;
            }
        }

        let ctx = HttpErrorContext {
            code,
            router,
            matched: &self.matched,
            methods_matched: &self.methods_matched,
            fault,
        };
        for hook in router.hooks().http_error_hooks() {
            hook(&ctx, response).map_err(escalation)?;
        }
        Ok(aborted)
    }

    /// Invokes the routes registered for `code`, in order.
    ///
    /// Skips behave as in the main loop. An abort sets its status and ends
    /// the status routes without escalating again.
    fn run_status_routes(
        &mut self,
        code: u16,
        request: &Request,
        response: &mut Response,
        transport: &mut dyn Transport,
    ) -> Result<bool, UnhandledDispatchFault> {
        let router = self.router;
        let mut skip = 0usize;

        for route in router.routes().iter().filter(|r| r.status_code() == Some(code)) {
            if skip > 0 {
                skip -= 1;
                continue;
            }
            tracing::debug!(code, route = %route.id(), "invoking status route");

            match self.invoke(route, request, response, transport) {
                Invocation::Completed(reply) => self
                    .output
                    .absorb(reply, response)
                    .map_err(|err| UnhandledDispatchFault::new(err.into(), FaultStage::Escalation))?,
                Invocation::Signalled(ControlSignal::SkipThis) => {}
                Invocation::Signalled(ControlSignal::SkipNext(count)) => skip = count,
                Invocation::Signalled(ControlSignal::SkipRemaining) => break,
                Invocation::Signalled(ControlSignal::Abort(next)) => {
                    tracing::info!(code = next, "status route aborted");
                    apply_code(response, next)
                        .map_err(|err| UnhandledDispatchFault::new(err.into(), FaultStage::Escalation))?;
                    return Ok(true);
                }
                Invocation::Faulted(fault) => {
                    return Err(UnhandledDispatchFault::new(fault, FaultStage::Escalation));
                }
            }
        }
        Ok(false)
    }
}
