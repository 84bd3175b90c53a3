//! Process-level fault trap.
//!
//! [`ErrorGuard`] owns an ordered list of handlers that are told about faults
//! the application did not catch itself. It is an explicit collaborator:
//! create one, share it behind an `Arc`, and [`install`](ErrorGuard::install)
//! it to route panics through its handlers. Nothing in the dispatch engine
//! depends on a guard being installed.
//!
//! [`GuardedError`] is the error value the guard hands to its handlers. It
//! carries the original message, a JSON parameter map, a numeric code, and the
//! source location where it was raised.

use std::fmt;
use std::panic::{self, Location, PanicInfo};
use std::sync::{Arc, Mutex, RwLock};

use serde_json::{Map, Value};
use thiserror::Error;

/// Code used for errors converted from a panic.
pub const FATAL_CODE: i64 = 1;

/// An error with structured parameters and an origin location.
///
/// The display message is the original message followed by the parameters as
/// JSON, e.g. `foo ({"bar":"baz"})`.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{original_message} ({})", Value::Object(.params.clone()))]
pub struct GuardedError {
    original_message: String,
    params: Map<String, Value>,
    code: i64,
    file: Option<String>,
    line: Option<u32>,
}

impl GuardedError {
    /// Creates an error raised at the caller's location.
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let location = Location::caller();
        Self {
            original_message: message.into(),
            params: Map::new(),
            code: 0,
            file: Some(location.file().to_string()),
            line: Some(location.line()),
        }
    }

    /// Replaces the parameter map.
    #[must_use]
    pub fn with_params(mut self, params: Map<String, Value>) -> Self {
        self.params = params;
        self
    }

    /// Adds a single parameter.
    #[must_use]
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Sets the numeric error code.
    #[must_use]
    pub const fn with_code(mut self, code: i64) -> Self {
        self.code = code;
        self
    }

    /// Overrides the recorded origin.
    #[must_use]
    pub fn at(mut self, file: impl Into<String>, line: u32) -> Self {
        self.file = Some(file.into());
        self.line = Some(line);
        self
    }

    /// The message without the parameter suffix.
    pub fn original_message(&self) -> &str {
        &self.original_message
    }

    /// All parameters.
    pub const fn params(&self) -> &Map<String, Value> {
        &self.params
    }

    /// A single parameter, if present.
    pub fn get_param(&self, name: &str) -> Option<&Value> {
        self.params.get(name)
    }

    /// The numeric error code.
    pub const fn code(&self) -> i64 {
        self.code
    }

    /// The source file the error was raised in.
    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }

    /// The source line the error was raised at.
    pub const fn line(&self) -> Option<u32> {
        self.line
    }
}

/// A handler notified of every fault the guard sees.
pub type GuardHandler = Arc<dyn Fn(&GuardedError) + Send + Sync>;

type PanicHook = Box<dyn Fn(&PanicInfo<'_>) + Send + Sync + 'static>;

/// Collects fault handlers and optionally traps panics.
#[derive(Default)]
pub struct ErrorGuard {
    handlers: RwLock<Vec<GuardHandler>>,
    previous_hook: Mutex<Option<PanicHook>>,
}

impl fmt::Debug for ErrorGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorGuard")
            .field("handlers", &self.handlers_count())
            .field("installed", &self.is_installed())
            .finish()
    }
}

impl ErrorGuard {
    /// Creates a guard with no handlers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a handler. Returns the number of handlers now registered.
    pub fn push_handler(&self, handler: GuardHandler) -> usize {
        let mut handlers = self.handlers.write().expect("guard lock poisoned");
        handlers.push(handler);
        handlers.len()
    }

    /// Replaces all handlers.
    pub fn set_handlers(&self, handlers: Vec<GuardHandler>) {
        *self.handlers.write().expect("guard lock poisoned") = handlers;
    }

    /// Returns a snapshot of the registered handlers.
    pub fn handlers(&self) -> Vec<GuardHandler> {
        self.handlers.read().expect("guard lock poisoned").clone()
    }

    /// Removes every handler.
    pub fn reset_handlers(&self) {
        self.handlers.write().expect("guard lock poisoned").clear();
    }

    /// Returns the number of registered handlers.
    pub fn handlers_count(&self) -> usize {
        self.handlers.read().expect("guard lock poisoned").len()
    }

    /// Passes `error` to every handler in registration order.
    pub fn on_exception(&self, error: &GuardedError) {
        // Snapshot first so a handler may register further handlers.
        for handler in self.handlers() {
            handler(error);
        }
    }

    /// Converts a raw runtime fault into a [`GuardedError`], reports it to the
    /// handlers, and returns it so the caller can propagate it.
    pub fn on_error(
        &self,
        code: i64,
        message: impl Into<String>,
        file: impl Into<String>,
        line: u32,
    ) -> GuardedError {
        let mut params = Map::new();
        let file = file.into();
        params.insert("file".to_string(), Value::String(file.clone()));
        params.insert("line".to_string(), Value::from(line));

        let error = GuardedError::new(message)
            .with_params(params)
            .with_code(code)
            .at(file, line);
        tracing::warn!(code, message = %error.original_message(), "guarded error");
        self.on_exception(&error);
        error
    }

    /// Routes panics through this guard's handlers.
    ///
    /// The previously installed panic hook is kept and restored by
    /// [`uninstall`](Self::uninstall). Installing twice is a no-op.
    pub fn install(self: &Arc<Self>) {
        let mut previous = self.previous_hook.lock().expect("guard lock poisoned");
        if previous.is_some() {
            return;
        }
        *previous = Some(panic::take_hook());

        let guard = Arc::clone(self);
        panic::set_hook(Box::new(move |info| {
            let (file, line) = info
                .location()
                .map_or_else(|| ("<unknown>".to_string(), 0), |l| (l.file().to_string(), l.line()));
            guard.on_error(FATAL_CODE, panic_message(info), file, line);
        }));
        tracing::debug!("error guard installed");
    }

    /// Restores the panic hook that was active before [`install`](Self::install).
    pub fn uninstall(&self) {
        let mut previous = self.previous_hook.lock().expect("guard lock poisoned");
        if let Some(hook) = previous.take() {
            panic::set_hook(hook);
            tracing::debug!("error guard uninstalled");
        }
    }

    /// Returns `true` while the guard owns the panic hook.
    pub fn is_installed(&self) -> bool {
        self.previous_hook
            .lock()
            .expect("guard lock poisoned")
            .is_some()
    }
}

fn panic_message(info: &PanicInfo<'_>) -> String {
    let payload = info.payload();
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "panic".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder() -> (Arc<Mutex<Vec<GuardedError>>>, GuardHandler) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let handler: GuardHandler = Arc::new(move |e: &GuardedError| {
            sink.lock().unwrap().push(e.clone());
        });
        (seen, handler)
    }

    #[test]
    fn test_guarded_error_params() {
        let e = GuardedError::new("foo").with_param("bar", "baz");
        assert_eq!(e.get_param("bar"), Some(&Value::from("baz")));
        assert!(e.get_param("not_existed").is_none());
        assert_eq!(e.params().len(), 1);
    }

    #[test]
    fn test_guarded_error_message_includes_params() {
        let e = GuardedError::new("foo").with_param("bar", "baz");
        let message = e.to_string();
        assert!(message.contains("foo"));
        assert!(message.contains("bar"));
        assert!(message.contains("baz"));
        assert_eq!(e.original_message(), "foo");
    }

    #[test]
    fn test_guarded_error_records_caller() {
        let e = GuardedError::new("here");
        assert_eq!(e.file(), Some(file!()));
        assert!(e.line().is_some());
    }

    #[test]
    fn test_on_exception_calls_handlers_in_order() {
        let guard = ErrorGuard::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        for tag in ["first", "second"] {
            let order = Arc::clone(&order);
            guard.push_handler(Arc::new(move |_| order.lock().unwrap().push(tag)));
        }

        let must_be = GuardedError::new("FooMessage").with_param("bar", 42);
        guard.on_exception(&must_be);
        assert_eq!(*order.lock().unwrap(), vec!["first", "second"]);
    }

    #[test]
    fn test_on_error_builds_and_reports() {
        let guard = ErrorGuard::new();
        let (seen, handler) = recorder();
        guard.push_handler(handler);

        let returned = guard.on_error(42, "FooMessage", "lib.rs", 4242);
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].code(), 42);
        assert!(seen[0].to_string().contains("FooMessage"));
        assert_eq!(seen[0].line(), Some(4242));
        assert_eq!(returned, seen[0]);
    }

    #[test]
    fn test_set_and_reset_handlers() {
        let guard = ErrorGuard::new();
        let (_, a) = recorder();
        let (_, b) = recorder();
        assert_eq!(guard.push_handler(a), 1);
        guard.set_handlers(vec![b]);
        assert_eq!(guard.handlers_count(), 1);
        guard.reset_handlers();
        assert_eq!(guard.handlers_count(), 0);
    }

    #[test]
    fn test_install_routes_panics_to_handlers() {
        let guard = Arc::new(ErrorGuard::new());
        let (seen, handler) = recorder();
        guard.push_handler(handler);

        guard.install();
        guard.install();
        assert!(guard.is_installed());
        let result = std::panic::catch_unwind(|| panic!("guarded boom"));
        guard.uninstall();

        assert!(result.is_err());
        assert!(!guard.is_installed());
        let seen = seen.lock().unwrap();
        let trapped = seen
            .iter()
            .find(|e| e.original_message() == "guarded boom")
            .expect("panic should reach the guard");
        assert_eq!(trapped.code(), FATAL_CODE);
    }
}
