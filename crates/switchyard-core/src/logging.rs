//! Logging integration for switchyard.
//!
//! Provides helpers for configuring [`tracing`]-based logging from
//! [`Settings`](crate::settings::Settings) and for creating per-dispatch spans.

use crate::settings::Settings;

/// Sets up the global tracing subscriber based on the given settings.
///
/// The log level is read from `settings.log_level` (e.g. "debug", "info",
/// "switchyard_dispatch=trace"). In debug mode a pretty, human-readable format
/// is used; otherwise a structured JSON format is used.
///
/// Calling this more than once is harmless: if a subscriber is already
/// installed the call does nothing.
pub fn setup_logging(settings: &Settings) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_new(&settings.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    if settings.debug {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(false)
            .with_file(true)
            .with_line_number(true)
            .pretty()
            .try_init()
            .ok();
    } else {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .json()
            .try_init()
            .ok();
    }
}

/// Creates a tracing span for one dispatch call.
///
/// Every event emitted while matching, invoking, and escalating a request is
/// recorded inside this span, so log lines carry the method and raw path.
///
/// # Examples
///
/// ```
/// use switchyard_core::logging::dispatch_span;
///
/// let span = dispatch_span("GET", "/users/42");
/// let _guard = span.enter();
/// tracing::debug!("matching");
/// ```
pub fn dispatch_span(method: &str, path: &str) -> tracing::Span {
    tracing::info_span!("dispatch", method = method, path = path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setup_logging_twice_is_harmless() {
        let settings = Settings::default();
        setup_logging(&settings);
        setup_logging(&settings);
    }

    #[test]
    fn test_dispatch_span_enters() {
        let span = dispatch_span("POST", "/login");
        let _guard = span.enter();
        tracing::debug!("inside span");
    }
}
