//! Core error types for the switchyard routing engine.
//!
//! [`SwitchyardError`] covers every recoverable failure raised while building
//! or querying a router: pattern compilation, the route registry, reverse path
//! generation, response mutation, the service container, and configuration.
//! Failures that happen *during* a dispatch are modeled separately by the
//! dispatch crate; a handler that hits a `SwitchyardError` can still forward it
//! with `?`.

use thiserror::Error;

/// The primary error type for switchyard.
///
/// Each variant maps to an HTTP status code via [`SwitchyardError::status_code`],
/// so a handler that propagates one of these into a dispatch gets a sensible
/// escalation code.
#[derive(Error, Debug)]
pub enum SwitchyardError {
    // ── Pattern compilation ──────────────────────────────────────────

    /// A route pattern could not be compiled into a matcher.
    #[error("Invalid route pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// The pattern as it was registered.
        pattern: String,
        /// What the compiler rejected.
        reason: String,
    },

    // ── Registry ─────────────────────────────────────────────────────

    /// A route was added with an identifier that is already registered.
    #[error("Duplicate route id: {0}")]
    DuplicateRouteId(String),

    /// Two routes carry the same name.
    #[error("Duplicate route name: {0}")]
    DuplicateRouteName(String),

    /// A name lookup was attempted before the name index was prepared.
    #[error("Route names have not been prepared; call prepare_named() first")]
    RouteNameNotPrepared,

    /// No route carries the requested name.
    #[error("No route named '{0}'")]
    UnknownRouteName(String),

    /// Reverse path generation was missing a value for a required placeholder.
    #[error("Missing value for placeholder '{placeholder}' in route '{route}'")]
    MissingPlaceholderValue {
        /// The route name being reversed.
        route: String,
        /// The placeholder that had no value.
        placeholder: String,
    },

    // ── Response ─────────────────────────────────────────────────────

    /// The response was locked (after an abort) and cannot be mutated.
    #[error("Response is locked")]
    ResponseLocked,

    /// The response was already handed to a transport.
    #[error("Response has already been sent")]
    ResponseAlreadySent,

    /// A status code outside the range HTTP allows.
    #[error("Invalid status code: {0}")]
    InvalidStatusCode(u16),

    /// A header name or value could not be represented.
    #[error("Invalid header '{0}'")]
    InvalidHeader(String),

    // ── Services ─────────────────────────────────────────────────────

    /// No service factory is registered under the given name.
    #[error("Unknown service: {0}")]
    UnknownService(String),

    /// A service resolved to a value of a different type than requested.
    #[error("Service '{0}' does not hold the requested type")]
    ServiceTypeMismatch(String),

    // ── Configuration ────────────────────────────────────────────────

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    // ── IO ───────────────────────────────────────────────────────────

    /// An I/O error occurred while writing to a transport.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl SwitchyardError {
    /// Returns the HTTP status code associated with this error.
    ///
    /// Registry, service, and configuration errors are programming errors on
    /// the application side and map to 500. An attempt to write to a locked
    /// response maps to 409.
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::ResponseLocked | Self::ResponseAlreadySent => 409,
            Self::InvalidPattern { .. }
            | Self::DuplicateRouteId(_)
            | Self::DuplicateRouteName(_)
            | Self::RouteNameNotPrepared
            | Self::UnknownRouteName(_)
            | Self::MissingPlaceholderValue { .. }
            | Self::InvalidStatusCode(_)
            | Self::InvalidHeader(_)
            | Self::UnknownService(_)
            | Self::ServiceTypeMismatch(_)
            | Self::ConfigurationError(_)
            | Self::IoError(_) => 500,
        }
    }

    /// Shorthand for building an [`SwitchyardError::InvalidPattern`].
    pub fn invalid_pattern(pattern: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPattern {
            pattern: pattern.into(),
            reason: reason.into(),
        }
    }
}

/// A convenience type alias for `Result<T, SwitchyardError>`.
pub type SwitchyardResult<T> = Result<T, SwitchyardError>;
