//! # switchyard-core
//!
//! Core types for the switchyard routing engine. This crate has no HTTP
//! dependencies and provides the foundation the other crates build on.
//!
//! ## Modules
//!
//! - [`error`] - Error types and result aliases
//! - [`settings`] - Router settings and global configuration
//! - [`settings_loader`] - Loading settings from TOML, JSON, and the environment
//! - [`logging`] - Tracing-based logging integration
//! - [`services`] - The lazy named-service container
//! - [`guard`] - The process-level error guard

pub mod error;
pub mod guard;
pub mod logging;
pub mod services;
pub mod settings;
pub mod settings_loader;

// Re-export the most commonly used types at the crate root.
pub use error::{SwitchyardError, SwitchyardResult};
pub use guard::{ErrorGuard, GuardedError};
pub use services::App;
pub use settings::{CaptureMode, Settings, SETTINGS};
