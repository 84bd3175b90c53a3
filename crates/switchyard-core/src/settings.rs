//! Settings for the switchyard routing engine.
//!
//! This module provides the [`Settings`] struct, which holds the defaults a
//! router applies to every dispatch, and [`LazySettings`], a globally
//! accessible, lazily initialized settings instance.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::error::SwitchyardError;

/// How streamed handler output is combined with the response body.
///
/// See the dispatch engine documentation for the exact composition rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureMode {
    /// Streamed output goes straight to the transport.
    #[default]
    Direct,
    /// Streamed output is buffered and returned from the dispatch call.
    CaptureAndReturn,
    /// Streamed output becomes the whole response body.
    CaptureAndReplace,
    /// Streamed output is placed before the returned body.
    CaptureAndPrepend,
    /// Streamed output is placed after the returned body.
    CaptureAndAppend,
}

impl CaptureMode {
    /// Returns the configuration name of this mode.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::CaptureAndReturn => "capture_and_return",
            Self::CaptureAndReplace => "capture_and_replace",
            Self::CaptureAndPrepend => "capture_and_prepend",
            Self::CaptureAndAppend => "capture_and_append",
        }
    }

    /// Returns `true` if streamed output is buffered rather than passed through.
    pub const fn is_capturing(self) -> bool {
        !matches!(self, Self::Direct)
    }
}

impl fmt::Display for CaptureMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CaptureMode {
    type Err = SwitchyardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "direct" => Ok(Self::Direct),
            "capture_and_return" | "return" => Ok(Self::CaptureAndReturn),
            "capture_and_replace" | "replace" => Ok(Self::CaptureAndReplace),
            "capture_and_prepend" | "prepend" => Ok(Self::CaptureAndPrepend),
            "capture_and_append" | "append" => Ok(Self::CaptureAndAppend),
            other => Err(SwitchyardError::ConfigurationError(format!(
                "Unknown capture mode '{other}'"
            ))),
        }
    }
}

/// The complete set of router settings.
///
/// # Examples
///
/// ```
/// use switchyard_core::settings::{CaptureMode, Settings};
///
/// let settings = Settings::default();
/// assert!(settings.debug);
/// assert_eq!(settings.default_capture_mode, CaptureMode::Direct);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    // ── Core ─────────────────────────────────────────────────────────

    /// Whether debug mode is enabled.
    pub debug: bool,

    // ── Dispatch ─────────────────────────────────────────────────────

    /// Capture mode used when a dispatch call does not choose one.
    pub default_capture_mode: CaptureMode,
    /// Whether the response is handed to the transport at the end of a dispatch.
    pub send_response: bool,
    /// Whether a single trailing `/` on the request path is ignored when matching.
    pub trailing_slash_tolerant: bool,

    // ── Logging ──────────────────────────────────────────────────────

    /// The log level or filter directive (e.g. "info", "switchyard_dispatch=debug").
    pub log_level: String,

    // ── Escape hatch ─────────────────────────────────────────────────

    /// Application settings that don't fit into the above categories.
    pub extra: HashMap<String, serde_json::Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: true,
            default_capture_mode: CaptureMode::Direct,
            send_response: true,
            trailing_slash_tolerant: true,
            log_level: "info".to_string(),
            extra: HashMap::new(),
        }
    }
}

/// A lazily-initialized, globally-accessible settings container.
///
/// Call [`configure`](LazySettings::configure) once at startup, then use
/// [`get`](LazySettings::get) anywhere.
pub struct LazySettings {
    inner: OnceLock<Settings>,
}

impl Default for LazySettings {
    fn default() -> Self {
        Self::new()
    }
}

impl LazySettings {
    /// Creates a new, unconfigured `LazySettings`.
    pub const fn new() -> Self {
        Self {
            inner: OnceLock::new(),
        }
    }

    /// Configures the global settings. Must be called exactly once.
    ///
    /// # Panics
    ///
    /// Panics if settings have already been configured.
    pub fn configure(&self, settings: Settings) {
        self.inner
            .set(settings)
            .expect("Settings have already been configured");
    }

    /// Returns the configured settings.
    ///
    /// # Panics
    ///
    /// Panics if settings have not been configured.
    pub fn get(&self) -> &Settings {
        self.inner
            .get()
            .expect("Settings have not been configured. Call SETTINGS.configure() first.")
    }

    /// Returns the configured settings, or `None` before configuration.
    pub fn try_get(&self) -> Option<&Settings> {
        self.inner.get()
    }

    /// Returns `true` if settings have been configured.
    pub fn is_configured(&self) -> bool {
        self.inner.get().is_some()
    }
}

/// The global settings instance.
pub static SETTINGS: LazySettings = LazySettings::new();

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let s = Settings::default();
        assert!(s.debug);
        assert!(s.send_response);
        assert!(s.trailing_slash_tolerant);
        assert_eq!(s.log_level, "info");
        assert_eq!(s.default_capture_mode, CaptureMode::Direct);
        assert!(s.extra.is_empty());
    }

    #[test]
    fn test_capture_mode_from_str() {
        assert_eq!("direct".parse::<CaptureMode>().unwrap(), CaptureMode::Direct);
        assert_eq!(
            "capture-and-return".parse::<CaptureMode>().unwrap(),
            CaptureMode::CaptureAndReturn
        );
        assert_eq!(
            "Replace".parse::<CaptureMode>().unwrap(),
            CaptureMode::CaptureAndReplace
        );
        assert!("sideways".parse::<CaptureMode>().is_err());
    }

    #[test]
    fn test_capture_mode_display_round_trip() {
        for mode in [
            CaptureMode::Direct,
            CaptureMode::CaptureAndReturn,
            CaptureMode::CaptureAndReplace,
            CaptureMode::CaptureAndPrepend,
            CaptureMode::CaptureAndAppend,
        ] {
            assert_eq!(mode.to_string().parse::<CaptureMode>().unwrap(), mode);
        }
        assert!(!CaptureMode::Direct.is_capturing());
        assert!(CaptureMode::CaptureAndAppend.is_capturing());
    }

    #[test]
    fn test_capture_mode_serde_name() {
        let json = serde_json::to_string(&CaptureMode::CaptureAndPrepend).unwrap();
        assert_eq!(json, "\"capture_and_prepend\"");
    }

    #[test]
    fn test_lazy_settings_configure_and_get() {
        let lazy = LazySettings::new();
        assert!(!lazy.is_configured());
        assert!(lazy.try_get().is_none());

        let settings = Settings {
            debug: false,
            ..Settings::default()
        };
        lazy.configure(settings);
        assert!(lazy.is_configured());
        assert!(!lazy.get().debug);
    }

    #[test]
    #[should_panic(expected = "already been configured")]
    fn test_lazy_settings_double_configure_panics() {
        let lazy = LazySettings::new();
        lazy.configure(Settings::default());
        lazy.configure(Settings::default());
    }

    #[test]
    #[should_panic(expected = "not been configured")]
    fn test_lazy_settings_get_before_configure_panics() {
        let lazy = LazySettings::new();
        let _ = lazy.get();
    }
}
