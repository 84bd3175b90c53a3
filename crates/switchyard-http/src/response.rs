//! HTTP response type.
//!
//! [`Response`] carries a status, headers, and a text body that handlers build
//! up during a dispatch. Once locked it refuses every mutation with
//! [`SwitchyardError::ResponseLocked`].

use std::fmt;

use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, StatusCode};

use switchyard_core::{SwitchyardError, SwitchyardResult};

use crate::transport::Transport;

/// An outgoing response.
///
/// # Examples
///
/// ```
/// use switchyard_http::Response;
///
/// let mut response = Response::ok("Hello");
/// response.append(", World!").unwrap();
/// assert_eq!(response.body(), "Hello, World!");
///
/// response.lock();
/// assert!(response.set_body("nope").is_err());
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: String,
    locked: bool,
    sent: bool,
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("status", &self.status)
            .field("headers", &self.headers.len())
            .field("body", &self.body.chars().take(100).collect::<String>())
            .field("locked", &self.locked)
            .field("sent", &self.sent)
            .finish()
    }
}

impl Default for Response {
    fn default() -> Self {
        Self::new(StatusCode::OK, "")
    }
}

impl Response {
    /// Creates an unlocked response with the given status and body.
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
            locked: false,
            sent: false,
        }
    }

    /// Creates a 200 OK response.
    pub fn ok(body: impl Into<String>) -> Self {
        Self::new(StatusCode::OK, body)
    }

    /// Creates a 404 Not Found response.
    pub fn not_found(body: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, body)
    }

    /// Creates a 500 Internal Server Error response.
    pub fn server_error(body: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, body)
    }

    // ── Status ───────────────────────────────────────────────────────

    /// Returns the status.
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the numeric status code.
    pub fn code(&self) -> u16 {
        self.status.as_u16()
    }

    /// Sets the status.
    pub fn set_status(&mut self, status: StatusCode) -> SwitchyardResult<()> {
        self.require_unlocked()?;
        self.status = status;
        Ok(())
    }

    /// Sets the status from a numeric code.
    pub fn set_code(&mut self, code: u16) -> SwitchyardResult<()> {
        let status = StatusCode::from_u16(code).map_err(|_| SwitchyardError::InvalidStatusCode(code))?;
        self.set_status(status)
    }

    // ── Headers ──────────────────────────────────────────────────────

    /// Returns the headers.
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns a header value as text, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Sets a header, replacing any existing value.
    pub fn set_header(&mut self, name: &str, value: &str) -> SwitchyardResult<()> {
        self.require_unlocked()?;
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| SwitchyardError::InvalidHeader(name.to_string()))?;
        let value = HeaderValue::from_str(value)
            .map_err(|_| SwitchyardError::InvalidHeader(name.to_string()))?;
        self.headers.insert(name, value);
        Ok(())
    }

    /// Removes a header.
    pub fn remove_header(&mut self, name: &str) -> SwitchyardResult<()> {
        self.require_unlocked()?;
        self.headers.remove(name);
        Ok(())
    }

    // ── Body ─────────────────────────────────────────────────────────

    /// Returns the body.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Replaces the body.
    pub fn set_body(&mut self, body: impl Into<String>) -> SwitchyardResult<()> {
        self.require_unlocked()?;
        self.body = body.into();
        Ok(())
    }

    /// Appends to the body.
    pub fn append(&mut self, content: &str) -> SwitchyardResult<()> {
        self.require_unlocked()?;
        self.body.push_str(content);
        Ok(())
    }

    /// Prepends to the body.
    pub fn prepend(&mut self, content: &str) -> SwitchyardResult<()> {
        self.require_unlocked()?;
        self.body.insert_str(0, content);
        Ok(())
    }

    /// Replaces status, headers, and body with those of `other`.
    ///
    /// The lock and sent flags of `self` are kept.
    pub fn replace_with(&mut self, other: Self) -> SwitchyardResult<()> {
        self.require_unlocked()?;
        self.status = other.status;
        self.headers = other.headers;
        self.body = other.body;
        Ok(())
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Locks the response against further mutation.
    pub fn lock(&mut self) {
        self.locked = true;
    }

    /// Lifts the lock.
    ///
    /// This is the one way past [`SwitchyardError::ResponseLocked`]. The
    /// dispatch engine uses it while escalating an abort. Handlers and hooks
    /// should treat a locked response as final.
    pub fn unlock(&mut self) {
        self.locked = false;
    }

    /// Returns `true` while the response is locked.
    pub const fn is_locked(&self) -> bool {
        self.locked
    }

    /// Returns `true` once the response has been sent.
    pub const fn is_sent(&self) -> bool {
        self.sent
    }

    /// Hands the response to `transport` and marks it sent.
    ///
    /// Sending ignores the lock: a locked response is exactly what an abort
    /// wants delivered.
    pub fn send(&mut self, transport: &mut dyn Transport) -> SwitchyardResult<()> {
        if self.sent {
            return Err(SwitchyardError::ResponseAlreadySent);
        }
        transport.send(self)?;
        self.sent = true;
        Ok(())
    }

    /// Formats the HTTP/1.1 status line, e.g. `HTTP/1.1 404 Not Found`.
    pub fn status_line(&self) -> String {
        format!(
            "HTTP/1.1 {} {}",
            self.status.as_str(),
            self.status.canonical_reason().unwrap_or("")
        )
        .trim_end()
        .to_string()
    }

    const fn require_unlocked(&self) -> SwitchyardResult<()> {
        if self.locked {
            Err(SwitchyardError::ResponseLocked)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::BufferedTransport;

    #[test]
    fn test_defaults() {
        let response = Response::default();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.body(), "");
        assert!(!response.is_locked());
        assert!(!response.is_sent());
    }

    #[test]
    fn test_body_mutation() {
        let mut response = Response::ok("b");
        response.append("c").unwrap();
        response.prepend("a").unwrap();
        assert_eq!(response.body(), "abc");
        response.set_body("x").unwrap();
        assert_eq!(response.body(), "x");
    }

    #[test]
    fn test_locked_rejects_mutation() {
        let mut response = Response::ok("kept");
        response.lock();
        assert!(matches!(response.set_code(500), Err(SwitchyardError::ResponseLocked)));
        assert!(matches!(response.append("x"), Err(SwitchyardError::ResponseLocked)));
        assert!(matches!(response.set_header("x-a", "b"), Err(SwitchyardError::ResponseLocked)));
        assert!(response.replace_with(Response::not_found("")).is_err());
        assert_eq!(response.body(), "kept");
        assert_eq!(response.code(), 200);

        response.unlock();
        response.set_code(418).unwrap();
        assert_eq!(response.code(), 418);
    }

    #[test]
    fn test_set_code_rejects_out_of_range() {
        let mut response = Response::default();
        assert!(matches!(
            response.set_code(1337),
            Err(SwitchyardError::InvalidStatusCode(1337))
        ));
    }

    #[test]
    fn test_headers() {
        let mut response = Response::default();
        response.set_header("Allow", "GET, POST").unwrap();
        assert_eq!(response.header("allow"), Some("GET, POST"));
        response.remove_header("allow").unwrap();
        assert!(response.header("allow").is_none());
        assert!(response.set_header("bad name", "x").is_err());
    }

    #[test]
    fn test_replace_with_keeps_flags() {
        let mut response = Response::ok("old");
        let mut other = Response::not_found("new");
        other.lock();
        response.replace_with(other).unwrap();
        assert_eq!(response.code(), 404);
        assert_eq!(response.body(), "new");
        assert!(!response.is_locked());
    }

    #[test]
    fn test_send_once() {
        let mut transport = BufferedTransport::new();
        let mut response = Response::ok("hi");
        response.lock();
        response.send(&mut transport).unwrap();
        assert!(response.is_sent());
        assert!(matches!(
            response.send(&mut transport),
            Err(SwitchyardError::ResponseAlreadySent)
        ));
        assert_eq!(transport.sent().len(), 1);
    }

    #[test]
    fn test_status_line() {
        assert_eq!(Response::not_found("").status_line(), "HTTP/1.1 404 Not Found");
        let mut response = Response::default();
        response.set_code(599).unwrap();
        assert_eq!(response.status_line(), "HTTP/1.1 599");
    }
}
