//! In-memory test client for switchyard routers.
//!
//! [`Client`] dispatches requests through a [`Router`] with a
//! [`BufferedTransport`] and collects everything the dispatch produced into a
//! [`TestResponse`]: the response, streamed output, the dispatch report, and
//! any unhandled fault.
//!
//! ## Usage
//!
//! ```
//! use switchyard_dispatch::{Reply, Router};
//! use switchyard_test::Client;
//!
//! let mut router = Router::new();
//! router.get("/hello", |_ctx| Ok(Reply::text("Hello, World!"))).unwrap();
//!
//! let client = Client::new(router);
//! let response = client.get("/hello");
//! assert_eq!(response.status_code(), 200);
//! assert_eq!(response.text(), "Hello, World!");
//! ```

use std::collections::BTreeMap;

use http::{HeaderMap, Method, StatusCode};

use switchyard_dispatch::{DispatchOptions, Router, UnhandledDispatchFault};
use switchyard_http::{BufferedTransport, Request, Response};

use crate::request_factory::RequestFactory;

/// A client that dispatches requests through a router in memory.
///
/// Each request gets a fresh [`Response`] and [`BufferedTransport`]. The
/// router is shared across requests, so memoized services persist.
#[derive(Debug)]
pub struct Client {
    router: Router,
    options: DispatchOptions,
    factory: RequestFactory,
}

impl Client {
    /// Wraps `router`, dispatching with its default options.
    pub fn new(router: Router) -> Self {
        let options = router.default_options();
        Self {
            router,
            options,
            factory: RequestFactory::new(),
        }
    }

    /// Replaces the dispatch options used for every request.
    #[must_use]
    pub const fn with_options(mut self, options: DispatchOptions) -> Self {
        self.options = options;
        self
    }

    /// Adds a header sent with every request.
    #[must_use]
    pub fn with_default_header(mut self, name: &str, value: &str) -> Self {
        self.factory = self.factory.with_default_header(name, value);
        self
    }

    /// Returns the wrapped router.
    pub const fn router(&self) -> &Router {
        &self.router
    }

    /// Returns the wrapped router mutably, for registering more routes.
    pub fn router_mut(&mut self) -> &mut Router {
        &mut self.router
    }

    /// Returns the options requests are dispatched with.
    pub const fn options(&self) -> DispatchOptions {
        self.options
    }

    /// Sends a GET request. `target` may carry a query string.
    pub fn get(&self, target: &str) -> TestResponse {
        self.dispatch(self.factory.get(target))
    }

    /// Sends a POST request with form data.
    pub fn post(&self, target: &str, form: &BTreeMap<String, String>) -> TestResponse {
        self.dispatch(self.factory.post(target, form))
    }

    /// Sends a POST request with a JSON body.
    pub fn post_json(&self, target: &str, json: &serde_json::Value) -> TestResponse {
        self.dispatch(self.factory.post_json(target, json))
    }

    /// Sends a PUT request with form data.
    pub fn put(&self, target: &str, form: &BTreeMap<String, String>) -> TestResponse {
        self.dispatch(self.factory.put(target, form))
    }

    /// Sends a PATCH request with form data.
    pub fn patch(&self, target: &str, form: &BTreeMap<String, String>) -> TestResponse {
        self.dispatch(self.factory.patch(target, form))
    }

    /// Sends a DELETE request.
    pub fn delete(&self, target: &str) -> TestResponse {
        self.dispatch(self.factory.delete(target))
    }

    /// Sends a HEAD request.
    pub fn head(&self, target: &str) -> TestResponse {
        self.dispatch(self.factory.head(target))
    }

    /// Sends an OPTIONS request.
    pub fn options_request(&self, target: &str) -> TestResponse {
        self.dispatch(self.factory.options(target))
    }

    /// Sends a body-less request with any method.
    pub fn request(&self, method: Method, target: &str) -> TestResponse {
        self.dispatch(self.factory.request(method, target))
    }

    /// Dispatches a prepared request.
    pub fn dispatch(&self, request: Request) -> TestResponse {
        self.dispatch_with(request, self.options)
    }

    /// Dispatches a prepared request with explicit options.
    pub fn dispatch_with(&self, mut request: Request, options: DispatchOptions) -> TestResponse {
        let mut response = Response::default();
        let mut transport = BufferedTransport::new();
        let result = self
            .router
            .dispatch(&mut request, &mut response, options, &mut transport);

        let (captured, matched, methods_matched, fault) = match result {
            Ok(dispatched) => (
                dispatched.captured,
                dispatched.matched.len(),
                dispatched.methods_matched,
                None,
            ),
            Err(unhandled) => (None, 0, Vec::new(), Some(unhandled)),
        };

        TestResponse {
            status: response.status(),
            headers: response.headers().clone(),
            body: response.body().to_string(),
            output: transport.take_output(),
            captured,
            matched,
            methods_matched,
            locked: response.is_locked(),
            sent: transport.last_sent().cloned(),
            fault,
        }
    }
}

/// Everything observable about one dispatched request.
#[derive(Debug)]
pub struct TestResponse {
    /// The final status.
    pub status: StatusCode,
    /// The final headers.
    pub headers: HeaderMap,
    /// The final body.
    pub body: String,
    /// Text streamed straight to the transport.
    pub output: String,
    /// Captured output, in capture-and-return mode.
    pub captured: Option<String>,
    /// How many routes matched the path.
    pub matched: usize,
    /// Methods of the matched routes, sorted.
    pub methods_matched: Vec<String>,
    /// Whether the response ended locked.
    pub locked: bool,
    /// The response handed to the transport, if it was sent.
    pub sent: Option<Response>,
    /// The fault that escaped dispatch, if any.
    pub fault: Option<UnhandledDispatchFault>,
}

impl TestResponse {
    /// Returns the response body.
    pub fn text(&self) -> &str {
        &self.body
    }

    /// Deserializes the response body as JSON.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.body)
    }

    /// Returns the numeric status code.
    pub const fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    /// Returns the value of a header by name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns `true` if the response has the specified header.
    pub fn has_header(&self, name: &str) -> bool {
        self.headers.contains_key(name)
    }

    /// Returns `true` if the response body contains the given text.
    pub fn contains(&self, text: &str) -> bool {
        self.body.contains(text)
    }

    /// Returns the methods listed in the `Allow` header.
    pub fn allowed_methods(&self) -> Vec<&str> {
        self.header("allow")
            .map(|allow| allow.split(", ").filter(|m| !m.is_empty()).collect())
            .unwrap_or_default()
    }

    /// Returns `true` if a fault escaped every handler.
    pub const fn is_unhandled(&self) -> bool {
        self.fault.is_some()
    }
}
