//! HTTP request type.
//!
//! [`Request`] is a plain value container: method, raw path, parsed query,
//! headers, and the named parameters bound by the router while matching.

use std::collections::HashMap;

use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, Method};

/// An incoming request as the router sees it.
///
/// The path is kept exactly as it arrived, percent-escapes included. Path
/// parameters are decoded when the router binds them.
///
/// # Examples
///
/// ```
/// use switchyard_http::Request;
///
/// let request = Request::builder()
///     .method(http::Method::GET)
///     .uri("/articles/2024?page=1")
///     .build();
///
/// assert_eq!(request.method(), &http::Method::GET);
/// assert_eq!(request.path(), "/articles/2024");
/// assert_eq!(request.query("page"), Some("1"));
/// ```
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    path: String,
    query_string: String,
    query: Vec<(String, String)>,
    headers: HeaderMap,
    params: HashMap<String, String>,
    body: Vec<u8>,
}

impl Default for Request {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl Request {
    /// Creates a new [`RequestBuilder`].
    pub fn builder() -> RequestBuilder {
        RequestBuilder::default()
    }

    /// Shorthand for a body-less request with the given method and URI.
    pub fn new(method: Method, uri: &str) -> Self {
        Self::builder().method(method).uri(uri).build()
    }

    /// Returns the HTTP method.
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the raw request path, without the query string.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the raw query string, without the leading `?`.
    pub fn query_string(&self) -> &str {
        &self.query_string
    }

    /// Returns the first query value for `name`.
    pub fn query(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns every decoded query pair in order.
    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }

    /// Returns the request headers.
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns a header value as text, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns the raw request body.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Returns the named path parameters bound so far.
    pub const fn params(&self) -> &HashMap<String, String> {
        &self.params
    }

    /// Binds a named path parameter, replacing any previous value.
    pub fn set_param(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.params.insert(name.into(), value.into());
    }

    /// Looks a parameter up by name: path parameters first, then the query.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .get(name)
            .map(String::as_str)
            .or_else(|| self.query(name))
    }

    /// Like [`param`](Self::param) with a fallback value.
    pub fn param_or<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        self.param(name).unwrap_or(default)
    }

    /// Returns `true` if the method is `HEAD`.
    pub fn is_head(&self) -> bool {
        self.method == Method::HEAD
    }

    /// Returns the path followed by the query string, if any.
    pub fn full_path(&self) -> String {
        if self.query_string.is_empty() {
            self.path.clone()
        } else {
            format!("{}?{}", self.path, self.query_string)
        }
    }
}

/// Builder for [`Request`].
#[derive(Debug)]
pub struct RequestBuilder {
    method: Method,
    path: String,
    query_string: String,
    headers: HeaderMap,
    params: HashMap<String, String>,
    body: Vec<u8>,
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self {
            method: Method::GET,
            path: "/".to_string(),
            query_string: String::new(),
            headers: HeaderMap::new(),
            params: HashMap::new(),
            body: Vec::new(),
        }
    }
}

impl RequestBuilder {
    /// Sets the HTTP method.
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Sets the raw request path.
    #[must_use]
    pub fn path(mut self, path: &str) -> Self {
        self.path = path.to_string();
        self
    }

    /// Sets the query string (without leading `?`).
    #[must_use]
    pub fn query_string(mut self, qs: &str) -> Self {
        self.query_string = qs.to_string();
        self
    }

    /// Sets path and query from a request target such as `/a/b?x=1`.
    #[must_use]
    pub fn uri(self, uri: &str) -> Self {
        match uri.split_once('?') {
            Some((path, query)) => self.path(path).query_string(query),
            None => self.path(uri).query_string(""),
        }
    }

    /// Adds a header. Names or values that are not valid HTTP are skipped.
    #[must_use]
    pub fn header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.append(name, value);
        }
        self
    }

    /// Pre-binds a named parameter.
    #[must_use]
    pub fn param(mut self, name: &str, value: &str) -> Self {
        self.params.insert(name.to_string(), value.to_string());
        self
    }

    /// Sets the request body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Builds the [`Request`].
    pub fn build(self) -> Request {
        let query = url::form_urlencoded::parse(self.query_string.as_bytes())
            .into_owned()
            .collect();
        Request {
            method: self.method,
            path: self.path,
            query_string: self.query_string,
            query,
            headers: self.headers,
            params: self.params,
            body: self.body,
        }
    }
}
