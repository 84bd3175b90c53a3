//! Request factory for building [`Request`] objects in tests.
//!
//! [`RequestFactory`] builds requests directly so individual handlers or the
//! router can be exercised without a transport in front of them.
//!
//! ## Example
//!
//! ```
//! use switchyard_test::RequestFactory;
//!
//! let factory = RequestFactory::new();
//! let request = factory.get("/articles/?page=2");
//! assert_eq!(request.method(), &http::Method::GET);
//! assert_eq!(request.path(), "/articles/");
//! assert_eq!(request.query("page"), Some("2"));
//! ```

use std::collections::BTreeMap;

use http::Method;
use switchyard_http::Request;

/// Content type used for form bodies.
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Content type used for JSON bodies.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// A factory for building [`Request`] objects.
///
/// Default headers are applied to every request in the order they were added.
#[derive(Debug, Clone, Default)]
pub struct RequestFactory {
    default_headers: Vec<(String, String)>,
}

impl RequestFactory {
    /// Creates a factory with no default headers.
    pub const fn new() -> Self {
        Self {
            default_headers: Vec::new(),
        }
    }

    /// Adds a header that will be included in all requests.
    #[must_use]
    pub fn with_default_header(mut self, name: &str, value: &str) -> Self {
        self.default_headers
            .push((name.to_string(), value.to_string()));
        self
    }

    /// Builds a GET request. `target` may carry a query string.
    pub fn get(&self, target: &str) -> Request {
        self.request(Method::GET, target)
    }

    /// Builds a GET request with `query` encoded onto `path`.
    pub fn get_with_query(&self, path: &str, query: &[(&str, &str)]) -> Request {
        self.request(Method::GET, &with_query(path, query))
    }

    /// Builds a POST request with a form-encoded body.
    pub fn post(&self, target: &str, form: &BTreeMap<String, String>) -> Request {
        self.form_request(Method::POST, target, form)
    }

    /// Builds a POST request with a JSON body.
    pub fn post_json(&self, target: &str, json: &serde_json::Value) -> Request {
        let body = serde_json::to_vec(json).unwrap_or_default();
        self.build(Method::POST, target, Some((body, JSON_CONTENT_TYPE)))
    }

    /// Builds a PUT request with a form-encoded body.
    pub fn put(&self, target: &str, form: &BTreeMap<String, String>) -> Request {
        self.form_request(Method::PUT, target, form)
    }

    /// Builds a PATCH request with a form-encoded body.
    pub fn patch(&self, target: &str, form: &BTreeMap<String, String>) -> Request {
        self.form_request(Method::PATCH, target, form)
    }

    /// Builds a DELETE request.
    pub fn delete(&self, target: &str) -> Request {
        self.request(Method::DELETE, target)
    }

    /// Builds a HEAD request.
    pub fn head(&self, target: &str) -> Request {
        self.request(Method::HEAD, target)
    }

    /// Builds an OPTIONS request.
    pub fn options(&self, target: &str) -> Request {
        self.request(Method::OPTIONS, target)
    }

    /// Builds a body-less request with any method.
    pub fn request(&self, method: Method, target: &str) -> Request {
        self.build(method, target, None)
    }

    fn form_request(
        &self,
        method: Method,
        target: &str,
        form: &BTreeMap<String, String>,
    ) -> Request {
        let body = encode_form_data(form.iter()).into_bytes();
        self.build(method, target, Some((body, FORM_CONTENT_TYPE)))
    }

    fn build(&self, method: Method, target: &str, body: Option<(Vec<u8>, &str)>) -> Request {
        let mut builder = Request::builder().method(method).uri(target);

        for (name, value) in &self.default_headers {
            builder = builder.header(name, value);
        }

        if let Some((bytes, content_type)) = body {
            builder = builder.header("content-type", content_type).body(bytes);
        }

        builder.build()
    }
}

/// Appends `query` to `path`, form-encoded, after any existing query string.
pub fn with_query(path: &str, query: &[(&str, &str)]) -> String {
    if query.is_empty() {
        return path.to_string();
    }
    let encoded = encode_form_data(query.iter().copied());
    let separator = if path.contains('?') { '&' } else { '?' };
    format!("{path}{separator}{encoded}")
}

fn encode_form_data<K, V>(pairs: impl Iterator<Item = (K, V)>) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    // ── Methods ─────────────────────────────────────────────────────

    #[test]
    fn test_factory_get() {
        let req = RequestFactory::new().get("/articles/");
        assert_eq!(req.method(), &Method::GET);
        assert_eq!(req.path(), "/articles/");
        assert_eq!(req.query_string(), "");
    }

    #[test]
    fn test_factory_default() {
        let req = RequestFactory::default().get("/");
        assert_eq!(req.path(), "/");
    }

    #[test]
    fn test_factory_post_form() {
        let req = RequestFactory::new().post("/submit/", &form(&[("name", "alice smith")]));
        assert_eq!(req.method(), &Method::POST);
        assert_eq!(req.header("content-type"), Some(FORM_CONTENT_TYPE));
        assert_eq!(req.body(), b"name=alice+smith");
    }

    #[test]
    fn test_factory_post_json() {
        let req = RequestFactory::new().post_json("/api/", &serde_json::json!({"key": "value"}));
        assert_eq!(req.method(), &Method::POST);
        assert_eq!(req.header("content-type"), Some(JSON_CONTENT_TYPE));
        let parsed: serde_json::Value = serde_json::from_slice(req.body()).unwrap();
        assert_eq!(parsed["key"], "value");
    }

    #[test]
    fn test_factory_put_and_patch() {
        let factory = RequestFactory::new();
        let data = form(&[("field", "updated")]);
        assert_eq!(factory.put("/update/", &data).method(), &Method::PUT);
        assert_eq!(factory.patch("/patch/", &data).method(), &Method::PATCH);
        assert_eq!(factory.patch("/patch/", &data).body(), b"field=updated");
    }

    #[test]
    fn test_factory_bodiless_methods() {
        let factory = RequestFactory::new();
        assert_eq!(factory.delete("/items/1/").method(), &Method::DELETE);
        assert_eq!(factory.head("/check/").method(), &Method::HEAD);
        assert!(factory.head("/check/").is_head());
        assert_eq!(factory.options("/api/").method(), &Method::OPTIONS);
        assert!(factory.delete("/items/1/").body().is_empty());
    }

    // ── Query strings ───────────────────────────────────────────────

    #[test]
    fn test_factory_query_in_target() {
        let req = RequestFactory::new().get("/search?q=rust&page=2");
        assert_eq!(req.path(), "/search");
        assert_eq!(req.query("q"), Some("rust"));
        assert_eq!(req.param("page"), Some("2"));
    }

    #[test]
    fn test_factory_get_with_query() {
        let req = RequestFactory::new().get_with_query("/search", &[("q", "a b&c")]);
        assert_eq!(req.query_string(), "q=a+b%26c");
        assert_eq!(req.query("q"), Some("a b&c"));
    }

    #[test]
    fn test_with_query_appends() {
        assert_eq!(with_query("/p", &[]), "/p");
        assert_eq!(with_query("/p", &[("a", "1")]), "/p?a=1");
        assert_eq!(with_query("/p?a=1", &[("b", "2")]), "/p?a=1&b=2");
    }

    // ── Headers ─────────────────────────────────────────────────────

    #[test]
    fn test_factory_default_headers() {
        let factory = RequestFactory::new()
            .with_default_header("accept", "application/json")
            .with_default_header("x-custom", "test-value");

        let req = factory.get("/api/");
        assert_eq!(req.header("accept"), Some("application/json"));
        assert_eq!(req.header("x-custom"), Some("test-value"));
    }
}
