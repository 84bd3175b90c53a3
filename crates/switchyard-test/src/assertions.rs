//! Assertion helpers for [`TestResponse`].
//!
//! - [`assert_status`] - Assert the final status code
//! - [`assert_contains`] / [`assert_not_contains`] - Assert on the body
//! - [`assert_output`] - Assert on text streamed to the transport
//! - [`assert_header`] - Assert a header value
//! - [`assert_not_found`] - Assert a 404 with no route matched
//! - [`assert_method_not_allowed`] - Assert a 405 with the expected `Allow` list
//! - [`assert_handled`] / [`assert_unhandled`] - Assert on escaped faults

use switchyard_dispatch::FaultStage;

use crate::client::TestResponse;

/// Asserts the status code.
///
/// # Panics
///
/// Panics if the status differs from `expected`.
pub fn assert_status(response: &TestResponse, expected: u16) {
    let actual = response.status_code();
    assert_eq!(
        actual, expected,
        "Expected status {expected}, got {actual}.\nBody: {}",
        response.body
    );
}

/// Asserts that the response body contains the given text.
///
/// # Panics
///
/// Panics if the response body does not contain `text`.
pub fn assert_contains(response: &TestResponse, text: &str) {
    let body = response.text();
    assert!(
        body.contains(text),
        "Response body does not contain '{text}'.\nActual body: {body}"
    );
}

/// Asserts that the response body does not contain the given text.
///
/// # Panics
///
/// Panics if the response body contains `text`.
pub fn assert_not_contains(response: &TestResponse, text: &str) {
    let body = response.text();
    assert!(
        !body.contains(text),
        "Response body unexpectedly contains '{text}'.\nActual body: {body}"
    );
}

/// Asserts the text streamed directly to the transport.
///
/// # Panics
///
/// Panics if the streamed output differs from `expected`.
pub fn assert_output(response: &TestResponse, expected: &str) {
    assert_eq!(
        response.output, expected,
        "Streamed output mismatch"
    );
}

/// Asserts that a header is present with the given value.
///
/// # Panics
///
/// Panics if the header is missing or has another value.
pub fn assert_header(response: &TestResponse, name: &str, expected: &str) {
    let actual = response
        .header(name)
        .unwrap_or_else(|| panic!("Response is missing header '{name}'"));
    assert_eq!(
        actual, expected,
        "Header '{name}': expected '{expected}', got '{actual}'"
    );
}

/// Asserts a 404 where no route matched the path.
///
/// # Panics
///
/// Panics if the status is not 404 or some route matched.
pub fn assert_not_found(response: &TestResponse) {
    assert_status(response, 404);
    assert_eq!(
        response.matched, 0,
        "Expected no matched routes, got {}",
        response.matched
    );
}

/// Asserts a 405 whose `Allow` header lists exactly `methods`.
///
/// # Panics
///
/// Panics if the status is not 405 or the allowed methods differ.
pub fn assert_method_not_allowed(response: &TestResponse, methods: &[&str]) {
    assert_status(response, 405);
    let allowed = response.allowed_methods();
    assert_eq!(
        allowed, methods,
        "Allow header mismatch: expected {methods:?}, got {allowed:?}"
    );
}

/// Asserts that no fault escaped dispatch.
///
/// # Panics
///
/// Panics if the dispatch ended with an unhandled fault.
pub fn assert_handled(response: &TestResponse) {
    if let Some(unhandled) = &response.fault {
        panic!("Dispatch ended with an unhandled fault: {unhandled}");
    }
}

/// Asserts that a fault escaped dispatch at `stage`.
///
/// # Panics
///
/// Panics if no fault escaped, or it escaped at another stage.
pub fn assert_unhandled(response: &TestResponse, stage: FaultStage) {
    let unhandled = response
        .fault
        .as_ref()
        .unwrap_or_else(|| panic!("Expected an unhandled fault during {stage}, dispatch succeeded"));
    assert_eq!(
        unhandled.stage, stage,
        "Fault escaped at the wrong stage: {unhandled}"
    );
    assert_status(response, 500);
}
