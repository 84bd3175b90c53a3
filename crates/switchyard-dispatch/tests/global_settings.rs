//! Integration tests for routers built from the global settings.
//!
//! The global can only be configured once per process, so these tests live in
//! their own binary.

use http::Method;

use switchyard_core::{Settings, SETTINGS};
use switchyard_dispatch::{Reply, Router};
use switchyard_http::{BufferedTransport, Request, Response};

// ═════════════════════════════════════════════════════════════════════
// 1. Configured global
// ═════════════════════════════════════════════════════════════════════

#[test]
fn test_router_new_reads_configured_settings() {
    SETTINGS.configure(Settings {
        trailing_slash_tolerant: false,
        send_response: false,
        ..Settings::default()
    });

    let mut router = Router::new();
    router.get("/x", |_| Ok(Reply::text("x"))).unwrap();
    assert!(!router.default_options().send);
    assert!(!Router::default().default_options().send);

    let mut request = Request::builder().method(Method::GET).path("/x/").build();
    let mut response = Response::default();
    let mut transport = BufferedTransport::new();
    let dispatched = router
        .dispatch(&mut request, &mut response, router.default_options(), &mut transport)
        .unwrap();

    assert!(dispatched.matched.is_empty());
    assert_eq!(response.code(), 404);
    assert!(transport.last_sent().is_none());
}
