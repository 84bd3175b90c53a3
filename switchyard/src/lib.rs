//! # switchyard
//!
//! Ordered-match HTTP routing and dispatch.
//!
//! Every route whose pattern and method match a request runs, in registration
//! order. Handlers steer the loop with control signals, stream or return
//! output, and hand failures to status routes and error hooks.
//!
//! This is the meta-crate that re-exports the sub-crates. Depend on
//! `switchyard` for everything, or on individual crates for finer-grained
//! control.
//!
//! ```
//! use switchyard::prelude::*;
//!
//! let mut router = Router::new();
//! router
//!     .with("/users", |users| {
//!         users.get("/[i:id]", |ctx| {
//!             Ok(format!("user {}", ctx.param("id").unwrap_or_default()).into())
//!         })?;
//!         Ok(())
//!     })
//!     .unwrap();
//!
//! let exchange = router.handle(Request::new(Method::GET, "/users/42")).unwrap();
//! assert_eq!(exchange.response.body(), "user 42");
//! assert_eq!(exchange.transport.last_sent().unwrap().code(), 200);
//! ```

/// Settings, errors, logging, services, and the error guard.
pub use switchyard_core as core;

/// Request, response, transports, and route patterns.
pub use switchyard_http as http;

/// The router and dispatch engine.
pub use switchyard_dispatch as dispatch;

/// Request factory, in-memory client, and assertions.
#[cfg(feature = "testing")]
pub use switchyard_test as test;

/// The names most applications need.
pub mod prelude {
    pub use ::http::{Method, StatusCode};

    pub use switchyard_core::{CaptureMode, Settings, SwitchyardError, SwitchyardResult};
    pub use switchyard_dispatch::{
        abort, fail, fail_http, skip_next, skip_remaining, skip_this, DispatchFault,
        DispatchOptions, HandlerContext, HandlerResult, Reply, Router,
    };
    pub use switchyard_http::{BufferedTransport, Request, Response, Transport};
}
