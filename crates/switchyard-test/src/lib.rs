//! # switchyard-test
//!
//! Testing utilities for switchyard routers. Provides a request factory, an
//! in-memory client that dispatches through a [`Router`](switchyard_dispatch::Router),
//! and assertion helpers for the resulting responses.
//!
//! No network and no async runtime are involved: every request is dispatched
//! synchronously against a [`BufferedTransport`](switchyard_http::BufferedTransport).

pub mod assertions;
pub mod client;
pub mod request_factory;

pub use client::{Client, TestResponse};
pub use request_factory::RequestFactory;
