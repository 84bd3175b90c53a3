//! # switchyard-http
//!
//! HTTP value types and URL routing primitives for switchyard: the request and
//! response containers, output transports, the pattern compiler, and the route
//! registry. Nothing in this crate invokes handlers; that is the dispatch
//! crate's job.
//!
//! ## Modules
//!
//! - [`request`] - The incoming request
//! - [`response`] - The outgoing response and its lock
//! - [`transport`] - Where streamed output and finished responses go
//! - [`urls`] - Patterns, the registry, and reverse generation

pub mod request;
pub mod response;
pub mod transport;
pub mod urls;

pub use request::{Request, RequestBuilder};
pub use response::Response;
pub use transport::{BufferedTransport, Transport, WriterTransport};
pub use urls::pattern::{PathMatch, PatternKind, RoutePattern};
pub use urls::registry::{Route, RouteId, RouteMut, RouteRegistry, RouteTarget};
