//! Route patterns, the route registry, and reverse path generation.
//!
//! - [`placeholder`]: Placeholder types (`i`, `a`, `h`, `s`, `*`, `**`, alternations)
//! - [`pattern`]: Pattern compilation, matching, and namespace scoping
//! - [`registry`]: The ordered route registry with its name index
//! - [`reverse`]: Path generation from route names
//!
//! # Examples
//!
//! ```
//! use std::collections::HashMap;
//! use switchyard_http::urls::pattern::RoutePattern;
//! use switchyard_http::urls::registry::{Route, RouteRegistry};
//! use switchyard_http::urls::reverse::reverse;
//!
//! let mut registry = RouteRegistry::new();
//! let pattern = RoutePattern::compile("/articles/[i:year]").unwrap();
//! registry.add(Route::new(&["GET"], pattern, ()).with_name("article-year")).unwrap();
//!
//! // Forward matching
//! let route = &registry.all()[0];
//! let found = route.pattern().unwrap().match_path("/articles/2024").unwrap();
//! assert_eq!(found.get("year"), Some("2024"));
//!
//! // Reverse generation
//! registry.prepare_named().unwrap();
//! let params = HashMap::from([("year", "2024")]);
//! let path = reverse(&registry, "article-year", Some(&params), true).unwrap();
//! assert_eq!(path, "/articles/2024");
//! ```

pub mod pattern;
pub mod placeholder;
pub mod registry;
pub mod reverse;
