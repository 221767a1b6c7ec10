//! # switchyard
//!
//! A radix-tree HTTP request router and dispatch engine: pattern parsing,
//! copy-on-write tree publication, a bloom-gated compiled lookup layer,
//! pooled per-request contexts, and an API-version overlay with detector
//! chains and deprecation lifecycle.
//!
//! ## Architecture
//!
//! - [`pattern`] — route pattern parsing (`:param`, `*wildcard`, static segments)
//! - [`constraint`] — the `Where`/`WhereNumber`/`WhereAlpha`/... parameter constraint family
//! - [`radix`] — the radix tree: node structure, insertion, constraint-gated lookup
//! - [`registry`] — copy-on-write `method -> tree` publication
//! - [`compiled`] — static hash table + bloom-gated dynamic list, built at freeze
//! - [`context`] — the pooled per-request [`context::Context`]
//! - [`handler`] — the cursor-driven handler chain
//! - [`version`] — the API-version overlay: detectors, lifecycle, observers
//! - [`freeze`] — the one-way mutable → frozen lifecycle transition
//! - [`builder`] — the fluent route-registration surface
//! - [`observability`] — the external observability contract
//! - [`dispatcher`] — [`dispatcher::Router`], the `serve` entry point
//!
//! ## Example
//!
//! ```
//! use switchyard::dispatcher::Router;
//! use switchyard::context::RequestInfo;
//! use http::{HeaderMap, Method};
//! use std::sync::Arc;
//!
//! let router = Router::new();
//! router
//!     .registrar()
//!     .get(
//!         "/users/:id",
//!         vec![Arc::new(|ctx: &mut switchyard::context::Context| {
//!             let id = ctx.param("id").unwrap_or("").to_string();
//!             ctx.response_body = format!("user {id}").into_bytes();
//!         })],
//!     )
//!     .unwrap()
//!     .where_number("id");
//!
//! let response = router.serve(RequestInfo {
//!     method: Method::GET,
//!     path: "/users/42".into(),
//!     headers: HeaderMap::new(),
//!     raw_query: String::new(),
//!     cookie_header: None,
//! });
//! assert_eq!(response.body, b"user 42");
//! ```

pub mod builder;
pub mod compiled;
pub mod constraint;
pub mod context;
pub mod dispatcher;
pub mod error;
pub mod freeze;
pub mod handler;
pub mod ids;
pub mod observability;
pub mod pattern;
pub mod radix;
pub mod registry;
pub mod version;

pub use context::{Context, RequestInfo};
pub use dispatcher::{Response, Router};
pub use error::FreezeError;
pub use handler::Handler;
pub use observability::{DynObservability, Observability};
pub use pattern::Pattern;
