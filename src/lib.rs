//! # waymark
//!
//! **waymark** is a regex-driven request router: it selects at most one terminal
//! handler for an HTTP method and path, runs any matching middleware routes first, and
//! falls back to layered not-found handlers when nothing matched.
//!
//! ## Overview
//!
//! The transport hands the engine plain values (method, URI, host, headers); the engine
//! writes no bytes and sets no status codes. It reports what happened through a
//! [`RunReport`] and the boundary layer turns that into a response.
//!
//! ## Architecture
//!
//! - **[`pattern`]** - route definitions (`/hello/{name}`, `/blog(/\d{4})?`) compiled to anchored regexes
//! - **[`domain`]** - host rules for domain-scoped routes
//! - **[`request`]** - effective method (HEAD, method override) and normalised path
//! - **[`router`]** - route table, matcher and the [`Router::run`] pipeline
//! - **[`dispatcher`]** - handler references, controller registry, invocation
//! - **[`scope`]** - prefix, namespace and domain composition at registration
//! - **[`middleware`]** - observers around each run (tracing, metrics)
//! - **[`shared`]** - lock-free swappable router for long-lived servers
//! - **[`runtime_config`]** / **[`logging`]** - configuration and subscriber setup
//!
//! ### Request Handling Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Transport
//!     participant Router
//!     participant Resolver as request::resolve
//!     participant Table as RouteTable
//!     participant Dispatcher
//!
//!     Transport->>Router: run(RequestContext)
//!     Router->>Resolver: method override, base path, normalise
//!     Resolver-->>Router: ResolvedRequest
//!     Router->>Table: before-routes for method + host
//!     loop every matching before-route
//!         Router->>Dispatcher: invoke(handler, params)
//!     end
//!     Router->>Table: after-routes for method + host
//!     alt first match
//!         Router->>Dispatcher: invoke(handler, params)
//!     else no match
//!         Router->>Table: not-found rules
//!         Router->>Dispatcher: invoke(fallback, params)
//!     end
//!     Router-->>Transport: RunReport (outcome, status, suppress_body)
//! ```
//!
//! ## Quick Start
//!
//! ```no_run
//! use waymark::{handler, RequestContext, RouterBuilder};
//!
//! # fn main() -> Result<(), waymark::RouterError> {
//! let mut builder = RouterBuilder::new();
//! builder.before("GET|POST", "/admin/.*", handler(|_call| Ok(())))?;
//! builder.get("/hello/{name}", handler(|call| {
//!     println!("Hello {}", call.param(0).unwrap_or("stranger"));
//!     Ok(())
//! }))?;
//! builder.mount("/movies", |movies| {
//!     movies.get("/", handler(|_call| Ok(())))?;
//!     movies.get("/(\\d+)", handler(|call| {
//!         println!("movie {}", call.param(0).unwrap_or_default());
//!         Ok(())
//!     }))?;
//!     Ok(())
//! })?;
//! builder.set_404(handler(|call| {
//!     if call.matched_other_method() {
//!         println!("405");
//!     }
//!     Ok(())
//! }));
//!
//! let router = builder.build();
//! let report = router.run(&RequestContext::parse("GET", "/movies/42")?)?;
//! assert!(report.handled());
//! # Ok(())
//! # }
//! ```

pub mod dispatcher;
pub mod domain;
pub mod error;
pub mod ids;
pub mod logging;
pub mod middleware;
pub mod pattern;
pub mod request;
pub mod router;
pub mod runtime_config;
pub mod scope;
pub mod shared;

pub use dispatcher::{
    handler, Call, ControllerRegistry, ControllerTarget, HandlerRef, HandlerResult,
};
pub use domain::DomainPattern;
pub use error::RouterError;
pub use ids::RequestId;
pub use middleware::{Middleware, MetricsMiddleware, MetricsSnapshot, TracingMiddleware};
pub use pattern::CompiledPattern;
pub use request::{RequestContext, ResolvedRequest};
pub use router::{Outcome, Params, RouteInfo, RouteKind, Router, RunReport};
pub use runtime_config::RouterConfig;
pub use scope::{Registrar, RouterBuilder, Scope};
pub use shared::SharedRouter;
