//! # Router Module
//!
//! Route storage, path matching and the request pipeline.
//!
//! ## Overview
//!
//! - [`table`](RouteTable): routes partitioned by set (before/after), method and
//!   domain, plus the not-found rules
//! - [`matcher`](match_path): anchored matching and positional parameter extraction
//! - [`Router`]: the frozen table driving [`run`](Router::run)
//!
//! ## Matching Order
//!
//! For the effective method of a request (a `HEAD` request consults the `HEAD`
//! buckets, then the `GET` buckets; a route registered for both runs once):
//!
//! 1. Every matching before-route runs, in registration order.
//! 2. After-routes are scanned in registration order (domain-restricted routes whose
//!    domain matches first); the first match runs and the scan stops.
//! 3. Without a handled after-route, the not-found chain is walked and at most one
//!    rule runs.
//!
//! ## Example
//!
//! ```rust,ignore
//! use waymark::{handler, RequestContext, RouterBuilder};
//!
//! let mut builder = RouterBuilder::new();
//! builder.get("/hello/{name}", handler(|call| {
//!     println!("Hello {}", call.param(0).unwrap_or("stranger"));
//!     Ok(())
//! }))?;
//! let router = builder.build();
//!
//! let report = router.run(&RequestContext::parse("GET", "/hello/bramus")?)?;
//! assert!(report.handled());
//! ```

mod core;
mod matcher;
mod table;

pub use core::{Outcome, RouteInfo, Router, RunReport};
pub use matcher::{match_path, ParamVec, Params, MAX_INLINE_PARAMS};
pub use table::{MethodBucket, NotFoundRule, Route, RouteKind, RouteTable};
