//! # Shared Router
//!
//! A long-lived server keeps one [`SharedRouter`] and lets every worker thread match
//! against it. Registration never touches the router that is serving traffic: a new
//! table is built from scratch with a [`RouterBuilder`](crate::RouterBuilder) and then
//! swapped in atomically.
//!
//! ```rust,ignore
//! let shared = SharedRouter::new(initial_builder.build());
//!
//! // request threads
//! let report = shared.run(&ctx)?;
//!
//! // reload path
//! let previous = shared.replace(rebuilt.build());
//! ```
//!
//! Readers never block and never observe a half-registered table. A request that
//! loaded the old router finishes on it.

use arc_swap::ArcSwap;
use std::sync::Arc;
use tracing::info;

use crate::error::RouterError;
use crate::request::RequestContext;
use crate::router::{RouteKind, Router, RunReport};

/// Atomically swappable handle to a frozen [`Router`].
pub struct SharedRouter {
    current: ArcSwap<Router>,
}

impl SharedRouter {
    /// Share `router` until the first [`SharedRouter::replace`].
    #[must_use]
    pub fn new(router: Router) -> Self {
        SharedRouter {
            current: ArcSwap::from_pointee(router),
        }
    }

    /// Snapshot of the router currently serving traffic.
    #[must_use]
    pub fn load(&self) -> Arc<Router> {
        self.current.load_full()
    }

    /// Install `router` for all subsequent requests and return the previous one.
    pub fn replace(&self, router: Router) -> Arc<Router> {
        info!(
            before_routes = router.table().route_count(RouteKind::Before),
            after_routes = router.table().route_count(RouteKind::After),
            "Router replaced"
        );
        self.current.swap(Arc::new(router))
    }

    /// Run a request against the current router.
    ///
    /// # Errors
    ///
    /// See [`Router::run`].
    pub fn run(&self, ctx: &RequestContext) -> Result<RunReport, RouterError> {
        self.current.load().run(ctx)
    }
}

impl From<Router> for SharedRouter {
    fn from(router: Router) -> Self {
        SharedRouter::new(router)
    }
}
