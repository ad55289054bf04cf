//! Router core: the request-phase pipeline.
//!
//! ```text
//! RequestContext ─ resolve ─► ResolvedRequest
//!        │
//!        ├─ before-routes: every match runs, in order
//!        ├─ after-routes:  first match runs, scan stops
//!        └─ none handled:  not-found chain (scoped rules, then universal)
//! ```
//!
//! The table is never written after [`RouterBuilder::build`](crate::RouterBuilder::build),
//! so one `Router` serves any number of threads without locking.

use http::{Method, StatusCode};
use smallvec::{smallvec, SmallVec};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, info_span, warn};

use super::matcher::match_path;
use super::table::{Route, RouteKind, RouteTable};
use crate::dispatcher::{dispatch, Call, ControllerRegistry, Dispatch};
use crate::domain::DomainPattern;
use crate::error::RouterError;
use crate::ids::RequestId;
use crate::middleware::Middleware;
use crate::request::{resolve, RequestContext, ResolvedRequest};
use crate::runtime_config::RouterConfig;

/// How a request ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// An after-route handled the request.
    Handled { pattern: String },
    /// A not-found rule handled the request. `pattern` is `*` for a pattern-less rule.
    Fallback { pattern: String },
    /// Nothing handled the request and no fallback applied.
    NotFound,
}

/// What [`Router::run`] reports back to the boundary layer.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub request_id: RequestId,
    /// Method used for matching (`GET` for a `HEAD` request, which also tries `HEAD`
    /// routes first)
    pub method: Method,
    /// Normalised path used for matching
    pub path: String,
    pub outcome: Outcome,
    /// Number of before-route handlers invoked
    pub before_invoked: usize,
    /// `HEAD` request: the boundary layer must not emit a body
    pub suppress_body: bool,
}

impl RunReport {
    /// `true` only when an after-route handled the request.
    #[must_use]
    pub fn handled(&self) -> bool {
        matches!(self.outcome, Outcome::Handled { .. })
    }

    /// Status the boundary layer should signal.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self.outcome {
            Outcome::Handled { .. } => StatusCode::OK,
            Outcome::Fallback { .. } | Outcome::NotFound => StatusCode::NOT_FOUND,
        }
    }

    /// Pattern of the route or rule that handled the request.
    #[must_use]
    pub fn pattern(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Handled { pattern } | Outcome::Fallback { pattern } => Some(pattern),
            Outcome::NotFound => None,
        }
    }
}

/// One row of [`Router::routes`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteInfo {
    pub kind: RouteKind,
    pub method: Method,
    pub domain: Option<String>,
    pub pattern: String,
    pub handler: String,
}

/// Frozen route table plus everything needed to drive a request through it.
pub struct Router {
    table: RouteTable,
    controllers: ControllerRegistry,
    config: RouterConfig,
    middleware: Vec<Arc<dyn Middleware>>,
}

impl Router {
    pub(crate) fn from_parts(
        table: RouteTable,
        controllers: ControllerRegistry,
        config: RouterConfig,
        middleware: Vec<Arc<dyn Middleware>>,
    ) -> Self {
        Router {
            table,
            controllers,
            config,
            middleware,
        }
    }

    /// Start a new [`RouterBuilder`](crate::RouterBuilder).
    #[must_use]
    pub fn builder() -> crate::RouterBuilder {
        crate::RouterBuilder::new()
    }

    /// Request-resolution settings this router was built with.
    #[must_use]
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Explicit base path, if one was configured.
    #[must_use]
    pub fn base_path(&self) -> Option<&str> {
        self.config.base_path.as_deref()
    }

    /// The frozen route table.
    #[must_use]
    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    /// Drive one request through the engine.
    ///
    /// # Errors
    ///
    /// [`RouterError::Handler`] when a handler fails. Processing stops at that handler.
    pub fn run(&self, ctx: &RequestContext) -> Result<RunReport, RouterError> {
        self.run_then(ctx, |_| {})
    }

    /// Like [`run`](Router::run), then call `on_handled` if an after-route handled the
    /// request. Fallbacks do not trigger it.
    ///
    /// # Errors
    ///
    /// [`RouterError::Handler`] when a handler fails; `on_handled` is not called.
    pub fn run_then<F>(&self, ctx: &RequestContext, on_handled: F) -> Result<RunReport, RouterError>
    where
        F: FnOnce(&RunReport),
    {
        let started = Instant::now();
        let request = Arc::new(resolve(ctx, &self.config));
        let span = info_span!(
            "route",
            request_id = %request.request_id,
            method = %request.method,
            path = %request.path
        );
        let _entered = span.enter();

        for mw in &self.middleware {
            mw.before(&request);
        }

        let report = self.drive(&request)?;
        if report.handled() {
            on_handled(&report);
        }

        let latency = started.elapsed();
        for mw in &self.middleware {
            mw.after(&request, &report, latency);
        }
        Ok(report)
    }

    fn drive(&self, request: &Arc<ResolvedRequest>) -> Result<RunReport, RouterError> {
        let host = request.host.as_deref();
        let path = request.path.as_str();

        debug!(
            method = %request.method,
            path = %path,
            host = ?host,
            "Route match attempt"
        );

        let methods = lookup_methods(request);
        let mut diverted = false;
        let mut before_invoked = 0;
        // One registration may sit in both the HEAD and GET buckets.
        let mut ran: SmallVec<[u64; 8]> = SmallVec::new();
        for route in self.candidates(RouteKind::Before, &methods, host) {
            if ran.contains(&route.registration) {
                continue;
            }
            let Some(params) = match_path(&route.pattern, path) else {
                continue;
            };
            let call = Call::new(params, Arc::clone(request));
            if dispatch(&route.handler, &self.controllers, &call, route.pattern.as_str())?
                == Dispatch::Invoked
            {
                ran.push(route.registration);
                before_invoked += 1;
                diverted |= call.not_found_requested();
            }
        }

        let mut handled: Option<&Route> = None;
        if !diverted {
            let scan_start = Instant::now();
            for route in self.candidates(RouteKind::After, &methods, host) {
                let Some(params) = match_path(&route.pattern, path) else {
                    continue;
                };
                self.log_match(request, route, scan_start.elapsed());
                let call = Call::new(params, Arc::clone(request));
                match dispatch(&route.handler, &self.controllers, &call, route.pattern.as_str())? {
                    Dispatch::Unresolved => continue,
                    Dispatch::Invoked if call.not_found_requested() => diverted = true,
                    Dispatch::Invoked => handled = Some(route),
                }
                break;
            }
        }

        let outcome = match handled {
            Some(route) => Outcome::Handled {
                pattern: route.pattern.as_str().to_string(),
            },
            None => {
                if diverted {
                    debug!(path = %path, "Not-found requested by handler");
                }
                self.fallback(request)?
            }
        };

        Ok(RunReport {
            request_id: request.request_id,
            method: request.method.clone(),
            path: request.path.clone(),
            outcome,
            before_invoked,
            suppress_body: request.suppress_body(),
        })
    }

    fn fallback(&self, request: &Arc<ResolvedRequest>) -> Result<Outcome, RouterError> {
        let host = request.host.as_deref();
        let path = request.path.as_str();
        let mut other_method: Option<bool> = None;

        for rule in self.table.not_found_rules() {
            let Some(params) = rule.applies_to(path, host) else {
                continue;
            };
            let matched_other =
                *other_method.get_or_insert_with(|| self.matches_other_method(request));
            let call = Call::for_fallback(params, Arc::clone(request), matched_other);
            if dispatch(&rule.handler, &self.controllers, &call, rule.label())? == Dispatch::Invoked {
                info!(
                    method = %request.method,
                    path = %path,
                    rule = %rule.label(),
                    handler = %rule.handler.describe(),
                    matched_other_method = matched_other,
                    "Not-found handler invoked"
                );
                return Ok(Outcome::Fallback {
                    pattern: rule.label().to_string(),
                });
            }
        }

        warn!(
            method = %request.method,
            path = %path,
            host = ?host,
            "No route matched"
        );
        Ok(Outcome::NotFound)
    }

    /// Routes of `kind` for every method in `methods`, bucket by bucket.
    fn candidates<'a>(
        &'a self,
        kind: RouteKind,
        methods: &'a [Method],
        host: Option<&'a str>,
    ) -> impl Iterator<Item = &'a Route> + 'a {
        methods
            .iter()
            .filter_map(move |m| self.table.bucket(kind, m))
            .flat_map(move |bucket| bucket.candidates(host))
    }

    /// Whether an after-route for a method this request did not consult matches the
    /// same path and host.
    fn matches_other_method(&self, request: &ResolvedRequest) -> bool {
        let host = request.host.as_deref();
        let consulted = lookup_methods(request);
        self.table
            .methods(RouteKind::After)
            .filter(|m| !consulted.contains(m))
            .filter_map(|m| self.table.bucket(RouteKind::After, m))
            .any(|bucket| {
                bucket
                    .candidates(host)
                    .any(|route| route.pattern.is_match(&request.path))
            })
    }

    fn log_match(&self, request: &ResolvedRequest, route: &Route, elapsed: Duration) {
        let threshold = Duration::from_micros(self.config.slow_match_threshold_us);
        if elapsed > threshold {
            warn!(
                method = %request.method,
                path = %request.path,
                pattern = %route.pattern,
                handler = %route.handler.describe(),
                duration_us = elapsed.as_micros(),
                "Slow route matching detected"
            );
        } else {
            info!(
                method = %request.method,
                path = %request.path,
                pattern = %route.pattern,
                handler = %route.handler.describe(),
                duration_us = elapsed.as_micros(),
                "Route matched"
            );
        }
    }

    /// Every registered route, before-routes first, sorted by method.
    #[must_use]
    pub fn routes(&self) -> Vec<RouteInfo> {
        self.table
            .entries()
            .into_iter()
            .map(|(kind, route)| RouteInfo {
                kind,
                method: route.method.clone(),
                domain: route.domain.as_ref().map(DomainPattern::to_string),
                pattern: route.pattern.as_str().to_string(),
                handler: route.handler.describe(),
            })
            .collect()
    }

    /// Log every registered route at `info`.
    pub fn dump_routes(&self) {
        let routes = self.routes();
        info!(
            count = routes.len(),
            base_path = ?self.config.base_path,
            "Registered routes"
        );
        for route in routes {
            info!(
                kind = %route.kind,
                method = %route.method,
                domain = route.domain.as_deref().unwrap_or("*"),
                pattern = %route.pattern,
                handler = %route.handler,
                "Route"
            );
        }
    }
}

/// Buckets consulted for a request, in order. `HEAD` tries its own routes, then `GET`.
fn lookup_methods(request: &ResolvedRequest) -> SmallVec<[Method; 2]> {
    if request.original_method == Method::HEAD {
        smallvec![Method::HEAD, Method::GET]
    } else {
        smallvec![request.method.clone()]
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("before_routes", &self.table.route_count(RouteKind::Before))
            .field("after_routes", &self.table.route_count(RouteKind::After))
            .field("not_found_rules", &self.table.not_found_count())
            .field("config", &self.config)
            .finish()
    }
}
