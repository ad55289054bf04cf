use std::time::Duration;

use tracing::{debug, info};

use super::Middleware;
use crate::request::ResolvedRequest;
use crate::router::{Outcome, RunReport};

/// Logs one summary line per request.
///
/// Runs inside the `route` span opened by [`Router::run`](crate::Router::run), so the
/// request id, method and path are attached by the subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingMiddleware;

impl Middleware for TracingMiddleware {
    fn before(&self, req: &ResolvedRequest) {
        debug!(
            original_method = %req.original_method,
            host = ?req.host,
            query = ?req.query,
            "Request started"
        );
    }

    fn after(&self, req: &ResolvedRequest, report: &RunReport, latency: Duration) {
        let outcome = match &report.outcome {
            Outcome::Handled { .. } => "handled",
            Outcome::Fallback { .. } => "fallback",
            Outcome::NotFound => "not_found",
        };
        info!(
            request_id = %report.request_id,
            method = %report.method,
            path = %req.path,
            outcome,
            pattern = report.pattern().unwrap_or("-"),
            status = report.status().as_u16(),
            before_invoked = report.before_invoked,
            suppress_body = report.suppress_body,
            latency_us = u64::try_from(latency.as_micros()).unwrap_or(u64::MAX),
            "Request completed"
        );
    }
}
