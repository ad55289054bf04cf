use std::time::Duration;

use crate::request::ResolvedRequest;
use crate::router::RunReport;

/// Observer hooks around [`Router::run`](crate::Router::run).
///
/// Middleware cannot change routing; it sees the resolved request before matching and
/// the report once a handler or fallback has finished. Requests whose handler failed
/// never reach `after`.
pub trait Middleware: Send + Sync {
    fn before(&self, _req: &ResolvedRequest) {}
    fn after(&self, _req: &ResolvedRequest, _report: &RunReport, _latency: Duration) {}
}
