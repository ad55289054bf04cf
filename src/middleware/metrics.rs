use dashmap::DashMap;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use super::Middleware;
use crate::request::ResolvedRequest;
use crate::router::{Outcome, RunReport};

/// Counts requests by outcome and by the pattern that handled them.
///
/// All counters are atomics (`Ordering::Relaxed`) and the per-pattern table is a
/// [`DashMap`], so recording never blocks a request on another one.
#[derive(Debug, Default)]
pub struct MetricsMiddleware {
    request_count: AtomicUsize,
    handled: AtomicUsize,
    fallback: AtomicUsize,
    not_found: AtomicUsize,
    suppressed_bodies: AtomicUsize,
    total_latency_ns: AtomicU64,
    pattern_hits: DashMap<String, AtomicUsize>,
}

/// Point-in-time copy of the counters, serialisable for a metrics endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub requests: usize,
    pub handled: usize,
    pub fallback: usize,
    pub not_found: usize,
    pub suppressed_bodies: usize,
    pub average_latency_ns: u64,
    /// Handled and fallback requests per pattern, sorted by pattern
    pub pattern_hits: BTreeMap<String, usize>,
}

impl MetricsMiddleware {
    /// All counters at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of requests observed.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::Relaxed)
    }

    /// Mean time spent in `run`; zero before the first request completes.
    #[must_use]
    pub fn average_latency(&self) -> Duration {
        let completed = self.completed() as u64;
        if completed == 0 {
            Duration::from_nanos(0)
        } else {
            Duration::from_nanos(self.total_latency_ns.load(Ordering::Relaxed) / completed)
        }
    }

    /// Requests handled or answered by the rule with this pattern (`*` for a
    /// pattern-less not-found rule).
    #[must_use]
    pub fn hits(&self, pattern: &str) -> usize {
        self.pattern_hits
            .get(pattern)
            .map_or(0, |n| n.load(Ordering::Relaxed))
    }

    /// Copy the current counters.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests: self.request_count(),
            handled: self.handled.load(Ordering::Relaxed),
            fallback: self.fallback.load(Ordering::Relaxed),
            not_found: self.not_found.load(Ordering::Relaxed),
            suppressed_bodies: self.suppressed_bodies.load(Ordering::Relaxed),
            average_latency_ns: u64::try_from(self.average_latency().as_nanos()).unwrap_or(u64::MAX),
            pattern_hits: self
                .pattern_hits
                .iter()
                .map(|entry| (entry.key().clone(), entry.value().load(Ordering::Relaxed)))
                .collect(),
        }
    }

    fn completed(&self) -> usize {
        self.handled.load(Ordering::Relaxed)
            + self.fallback.load(Ordering::Relaxed)
            + self.not_found.load(Ordering::Relaxed)
    }

    fn hit(&self, pattern: &str) {
        if let Some(counter) = self.pattern_hits.get(pattern) {
            counter.fetch_add(1, Ordering::Relaxed);
            return;
        }
        self.pattern_hits
            .entry(pattern.to_string())
            .or_default()
            .fetch_add(1, Ordering::Relaxed);
    }
}

impl Middleware for MetricsMiddleware {
    fn before(&self, _req: &ResolvedRequest) {
        self.request_count.fetch_add(1, Ordering::Relaxed);
    }

    fn after(&self, _req: &ResolvedRequest, report: &RunReport, latency: Duration) {
        let nanos = u64::try_from(latency.as_nanos()).unwrap_or(u64::MAX);
        self.total_latency_ns.fetch_add(nanos, Ordering::Relaxed);

        match &report.outcome {
            Outcome::Handled { pattern } => {
                self.handled.fetch_add(1, Ordering::Relaxed);
                self.hit(pattern);
            }
            Outcome::Fallback { pattern } => {
                self.fallback.fetch_add(1, Ordering::Relaxed);
                self.hit(pattern);
            }
            Outcome::NotFound => {
                self.not_found.fetch_add(1, Ordering::Relaxed);
            }
        }
        if report.suppress_body {
            self.suppressed_bodies.fetch_add(1, Ordering::Relaxed);
        }
    }
}
