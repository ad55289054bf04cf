//! Route Table: per-method, per-domain route storage plus the not-found chain.
//!
//! ```text
//! RouteTable
//! ├── before: Method → MethodBucket { scoped, wildcard }
//! ├── after:  Method → MethodBucket { scoped, wildcard }
//! └── not-found rules: scoped (newest first), then universal
//! ```
//!
//! Within a bucket, routes restricted to a domain are consulted before routes without
//! one; each list keeps registration order.

use http::Method;
use std::collections::HashMap;
use std::fmt;

use crate::dispatcher::HandlerRef;
use crate::domain::DomainPattern;
use crate::pattern::CompiledPattern;

use super::matcher::{match_path, Params};

/// Which set a route belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteKind {
    /// Middleware route: every match runs.
    Before,
    /// Terminal route: first match wins.
    After,
}

impl fmt::Display for RouteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RouteKind::Before => "before",
            RouteKind::After => "after",
        })
    }
}

/// A registered `(method, pattern, handler)` triple. Immutable once stored.
#[derive(Debug, Clone)]
pub struct Route {
    /// Shared by every method inserted from one registration call.
    pub(crate) registration: u64,
    pub(crate) method: Method,
    pub(crate) pattern: CompiledPattern,
    pub(crate) handler: HandlerRef,
    pub(crate) domain: Option<DomainPattern>,
}

impl Route {
    /// Method bucket this route was stored under.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Fully-qualified pattern (prefixes applied).
    #[must_use]
    pub fn pattern(&self) -> &CompiledPattern {
        &self.pattern
    }

    /// Handler reference, namespace already applied.
    #[must_use]
    pub fn handler(&self) -> &HandlerRef {
        &self.handler
    }

    /// `None` for a route that matches any host.
    #[must_use]
    pub fn domain(&self) -> Option<&DomainPattern> {
        self.domain.as_ref()
    }
}

/// Routes for one method within one set.
#[derive(Debug, Default, Clone)]
pub struct MethodBucket {
    scoped: Vec<Route>,
    wildcard: Vec<Route>,
}

impl MethodBucket {
    fn push(&mut self, route: Route) {
        if route.domain.is_some() {
            self.scoped.push(route);
        } else {
            self.wildcard.push(route);
        }
    }

    /// Routes eligible for `host`, in matching order.
    pub fn candidates<'a>(&'a self, host: Option<&'a str>) -> impl Iterator<Item = &'a Route> + 'a {
        self.scoped
            .iter()
            .filter(move |r| r.domain.as_ref().is_some_and(|d| d.matches(host)))
            .chain(self.wildcard.iter())
    }

    /// Every route in the bucket, scoped first.
    pub fn iter(&self) -> impl Iterator<Item = &Route> {
        self.scoped.iter().chain(self.wildcard.iter())
    }

    /// Number of routes, scoped and wildcard.
    #[must_use]
    pub fn len(&self) -> usize {
        self.scoped.len() + self.wildcard.len()
    }

    /// `true` when the bucket holds no route.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Fallback handler, optionally limited to a path pattern and/or a domain.
#[derive(Debug, Clone)]
pub struct NotFoundRule {
    pub(crate) pattern: Option<CompiledPattern>,
    pub(crate) domain: Option<DomainPattern>,
    pub(crate) handler: HandlerRef,
}

impl NotFoundRule {
    /// A rule with neither pattern nor domain applies to every request.
    #[must_use]
    pub fn is_universal(&self) -> bool {
        self.pattern.is_none() && self.domain.is_none()
    }

    /// Parameters for this request when the rule applies.
    #[must_use]
    pub fn applies_to(&self, path: &str, host: Option<&str>) -> Option<Params> {
        if let Some(domain) = &self.domain {
            if !domain.matches(host) {
                return None;
            }
        }
        match &self.pattern {
            Some(pattern) => match_path(pattern, path),
            None => Some(Params::default()),
        }
    }

    /// Pattern source, or `*` for a pattern-less rule.
    #[must_use]
    pub fn label(&self) -> &str {
        self.pattern.as_ref().map_or("*", CompiledPattern::as_str)
    }

    /// Handler invoked when the rule applies.
    #[must_use]
    pub fn handler(&self) -> &HandlerRef {
        &self.handler
    }

    fn same_scope(&self, other: &NotFoundRule) -> bool {
        self.pattern.as_ref().map(CompiledPattern::as_str)
            == other.pattern.as_ref().map(CompiledPattern::as_str)
            && self.domain.as_ref().map(ToString::to_string)
                == other.domain.as_ref().map(ToString::to_string)
    }
}

/// All routes and not-found rules of one router.
#[derive(Debug, Default, Clone)]
pub struct RouteTable {
    before: HashMap<Method, MethodBucket>,
    after: HashMap<Method, MethodBucket>,
    scoped_not_found: Vec<NotFoundRule>,
    universal_not_found: Option<NotFoundRule>,
    registrations: u64,
}

impl RouteTable {
    /// Empty table without routes or not-found rules.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Id for the next registration call; its routes share it across methods.
    pub(crate) fn next_registration(&mut self) -> u64 {
        self.registrations += 1;
        self.registrations
    }

    pub(crate) fn insert(&mut self, kind: RouteKind, route: Route) {
        self.set_mut(kind)
            .entry(route.method.clone())
            .or_default()
            .push(route);
    }

    /// Add a not-found rule. A rule for an already-covered pattern and domain replaces
    /// the old one; a universal rule replaces the previous universal rule.
    pub(crate) fn set_not_found(&mut self, rule: NotFoundRule) {
        if rule.is_universal() {
            self.universal_not_found = Some(rule);
            return;
        }
        self.scoped_not_found.retain(|existing| !existing.same_scope(&rule));
        self.scoped_not_found.push(rule);
    }

    /// Bucket for `method` in the given set.
    #[must_use]
    pub fn bucket(&self, kind: RouteKind, method: &Method) -> Option<&MethodBucket> {
        self.set(kind).get(method)
    }

    /// Methods that have at least one route in the given set.
    pub fn methods(&self, kind: RouteKind) -> impl Iterator<Item = &Method> {
        self.set(kind).keys()
    }

    /// Not-found rules in evaluation order: scoped rules newest first, then the
    /// universal rule.
    pub fn not_found_rules(&self) -> impl Iterator<Item = &NotFoundRule> {
        self.scoped_not_found
            .iter()
            .rev()
            .chain(self.universal_not_found.iter())
    }

    /// Routes of `kind` across all methods.
    #[must_use]
    pub fn route_count(&self, kind: RouteKind) -> usize {
        self.set(kind).values().map(MethodBucket::len).sum()
    }

    /// Scoped rules plus the universal one, if set.
    #[must_use]
    pub fn not_found_count(&self) -> usize {
        self.scoped_not_found.len() + usize::from(self.universal_not_found.is_some())
    }

    /// Every route with its set, sorted by set then method name. Within a method the
    /// order is the match order: domain-scoped routes, then the rest.
    #[must_use]
    pub fn entries(&self) -> Vec<(RouteKind, &Route)> {
        let mut out = Vec::with_capacity(
            self.route_count(RouteKind::Before) + self.route_count(RouteKind::After),
        );
        for kind in [RouteKind::Before, RouteKind::After] {
            let mut methods: Vec<&Method> = self.set(kind).keys().collect();
            methods.sort_by(|a, b| a.as_str().cmp(b.as_str()));
            for method in methods {
                if let Some(bucket) = self.set(kind).get(method) {
                    out.extend(bucket.iter().map(|route| (kind, route)));
                }
            }
        }
        out
    }

    fn set(&self, kind: RouteKind) -> &HashMap<Method, MethodBucket> {
        match kind {
            RouteKind::Before => &self.before,
            RouteKind::After => &self.after,
        }
    }

    fn set_mut(&mut self, kind: RouteKind) -> &mut HashMap<Method, MethodBucket> {
        match kind {
            RouteKind::Before => &mut self.before,
            RouteKind::After => &mut self.after,
        }
    }
}
