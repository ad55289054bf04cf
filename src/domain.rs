//! Host (domain) rules for route scoping.
//!
//! # Matching rules
//! - `admin.example.com` matches that host exactly (case-insensitive)
//! - `*.example.com` matches any subdomain and the bare `example.com`
//! - `*` matches every host, including a request without one
//! - [`DomainPattern::custom`] plugs in a caller-supplied predicate
//!
//! The port is ignored on the request side (`example.com:8080` is `example.com`).
//! A route with no domain at all is a wildcard and is not represented here.

use std::fmt;
use std::sync::Arc;

use crate::error::RouterError;

type HostPredicate = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// A declared domain a route (or not-found rule) is restricted to.
#[derive(Clone)]
pub enum DomainPattern {
    /// Any host.
    Any,
    /// Exact host, stored lowercase.
    Exact(String),
    /// `*.example.com`: the stored value is the suffix including the dot (`.example.com`).
    Suffix(String),
    /// Caller-supplied rule. `label` is used for logging and route listings.
    Custom {
        label: String,
        predicate: HostPredicate,
    },
}

impl DomainPattern {
    /// Parse a domain rule.
    ///
    /// # Errors
    ///
    /// [`RouterError::InvalidDomain`] for an empty rule, a bare `*.`, or a rule
    /// containing whitespace or a `/`.
    pub fn parse(rule: &str) -> Result<Self, RouterError> {
        let rule = rule.trim();
        if rule.is_empty() || rule.contains(|c: char| c.is_whitespace() || c == '/') {
            return Err(RouterError::InvalidDomain(rule.to_string()));
        }
        if rule == "*" {
            return Ok(DomainPattern::Any);
        }
        if let Some(bare) = rule.strip_prefix("*.") {
            if bare.is_empty() {
                return Err(RouterError::InvalidDomain(rule.to_string()));
            }
            return Ok(DomainPattern::Suffix(format!(".{}", bare.to_lowercase())));
        }
        Ok(DomainPattern::Exact(rule.to_lowercase()))
    }

    /// Build a rule from a predicate over the port-stripped, lowercased host.
    pub fn custom<F>(label: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        DomainPattern::Custom {
            label: label.into(),
            predicate: Arc::new(predicate),
        }
    }

    /// Check a request host against this rule.
    #[must_use]
    pub fn matches(&self, host: Option<&str>) -> bool {
        if let DomainPattern::Any = self {
            return true;
        }
        let Some(host) = host else {
            return false;
        };
        let host = normalize_host(host);

        match self {
            DomainPattern::Any => true,
            DomainPattern::Exact(expected) => host == *expected,
            DomainPattern::Suffix(suffix) => host.ends_with(suffix.as_str()) || host == suffix[1..],
            DomainPattern::Custom { predicate, .. } => predicate(&host),
        }
    }
}

impl fmt::Display for DomainPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomainPattern::Any => f.write_str("*"),
            DomainPattern::Exact(host) => f.write_str(host),
            DomainPattern::Suffix(suffix) => write!(f, "*{suffix}"),
            DomainPattern::Custom { label, .. } => write!(f, "custom({label})"),
        }
    }
}

impl fmt::Debug for DomainPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DomainPattern({self})")
    }
}

/// Lowercase and drop a trailing `:port`. Bracketed IPv6 literals keep their colons.
pub(crate) fn normalize_host(host: &str) -> String {
    let host = host.trim();
    let without_port = match host.rsplit_once(':') {
        Some((name, port))
            if !port.is_empty()
                && port.bytes().all(|b| b.is_ascii_digit())
                && (!name.contains(':') || name.ends_with(']')) =>
        {
            name
        }
        _ => host,
    };
    without_port.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_rule_is_case_insensitive_and_ignores_port() {
        let rule = DomainPattern::parse("Admin.Example.com").unwrap();
        assert!(rule.matches(Some("admin.example.com")));
        assert!(rule.matches(Some("ADMIN.EXAMPLE.COM:8080")));
        assert!(!rule.matches(Some("example.com")));
        assert!(!rule.matches(None));
    }

    #[test]
    fn suffix_rule_matches_subdomains_and_bare_domain() {
        let rule = DomainPattern::parse("*.example.com").unwrap();
        assert!(rule.matches(Some("api.example.com")));
        assert!(rule.matches(Some("www.api.example.com")));
        assert!(rule.matches(Some("example.com")));
        assert!(!rule.matches(Some("badexample.com")));
    }

    #[test]
    fn any_rule_matches_without_host() {
        let rule = DomainPattern::parse("*").unwrap();
        assert!(rule.matches(None));
        assert!(rule.matches(Some("whatever.test")));
    }

    #[test]
    fn custom_rule_sees_normalized_host() {
        let rule = DomainPattern::custom("tenant", |host| host.starts_with("tenant-"));
        assert!(rule.matches(Some("Tenant-42.example.com:443")));
        assert!(!rule.matches(Some("admin.example.com")));
        assert_eq!(rule.to_string(), "custom(tenant)");
    }

    #[test]
    fn malformed_rules_are_rejected() {
        assert!(DomainPattern::parse("").is_err());
        assert!(DomainPattern::parse("*.").is_err());
        assert!(DomainPattern::parse("example.com/admin").is_err());
    }

    #[test]
    fn ipv6_literal_keeps_address() {
        assert_eq!(normalize_host("[::1]:8080"), "[::1]");
        assert_eq!(normalize_host("[::1]"), "[::1]");
    }
}
