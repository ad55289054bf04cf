//! # Request Context Resolver
//!
//! The transport hands the engine a [`RequestContext`]: plain values, never ambient
//! global state. [`resolve`] turns it into the [`ResolvedRequest`] the matcher works on:
//!
//! - **Method**: `HEAD` resolves to `GET`; the router tries `HEAD` routes first and
//!   then `GET` routes, and the boundary layer drops the body (see
//!   [`ResolvedRequest::suppress_body`]); a `POST` carrying the override header with
//!   `PUT`, `DELETE` or `PATCH` is matched as that method.
//! - **Path**: query string removed, percent-decoded, base path stripped, then
//!   normalised to exactly one leading slash and no trailing slash (`""` becomes `/`).

use http::{HeaderMap, HeaderName, HeaderValue, Method};
use std::borrow::Cow;
use tracing::{debug, warn};

use crate::domain::normalize_host;
use crate::error::RouterError;
use crate::ids::RequestId;
use crate::runtime_config::RouterConfig;

/// Methods a `POST` may be tunnelled as through the override header.
const OVERRIDABLE_METHODS: [Method; 3] = [Method::PUT, Method::DELETE, Method::PATCH];

/// Everything the engine needs to know about one inbound request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Method as received on the wire
    pub method: Method,
    /// Request target including base path and, optionally, the query string
    pub uri: String,
    /// Raw query string when the transport delivers it separately
    pub query: Option<String>,
    /// Host the request was addressed to; falls back to the `Host` header
    pub host: Option<String>,
    /// Parsed request headers
    pub headers: HeaderMap,
    /// Path of the executing entry script, used to auto-detect the base path
    pub script_name: Option<String>,
}

impl RequestContext {
    /// Context for `method` and `uri` with no host, headers or script name.
    pub fn new(method: Method, uri: impl Into<String>) -> Self {
        RequestContext {
            method,
            uri: uri.into(),
            query: None,
            host: None,
            headers: HeaderMap::new(),
            script_name: None,
        }
    }

    /// Build a context from a method name as received from the transport.
    ///
    /// # Errors
    ///
    /// [`RouterError::InvalidMethod`] when `method` is not a valid method token.
    pub fn parse(method: &str, uri: impl Into<String>) -> Result<Self, RouterError> {
        let method = Method::from_bytes(method.as_bytes())
            .map_err(|_| RouterError::InvalidMethod(method.to_string()))?;
        Ok(Self::new(method, uri))
    }

    /// Add a header. Names or values that are not valid HTTP are dropped with a warning.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                self.headers.append(name, value);
            }
            _ => warn!(header = %name, "Dropping invalid request header"),
        }
        self
    }

    /// Set the `Host` value. It takes precedence over a `Host` header.
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Set the query string. It is kept for handlers and never matched.
    #[must_use]
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Front-controller script path used to detect the base path.
    #[must_use]
    pub fn with_script_name(mut self, script_name: impl Into<String>) -> Self {
        self.script_name = Some(script_name.into());
        self
    }

    /// Host from the explicit field, else from the `Host` header.
    #[must_use]
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref().or_else(|| {
            self.headers
                .get(http::header::HOST)
                .and_then(|v| v.to_str().ok())
        })
    }
}

/// A request as seen by the matcher and by handlers.
#[derive(Debug, Clone)]
pub struct ResolvedRequest {
    /// Identifier for log correlation
    pub request_id: RequestId,
    /// Method received on the wire
    pub original_method: Method,
    /// Method used for matching (after HEAD and override handling)
    pub method: Method,
    /// Base-path-stripped, decoded, normalised path
    pub path: String,
    /// Query string without the leading `?`
    pub query: Option<String>,
    /// Lowercased host without port
    pub host: Option<String>,
    /// Request headers
    pub headers: HeaderMap,
}

impl ResolvedRequest {
    /// `true` for `HEAD` requests: handlers ran as for `GET` but the boundary layer
    /// must not emit a body.
    #[must_use]
    pub fn suppress_body(&self) -> bool {
        self.original_method == Method::HEAD
    }

    /// Header lookup (case-insensitive per RFC 7230).
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Resolve a transport-level request into the values the matcher works on.
#[must_use]
pub fn resolve(ctx: &RequestContext, config: &RouterConfig) -> ResolvedRequest {
    let method = effective_method(&ctx.method, &ctx.headers, &config.method_override_header);

    let (raw_path, inline_query) = match ctx.uri.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (ctx.uri.as_str(), None),
    };
    let query = ctx
        .query
        .clone()
        .or_else(|| inline_query.map(str::to_string))
        .filter(|q| !q.is_empty());

    let decoded: Cow<'_, str> = if config.decode_path {
        decode_path(raw_path)
    } else {
        Cow::Borrowed(raw_path)
    };

    let base_path = match &config.base_path {
        Some(explicit) => Cow::Borrowed(explicit.as_str()),
        None => Cow::Owned(detect_base_path(ctx.script_name.as_deref())),
    };
    let path = normalize_path(strip_base_path(&decoded, &base_path));

    let request_id = RequestId::from_header_or_new(
        ctx.headers
            .get("x-request-id")
            .and_then(|v| v.to_str().ok()),
    );

    debug!(
        request_id = %request_id,
        original_method = %ctx.method,
        method = %method,
        uri = %ctx.uri,
        base_path = %base_path,
        path = %path,
        "Request resolved"
    );

    ResolvedRequest {
        request_id,
        original_method: ctx.method.clone(),
        method,
        path,
        query,
        host: ctx.host().map(normalize_host),
        headers: ctx.headers.clone(),
    }
}

/// Method used for matching.
#[must_use]
pub fn effective_method(method: &Method, headers: &HeaderMap, override_header: &str) -> Method {
    if *method == Method::HEAD {
        return Method::GET;
    }
    if *method == Method::POST {
        let requested = headers
            .get(override_header)
            .and_then(|v| v.to_str().ok())
            .map(str::trim);
        if let Some(requested) = requested {
            if let Some(m) = OVERRIDABLE_METHODS
                .iter()
                .find(|m| m.as_str().eq_ignore_ascii_case(requested))
            {
                return m.clone();
            }
        }
    }
    method.clone()
}

/// Base path derived from the entry script: its directory with a trailing slash.
///
/// `/sub/folder/index.php` gives `/sub/folder/`; no script name gives `/`.
#[must_use]
pub fn detect_base_path(script_name: Option<&str>) -> String {
    match script_name.and_then(|s| s.rsplit_once('/')) {
        Some((dir, _)) => format!("{dir}/"),
        None => "/".to_string(),
    }
}

/// Remove `base_path` from the front of `path` when it is a prefix on a segment boundary.
///
/// A path that does not live under the base path is returned unchanged.
#[must_use]
pub fn strip_base_path<'a>(path: &'a str, base_path: &str) -> &'a str {
    let base = base_path.trim_end_matches('/');
    if base.is_empty() {
        return path;
    }
    match path.strip_prefix(base) {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
        _ => path,
    }
}

/// Exactly one leading slash, no trailing slash; empty becomes `/`.
#[must_use]
pub fn normalize_path(path: &str) -> String {
    let trimmed = path.trim_matches('/');
    let mut out = String::with_capacity(trimmed.len() + 1);
    out.push('/');
    out.push_str(trimmed);
    out
}

fn decode_path(raw: &str) -> Cow<'_, str> {
    if !raw.contains('%') {
        return Cow::Borrowed(raw);
    }
    match urlencoding::decode(raw) {
        Ok(decoded) => decoded,
        Err(_) => {
            debug!(path = %raw, "Path is not valid UTF-8 once decoded, matching raw path");
            Cow::Borrowed(raw)
        }
    }
}
