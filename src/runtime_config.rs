//! # Runtime Configuration Module
//!
//! Settings that change how an inbound request is turned into the method and path the
//! matcher sees. None of them affect registration.
//!
//! ## Environment Variables
//!
//! ### `WAYMARK_BASE_PATH`
//!
//! Explicit base path stripped from every request path (e.g. `/app/`). When unset the
//! base path is derived per request from the executing script name, falling back to `/`.
//!
//! ### `WAYMARK_METHOD_OVERRIDE_HEADER`
//!
//! Header consulted on `POST` requests to tunnel `PUT`, `DELETE` or `PATCH`.
//! Default: `X-HTTP-Method-Override`.
//!
//! ### `WAYMARK_DECODE_PATH`
//!
//! Percent-decode the request path before matching. Default: `true`.
//!
//! ### `WAYMARK_SLOW_MATCH_US`
//!
//! Matching slower than this many microseconds is logged at `warn`. Default: `1000`.
//!
//! ## Files
//!
//! [`RouterConfig::load`] accepts `.toml`, `.yaml` and `.yml` files with the same keys:
//!
//! ```toml
//! base_path = "/sub/folder/"
//! method_override_header = "X-HTTP-Method-Override"
//! decode_path = true
//! slow_match_threshold_us = 500
//! ```

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::env;
use std::path::Path;

/// Default header used for method overrides.
pub const DEFAULT_METHOD_OVERRIDE_HEADER: &str = "X-HTTP-Method-Override";

/// Request-resolution settings shared by every request a router handles.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Explicit base path; `None` means auto-detect from the script name.
    pub base_path: Option<String>,
    /// Header carrying the overriding method on `POST` requests.
    pub method_override_header: String,
    /// Percent-decode the path before matching.
    pub decode_path: bool,
    /// Threshold above which a match is reported as slow.
    pub slow_match_threshold_us: u64,
}

impl Default for RouterConfig {
    fn default() -> Self {
        RouterConfig {
            base_path: None,
            method_override_header: DEFAULT_METHOD_OVERRIDE_HEADER.to_string(),
            decode_path: true,
            slow_match_threshold_us: 1000,
        }
    }
}

impl RouterConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = RouterConfig::default();
        RouterConfig {
            base_path: env::var("WAYMARK_BASE_PATH").ok().filter(|s| !s.is_empty()),
            method_override_header: env::var("WAYMARK_METHOD_OVERRIDE_HEADER")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or(defaults.method_override_header),
            decode_path: env::var("WAYMARK_DECODE_PATH")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.decode_path),
            slow_match_threshold_us: env::var("WAYMARK_SLOW_MATCH_US")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.slow_match_threshold_us),
        }
    }

    /// Parse a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).context("failed to parse router config as TOML")
    }

    /// Parse a YAML document.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).context("failed to parse router config as YAML")
    }

    /// Load a config file, choosing the parser from the extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read router config {}", path.display()))?;

        let parsed = match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml_str(&text),
            Some("yaml" | "yml") => Self::from_yaml_str(&text),
            other => bail!(
                "unsupported router config extension {:?} for {}",
                other,
                path.display()
            ),
        };
        parsed.with_context(|| format!("invalid router config {}", path.display()))
    }

    /// Builder-style base path override.
    #[must_use]
    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = Some(base_path.into());
        self
    }
}
