//! Error taxonomy for route registration and request dispatch.
//!
//! Only two kinds of failure ever reach a caller:
//!
//! - **Registration errors** (`InvalidPattern`, `InvalidHandler`, `InvalidMethod`,
//!   `InvalidDomain`) are returned from the registration verbs, so a broken route
//!   table is detected at startup and never at match time.
//! - **Handler errors** (`Handler`) are raised by user handlers and propagate out of
//!   [`Router::run`](crate::Router::run) untouched apart from being tagged with the
//!   route that produced them.
//!
//! An unmatched request is not an error (it is an [`Outcome`](crate::Outcome)), and a
//! controller reference that cannot be resolved is swallowed by the dispatcher.

use thiserror::Error;

/// Boxed error carried by [`RouterError::Handler`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors produced while building a router or driving a request through it.
#[derive(Debug, Error)]
pub enum RouterError {
    /// The route definition did not compile to a valid regular expression.
    #[error("invalid route pattern '{pattern}': {source}")]
    InvalidPattern {
        /// The fully-qualified pattern that failed to compile
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A handler string was neither `Type@method` nor `Type::method`.
    #[error("invalid handler reference '{0}': expected 'Type@method' or 'Type::method'")]
    InvalidHandler(String),

    /// A method name in a registration call is not a valid HTTP method token.
    #[error("invalid HTTP method '{0}'")]
    InvalidMethod(String),

    /// A domain rule was empty or malformed.
    #[error("invalid domain rule '{0}'")]
    InvalidDomain(String),

    /// A handler returned an error; fatal for the current request.
    #[error("handler for route '{route}' failed: {source}")]
    Handler {
        /// Pattern of the route (or not-found rule) whose handler failed
        route: String,
        #[source]
        source: BoxError,
    },
}

impl RouterError {
    pub(crate) fn handler(route: &str, source: anyhow::Error) -> Self {
        RouterError::Handler {
            route: route.to_string(),
            source: source.into(),
        }
    }

    /// Returns `true` when the error came from user handler code rather than
    /// from route registration.
    #[must_use]
    pub fn is_handler_error(&self) -> bool {
        matches!(self, RouterError::Handler { .. })
    }
}
