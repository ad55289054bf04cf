//! Dispatcher core: handler references, the per-invocation [`Call`], and the single
//! resolution attempt that turns a [`HandlerRef`] into something callable.

use std::cell::Cell;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use super::controller::ControllerRegistry;
use crate::error::RouterError;
use crate::request::ResolvedRequest;
use crate::router::Params;

/// What every handler returns. The `Ok` value carries no control-flow meaning.
pub type HandlerResult = anyhow::Result<()>;

/// Type-erased handler closure.
pub type HandlerFn = dyn Fn(&Call) -> HandlerResult + Send + Sync;

/// Separator between namespace segments and between a type and a static method.
pub const NAMESPACE_SEPARATOR: &str = "::";

/// Everything a handler gets to see for one invocation.
pub struct Call {
    params: Params,
    request: Arc<ResolvedRequest>,
    matched_other_method: bool,
    not_found_requested: Cell<bool>,
}

impl Call {
    pub(crate) fn new(params: Params, request: Arc<ResolvedRequest>) -> Self {
        Call {
            params,
            request,
            matched_other_method: false,
            not_found_requested: Cell::new(false),
        }
    }

    pub(crate) fn for_fallback(
        params: Params,
        request: Arc<ResolvedRequest>,
        matched_other_method: bool,
    ) -> Self {
        Call {
            matched_other_method,
            ..Call::new(params, request)
        }
    }

    /// Positional parameters in extraction order.
    #[must_use]
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Shorthand for `params().get(index)`.
    #[must_use]
    pub fn param(&self, index: usize) -> Option<&str> {
        self.params.get(index)
    }

    /// Shorthand for `params().named(name)`.
    #[must_use]
    pub fn named(&self, name: &str) -> Option<&str> {
        self.params.named(name)
    }

    /// The resolved request being routed.
    #[must_use]
    pub fn request(&self) -> &ResolvedRequest {
        &self.request
    }

    /// Inside a not-found handler: `true` when an after-route for a different method
    /// matches the same path and host, i.e. the answer is "method not allowed".
    #[must_use]
    pub fn matched_other_method(&self) -> bool {
        self.matched_other_method
    }

    /// Ask the engine to walk the not-found chain once this handler returns.
    ///
    /// Ignored when called from a not-found handler.
    pub fn trigger_not_found(&self) {
        self.not_found_requested.set(true);
    }

    pub(crate) fn not_found_requested(&self) -> bool {
        self.not_found_requested.get()
    }
}

impl fmt::Debug for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Call")
            .field("method", &self.request.method)
            .field("path", &self.request.path)
            .field("params", &self.params)
            .field("matched_other_method", &self.matched_other_method)
            .finish()
    }
}

/// Controller method named by a `Type@method` or `Type::method` string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerTarget {
    /// Type name, `::`-separated. A leading `::` marks it as fully qualified.
    pub type_name: String,
    /// Method name looked up on the type.
    pub method: String,
    /// `Type::method`: only a static method satisfies the reference.
    /// `Type@method`: the method is called as declared.
    pub is_static: bool,
}

impl ControllerTarget {
    /// Parse `Type@method` or `Type::method`. Legacy `\` separators are read as `::`.
    ///
    /// # Errors
    ///
    /// [`RouterError::InvalidHandler`] when either half is empty or no separator is present.
    pub fn parse(reference: &str) -> Result<Self, RouterError> {
        let normalized = reference.trim().replace('\\', NAMESPACE_SEPARATOR);
        let invalid = || RouterError::InvalidHandler(reference.to_string());

        let (type_name, method, is_static) = match normalized.rsplit_once('@') {
            Some((t, m)) => (t, m, false),
            None => {
                let (t, m) = normalized.rsplit_once(NAMESPACE_SEPARATOR).ok_or_else(invalid)?;
                (t, m, true)
            }
        };
        if method.is_empty() || type_name.trim_start_matches(':').is_empty() {
            return Err(invalid());
        }
        Ok(ControllerTarget {
            type_name: type_name.to_string(),
            method: method.to_string(),
            is_static,
        })
    }

    /// Whether the type name starts with the namespace separator.
    #[must_use]
    pub fn is_fully_qualified(&self) -> bool {
        self.type_name.starts_with(NAMESPACE_SEPARATOR)
    }

    /// Prefix `namespace` onto a relative type name. Fully qualified names are kept.
    #[must_use]
    pub fn qualified(mut self, namespace: &str) -> Self {
        if !namespace.is_empty() && !self.is_fully_qualified() {
            self.type_name = format!("{namespace}{NAMESPACE_SEPARATOR}{}", self.type_name);
        }
        self
    }

    /// Type name as looked up in the registry: leading separator removed.
    #[must_use]
    pub fn lookup_name(&self) -> &str {
        self.type_name
            .strip_prefix(NAMESPACE_SEPARATOR)
            .unwrap_or(&self.type_name)
    }
}

impl fmt::Display for ControllerTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sep = if self.is_static { NAMESPACE_SEPARATOR } else { "@" };
        write!(f, "{}{sep}{}", self.type_name, self.method)
    }
}

/// A handler as registered: either directly callable or a named controller method.
#[derive(Clone)]
pub enum HandlerRef {
    Closure(Arc<HandlerFn>),
    Controller(ControllerTarget),
    /// A controller string that could not be parsed. Never resolves.
    Invalid(String),
}

impl HandlerRef {
    /// Parse a controller reference string.
    ///
    /// # Errors
    ///
    /// See [`ControllerTarget::parse`].
    pub fn controller(reference: &str) -> Result<Self, RouterError> {
        ControllerTarget::parse(reference).map(HandlerRef::Controller)
    }

    /// Apply the registration-time namespace rule.
    #[must_use]
    pub(crate) fn qualified(self, namespace: &str) -> Self {
        match self {
            HandlerRef::Controller(target) => HandlerRef::Controller(target.qualified(namespace)),
            other => other,
        }
    }

    /// Short description used in logs and route listings.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            HandlerRef::Closure(_) => "<closure>".to_string(),
            HandlerRef::Controller(target) => target.to_string(),
            HandlerRef::Invalid(raw) => format!("<invalid {raw}>"),
        }
    }
}

impl fmt::Debug for HandlerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HandlerRef({})", self.describe())
    }
}

impl<F> From<F> for HandlerRef
where
    F: Fn(&Call) -> HandlerResult + Send + Sync + 'static,
{
    fn from(f: F) -> Self {
        HandlerRef::Closure(Arc::new(f))
    }
}

impl From<&str> for HandlerRef {
    fn from(reference: &str) -> Self {
        HandlerRef::controller(reference).unwrap_or_else(|_| HandlerRef::Invalid(reference.to_string()))
    }
}

impl From<String> for HandlerRef {
    fn from(reference: String) -> Self {
        HandlerRef::from(reference.as_str())
    }
}

/// Wrap a closure as a [`HandlerRef`], fixing its argument type for inference.
///
/// ```rust,ignore
/// builder.get("/hello/{name}", handler(|call| {
///     println!("hello {}", call.param(0).unwrap_or("world"));
///     Ok(())
/// }))?;
/// ```
pub fn handler<F>(f: F) -> HandlerRef
where
    F: Fn(&Call) -> HandlerResult + Send + Sync + 'static,
{
    HandlerRef::Closure(Arc::new(f))
}

/// Outcome of one dispatch attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Dispatch {
    Invoked,
    /// The controller type or method is not registered; behaves as "no match".
    Unresolved,
}

/// Resolve `handler` once and, when it resolves, invoke it.
///
/// A handler error is returned as [`RouterError::Handler`] tagged with `route`.
pub(crate) fn dispatch(
    handler: &HandlerRef,
    controllers: &ControllerRegistry,
    call: &Call,
    route: &str,
) -> Result<Dispatch, RouterError> {
    let result = match handler {
        HandlerRef::Closure(f) => f(call),
        HandlerRef::Controller(target) => match controllers.resolve(target) {
            Some(invoker) => invoker(call),
            None => {
                debug!(
                    route = %route,
                    handler = %target,
                    "Controller not registered, treating route as unmatched"
                );
                return Ok(Dispatch::Unresolved);
            }
        },
        HandlerRef::Invalid(raw) => {
            debug!(route = %route, handler = %raw, "Unparseable handler reference skipped");
            return Ok(Dispatch::Unresolved);
        }
    };
    result
        .map(|()| Dispatch::Invoked)
        .map_err(|source| RouterError::handler(route, source))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instance_and_static_forms_parse() {
        let at = ControllerTarget::parse("Users@show").unwrap();
        assert_eq!((at.type_name.as_str(), at.method.as_str(), at.is_static), ("Users", "show", false));

        let st = ControllerTarget::parse("App::Users::list").unwrap();
        assert_eq!((st.type_name.as_str(), st.method.as_str(), st.is_static), ("App::Users", "list", true));
    }

    #[test]
    fn backslash_separators_are_normalized() {
        let t = ControllerTarget::parse("\\App\\Controllers\\Users@show").unwrap();
        assert_eq!(t.type_name, "::App::Controllers::Users");
        assert!(t.is_fully_qualified());
        assert_eq!(t.lookup_name(), "App::Controllers::Users");
    }

    #[test]
    fn namespace_applies_only_to_relative_names() {
        let relative = ControllerTarget::parse("Users@show").unwrap().qualified("App::Controllers");
        assert_eq!(relative.lookup_name(), "App::Controllers::Users");

        let absolute = ControllerTarget::parse("::Other::Users@show")
            .unwrap()
            .qualified("App::Controllers");
        assert_eq!(absolute.lookup_name(), "Other::Users");
    }

    #[test]
    fn malformed_references_are_rejected() {
        assert!(ControllerTarget::parse("Users").is_err());
        assert!(ControllerTarget::parse("@show").is_err());
        assert!(ControllerTarget::parse("Users@").is_err());
        assert!(matches!(HandlerRef::from("nonsense"), HandlerRef::Invalid(_)));
    }

    #[test]
    fn display_round_trips_the_separator() {
        assert_eq!(ControllerTarget::parse("A::B@c").unwrap().to_string(), "A::B@c");
        assert_eq!(ControllerTarget::parse("A::B::c").unwrap().to_string(), "A::B::c");
    }
}
