//! # Scope Builder
//!
//! Registration-time composition of the three scope dimensions:
//!
//! | Dimension | Effect on a registered route |
//! |---|---|
//! | prefix | concatenated in front of the pattern |
//! | namespace | prefixed onto relative `Type@method` / `Type::method` handler names |
//! | domain | restricts the route to requests for a matching host |
//!
//! A [`Scope`] is a plain value. Nested blocks get a derived copy through a child
//! [`Registrar`], so leaving a block restores the enclosing scope without any shared
//! mutable state:
//!
//! ```rust,ignore
//! builder.mount("/movies", |movies| {
//!     movies.get("/", handler(list))?;               // -> /movies
//!     movies.mount("/(\\d+)", |movie| {
//!         movie.get("/photos", handler(photos))?;    // -> /movies/(\d+)/photos
//!         Ok(())
//!     })?;
//!     Ok(())
//! })?;
//! builder.get("/", handler(home))?;                  // prefix is back to ""
//! ```
//!
//! Everything is resolved when the verb is called: the route table only ever sees
//! fully-qualified patterns and handler references.

use http::Method;
use std::sync::Arc;
use tracing::{debug, info};

use crate::dispatcher::{ControllerRegistry, HandlerRef, NAMESPACE_SEPARATOR};
use crate::domain::DomainPattern;
use crate::error::RouterError;
use crate::middleware::Middleware;
use crate::pattern::CompiledPattern;
use crate::router::{NotFoundRule, Route, RouteKind, RouteTable, Router};
use crate::runtime_config::RouterConfig;

/// Methods registered by `all`.
pub const ALL_METHODS: [Method; 7] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::OPTIONS,
    Method::PATCH,
    Method::HEAD,
];

/// Prefix, namespace and domain in effect for a block of registrations.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    prefix: String,
    namespace: String,
    domain: Option<DomainPattern>,
}

impl Scope {
    /// The empty scope: no prefix, no namespace, any host.
    #[must_use]
    pub fn root() -> Self {
        Self::default()
    }

    /// Accumulated path prefix, empty at the root.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Controller namespace prepended to relative controller names.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Host rule for routes registered in this scope.
    #[must_use]
    pub fn domain(&self) -> Option<&DomainPattern> {
        self.domain.as_ref()
    }

    /// Child scope whose prefix is this prefix followed by `prefix`.
    #[must_use]
    pub fn with_prefix(&self, prefix: &str) -> Self {
        Scope {
            prefix: format!("{}{prefix}", self.prefix),
            ..self.clone()
        }
    }

    /// Child scope with a nested namespace. A namespace starting with the separator
    /// (or `\`) replaces the current one instead of nesting under it.
    #[must_use]
    pub fn with_namespace(&self, namespace: &str) -> Self {
        let normalized = namespace.trim().replace('\\', NAMESPACE_SEPARATOR);
        let absolute = normalized.starts_with(NAMESPACE_SEPARATOR);
        let segment = normalized.trim_matches(':');

        let namespace = if absolute || self.namespace.is_empty() {
            segment.to_string()
        } else if segment.is_empty() {
            self.namespace.clone()
        } else {
            format!("{}{NAMESPACE_SEPARATOR}{segment}", self.namespace)
        };
        Scope {
            namespace,
            ..self.clone()
        }
    }

    /// Child scope restricted to `domain`. Replaces any enclosing domain.
    #[must_use]
    pub fn with_domain(&self, domain: DomainPattern) -> Self {
        Scope {
            domain: Some(domain),
            ..self.clone()
        }
    }

    /// Final pattern for a definition registered in this scope:
    /// `prefix + "/" + trim(pattern, "/")`, right-trimmed of `/` when a prefix is set.
    #[must_use]
    pub fn qualify_pattern(&self, pattern: &str) -> String {
        let joined = format!("{}/{}", self.prefix, pattern.trim_matches('/'));
        if self.prefix.is_empty() {
            joined
        } else {
            joined.trim_end_matches('/').to_string()
        }
    }

    /// Apply this scope's namespace to a controller reference.
    #[must_use]
    pub fn qualify_handler(&self, handler: HandlerRef) -> HandlerRef {
        handler.qualified(&self.namespace)
    }
}

/// Parse a `|`-delimited method list such as `GET|POST`.
///
/// # Errors
///
/// [`RouterError::InvalidMethod`] for an empty list or an invalid token.
pub fn parse_methods(methods: &str) -> Result<Vec<Method>, RouterError> {
    let parsed = methods
        .split('|')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(|m| {
            Method::from_bytes(m.to_ascii_uppercase().as_bytes())
                .map_err(|_| RouterError::InvalidMethod(m.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    if parsed.is_empty() {
        return Err(RouterError::InvalidMethod(methods.to_string()));
    }
    Ok(parsed)
}

/// Registers routes into a [`RouteTable`] under one [`Scope`].
///
/// Obtained from [`RouterBuilder::registrar`] or from a parent registrar's
/// [`mount`](Registrar::mount), [`group`](Registrar::group), [`prefix`](Registrar::prefix),
/// [`namespace`](Registrar::namespace) and [`domain`](Registrar::domain).
pub struct Registrar<'a> {
    table: &'a mut RouteTable,
    scope: Scope,
}

macro_rules! verb_shorthands {
    ($($(#[$doc:meta])* $name:ident => $method:expr;)*) => {
        $(
            $(#[$doc])*
            ///
            /// # Errors
            ///
            /// See [`Registrar::add`].
            pub fn $name(
                &mut self,
                pattern: &str,
                handler: impl Into<HandlerRef>,
            ) -> Result<&mut Self, RouterError> {
                self.add(RouteKind::After, &[$method], pattern, handler.into())
            }
        )*
    };
}

impl<'a> Registrar<'a> {
    /// Registrar writing into `table` under `scope`.
    pub fn new(table: &'a mut RouteTable, scope: Scope) -> Self {
        Registrar { table, scope }
    }

    /// Scope applied to every registration made through this registrar.
    #[must_use]
    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Register `handler` for each of `methods` in the `kind` set.
    ///
    /// # Errors
    ///
    /// [`RouterError::InvalidPattern`] when the qualified pattern does not compile.
    pub fn add(
        &mut self,
        kind: RouteKind,
        methods: &[Method],
        pattern: &str,
        handler: HandlerRef,
    ) -> Result<&mut Self, RouterError> {
        let qualified = self.scope.qualify_pattern(pattern);
        let compiled = CompiledPattern::compile(&qualified)?;
        let handler = self.scope.qualify_handler(handler);
        let registration = self.table.next_registration();

        for method in methods {
            debug!(
                kind = %kind,
                method = %method,
                pattern = %compiled,
                handler = %handler.describe(),
                domain = ?self.scope.domain.as_ref().map(ToString::to_string),
                "Route registered"
            );
            self.table.insert(
                kind,
                Route {
                    registration,
                    method: method.clone(),
                    pattern: compiled.clone(),
                    handler: handler.clone(),
                    domain: self.scope.domain.clone(),
                },
            );
        }
        Ok(self)
    }

    /// Register a terminal route for a `|`-delimited method list.
    ///
    /// # Errors
    ///
    /// [`RouterError::InvalidMethod`] or [`RouterError::InvalidPattern`].
    pub fn match_methods(
        &mut self,
        methods: &str,
        pattern: &str,
        handler: impl Into<HandlerRef>,
    ) -> Result<&mut Self, RouterError> {
        let methods = parse_methods(methods)?;
        self.add(RouteKind::After, &methods, pattern, handler.into())
    }

    /// Register a before-route (middleware) for a `|`-delimited method list.
    ///
    /// # Errors
    ///
    /// [`RouterError::InvalidMethod`] or [`RouterError::InvalidPattern`].
    pub fn before(
        &mut self,
        methods: &str,
        pattern: &str,
        handler: impl Into<HandlerRef>,
    ) -> Result<&mut Self, RouterError> {
        let methods = parse_methods(methods)?;
        self.add(RouteKind::Before, &methods, pattern, handler.into())
    }

    /// Register a terminal route for every method in [`ALL_METHODS`].
    ///
    /// # Errors
    ///
    /// See [`Registrar::add`].
    pub fn all(
        &mut self,
        pattern: &str,
        handler: impl Into<HandlerRef>,
    ) -> Result<&mut Self, RouterError> {
        self.add(RouteKind::After, &ALL_METHODS, pattern, handler.into())
    }

    verb_shorthands! {
        /// Register a `GET` route.
        get => Method::GET;
        /// Register a `POST` route.
        post => Method::POST;
        /// Register a `PUT` route.
        put => Method::PUT;
        /// Register a `PATCH` route.
        patch => Method::PATCH;
        /// Register a `DELETE` route.
        delete => Method::DELETE;
        /// Register an `OPTIONS` route.
        options => Method::OPTIONS;
        /// Register a `HEAD` route. `HEAD` requests try these before falling back to
        /// the `GET` routes.
        head => Method::HEAD;
    }

    /// Fallback for every unmatched request in this scope's domain (or everywhere when
    /// no domain is set). The most recent call wins.
    pub fn set_404(&mut self, handler: impl Into<HandlerRef>) -> &mut Self {
        let handler = self.scope.qualify_handler(handler.into());
        debug!(
            handler = %handler.describe(),
            domain = ?self.scope.domain.as_ref().map(ToString::to_string),
            "Not-found handler registered"
        );
        self.table.set_not_found(NotFoundRule {
            pattern: None,
            domain: self.scope.domain.clone(),
            handler,
        });
        self
    }

    /// Fallback for unmatched requests whose path matches `pattern` (qualified with the
    /// current prefix). The handler receives the pattern's parameters.
    ///
    /// # Errors
    ///
    /// [`RouterError::InvalidPattern`] when the qualified pattern does not compile.
    pub fn set_404_for(
        &mut self,
        pattern: &str,
        handler: impl Into<HandlerRef>,
    ) -> Result<&mut Self, RouterError> {
        let compiled = CompiledPattern::compile(&self.scope.qualify_pattern(pattern))?;
        let handler = self.scope.qualify_handler(handler.into());
        debug!(
            pattern = %compiled,
            handler = %handler.describe(),
            "Scoped not-found handler registered"
        );
        self.table.set_not_found(NotFoundRule {
            pattern: Some(compiled),
            domain: self.scope.domain.clone(),
            handler,
        });
        Ok(self)
    }

    /// Child registrar whose prefix extends this one.
    pub fn prefix(&mut self, prefix: &str) -> Registrar<'_> {
        let scope = self.scope.with_prefix(prefix);
        Registrar::new(&mut *self.table, scope)
    }

    /// Child registrar with a nested controller namespace.
    pub fn namespace(&mut self, namespace: &str) -> Registrar<'_> {
        let scope = self.scope.with_namespace(namespace);
        Registrar::new(&mut *self.table, scope)
    }

    /// Child registrar restricted to a host rule (see [`DomainPattern::parse`]).
    ///
    /// # Errors
    ///
    /// [`RouterError::InvalidDomain`] for a malformed rule.
    pub fn domain(&mut self, rule: &str) -> Result<Registrar<'_>, RouterError> {
        let domain = DomainPattern::parse(rule)?;
        Ok(self.domain_pattern(domain))
    }

    /// Child registrar restricted to an already-built host rule.
    pub fn domain_pattern(&mut self, domain: DomainPattern) -> Registrar<'_> {
        let scope = self.scope.with_domain(domain);
        Registrar::new(&mut *self.table, scope)
    }

    /// Run `block` against a registrar with this registrar's scope.
    ///
    /// # Errors
    ///
    /// Whatever `block` returns.
    pub fn group<F>(&mut self, block: F) -> Result<&mut Self, RouterError>
    where
        F: FnOnce(&mut Registrar<'_>) -> Result<(), RouterError>,
    {
        let mut child = Registrar::new(&mut *self.table, self.scope.clone());
        block(&mut child)?;
        Ok(self)
    }

    /// Run `block` with `prefix` appended to the current prefix.
    ///
    /// # Errors
    ///
    /// Whatever `block` returns.
    pub fn mount<F>(&mut self, prefix: &str, block: F) -> Result<&mut Self, RouterError>
    where
        F: FnOnce(&mut Registrar<'_>) -> Result<(), RouterError>,
    {
        let mut child = self.prefix(prefix);
        block(&mut child)?;
        Ok(self)
    }
}

/// Collects routes, controllers and settings, then freezes them into a [`Router`].
///
/// The builder's own verbs register at the root scope (plus the default namespace set
/// through [`set_namespace`](RouterBuilder::set_namespace)).
pub struct RouterBuilder {
    table: RouteTable,
    scope: Scope,
    controllers: ControllerRegistry,
    config: RouterConfig,
    middleware: Vec<Arc<dyn Middleware>>,
}

impl Default for RouterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

macro_rules! forward_verbs {
    ($($name:ident),* $(,)?) => {
        $(
            #[doc = concat!("Root-scope [`Registrar::", stringify!($name), "`].")]
            ///
            /// # Errors
            ///
            /// See [`Registrar::add`].
            pub fn $name(
                &mut self,
                pattern: &str,
                handler: impl Into<HandlerRef>,
            ) -> Result<&mut Self, RouterError> {
                self.registrar().$name(pattern, handler)?;
                Ok(self)
            }
        )*
    };
}

impl RouterBuilder {
    /// Empty builder with the default config.
    #[must_use]
    pub fn new() -> Self {
        RouterBuilder {
            table: RouteTable::new(),
            scope: Scope::root(),
            controllers: ControllerRegistry::new(),
            config: RouterConfig::default(),
            middleware: Vec::new(),
        }
    }

    /// Use `config` for request resolution in the built router.
    #[must_use]
    pub fn with_config(mut self, config: RouterConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the controller registry.
    #[must_use]
    pub fn with_controllers(mut self, controllers: ControllerRegistry) -> Self {
        self.controllers = controllers;
        self
    }

    /// Controllers resolved by `Type@method` / `Type::method` handlers.
    pub fn controllers_mut(&mut self) -> &mut ControllerRegistry {
        &mut self.controllers
    }

    /// Attach an observer called around every [`Router::run`].
    pub fn add_middleware(&mut self, middleware: Arc<dyn Middleware>) -> &mut Self {
        self.middleware.push(middleware);
        self
    }

    /// Default namespace for controller references registered afterwards.
    pub fn set_namespace(&mut self, namespace: &str) -> &mut Self {
        self.scope = Scope {
            namespace: String::new(),
            ..self.scope.clone()
        }
        .with_namespace(namespace);
        self
    }

    /// Explicit base path; overrides detection from the script name.
    pub fn set_base_path(&mut self, base_path: impl Into<String>) -> &mut Self {
        self.config.base_path = Some(base_path.into());
        self
    }

    /// Registrar at the builder's root scope.
    pub fn registrar(&mut self) -> Registrar<'_> {
        Registrar::new(&mut self.table, self.scope.clone())
    }

    forward_verbs!(get, post, put, patch, delete, options, head, all);

    /// Root-scope [`Registrar::match_methods`].
    ///
    /// # Errors
    ///
    /// [`RouterError::InvalidMethod`] or [`RouterError::InvalidPattern`].
    pub fn match_methods(
        &mut self,
        methods: &str,
        pattern: &str,
        handler: impl Into<HandlerRef>,
    ) -> Result<&mut Self, RouterError> {
        self.registrar().match_methods(methods, pattern, handler)?;
        Ok(self)
    }

    /// Root-scope [`Registrar::before`].
    ///
    /// # Errors
    ///
    /// [`RouterError::InvalidMethod`] or [`RouterError::InvalidPattern`].
    pub fn before(
        &mut self,
        methods: &str,
        pattern: &str,
        handler: impl Into<HandlerRef>,
    ) -> Result<&mut Self, RouterError> {
        self.registrar().before(methods, pattern, handler)?;
        Ok(self)
    }

    /// Root-scope [`Registrar::mount`].
    ///
    /// # Errors
    ///
    /// Whatever `block` returns.
    pub fn mount<F>(&mut self, prefix: &str, block: F) -> Result<&mut Self, RouterError>
    where
        F: FnOnce(&mut Registrar<'_>) -> Result<(), RouterError>,
    {
        self.registrar().mount(prefix, block)?;
        Ok(self)
    }

    /// Root-scope [`Registrar::group`].
    ///
    /// # Errors
    ///
    /// Whatever `block` returns.
    pub fn group<F>(&mut self, block: F) -> Result<&mut Self, RouterError>
    where
        F: FnOnce(&mut Registrar<'_>) -> Result<(), RouterError>,
    {
        self.registrar().group(block)?;
        Ok(self)
    }

    /// Root-scope [`Registrar::set_404`].
    pub fn set_404(&mut self, handler: impl Into<HandlerRef>) -> &mut Self {
        self.registrar().set_404(handler);
        self
    }

    /// Root-scope [`Registrar::set_404_for`].
    ///
    /// # Errors
    ///
    /// [`RouterError::InvalidPattern`] when the pattern does not compile.
    pub fn set_404_for(
        &mut self,
        pattern: &str,
        handler: impl Into<HandlerRef>,
    ) -> Result<&mut Self, RouterError> {
        self.registrar().set_404_for(pattern, handler)?;
        Ok(self)
    }

    /// Freeze the table. The resulting [`Router`] is immutable and shareable.
    #[must_use]
    pub fn build(self) -> Router {
        info!(
            before_routes = self.table.route_count(RouteKind::Before),
            after_routes = self.table.route_count(RouteKind::After),
            not_found_rules = self.table.not_found_count(),
            controllers = self.controllers.len(),
            base_path = ?self.config.base_path,
            "Routing table loaded"
        );
        Router::from_parts(self.table, self.controllers, self.config, self.middleware)
    }
}
