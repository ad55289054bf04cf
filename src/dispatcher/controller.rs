//! Controller registry: the lookup table behind `Type@method` and `Type::method`
//! handler strings.
//!
//! Each registered type carries a no-argument factory (its [`Default`] impl) and two
//! method tables. Static methods are invoked without creating an instance; instance
//! methods run against a fresh instance per call.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use tracing::debug;

use super::core::{Call, ControllerTarget, HandlerFn, HandlerResult, NAMESPACE_SEPARATOR};

#[derive(Default)]
struct ControllerEntry {
    instance_methods: HashMap<String, Arc<HandlerFn>>,
    static_methods: HashMap<String, Arc<HandlerFn>>,
}

/// Fully-qualified type name → callable methods.
#[derive(Default)]
pub struct ControllerRegistry {
    types: HashMap<String, ControllerEntry>,
}

impl ControllerRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start registering methods of `T` under `type_name` (e.g. `App::Controllers::Users`).
    ///
    /// Registering the same name again adds to the existing method tables.
    pub fn register<T>(&mut self, type_name: &str) -> ControllerBuilder<'_, T>
    where
        T: Default + Send + Sync + 'static,
    {
        let name = normalize_type_name(type_name);
        debug!(controller = %name, "Controller registered");
        ControllerBuilder {
            entry: self.types.entry(name).or_default(),
            _type: PhantomData,
        }
    }

    /// Whether `type_name` is known.
    #[must_use]
    pub fn contains(&self, type_name: &str) -> bool {
        self.types.contains_key(&normalize_type_name(type_name))
    }

    /// Number of registered controller types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// `true` when no controller type is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Resolve a target to an invoker.
    ///
    /// - `Type::method` matches a static method only.
    /// - `Type@method` prefers a static method and otherwise uses an instance method.
    ///
    /// `None` when the type or a suitable method is not registered.
    #[must_use]
    pub fn resolve(&self, target: &ControllerTarget) -> Option<Arc<HandlerFn>> {
        let entry = self.types.get(target.lookup_name())?;
        let found = entry.static_methods.get(&target.method).or_else(|| {
            if target.is_static {
                None
            } else {
                entry.instance_methods.get(&target.method)
            }
        });
        found.map(Arc::clone)
    }
}

/// Adds methods of one controller type. Returned by [`ControllerRegistry::register`].
pub struct ControllerBuilder<'a, T> {
    entry: &'a mut ControllerEntry,
    _type: PhantomData<fn() -> T>,
}

impl<T> ControllerBuilder<'_, T>
where
    T: Default + Send + Sync + 'static,
{
    /// Method called on `T::default()` for every invocation.
    pub fn instance<F>(self, name: &str, method: F) -> Self
    where
        F: Fn(&T, &Call) -> HandlerResult + Send + Sync + 'static,
    {
        let invoker = move |call: &Call| {
            let target = T::default();
            method(&target, call)
        };
        self.entry
            .instance_methods
            .insert(name.to_string(), Arc::new(invoker));
        self
    }

    /// Associated function; no instance is created.
    pub fn static_method<F>(self, name: &str, method: F) -> Self
    where
        F: Fn(&Call) -> HandlerResult + Send + Sync + 'static,
    {
        self.entry
            .static_methods
            .insert(name.to_string(), Arc::new(method));
        self
    }
}

fn normalize_type_name(type_name: &str) -> String {
    let normalized = type_name.trim().replace('\\', NAMESPACE_SEPARATOR);
    normalized
        .strip_prefix(NAMESPACE_SEPARATOR)
        .map(str::to_string)
        .unwrap_or(normalized)
}
