//! # Dispatcher Module
//!
//! Turns a matched route's [`HandlerRef`] into exactly one invocation.
//!
//! ## Handler References
//!
//! A handler is either a closure or a controller method named by string:
//!
//! ```rust,ignore
//! use waymark::{handler, ControllerRegistry, RouterBuilder};
//!
//! #[derive(Default)]
//! struct Users;
//!
//! impl Users {
//!     fn show(&self, call: &waymark::Call) -> waymark::HandlerResult {
//!         println!("user {}", call.param(0).unwrap_or("?"));
//!         Ok(())
//!     }
//! }
//!
//! let mut controllers = ControllerRegistry::new();
//! controllers.register::<Users>("App::Controllers::Users").instance("show", Users::show);
//!
//! let mut builder = RouterBuilder::new().with_controllers(controllers);
//! builder.set_namespace("App::Controllers");
//! builder.get("/users/(\\d+)", "Users@show")?;
//! builder.get("/", handler(|_call| Ok(())))?;
//! ```
//!
//! ## Resolution
//!
//! - **Closures** are called with the [`Call`] carrying the positional parameters.
//! - **`Type@method`** calls the method as declared: a static method directly, an
//!   instance method on a fresh `Type::default()`.
//! - **`Type::method`** only resolves static methods.
//!
//! Resolution is a single attempt. When the type or method is not registered the route
//! behaves as if its pattern had not matched, so route lists may name controllers that
//! are not linked into every build.
//!
//! ## Errors
//!
//! A handler's `Err` is wrapped in [`RouterError::Handler`](crate::RouterError::Handler)
//! and ends processing of the request. `Ok(())` never triggers further attempts.

mod controller;
mod core;

pub use controller::{ControllerBuilder, ControllerRegistry};
pub use core::{
    handler, Call, ControllerTarget, HandlerFn, HandlerRef, HandlerResult, NAMESPACE_SEPARATOR,
};
pub(crate) use core::{dispatch, Dispatch};
