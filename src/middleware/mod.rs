mod core;
mod metrics;
mod tracing;

pub use self::core::Middleware;
pub use self::metrics::{MetricsMiddleware, MetricsSnapshot};
pub use self::tracing::TracingMiddleware;
