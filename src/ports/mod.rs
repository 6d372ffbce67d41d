pub mod handler;
pub mod pattern_cache;
pub mod service_locator;

pub use handler::{Binding, Handler, Middleware, Request, Response};
pub use pattern_cache::PatternCache;
pub use service_locator::ServiceLocator;
