pub mod axum_service;
pub mod middleware;
pub mod pattern_cache;
pub mod service_registry;

/// Re-export commonly used types from adapters
pub use axum_service::{dispatch_response, into_axum_router};
pub use middleware::{RequestId, RequestTiming, SecurityHeaders};
pub use pattern_cache::SccPatternCache;
pub use service_registry::ServiceRegistry;
