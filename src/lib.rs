//! Switchyard - an HTTP request router and middleware dispatch engine.
//!
//! Switchyard maps `(method, path)` pairs to handlers, decodes typed path
//! parameters, and runs each request through a layered middleware chain
//! before the handler sees it. The crate follows a **hexagonal layout**:
//! traits live in `ports`, routing and dispatch logic in `core`, and
//! concrete implementations (service registry, pattern cache, axum glue) in
//! `adapters`.
//!
//! # Features
//! - Exact routes with O(1) lookup and pattern routes tried in registration order
//! - Typed placeholders: `{id:int}`, `{ratio:number}`, `{flag:bool}`, `{slug:string}`
//!   and raw regex fragments such as `{lang:(en|fr)}`
//! - Per-method buckets plus a wildcard bucket (`ANY` by default) as fallback
//! - Groups sharing a path prefix and middleware; one route may join several groups
//! - Six-lane middleware ordering (route/group/global, priority and normal)
//! - Handlers and middleware given as instances or resolved lazily by key
//! - Optional single-shot mode that clears the table after the first match
//! - YAML / JSON / TOML configuration, validation and a small CLI
//! - Structured tracing via `tracing` and metrics via the `metrics` facade
//!
//! # Quick Example
//! ```no_run
//! use std::sync::Arc;
//!
//! use http::Method;
//! use switchyard::{
//!     adapters::{ServiceRegistry, into_axum_router},
//!     core::{Dispatcher, HandlerTarget, Reference, Router},
//! };
//!
//! # fn main() -> eyre::Result<()> {
//! let registry = Arc::new(ServiceRegistry::new());
//! // registry.register_handler("Users", Arc::new(UsersHandler));
//!
//! let mut routes = Router::builder();
//! routes
//!     .add_route(Method::GET, "/users/{id:int}", HandlerTarget::parse("Users::show")?)?
//!     .middleware(Reference::key("Auth"));
//!
//! let dispatcher = Dispatcher::builder(routes.build(), registry).build();
//! let app: axum::Router = into_axum_router(Arc::new(dispatcher));
//! # let _ = app;
//! # Ok(()) }
//! ```
//!
//! # Error Handling
//! Registration fails fast with [`core::ConfigError`]. Dispatch returns
//! [`core::DispatchError`], which keeps routing, lookup and handler failures
//! apart. Handler errors are `eyre::Report`s passed through untouched.
//!
//! # Concurrency
//! A built [`core::Router`] is immutable apart from the single-shot swap,
//! which goes through `arc-swap`. Shared maps in adapters use `scc::HashMap`.
pub mod adapters;
pub mod config;
pub mod core;
pub mod metrics;
pub mod ports;
pub mod tracing_setup;

// Re-export commonly used types for easier access
pub use crate::{
    adapters::{SccPatternCache, ServiceRegistry, into_axum_router},
    config::{RouterConfig, RouterMode, load_config},
    core::{
        ConfigError, DispatchError, Dispatcher, HandlerTarget, MatchedRoute, Next, ParamValue,
        Params, Reference, RouteError, Router, RouterBuilder,
    },
    ports::{Binding, Handler, Middleware, ServiceLocator},
};
