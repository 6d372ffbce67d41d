//! Error taxonomy for registration and request time.
//!
//! Registration problems surface as [`ConfigError`] while the router is being
//! built and never at request time. Request-time failures are either routing
//! failures ([`RouteError`]), lookups of handlers or middleware by key
//! ([`LookupError`]), or failures raised by a handler or middleware body,
//! which are carried unmodified inside [`DispatchError::Handler`].
use thiserror::Error;

/// Registration-time configuration errors. All of them are fatal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    /// Template could not be compiled into a matcher
    #[error("Invalid route template \"{template}\": {reason}")]
    InvalidTemplate { template: String, reason: String },

    /// A route referenced a group that was never declared
    #[error("Group not declared: {0}")]
    UnknownGroup(String),

    /// A route was registered under a method with no bucket
    #[error("Method not allowed for registration: {0}")]
    UnknownMethod(String),

    /// The same (method, template) pair was registered twice
    #[error("Route already registered: {method} /{template}")]
    DuplicateRoute { method: String, template: String },

    /// The same group name was declared twice
    #[error("Group already declared: {0}")]
    DuplicateGroup(String),

    /// A handler reference string could not be parsed
    #[error("Invalid handler reference \"{0}\"")]
    InvalidHandlerReference(String),
}

/// Client-facing routing failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RouteError {
    /// Requested method has no bucket and is not the wildcard method
    #[error("Method Not Allowed {method}")]
    MethodNotAllowed { method: String },

    /// Neither the method bucket nor the wildcard bucket matched the path
    #[error("Not Found: {method} /{path}")]
    NotFound { method: String, path: String },
}

impl RouteError {
    /// HTTP status an adapter should answer with
    pub fn status_code(&self) -> http::StatusCode {
        match self {
            RouteError::MethodNotAllowed { .. } => http::StatusCode::METHOD_NOT_ALLOWED,
            RouteError::NotFound { .. } => http::StatusCode::NOT_FOUND,
        }
    }
}

/// Failures reported by the service locator.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum LookupError {
    #[error("Service not found: {0}")]
    NotFound(String),

    #[error("Failed to construct service '{key}': {source}")]
    Construction {
        key: String,
        #[source]
        source: eyre::Report,
    },
}

/// Everything that can end a dispatch without a response.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum DispatchError {
    #[error(transparent)]
    Route(#[from] RouteError),

    #[error(transparent)]
    Lookup(#[from] LookupError),

    /// Raised by a handler or middleware body; never translated here
    #[error(transparent)]
    Handler(#[from] eyre::Report),
}

/// Result type for registration calls
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for a dispatch
pub type DispatchResult<T> = Result<T, DispatchError>;
