use async_trait::async_trait;
use axum::body::Body;

use crate::core::{
    dispatcher::Next,
    error::DispatchResult,
    params::Params,
};

/// Request type flowing through the dispatcher
pub type Request = http::Request<Body>;

/// Response type produced by handlers and middleware
pub type Response = http::Response<Body>;

/// What the dispatcher binds to a handler call.
///
/// `operation` is the name fixed at registration (`"Users::show"` binds
/// `show`); handlers exposing several operations match on it explicitly.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Binding {
    pub operation: Option<String>,
    pub params: Params,
}

impl Binding {
    pub fn new(operation: Option<String>, params: Params) -> Self {
        Self { operation, params }
    }
}

/// Handler defines the port for the final request target
#[async_trait]
pub trait Handler: Send + Sync + 'static {
    /// Handle a routed request
    ///
    /// # Arguments
    /// * `request` - The request, augmented with `MatchedRoute` and `Params` extensions
    /// * `binding` - Registration-time operation name and decoded parameters
    ///
    /// # Returns
    /// The response, or an error that propagates unchanged to the caller
    async fn handle(&self, request: Request, binding: Binding) -> eyre::Result<Response>;
}

/// Middleware defines the port for cross-cutting request processing
///
/// A middleware either calls `next.run(request)` to continue the chain or
/// returns its own response, which ends the request without reaching the
/// handler.
#[async_trait]
pub trait Middleware: Send + Sync + 'static {
    async fn process(&self, request: Request, next: Next<'_>) -> DispatchResult<Response>;
}
