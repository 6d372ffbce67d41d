//! Request dispatch: routing, middleware traversal and handler invocation.
//!
//! A dispatch resolves the request against the [`Router`], tags the request
//! with [`MatchedRoute`] and [`Params`] extensions, then walks the
//! [`MiddlewareChain`] through [`Next`]. Each middleware decides whether to
//! continue; the handler runs once the chain is exhausted. Keyed handlers
//! and middleware are resolved through the [`ServiceLocator`] at the moment
//! they are needed, so a middleware that short-circuits never causes later
//! ones to be constructed.
use std::{fmt, sync::Arc, time::Instant};

use tracing::{Instrument, debug, error, warn};
use uuid::Uuid;

use crate::{
    config::models::RouterConfig,
    core::{
        chain::MiddlewareChain,
        error::{ConfigResult, DispatchError, DispatchResult},
        params::Params,
        path_finder::RouteMatch,
        route::{MatchedRoute, MiddlewareLanes, MiddlewareRef},
        router::{Router, RouterBuilder},
    },
    metrics::DispatchTimer,
    ports::{
        handler::{Binding, Middleware, Request, Response},
        service_locator::ServiceLocator,
    },
    tracing_setup::create_dispatch_span,
};

/// Where a dispatch currently is, recorded on its span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchStage {
    Routing,
    Middleware,
    Handling,
    Done,
    Failed,
}

impl DispatchStage {
    pub fn as_str(self) -> &'static str {
        match self {
            DispatchStage::Routing => "routing",
            DispatchStage::Middleware => "middleware",
            DispatchStage::Handling => "handling",
            DispatchStage::Done => "done",
            DispatchStage::Failed => "failed",
        }
    }
}

impl fmt::Display for DispatchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn record_stage(stage: DispatchStage) {
    tracing::Span::current().record("dispatch.stage", stage.as_str());
}

/// Continuation handed to each middleware.
///
/// Calling [`Next::run`] invokes the next middleware, or the handler once
/// none remain. Dropping it without running ends the request with whatever
/// the middleware returns.
pub struct Next<'a> {
    dispatcher: &'a Dispatcher,
    matched: &'a RouteMatch,
    chain: MiddlewareChain<'a>,
}

impl fmt::Debug for Next<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next")
            .field("route", &self.matched.route().template())
            .field("chain", &self.chain)
            .finish()
    }
}

impl<'a> Next<'a> {
    /// Matched route this chain belongs to.
    pub fn matched(&self) -> &RouteMatch {
        self.matched
    }

    pub async fn run(mut self, request: Request) -> DispatchResult<Response> {
        match self.chain.next() {
            Some((lane, reference)) => {
                record_stage(DispatchStage::Middleware);
                let middleware = self.dispatcher.resolve_middleware(reference)?;
                debug!(middleware = reference.label(), ?lane, "Running middleware");
                middleware.process(request, self).await
            }
            None => self.dispatcher.handle(request, self.matched).await,
        }
    }
}

/// Routes requests and drives them through middleware to a handler.
pub struct Dispatcher {
    router: Arc<Router>,
    locator: Arc<dyn ServiceLocator>,
    middleware: MiddlewareLanes,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("router", &self.router)
            .field("middleware", &self.middleware)
            .finish()
    }
}

impl Dispatcher {
    pub fn builder(router: Router, locator: Arc<dyn ServiceLocator>) -> DispatcherBuilder {
        DispatcherBuilder {
            router: Arc::new(router),
            locator,
            middleware: MiddlewareLanes::default(),
        }
    }

    /// Build router and global middleware from a config in one step.
    pub fn from_config(
        config: &RouterConfig,
        locator: Arc<dyn ServiceLocator>,
    ) -> ConfigResult<Self> {
        let (builder, middleware) = RouterBuilder::from_config(config)?;
        Ok(Self {
            router: Arc::new(builder.build()),
            locator,
            middleware,
        })
    }

    pub fn router(&self) -> &Arc<Router> {
        &self.router
    }

    /// Global middleware lanes
    pub fn middleware(&self) -> &MiddlewareLanes {
        &self.middleware
    }

    /// Route `request` and run it to completion.
    ///
    /// Handler and middleware errors propagate unchanged inside
    /// [`DispatchError::Handler`]; routing and lookup failures keep their
    /// own variants.
    pub async fn dispatch(&self, request: Request) -> DispatchResult<Response> {
        let request_id = Uuid::new_v4().to_string();
        let span = create_dispatch_span(
            request.method().as_str(),
            request.uri().path(),
            &request_id,
        );

        async move {
            let start = Instant::now();
            let mut timer = DispatchTimer::new();
            let result = self.dispatch_inner(request).await;

            let outcome = match &result {
                Ok(_) => "ok",
                Err(DispatchError::Route(_)) => "route_error",
                Err(DispatchError::Lookup(_)) => "lookup_error",
                Err(_) => "handler_error",
            };
            timer.finish(outcome);

            let span = tracing::Span::current();
            span.record("duration_ms", start.elapsed().as_millis() as u64);
            match &result {
                Ok(_) => record_stage(DispatchStage::Done),
                Err(DispatchError::Route(err)) => {
                    record_stage(DispatchStage::Failed);
                    debug!(error = %err, "Request not routed");
                }
                Err(err) => {
                    record_stage(DispatchStage::Failed);
                    warn!(error = %err, "Dispatch failed");
                }
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn dispatch_inner(&self, mut request: Request) -> DispatchResult<Response> {
        record_stage(DispatchStage::Routing);
        let matched = self
            .router
            .resolve(request.method(), request.uri().path())?;

        let route = matched.route();
        tracing::Span::current().record("route.template", route.template());
        request.extensions_mut().insert::<MatchedRoute>(route.describe());
        request.extensions_mut().insert::<Params>(matched.params().clone());

        let next = Next {
            dispatcher: self,
            matched: &matched,
            chain: MiddlewareChain::new(route, &self.middleware),
        };
        next.run(request).await
    }

    async fn handle(&self, request: Request, matched: &RouteMatch) -> DispatchResult<Response> {
        record_stage(DispatchStage::Handling);
        let target = matched.route().target();
        let handler = target
            .reference()
            .resolve(|key| self.locator.handler(key))?;

        let binding = Binding::new(
            target.operation().map(str::to_string),
            matched.params().clone(),
        );
        debug!(handler = %target.label(), "Invoking handler");

        handler.handle(request, binding).await.map_err(|err| {
            error!(handler = %target.label(), error = %err, "Handler failed");
            DispatchError::Handler(err)
        })
    }

    fn resolve_middleware(
        &self,
        reference: &MiddlewareRef,
    ) -> DispatchResult<Arc<dyn Middleware>> {
        Ok(reference.resolve(|key| self.locator.middleware(key))?)
    }
}

/// Collects global middleware before the dispatcher is frozen.
pub struct DispatcherBuilder {
    router: Arc<Router>,
    locator: Arc<dyn ServiceLocator>,
    middleware: MiddlewareLanes,
}

impl DispatcherBuilder {
    /// Append global normal middleware.
    pub fn middleware(mut self, middleware: MiddlewareRef) -> Self {
        self.middleware.push_normal(middleware);
        self
    }

    /// Add global priority middleware; the latest addition runs first.
    pub fn priority_middleware(mut self, middleware: MiddlewareRef) -> Self {
        self.middleware.push_priority(middleware);
        self
    }

    pub fn build(self) -> Dispatcher {
        Dispatcher {
            router: self.router,
            locator: self.locator,
            middleware: self.middleware,
        }
    }
}
