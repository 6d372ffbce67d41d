//! Reusable middleware for the dispatcher.
//!
//! Small stateless building blocks that can be registered globally, on a
//! group, or on a single route. Each one continues the chain and decorates
//! the response on the way back out.
use std::time::Instant;

use async_trait::async_trait;
use http::{HeaderName, HeaderValue};
use uuid::Uuid;

use crate::{
    core::{dispatcher::Next, error::DispatchResult, route::MatchedRoute},
    ports::handler::{Middleware, Request, Response},
};

/// Log start and end of a dispatched request including latency.
#[derive(Debug, Default, Clone, Copy)]
pub struct RequestTiming;

#[async_trait]
impl Middleware for RequestTiming {
    async fn process(&self, request: Request, next: Next<'_>) -> DispatchResult<Response> {
        let start = Instant::now();
        let method = request.method().clone();
        let uri = request.uri().clone();
        let template = request
            .extensions()
            .get::<MatchedRoute>()
            .map(|route| route.template.clone())
            .unwrap_or_default();

        tracing::info!(%method, %uri, template = %template, "Started processing");
        let response = next.run(request).await?;
        tracing::info!(
            %method,
            %uri,
            status = %response.status(),
            elapsed = ?start.elapsed(),
            "Completed"
        );

        Ok(response)
    }
}

/// Add common security hardening headers without overwriting existing ones.
#[derive(Debug, Default, Clone, Copy)]
pub struct SecurityHeaders;

#[async_trait]
impl Middleware for SecurityHeaders {
    async fn process(&self, request: Request, next: Next<'_>) -> DispatchResult<Response> {
        let mut response = next.run(request).await?;
        let headers = response.headers_mut();

        for (name, value) in [
            ("x-content-type-options", "nosniff"),
            ("x-frame-options", "DENY"),
            ("referrer-policy", "strict-origin-when-cross-origin"),
        ] {
            headers
                .entry(HeaderName::from_static(name))
                .or_insert(HeaderValue::from_static(value));
        }

        Ok(response)
    }
}

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Propagate the caller's `x-request-id`, generating one when absent.
#[derive(Debug, Default, Clone, Copy)]
pub struct RequestId;

#[async_trait]
impl Middleware for RequestId {
    async fn process(&self, mut request: Request, next: Next<'_>) -> DispatchResult<Response> {
        let id = match request.headers().get(REQUEST_ID_HEADER) {
            Some(value) => value.clone(),
            None => {
                let generated = HeaderValue::from_str(&Uuid::new_v4().to_string())
                    .map_err(eyre::Report::from)?;
                request.headers_mut().insert(REQUEST_ID_HEADER, generated.clone());
                generated
            }
        };

        let mut response = next.run(request).await?;
        response.headers_mut().insert(REQUEST_ID_HEADER, id);
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use http::Method;

    use super::*;
    use crate::{
        adapters::ServiceRegistry,
        core::{
            dispatcher::Dispatcher,
            route::{HandlerTarget, Reference},
            router::Router,
        },
        ports::handler::{Binding, Handler},
    };

    struct Ok200;

    #[async_trait]
    impl Handler for Ok200 {
        async fn handle(&self, request: Request, _binding: Binding) -> eyre::Result<Response> {
            let seen = request.headers().contains_key("x-request-id");
            Ok(Response::new(Body::from(seen.to_string())))
        }
    }

    fn dispatcher() -> Dispatcher {
        let registry = Arc::new(ServiceRegistry::new());
        registry.register_handler("Ok", Arc::new(Ok200));
        registry.register_middleware("RequestId", Arc::new(RequestId));

        let mut builder = Router::builder();
        builder
            .add_route(Method::GET, "/", HandlerTarget::new(Reference::key("Ok")))
            .unwrap();
        Dispatcher::builder(builder.build(), registry)
            .middleware(Reference::Instance(Arc::new(RequestTiming)))
            .middleware(Reference::Instance(Arc::new(SecurityHeaders)))
            .middleware(Reference::key("RequestId"))
            .build()
    }

    #[tokio::test]
    async fn test_decorations_applied() {
        let request = http::Request::builder()
            .uri("/")
            .body(Body::empty())
            .unwrap();
        let response = dispatcher().dispatch(request).await.unwrap();

        assert_eq!(response.headers()["x-frame-options"], "DENY");
        assert!(response.headers().contains_key("x-request-id"));
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"true");
    }

    #[tokio::test]
    async fn test_request_id_is_echoed() {
        let request = http::Request::builder()
            .uri("/")
            .header("x-request-id", "abc-123")
            .body(Body::empty())
            .unwrap();
        let response = dispatcher().dispatch(request).await.unwrap();
        assert_eq!(response.headers()["x-request-id"], "abc-123");
    }
}
