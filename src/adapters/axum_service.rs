//! Axum integration.
//!
//! The dispatcher is mounted as the fallback of an `axum::Router`, so every
//! request axum does not route itself goes through switchyard. Dispatch
//! errors become JSON error responses.
use std::sync::Arc;

use axum::{
    Json,
    extract::Request,
    response::{IntoResponse, Response},
};
use http::StatusCode;
use serde_json::json;

use crate::core::{dispatcher::Dispatcher, error::DispatchError};

impl IntoResponse for DispatchError {
    fn into_response(self) -> Response {
        let status = match &self {
            DispatchError::Route(err) => err.status_code(),
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!(error = ?self, "Request failed");
        }
        // Internal failures are not echoed to clients.
        let message = if status.is_server_error() {
            "Internal Server Error".to_string()
        } else {
            self.to_string()
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Dispatch and convert any error into a response.
pub async fn dispatch_response(dispatcher: &Dispatcher, request: Request) -> Response {
    match dispatcher.dispatch(request).await {
        Ok(response) => response,
        Err(err) => err.into_response(),
    }
}

/// Wrap a dispatcher in an axum router that sends every request through it.
pub fn into_axum_router(dispatcher: Arc<Dispatcher>) -> axum::Router {
    axum::Router::new().fallback(move |request: Request| {
        let dispatcher = dispatcher.clone();
        async move { dispatch_response(&dispatcher, request).await }
    })
}
