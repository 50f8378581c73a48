//! HTTP server setup.
//!
//! # Responsibilities
//! - Build the route table once from config and the store
//! - Create the axum Router whose fallback feeds the dispatcher
//! - Wire up middleware (request ID, tracing, timeout, security headers)
//! - Serve until the shutdown signal fires
//! - Record request metrics

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderName, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde_json::json;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::http::request::{self, UuidRequestId, X_REQUEST_ID};
use crate::hubs::app_router;
use crate::observability::metrics;
use crate::pipeline::{Dispatcher, ResponseSink};
use crate::routing::RouteError;
use crate::security::headers;
use crate::store::HubStore;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid route table: {}", join(.0))]
    Routes(Vec<RouteError>),
}

fn join(errors: &[RouteError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Application state injected into the fallback handler.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Dispatcher,
    pub max_body_size: usize,
}

/// HTTP front end for the dispatch pipeline.
pub struct HttpServer {
    router: Router,
    dispatcher: Dispatcher,
}

impl HttpServer {
    /// Build the route table and the axum router. Fails if any route
    /// declaration is invalid.
    pub fn new(config: &AppConfig, store: Arc<dyn HubStore>) -> Result<Self, ServerError> {
        let table = app_router(store, &config.api)
            .build()
            .map_err(ServerError::Routes)?;
        tracing::info!(
            entries = table.len(),
            mount_path = %config.api.mount_path,
            classify_failures = config.api.classify_failures,
            "Route table ready"
        );

        let dispatcher = Dispatcher::new(table);
        let state = AppState {
            dispatcher: dispatcher.clone(),
            max_body_size: config.security.max_body_size,
        };
        let router = Self::build_router(config, state);
        Ok(Self { router, dispatcher })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &AppConfig, state: AppState) -> Router {
        let request_id = HeaderName::from_static(X_REQUEST_ID);

        let mut router = Router::new().fallback(dispatch_handler).with_state(state);
        if config.security.enable_headers {
            router = headers::apply(router);
        }
        router
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(TraceLayer::new_for_http())
            .layer(PropagateRequestIdLayer::new(request_id.clone()))
            .layer(SetRequestIdLayer::new(request_id, UuidRequestId))
    }

    /// The fully layered router, for in-process tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Serve on `listener` until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Decode the request and hand it to the dispatcher.
///
/// Dispatch runs in its own task so that a client disconnect drops only the
/// receiving end; handlers already running finish and their write is discarded.
async fn dispatch_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let (parts, body) = request.into_parts();

    let mut ctx = match request::decode(parts, body, state.max_body_size).await {
        Ok(ctx) => ctx,
        Err(rejection) => {
            tracing::warn!(method = %method, error = %rejection, "Request rejected");
            metrics::record_request(&method, rejection.status().as_u16(), "none", start);
            return rejection.into_response();
        }
    };

    let (mut sink, reply) = ResponseSink::channel();
    let dispatcher = state.dispatcher;
    tokio::spawn(async move {
        let report = dispatcher.dispatch(&mut ctx, &mut sink).await;
        let status = report.status.map_or(0, |s| s.as_u16());
        let route = report.route.as_deref().unwrap_or("none");
        tracing::debug!(
            request_id = %ctx.request_id,
            route = %route,
            status,
            handlers = ?report.handlers_run,
            fallback = report.used_fallback,
            "Dispatch finished"
        );
        metrics::record_request(&method, status, route, start);
    });

    match reply.await {
        Ok(reply) => reply.into_response(),
        Err(_) => {
            // The dispatch task ended without writing (it panicked).
            tracing::error!("Dispatch task ended without a response");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "message": "internal error" })),
            )
                .into_response()
        }
    }
}
