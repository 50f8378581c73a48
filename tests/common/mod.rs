//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use hub_pipeline::config::AppConfig;
use hub_pipeline::http::HttpServer;
use hub_pipeline::store::MemoryStore;

pub const SEED: [&str; 5] = ["alpha", "beta", "gamma", "delta", "epsilon"];

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

/// The fully layered router for `config`, backed by `store`.
pub fn app_with(config: &AppConfig, store: Arc<MemoryStore>) -> Router {
    HttpServer::new(config, store).unwrap().router()
}

/// Default config, hubs 1..=5 seeded from [`SEED`].
pub fn seeded_app() -> (Router, Arc<MemoryStore>) {
    seeded_app_with(&AppConfig::default())
}

pub fn seeded_app_with(config: &AppConfig) -> (Router, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::with_hubs(SEED));
    (app_with(config, store.clone()), store)
}

/// Send one request in-process and decode the JSON reply.
pub async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> TestResponse {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();
    send_request(app, request).await
}

pub async fn send_request(app: &Router, request: Request<Body>) -> TestResponse {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    TestResponse {
        status,
        headers,
        body,
    }
}
