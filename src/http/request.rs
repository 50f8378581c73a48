//! Request decoding.
//!
//! # Responsibilities
//! - Generate a request ID (UUID v4) when the client sent none
//! - Read the body within the configured limit
//! - Decode it into the JSON object the handlers see
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - Content-Length checked before reading the body
//! - An empty body is "no body", not an error

use std::collections::HashMap;

use axum::body::Body;
use axum::extract::Query;
use axum::http::{header, request::Parts, HeaderValue, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use thiserror::Error;
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

use crate::pipeline::{JsonBody, RequestContext};

pub const X_REQUEST_ID: &str = "x-request-id";

/// Issues a fresh UUID v4 for requests arriving without `X-Request-ID`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Reasons a request is answered before dispatch.
#[derive(Debug, Error)]
pub enum RequestRejection {
    #[error("request body exceeds {limit} bytes")]
    TooLarge { limit: usize },

    #[error("malformed JSON body: {0}")]
    MalformedJson(#[from] serde_json::Error),

    #[error("request body must be a JSON object")]
    NotAnObject,
}

impl RequestRejection {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::MalformedJson(_) | Self::NotAnObject => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for RequestRejection {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "message": self.to_string() }))).into_response()
    }
}

/// Build the dispatch context from the raw request.
pub async fn decode(
    parts: Parts,
    body: Body,
    limit: usize,
) -> Result<RequestContext, RequestRejection> {
    let declared = parts
        .headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());
    if declared.is_some_and(|len| len > limit) {
        return Err(RequestRejection::TooLarge { limit });
    }

    // Streamed bodies without a length only fail here.
    let bytes = axum::body::to_bytes(body, limit)
        .await
        .map_err(|_| RequestRejection::TooLarge { limit })?;
    let body = parse_body(&bytes)?;

    let query = Query::<HashMap<String, String>>::try_from_uri(&parts.uri)
        .map(|Query(q)| q)
        .unwrap_or_default();
    let request_id = parts
        .headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    Ok(RequestContext::new(parts.method, parts.uri.path())
        .with_query(query)
        .with_request_id(request_id)
        .with_body(body)
        .with_headers(parts.headers))
}

fn parse_body(bytes: &[u8]) -> Result<Option<JsonBody>, RequestRejection> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    match serde_json::from_slice::<Value>(bytes)? {
        Value::Object(map) => Ok(Some(map)),
        _ => Err(RequestRejection::NotAnObject),
    }
}
