//! Reply conversion.
//!
//! The pipeline only produces status + JSON pairs; headers such as
//! `X-Request-ID` and the security set are added by tower layers.

use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::pipeline::Reply;

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
