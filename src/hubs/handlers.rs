//! Terminal handlers and the failure classifier.
//!
//! Store errors never escape: each becomes a `Failure::Collaborator` with a
//! stable message, and the raw cause only reaches the logs.

use std::sync::Arc;

use axum::http::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};

use crate::hubs::keys::RESOLVED_HUB;
use crate::pipeline::{
    ErrorHandler, Failure, HandlerFuture, Next, NormalHandler, RequestContext, ResponseSink,
};
use crate::store::{Hub, HubFilter, HubId, HubPatch, HubStore, NewHub, NewMessage};

/// Write `value` and end the chain. Double writes are reported by the dispatcher.
fn reply<T: Serialize>(res: &mut ResponseSink, status: StatusCode, value: &T) -> Next {
    let _ = res.write_json(status, value);
    Next::Advance
}

fn not_found(res: &mut ResponseSink) -> Next {
    reply(
        res,
        StatusCode::NOT_FOUND,
        &json!({ "message": "The hub could not be found" }),
    )
}

fn decode_body<T: DeserializeOwned>(req: &RequestContext, what: &str) -> Result<T, Failure> {
    let body = req
        .body
        .clone()
        .ok_or_else(|| Failure::validation("body required"))?;
    serde_json::from_value(Value::Object(body))
        .map_err(|e| Failure::validation(format!("invalid {what}: {e}")))
}

fn resolved_hub(req: &RequestContext) -> Result<Hub, Failure> {
    req.attachment(RESOLVED_HUB)
        .cloned()
        .ok_or_else(|| Failure::not_found("hub not found"))
}

fn id_param(req: &RequestContext) -> Option<HubId> {
    req.param("id").and_then(|raw| raw.parse().ok())
}

/// `GET /` on the root router.
pub fn api_status<'a>(
    _req: &'a mut RequestContext,
    res: &'a mut ResponseSink,
) -> HandlerFuture<'a> {
    Box::pin(async move { reply(res, StatusCode::OK, &json!({ "api": "up" })) })
}

/// Global middleware: log the request and advance.
pub fn access_log<'a>(
    req: &'a mut RequestContext,
    _res: &'a mut ResponseSink,
) -> HandlerFuture<'a> {
    Box::pin(async move {
        tracing::info!(
            request_id = %req.request_id,
            method = %req.method,
            path = %req.path,
            "Request received"
        );
        Next::Advance
    })
}

pub struct ListHubs {
    store: Arc<dyn HubStore>,
}

impl ListHubs {
    pub fn new(store: Arc<dyn HubStore>) -> Self {
        Self { store }
    }
}

impl NormalHandler for ListHubs {
    fn run<'a>(
        &'a self,
        req: &'a mut RequestContext,
        res: &'a mut ResponseSink,
    ) -> HandlerFuture<'a> {
        Box::pin(async move {
            let filter = HubFilter::from_query(&req.query);
            match self.store.find(&filter).await {
                Ok(hubs) => reply(res, StatusCode::OK, &hubs),
                Err(e) => Next::Fail(Failure::collaborator("error retrieving the hubs", e)),
            }
        })
    }
}

/// Responds with the hub attached by `RequireHub`.
pub struct ShowHub;

impl NormalHandler for ShowHub {
    fn run<'a>(
        &'a self,
        req: &'a mut RequestContext,
        res: &'a mut ResponseSink,
    ) -> HandlerFuture<'a> {
        Box::pin(async move {
            match resolved_hub(req) {
                Ok(hub) => reply(res, StatusCode::OK, &hub),
                Err(failure) => Next::Fail(failure),
            }
        })
    }
}

pub struct CreateHub {
    store: Arc<dyn HubStore>,
}

impl CreateHub {
    pub fn new(store: Arc<dyn HubStore>) -> Self {
        Self { store }
    }
}

impl NormalHandler for CreateHub {
    fn run<'a>(
        &'a self,
        req: &'a mut RequestContext,
        res: &'a mut ResponseSink,
    ) -> HandlerFuture<'a> {
        Box::pin(async move {
            let new_hub: NewHub = match decode_body(req, "hub") {
                Ok(hub) => hub,
                Err(failure) => return Next::Fail(failure),
            };
            match self.store.add(new_hub).await {
                Ok(hub) => reply(res, StatusCode::CREATED, &hub),
                Err(e) => Next::Fail(Failure::collaborator("error adding the hub", e)),
            }
        })
    }
}

pub struct UpdateHub {
    store: Arc<dyn HubStore>,
}

impl UpdateHub {
    pub fn new(store: Arc<dyn HubStore>) -> Self {
        Self { store }
    }
}

impl NormalHandler for UpdateHub {
    fn run<'a>(
        &'a self,
        req: &'a mut RequestContext,
        res: &'a mut ResponseSink,
    ) -> HandlerFuture<'a> {
        Box::pin(async move {
            let Some(id) = id_param(req) else {
                return not_found(res);
            };
            let patch: HubPatch = match decode_body(req, "hub") {
                Ok(patch) => patch,
                Err(failure) => return Next::Fail(failure),
            };
            match self.store.update(id, patch).await {
                Ok(Some(hub)) => reply(res, StatusCode::OK, &hub),
                Ok(None) => not_found(res),
                Err(e) => Next::Fail(Failure::collaborator("error updating the hub", e)),
            }
        })
    }
}

/// Existence is decided by the removed count, not by a guard.
pub struct RemoveHub {
    store: Arc<dyn HubStore>,
}

impl RemoveHub {
    pub fn new(store: Arc<dyn HubStore>) -> Self {
        Self { store }
    }
}

impl NormalHandler for RemoveHub {
    fn run<'a>(
        &'a self,
        req: &'a mut RequestContext,
        res: &'a mut ResponseSink,
    ) -> HandlerFuture<'a> {
        Box::pin(async move {
            let Some(id) = id_param(req) else {
                return not_found(res);
            };
            match self.store.remove(id).await {
                Ok(0) => not_found(res),
                Ok(_) => reply(
                    res,
                    StatusCode::OK,
                    &json!({ "message": "The hub has been nuked" }),
                ),
                Err(e) => Next::Fail(Failure::collaborator("error removing the hub", e)),
            }
        })
    }
}

pub struct ListMessages {
    store: Arc<dyn HubStore>,
}

impl ListMessages {
    pub fn new(store: Arc<dyn HubStore>) -> Self {
        Self { store }
    }
}

impl NormalHandler for ListMessages {
    fn run<'a>(
        &'a self,
        req: &'a mut RequestContext,
        res: &'a mut ResponseSink,
    ) -> HandlerFuture<'a> {
        Box::pin(async move {
            let hub = match resolved_hub(req) {
                Ok(hub) => hub,
                Err(failure) => return Next::Fail(failure),
            };
            match self.store.find_related(hub.id).await {
                Ok(messages) => reply(res, StatusCode::OK, &messages),
                Err(e) => Next::Fail(Failure::collaborator(
                    "error getting the messages for the hub",
                    e,
                )),
            }
        })
    }
}

/// Nested create. The success status is set per route.
pub struct AddMessage {
    store: Arc<dyn HubStore>,
    created: StatusCode,
}

impl AddMessage {
    pub fn new(store: Arc<dyn HubStore>, created: StatusCode) -> Self {
        Self { store, created }
    }
}

impl NormalHandler for AddMessage {
    fn run<'a>(
        &'a self,
        req: &'a mut RequestContext,
        res: &'a mut ResponseSink,
    ) -> HandlerFuture<'a> {
        Box::pin(async move {
            let hub = match resolved_hub(req) {
                Ok(hub) => hub,
                Err(failure) => return Next::Fail(failure),
            };
            let message: NewMessage = match decode_body(req, "message") {
                Ok(message) => message,
                Err(failure) => return Next::Fail(failure),
            };
            match self.store.add_message(hub.id, message).await {
                Ok(stored) => reply(res, self.created, &stored),
                Err(e) => Next::Fail(Failure::collaborator("error adding the message", e)),
            }
        })
    }
}

/// Error handler mapping failure kinds to distinct status codes.
/// Registered only when `api.classify_failures` is on.
pub struct FailureStatus;

impl FailureStatus {
    pub fn status_for(failure: &Failure) -> StatusCode {
        match failure {
            Failure::NotFound(_) => StatusCode::NOT_FOUND,
            Failure::Validation(_) => StatusCode::BAD_REQUEST,
            Failure::Collaborator { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ErrorHandler for FailureStatus {
    fn handle<'a>(
        &'a self,
        failure: Failure,
        _req: &'a mut RequestContext,
        res: &'a mut ResponseSink,
    ) -> HandlerFuture<'a> {
        Box::pin(async move {
            if let Failure::Collaborator { cause, .. } = &failure {
                tracing::error!(failure = %failure, cause = %cause, "Collaborator failure");
            }
            reply(res, Self::status_for(&failure), &failure.to_body())
        })
    }
}
