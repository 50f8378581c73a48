//! Admission guards.
//!
//! A guard either enriches the context and advances, or fails with a
//! descriptive value. Guards never write the response.

use std::sync::Arc;

use crate::hubs::keys::RESOLVED_HUB;
use crate::pipeline::{Failure, HandlerFuture, Next, NormalHandler, RequestContext, ResponseSink};
use crate::store::{HubId, HubStore};

/// The hub named by `:id` must exist. Attaches it under [`RESOLVED_HUB`].
pub struct RequireHub {
    store: Arc<dyn HubStore>,
}

impl RequireHub {
    pub fn new(store: Arc<dyn HubStore>) -> Self {
        Self { store }
    }
}

impl NormalHandler for RequireHub {
    fn run<'a>(
        &'a self,
        req: &'a mut RequestContext,
        _res: &'a mut ResponseSink,
    ) -> HandlerFuture<'a> {
        Box::pin(async move {
            // A non-numeric id can never name a stored hub.
            let Some(id) = req.param("id").and_then(|raw| raw.parse::<HubId>().ok()) else {
                return Next::Fail(Failure::not_found("hub not found"));
            };

            match self.store.find_by_id(id).await {
                Ok(Some(hub)) => {
                    req.attach(RESOLVED_HUB, hub);
                    Next::Advance
                }
                Ok(None) => Next::Fail(Failure::not_found("hub not found")),
                Err(e) => Next::Fail(Failure::collaborator("error retrieving the hub", e)),
            }
        })
    }
}

/// The request must carry a non-empty JSON object body.
pub struct RequireBody;

impl NormalHandler for RequireBody {
    fn run<'a>(
        &'a self,
        req: &'a mut RequestContext,
        _res: &'a mut ResponseSink,
    ) -> HandlerFuture<'a> {
        Box::pin(async move {
            match &req.body {
                Some(body) if !body.is_empty() => Next::Advance,
                _ => Next::Fail(Failure::validation("body required")),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use axum::http::Method;
    use serde_json::json;

    fn request(id: &str) -> RequestContext {
        let mut req = RequestContext::new(Method::GET, format!("/hubs/{id}"));
        req.params.insert("id".into(), id.into());
        req
    }

    #[tokio::test]
    async fn test_require_hub_attaches() {
        let guard = RequireHub::new(Arc::new(MemoryStore::with_hubs(["acme"])));
        let (mut res, _rx) = ResponseSink::channel();
        let mut req = request("1");

        assert_eq!(guard.run(&mut req, &mut res).await, Next::Advance);
        assert_eq!(req.attachment(RESOLVED_HUB).map(|h| h.name.as_str()), Some("acme"));
        assert!(!res.is_written());
    }

    #[tokio::test]
    async fn test_require_hub_absent_or_malformed() {
        let guard = RequireHub::new(Arc::new(MemoryStore::with_hubs(["acme"])));
        let (mut res, _rx) = ResponseSink::channel();

        for id in ["999", "abc"] {
            let mut req = request(id);
            assert_eq!(
                guard.run(&mut req, &mut res).await,
                Next::Fail(Failure::not_found("hub not found"))
            );
            assert!(req.attachment(RESOLVED_HUB).is_none());
        }
    }

    #[tokio::test]
    async fn test_require_hub_store_error() {
        let store = Arc::new(MemoryStore::with_hubs(["acme"]));
        store.set_unavailable(true);
        let guard = RequireHub::new(store);
        let (mut res, _rx) = ResponseSink::channel();

        let next = guard.run(&mut request("1"), &mut res).await;
        assert!(matches!(next, Next::Fail(Failure::Collaborator { .. })));
    }

    #[tokio::test]
    async fn test_require_body() {
        let (mut res, _rx) = ResponseSink::channel();
        let body = json!({ "name": "Acme" }).as_object().cloned();

        let mut req = RequestContext::new(Method::POST, "/hubs").with_body(body);
        assert_eq!(RequireBody.run(&mut req, &mut res).await, Next::Advance);

        let expected = Next::Fail(Failure::validation("body required"));
        let mut req = RequestContext::new(Method::POST, "/hubs");
        assert_eq!(RequireBody.run(&mut req, &mut res).await, expected);

        let mut req =
            RequestContext::new(Method::POST, "/hubs").with_body(Some(Default::default()));
        assert_eq!(RequireBody.run(&mut req, &mut res).await, expected);
    }
}
