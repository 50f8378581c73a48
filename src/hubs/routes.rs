//! Route declarations for the hubs API.
//!
//! ```text
//! GET    /                  list (sortby, sortdir, limit, page)
//! GET    /:id               RequireHub → show
//! POST   /                  RequireBody → create
//! DELETE /:id               remove (count based)
//! PUT    /:id               RequireBody → update
//! GET    /:id/messages      RequireHub → list messages
//! POST   /:id/messages      RequireHub → RequireBody → add message
//! ```

use std::sync::Arc;

use axum::http::StatusCode;

use crate::config::ApiConfig;
use crate::hubs::guards::{RequireBody, RequireHub};
use crate::hubs::handlers::{
    access_log, api_status, AddMessage, CreateHub, FailureStatus, ListHubs, ListMessages,
    RemoveHub, ShowHub, UpdateHub,
};
use crate::pipeline::{Chain, NormalHandler};
use crate::routing::Router;
use crate::store::HubStore;

/// The hubs resource, relative to its mount point.
pub fn hubs_router(store: Arc<dyn HubStore>, api: &ApiConfig) -> Router {
    let created = StatusCode::from_u16(api.message_created_status).unwrap_or_else(|_| {
        tracing::warn!(
            status = api.message_created_status,
            "Invalid message_created_status, using 201"
        );
        StatusCode::CREATED
    });

    let require_hub: Arc<dyn NormalHandler> = Arc::new(RequireHub::new(store.clone()));

    Router::new()
        .get("/", Chain::new().then(ListHubs::new(store.clone())))
        .get(
            "/:id",
            Chain::new().then_arc(require_hub.clone()).then(ShowHub),
        )
        .post(
            "/",
            Chain::new()
                .then(RequireBody)
                .then(CreateHub::new(store.clone())),
        )
        .delete("/:id", Chain::new().then(RemoveHub::new(store.clone())))
        .put(
            "/:id",
            Chain::new()
                .then(RequireBody)
                .then(UpdateHub::new(store.clone())),
        )
        .get(
            "/:id/messages",
            Chain::new()
                .then_arc(require_hub.clone())
                .then(ListMessages::new(store.clone())),
        )
        .post(
            "/:id/messages",
            Chain::new()
                .then_arc(require_hub)
                .then(RequireBody)
                .then(AddMessage::new(store, created)),
        )
}

/// The whole application: access log, status endpoint, and the hubs API
/// mounted under `api.mount_path`.
pub fn app_router(store: Arc<dyn HubStore>, api: &ApiConfig) -> Router {
    let router = Router::new()
        .middleware("/", access_log)
        .get("/", Chain::new().then(api_status))
        .mount(&api.mount_path, hubs_router(store, api));

    if api.classify_failures {
        router.error_handler("/", FailureStatus)
    } else {
        router
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn test_app_layout() {
        let table = app_router(Arc::new(MemoryStore::new()), &ApiConfig::default())
            .build()
            .unwrap();
        assert_eq!(
            table.describe(),
            vec![
                "USE /",
                "GET /",
                "GET /hubs",
                "GET /hubs/:id",
                "POST /hubs",
                "DELETE /hubs/:id",
                "PUT /hubs/:id",
                "GET /hubs/:id/messages",
                "POST /hubs/:id/messages",
            ]
        );
    }

    #[test]
    fn test_classification_appends_root_error_handler() {
        let api = ApiConfig {
            classify_failures: true,
            mount_path: "/api/hubs".into(),
            ..ApiConfig::default()
        };
        let table = app_router(Arc::new(MemoryStore::new()), &api).build().unwrap();
        let described = table.describe();
        assert_eq!(described.last().map(String::as_str), Some("ERR /"));
        assert!(described.contains(&"GET /api/hubs/:id".to_string()));
    }
}
