//! End-to-end behaviour of the hubs API through the full axum stack.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use serde_json::json;

use hub_pipeline::config::AppConfig;
use hub_pipeline::store::{HubStore, MemoryStore};

mod common;
use common::{app_with, seeded_app, seeded_app_with, send, send_request};

fn classifying() -> AppConfig {
    let mut config = AppConfig::default();
    config.api.classify_failures = true;
    config
}

#[tokio::test]
async fn test_get_existing_hub() {
    let (app, _) = seeded_app();
    let res = send(&app, Method::GET, "/hubs/5", None).await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body, json!({ "id": 5, "name": "epsilon" }));
}

#[tokio::test]
async fn test_encoded_id_is_decoded() {
    let (app, _) = seeded_app();
    let res = send(&app, Method::GET, "/hubs/%35", None).await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["name"], "epsilon");
}

#[tokio::test]
async fn test_missing_hub_falls_back_to_500() {
    let (app, _) = seeded_app();
    let res = send(&app, Method::GET, "/hubs/999", None).await;

    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.body, json!({ "message": "hub not found", "kind": "not_found" }));
}

#[tokio::test]
async fn test_create_without_body_falls_back_to_500() {
    let (app, store) = seeded_app();
    let res = send(&app, Method::POST, "/hubs", None).await;

    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.body["message"], "body required");
    assert_eq!(store.find(&Default::default()).await.unwrap().len(), 5);

    let res = send(&app, Method::POST, "/hubs", Some(json!({}))).await;
    assert_eq!(res.body["message"], "body required");
}

#[tokio::test]
async fn test_create_hub() {
    let (app, _) = seeded_app();
    let res = send(&app, Method::POST, "/hubs", Some(json!({ "name": "Acme" }))).await;

    assert_eq!(res.status, StatusCode::CREATED);
    assert_eq!(res.body, json!({ "id": 6, "name": "Acme" }));

    let res = send(&app, Method::GET, "/hubs/6", None).await;
    assert_eq!(res.body["name"], "Acme");
}

#[tokio::test]
async fn test_delete_is_count_based() {
    let (app, _) = seeded_app();

    let res = send(&app, Method::DELETE, "/hubs/5", None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body, json!({ "message": "The hub has been nuked" }));

    let res = send(&app, Method::DELETE, "/hubs/5", None).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.body, json!({ "message": "The hub could not be found" }));
}

#[tokio::test]
async fn test_nested_messages() {
    let (app, _) = seeded_app();

    let res = send(&app, Method::GET, "/hubs/5/messages", None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body, json!([]));

    let message = json!({ "sender": "ann", "text": "hello" });
    let res = send(&app, Method::POST, "/hubs/5/messages", Some(message)).await;
    assert_eq!(res.status.as_u16(), 210);
    assert_eq!(res.body["hub_id"], 5);
    assert_eq!(res.body["text"], "hello");

    let res = send(&app, Method::GET, "/hubs/5/messages", None).await;
    assert_eq!(res.body.as_array().map(Vec::len), Some(1));

    let res = send(&app, Method::GET, "/hubs/42/messages", None).await;
    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.body["kind"], "not_found");
}

#[tokio::test]
async fn test_message_status_is_configurable() {
    let mut config = AppConfig::default();
    config.api.message_created_status = 201;
    let (app, _) = seeded_app_with(&config);

    let message = json!({ "sender": "ann", "text": "hello" });
    let res = send(&app, Method::POST, "/hubs/1/messages", Some(message)).await;
    assert_eq!(res.status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_list_sorting_and_paging() {
    let (app, _) = seeded_app();

    let res = send(&app, Method::GET, "/hubs", None).await;
    assert_eq!(res.body.as_array().map(Vec::len), Some(5));

    let res = send(&app, Method::GET, "/hubs?sortby=name&sortdir=desc&limit=2", None).await;
    assert_eq!(res.body, json!([{ "id": 3, "name": "gamma" }, { "id": 5, "name": "epsilon" }]));

    let res = send(&app, Method::GET, "/hubs?sortby=name&sortdir=desc&limit=2&page=2", None).await;
    assert_eq!(res.body, json!([{ "id": 4, "name": "delta" }, { "id": 2, "name": "beta" }]));
}

#[tokio::test]
async fn test_update_hub() {
    let (app, _) = seeded_app();

    let res = send(&app, Method::PUT, "/hubs/2", Some(json!({ "name": "bravo" }))).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body, json!({ "id": 2, "name": "bravo" }));

    let res = send(&app, Method::PUT, "/hubs/99", Some(json!({ "name": "x" }))).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);

    let res = send(&app, Method::PUT, "/hubs/2", None).await;
    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.body["message"], "body required");
}

#[tokio::test]
async fn test_classified_failures() {
    let (app, _) = seeded_app_with(&classifying());

    let res = send(&app, Method::GET, "/hubs/999", None).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.body["kind"], "not_found");

    let res = send(&app, Method::POST, "/hubs", None).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["message"], "body required");

    let res = send(&app, Method::GET, "/hubs/1", None).await;
    assert_eq!(res.status, StatusCode::OK);
}

#[tokio::test]
async fn test_store_failure_hides_cause() {
    let (app, store) = seeded_app();
    store.set_unavailable(true);

    let res = send(&app, Method::GET, "/hubs", None).await;
    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        res.body,
        json!({ "message": "error retrieving the hubs", "kind": "collaborator" })
    );

    let res = send(&app, Method::GET, "/hubs/1", None).await;
    assert_eq!(res.body["message"], "error retrieving the hub");
}

#[tokio::test]
async fn test_unmatched_routes() {
    let (app, _) = seeded_app();

    let res = send(&app, Method::GET, "/nope", None).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.body, json!({ "message": "Cannot GET /nope" }));

    let res = send(&app, Method::PATCH, "/hubs/1", None).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.body, json!({ "message": "Cannot PATCH /hubs/1" }));
}

#[tokio::test]
async fn test_api_status_and_custom_mount() {
    let mut config = AppConfig::default();
    config.api.mount_path = "/api/v1/hubs".into();
    let app = app_with(&config, Arc::new(MemoryStore::with_hubs(["solo"])));

    let res = send(&app, Method::GET, "/", None).await;
    assert_eq!(res.body, json!({ "api": "up" }));

    let res = send(&app, Method::GET, "/api/v1/hubs/1", None).await;
    assert_eq!(res.body["name"], "solo");

    let res = send(&app, Method::GET, "/hubs/1", None).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_transport_rejections() {
    let mut config = AppConfig::default();
    config.security.max_body_size = 64;
    let (app, _) = seeded_app_with(&config);

    let malformed = Request::post("/hubs")
        .header("content-type", "application/json")
        .body(Body::from("{\"name\":"))
        .unwrap();
    let res = send_request(&app, malformed).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = send(&app, Method::POST, "/hubs", Some(json!(["not", "an", "object"]))).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let huge = json!({ "name": "x".repeat(200) });
    let res = send(&app, Method::POST, "/hubs", Some(huge)).await;
    assert_eq!(res.status, StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_response_headers() {
    let (app, _) = seeded_app();

    let res = send(&app, Method::GET, "/hubs/1", None).await;
    let id = res.headers["x-request-id"].to_str().unwrap();
    assert!(uuid::Uuid::parse_str(id).is_ok());
    assert_eq!(res.headers["x-content-type-options"], "nosniff");
    assert_eq!(res.headers["x-frame-options"], "SAMEORIGIN");

    let request = Request::get("/hubs/1")
        .header("x-request-id", "trace-me")
        .body(Body::empty())
        .unwrap();
    let res = send_request(&app, request).await;
    assert_eq!(res.headers["x-request-id"], "trace-me");

    let mut config = AppConfig::default();
    config.security.enable_headers = false;
    let (plain, _) = seeded_app_with(&config);
    let res = send(&plain, Method::GET, "/", None).await;
    assert!(res.headers.get("x-frame-options").is_none());
}
