//! Real-socket tests: startup, serving, and graceful shutdown.

use std::sync::Arc;

use serde_json::{json, Value};

use hub_pipeline::config::AppConfig;
use hub_pipeline::lifecycle;
use hub_pipeline::store::MemoryStore;

mod common;

fn local_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config
}

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_serves_over_tcp_and_shuts_down() {
    let store = Arc::new(MemoryStore::with_hubs(common::SEED));
    let running = lifecycle::start(&local_config(), store).await.unwrap();
    let base = format!("http://{}", running.local_addr);
    let client = client();

    let res = client.get(format!("{base}/hubs/1")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    assert!(res.headers().contains_key("x-request-id"));
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({ "id": 1, "name": "alpha" }));

    let res = client
        .post(format!("{base}/hubs/1/messages"))
        .json(&json!({ "sender": "ann", "text": "over the wire" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 210);

    running.stop().await.unwrap();
    assert!(client.get(format!("{base}/")).send().await.is_err());
}

#[tokio::test]
async fn test_bind_failure_is_reported() {
    let taken = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let mut config = local_config();
    config.listener.bind_address = taken.local_addr().unwrap().to_string();

    let err = lifecycle::start(&config, Arc::new(MemoryStore::new()))
        .await
        .err()
        .unwrap();
    assert!(matches!(err, lifecycle::StartupError::Bind { .. }));
}
