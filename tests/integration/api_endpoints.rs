//! Integration tests for API endpoints
//!
//! These tests verify that:
//! - Registration endpoints return the right status codes
//! - Mutations are pushed to live listeners before the response
//! - The WebSocket feed sends an initial snapshot and later updates
//! - The static dashboard is served when present

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use futures::StreamExt;
use serde_json::{Value, json};
use site_monitor::{
    MonitorEngine,
    api::{ApiConfig, ApiState, router, spawn_api_server},
    config::parse_config,
};
use tokio_tungstenite::tungstenite::Message;
use tower::ServiceExt;

use crate::helpers::*;

fn test_config() -> ApiConfig {
    ApiConfig {
        bind_addr: "127.0.0.1:0".parse().unwrap(), // Random port
        enable_cors: true,
        static_dir: None,
    }
}

fn test_engine() -> MonitorEngine {
    engine_with(Arc::new(ScriptedProber::new()))
}

async fn send(
    engine: &MonitorEngine,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let app = router(ApiState::new(engine.clone()), &test_config());

    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(body) => {
            request = request.header("content-type", "application/json");
            Body::from(body.to_string())
        }
        None => Body::empty(),
    };

    let response = app.oneshot(request.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

    (status, json)
}

#[tokio::test]
async fn test_health_endpoint_returns_ok() {
    let engine = test_engine();

    let (status, json) = send(&engine, "GET", "/api/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert!(json["timestamp"].is_string());
    assert_eq!(json["targets"], 0);
}

#[tokio::test]
async fn test_add_then_list() {
    let engine = test_engine();

    let (status, json) = send(
        &engine,
        "POST",
        "/api/websites",
        Some(json!({ "url": "http://ok.example" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Website added");

    let (status, json) = send(&engine, "GET", "/api/websites", None).await;
    assert_eq!(status, StatusCode::OK);

    let list = json.as_array().unwrap();
    assert_eq!(list.len(), 1);
    let target = &list[0];
    assert_eq!(target["url"], "http://ok.example/");
    assert_eq!(target["status"], "UNKNOWN");
    assert_eq!(target["is_up"], false);
    assert_eq!(target["response_time"], 0);
    assert!(target["last_checked"].is_null());
    assert_eq!(target["uptime_percentage"], 0.0);
    assert_eq!(target["total_checks"], 0);
    assert_eq!(target["avg_response_time"], 0);
    assert!(target["status_history"].as_array().unwrap().is_empty());
    assert!(target["created_at"].is_string());
}

#[tokio::test]
async fn test_duplicate_add_is_bad_request() {
    let engine = test_engine();
    let body = json!({ "url": "http://ok.example/" });

    send(&engine, "POST", "/api/websites", Some(body.clone())).await;
    let (status, json) = send(&engine, "POST", "/api/websites", Some(body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Website already exists");
    assert_eq!(engine.registry().len().await, 1);
}

#[tokio::test]
async fn test_invalid_url_is_bad_request() {
    let engine = test_engine();

    let (status, json) = send(
        &engine,
        "POST",
        "/api/websites",
        Some(json!({ "url": "not-a-url" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].is_string());
    assert!(engine.registry().is_empty().await);
}

#[tokio::test]
async fn test_remove_absent_is_not_found() {
    let engine = test_engine();

    let (status, json) = send(
        &engine,
        "DELETE",
        "/api/websites",
        Some(json!({ "url": "http://missing.example" })),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "Website not found");
}

#[tokio::test]
async fn test_remove_notifies_listeners_before_responding() {
    let engine = test_engine();
    engine.registry().add("http://ok.example/").await;

    let listener = Arc::new(RecordingListener::default());
    engine.subscribe(listener.clone()).await.unwrap();

    let (status, json) = send(
        &engine,
        "DELETE",
        "/api/websites",
        Some(json!({ "url": "http://ok.example" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Website removed");
    assert_eq!(listener.count().await, 2);
    assert!(listener.last().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_seeded_target_is_managed_over_rest() {
    let config = parse_config(r#"{ "targets": ["http://seed.example"] }"#).unwrap();
    let engine = test_engine();
    for url in &config.targets {
        assert!(engine.registry().add(url.clone()).await);
    }

    // The same endpoint is not registered twice
    let (status, _) = send(
        &engine,
        "POST",
        "/api/websites",
        Some(json!({ "url": "http://seed.example" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, json) = send(
        &engine,
        "DELETE",
        "/api/websites",
        Some(json!({ "url": "http://seed.example" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Website removed");
    assert!(engine.registry().is_empty().await);
}

#[tokio::test]
async fn test_static_dashboard_served() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), "<h1>dashboard</h1>").unwrap();
    std::fs::write(dir.path().join("app.js"), "connect();").unwrap();

    let config = ApiConfig {
        static_dir: Some(dir.path().to_path_buf()),
        ..test_config()
    };
    let app = router(ApiState::new(test_engine()), &config);

    let get = |uri: &'static str| {
        let app = app.clone();
        async move {
            let response = app
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            let status = response.status();
            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            (status, bytes)
        }
    };

    let (status, bytes) = get("/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&bytes[..], b"<h1>dashboard</h1>");

    let (status, bytes) = get("/static/app.js").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&bytes[..], b"connect();");

    // Assets live only under /static
    let (status, _) = get("/app.js").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

async fn next_snapshot<S>(ws: &mut S) -> Value
where
    S: futures::Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(2), ws.next())
            .await
            .expect("timed out waiting for snapshot")
            .expect("stream ended")
            .expect("websocket error");

        if let Message::Text(text) = msg {
            return serde_json::from_str(&text).unwrap();
        }
    }
}

#[tokio::test]
async fn test_websocket_initial_sync_and_updates() {
    let engine = test_engine();
    engine.registry().add("http://first.example/").await;

    let addr = spawn_api_server(test_config(), ApiState::new(engine.clone()))
        .await
        .unwrap();

    let (mut ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws"))
        .await
        .unwrap();

    let initial = next_snapshot(&mut ws).await;
    assert_eq!(initial.as_array().unwrap().len(), 1);
    assert_eq!(initial[0]["url"], "http://first.example/");

    let client = reqwest::Client::new();
    let response = client
        .post(format!("http://{addr}/api/websites"))
        .json(&json!({ "url": "http://second.example" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);

    let update = next_snapshot(&mut ws).await;
    let urls: Vec<&str> = update
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["url"].as_str().unwrap())
        .collect();
    assert_eq!(urls, vec!["http://first.example/", "http://second.example/"]);
}

#[tokio::test]
async fn test_websocket_disconnect_unsubscribes() {
    let engine = test_engine();
    let addr = spawn_api_server(test_config(), ApiState::new(engine.clone()))
        .await
        .unwrap();

    let (mut ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws"))
        .await
        .unwrap();
    next_snapshot(&mut ws).await;
    assert_eq!(engine.notifier().listener_count().await, 1);

    ws.close(None).await.unwrap();
    drop(ws);

    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            // Either the handler unsubscribes or the next broadcast drops it
            engine.notify_all().await;
            if engine.notifier().listener_count().await == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("listener should be removed after disconnect");
}
