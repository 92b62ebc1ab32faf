//! HTTP surface tests: health, server-side emits and the long-polling
//! transport.

#![allow(clippy::panic)]

use std::net::SocketAddr;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use tower::ServiceExt;

use snowfleet_relay::api::build_app;
use snowfleet_relay::app_state::AppState;
use snowfleet_relay::config::RelayConfig;

fn test_config() -> RelayConfig {
    RelayConfig {
        poll_wait: Duration::from_millis(200),
        ..RelayConfig::default()
    }
}

async fn spawn_relay() -> (String, AppState) {
    let state = AppState::new(test_config());
    let app = build_app(state.clone());
    let Ok(listener) = tokio::net::TcpListener::bind("127.0.0.1:0").await else {
        panic!("failed to bind test listener");
    };
    let Ok(addr): Result<SocketAddr, _> = listener.local_addr() else {
        panic!("listener has no local address");
    };
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (format!("http://{addr}"), state)
}

async fn body_json(response: axum::response::Response) -> Value {
    let Ok(bytes) = axum::body::to_bytes(response.into_body(), usize::MAX).await else {
        panic!("failed to read body");
    };
    serde_json::from_slice(&bytes).unwrap_or(Value::Null)
}

async fn open_session(client: &reqwest::Client, base: &str) -> String {
    let Ok(response) = client.post(format!("{base}/poll")).send().await else {
        panic!("open session request failed");
    };
    assert_eq!(response.status(), reqwest::StatusCode::CREATED);
    let Ok(body) = response.json::<Value>().await else {
        panic!("open session returned invalid JSON");
    };
    let Some(id) = body["connection_id"].as_str() else {
        panic!("missing connection_id in {body}");
    };
    id.to_string()
}

async fn send_frame(client: &reqwest::Client, base: &str, id: &str, frame: Value) -> reqwest::StatusCode {
    let Ok(response) = client
        .post(format!("{base}/poll/{id}"))
        .body(frame.to_string())
        .send()
        .await
    else {
        panic!("send frame request failed");
    };
    response.status()
}

async fn poll(client: &reqwest::Client, base: &str, id: &str) -> Vec<Value> {
    let Ok(response) = client.get(format!("{base}/poll/{id}")).send().await else {
        panic!("poll request failed");
    };
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let Ok(frames) = response.json::<Vec<Value>>().await else {
        panic!("poll returned invalid JSON");
    };
    frames
}

#[tokio::test]
async fn health_reports_version() {
    let app = build_app(AppState::new(test_config()));
    let Ok(request) = Request::builder().uri("/health").body(Body::empty()) else {
        panic!("invalid request");
    };
    let Ok(response) = app.oneshot(request).await else {
        panic!("router failed");
    };
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn preflight_allows_configured_dashboard_origin() {
    let config = RelayConfig {
        dashboard_origin: Some("http://dashboard.local".to_string()),
        ..test_config()
    };
    let app = build_app(AppState::new(config));
    let Ok(request) = Request::builder()
        .method("OPTIONS")
        .uri("/api/v1/events/property-status")
        .header("origin", "http://dashboard.local")
        .header("access-control-request-method", "POST")
        .body(Body::empty())
    else {
        panic!("invalid request");
    };
    let Ok(response) = app.oneshot(request).await else {
        panic!("router failed");
    };
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("access-control-allow-origin"),
        Some(&axum::http::HeaderValue::from_static("http://dashboard.local"))
    );
}

#[tokio::test]
async fn emit_rejects_malformed_body() {
    let app = build_app(AppState::new(test_config()));
    let Ok(request) = Request::builder()
        .method("POST")
        .uri("/api/v1/events/driver-position")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"driverId":"d1","status":"ON_ROUTE"}"#))
    else {
        panic!("invalid request");
    };
    let Ok(response) = app.oneshot(request).await else {
        panic!("router failed");
    };
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], 1001);
}

#[tokio::test]
async fn emit_with_no_listeners_delivers_to_nobody() {
    let app = build_app(AppState::new(test_config()));
    let Ok(request) = Request::builder()
        .method("POST")
        .uri("/api/v1/events/property-status")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"propertyId":"p1","status":"CLEARED"}"#))
    else {
        panic!("invalid request");
    };
    let Ok(response) = app.oneshot(request).await else {
        panic!("router failed");
    };
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let body = body_json(response).await;
    assert_eq!(body["delivered"], 0);
}

#[tokio::test]
async fn polling_session_receives_room_scoped_events() {
    let (base, state) = spawn_relay().await;
    let client = reqwest::Client::new();

    let dashboard = open_session(&client, &base).await;
    let bystander = open_session(&client, &base).await;

    let status = send_frame(
        &client,
        &base,
        &dashboard,
        json!({ "event": "join-room", "data": "dashboard" }),
    )
    .await;
    assert_eq!(status, reqwest::StatusCode::NO_CONTENT);
    assert_eq!(state.relay.stats().await.rooms.get("dashboard"), Some(&1));

    let Ok(emitted) = client
        .post(format!("{base}/api/v1/events/driver-position"))
        .json(&json!({ "driverId": "d1", "latitude": 40.71, "longitude": -74.0, "status": "ON_ROUTE" }))
        .send()
        .await
    else {
        panic!("emit request failed");
    };
    assert_eq!(emitted.status(), reqwest::StatusCode::ACCEPTED);

    let frames = poll(&client, &base, &dashboard).await;
    let [frame] = frames.as_slice() else {
        panic!("expected exactly one frame, got {frames:?}");
    };
    assert_eq!(frame["event"], "driver-position");
    assert_eq!(frame["data"]["driverId"], "d1");

    // nothing queued for the bystander: the poll waits and comes back empty
    assert!(poll(&client, &base, &bystander).await.is_empty());
}

#[tokio::test]
async fn polling_session_can_publish_to_everyone() {
    let (base, _state) = spawn_relay().await;
    let client = reqwest::Client::new();

    let sender = open_session(&client, &base).await;
    let receiver = open_session(&client, &base).await;

    let status = send_frame(
        &client,
        &base,
        &sender,
        json!({ "event": "property-status-update", "data": { "propertyId": "p1", "status": "CLEARED" } }),
    )
    .await;
    assert_eq!(status, reqwest::StatusCode::NO_CONTENT);

    for id in [&sender, &receiver] {
        let frames = poll(&client, &base, id).await;
        let [frame] = frames.as_slice() else {
            panic!("expected exactly one frame, got {frames:?}");
        };
        assert_eq!(frame["event"], "property-status");
        assert_eq!(frame["data"]["status"], "CLEARED");
    }
}

#[tokio::test]
async fn malformed_poll_frame_is_accepted_silently() {
    let (base, _state) = spawn_relay().await;
    let client = reqwest::Client::new();
    let id = open_session(&client, &base).await;

    let Ok(response) = client
        .post(format!("{base}/poll/{id}"))
        .body("{{{")
        .send()
        .await
    else {
        panic!("send request failed");
    };
    assert_eq!(response.status(), reqwest::StatusCode::NO_CONTENT);
    assert!(poll(&client, &base, &id).await.is_empty());
}

#[tokio::test]
async fn closed_session_is_gone() {
    let (base, state) = spawn_relay().await;
    let client = reqwest::Client::new();
    let id = open_session(&client, &base).await;
    assert_eq!(state.relay.stats().await.connections, 1);

    for _ in 0..2 {
        let Ok(response) = client.delete(format!("{base}/poll/{id}")).send().await else {
            panic!("delete request failed");
        };
        assert_eq!(response.status(), reqwest::StatusCode::NO_CONTENT);
    }
    assert_eq!(state.relay.stats().await.connections, 0);

    let Ok(response) = client.get(format!("{base}/poll/{id}")).send().await else {
        panic!("poll request failed");
    };
    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_session_id_is_bad_request() {
    let (base, _state) = spawn_relay().await;
    let client = reqwest::Client::new();
    let Ok(response) = client.get(format!("{base}/poll/not-a-uuid")).send().await else {
        panic!("poll request failed");
    };
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn stats_reflect_rooms() {
    let (base, _state) = spawn_relay().await;
    let client = reqwest::Client::new();
    let id = open_session(&client, &base).await;
    let _ = send_frame(
        &client,
        &base,
        &id,
        json!({ "event": "join-room", "data": { "room": "dashboard" } }),
    )
    .await;

    let Ok(response) = client.get(format!("{base}/api/v1/relay/stats")).send().await else {
        panic!("stats request failed");
    };
    let Ok(stats) = response.json::<Value>().await else {
        panic!("stats returned invalid JSON");
    };
    assert_eq!(stats["connections"], 1);
    assert_eq!(stats["rooms"]["dashboard"], 1);
}
