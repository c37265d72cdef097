//! Integration Tests for API Endpoints
//!
//! Tests full request/response cycle for each endpoint.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use boundcache::{api::create_router, AppState, CacheConfig};
use serde_json::{json, Value};
use tower::ServiceExt;

// == Helper Functions ==

fn create_test_app(max_items: usize, max_memory_bytes: usize) -> Router {
    let state = AppState::from_cache_config(
        CacheConfig::new()
            .max_items(max_items)
            .max_memory_bytes(max_memory_bytes),
    )
    .unwrap();
    create_router(state)
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn put_json(app: &Router, key: &str, value: Value) -> axum::response::Response {
    let body = json!({ "key": key, "value": value }).to_string();
    app.clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/set")
                .header("content-type", "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn send(app: &Router, method: &str, uri: &str) -> axum::response::Response {
    app.clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
}

// == SET Endpoint Tests ==

#[tokio::test]
async fn test_set_endpoint_success() {
    let app = create_test_app(100, 1 << 20);

    let response = put_json(&app, "test_key", json!("test_value")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_to_json(response.into_body()).await;
    assert!(json["message"].as_str().unwrap().contains("test_key"));
    assert_eq!(json["updated"], false);
}

#[tokio::test]
async fn test_set_endpoint_overwrite() {
    let app = create_test_app(100, 1 << 20);

    put_json(&app, "k", json!(1)).await;
    let response = put_json(&app, "k", json!({"v": 2})).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_to_json(response.into_body()).await["updated"], true);

    let response = send(&app, "GET", "/get/k").await;
    assert_eq!(body_to_json(response.into_body()).await["value"], json!({"v": 2}));
}

#[tokio::test]
async fn test_set_endpoint_value_too_large() {
    let app = create_test_app(100, 20);

    let response = put_json(&app, "big", json!("this string is too long")).await;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let json = body_to_json(response.into_body()).await;
    assert!(json["error"].as_str().unwrap().contains("too large"));

    let response = send(&app, "GET", "/has/big").await;
    assert_eq!(body_to_json(response.into_body()).await["exists"], false);
}

#[tokio::test]
async fn test_invalid_json_request() {
    let app = create_test_app(100, 1 << 20);

    let response = app
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/set")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"key": "missing_value"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_empty_key_request() {
    let app = create_test_app(100, 1 << 20);

    let response = put_json(&app, "", json!("value")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_to_json(response.into_body()).await;
    assert!(json["error"].as_str().unwrap().contains("empty"));
}

// == GET / HAS Endpoint Tests ==

#[tokio::test]
async fn test_get_endpoint_success() {
    let app = create_test_app(100, 1 << 20);

    let set_response = put_json(&app, "get_key", json!(["a", "b"])).await;
    assert_eq!(set_response.status(), StatusCode::OK);

    let get_response = send(&app, "GET", "/get/get_key").await;
    assert_eq!(get_response.status(), StatusCode::OK);
    let json = body_to_json(get_response.into_body()).await;
    assert_eq!(json["key"], "get_key");
    assert_eq!(json["value"], json!(["a", "b"]));
}

#[tokio::test]
async fn test_get_endpoint_not_found() {
    let app = create_test_app(100, 1 << 20);

    let response = send(&app, "GET", "/get/nonexistent_key").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_has_does_not_refresh_recency() {
    let app = create_test_app(2, 1 << 20);

    put_json(&app, "a", json!(1)).await;
    put_json(&app, "b", json!(2)).await;

    let response = send(&app, "GET", "/has/a").await;
    assert_eq!(body_to_json(response.into_body()).await["exists"], true);

    put_json(&app, "c", json!(3)).await;

    let response = send(&app, "GET", "/has/a").await;
    assert_eq!(body_to_json(response.into_body()).await["exists"], false);
}

// == DELETE / CLEAR Endpoint Tests ==

#[tokio::test]
async fn test_delete_endpoint_success() {
    let app = create_test_app(100, 1 << 20);

    put_json(&app, "delete_key", json!("delete_value")).await;

    let del_response = send(&app, "DELETE", "/del/delete_key").await;
    assert_eq!(del_response.status(), StatusCode::OK);

    let get_response = send(&app, "GET", "/get/delete_key").await;
    assert_eq!(get_response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_endpoint_not_found() {
    let app = create_test_app(100, 1 << 20);

    let response = send(&app, "DELETE", "/del/nonexistent_key").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_clear_endpoint() {
    let app = create_test_app(100, 1 << 20);

    put_json(&app, "a", json!(1)).await;
    put_json(&app, "b", json!(2)).await;

    let response = send(&app, "DELETE", "/clear").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_to_json(response.into_body()).await["removed"], 2);

    let response = send(&app, "GET", "/stats").await;
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["total_entries"], 0);
    assert_eq!(json["memory_usage"], 0);
}

// == STATS Endpoint Tests ==

#[tokio::test]
async fn test_stats_endpoint() {
    let app = create_test_app(100, 1 << 20);

    put_json(&app, "stats_key", json!("stats_value")).await;
    send(&app, "GET", "/get/stats_key").await; // hit
    send(&app, "GET", "/get/nonexistent").await; // miss

    let response = send(&app, "GET", "/stats").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;

    assert_eq!(json["hits"].as_u64().unwrap(), 1);
    assert_eq!(json["misses"].as_u64().unwrap(), 1);
    assert_eq!(json["total_entries"].as_u64().unwrap(), 1);
    // "stats_value" is 11 UTF-16 units
    assert_eq!(json["memory_usage"].as_u64().unwrap(), 22);
    assert_eq!(json["max_items"].as_u64().unwrap(), 100);
    assert!(json.get("hit_rate").is_some());
}

#[tokio::test]
async fn test_eviction_visible_in_stats() {
    let app = create_test_app(3, 1 << 20);

    for key in ["a", "b", "c"] {
        put_json(&app, key, json!(key)).await;
    }
    // Refresh a, so b is the least recently used
    send(&app, "GET", "/get/a").await;
    put_json(&app, "d", json!("d")).await;

    assert_eq!(send(&app, "GET", "/get/b").await.status(), StatusCode::NOT_FOUND);
    for key in ["a", "c", "d"] {
        let uri = format!("/has/{}", key);
        let json = body_to_json(send(&app, "GET", &uri).await.into_body()).await;
        assert_eq!(json["exists"], true, "{} should remain", key);
    }

    let json = body_to_json(send(&app, "GET", "/stats").await.into_body()).await;
    assert_eq!(json["evictions"], 1);
    assert_eq!(json["total_entries"], 3);
}

// == HEALTH Endpoint Tests ==

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_app(100, 1 << 20);

    let response = send(&app, "GET", "/health").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], "healthy");
    assert!(json.get("timestamp").is_some());
}

// == Live Server Test ==

#[tokio::test]
async fn test_live_server_round_trip() {
    let app = create_test_app(10, 1 << 20);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let client = reqwest::Client::new();
    let base = format!("http://{}", addr);

    let response = client
        .put(format!("{}/set", base))
        .json(&json!({"key": "live", "value": {"n": 1}}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);

    let json: Value = client
        .get(format!("{}/get/live", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(json["value"], json!({"n": 1}));

    server.abort();
}
