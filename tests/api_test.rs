//! Integration tests for the gateway HTTP API.
//!
//! The full router runs against an in-memory store and scripted backends;
//! requests go through `tower::ServiceExt::oneshot`, no sockets involved.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use bytes::Bytes;
use http::{Method, Request, StatusCode};
use sha2::{Digest, Sha256};
use tokio::sync::Semaphore;
use tower::ServiceExt;

use oracle_gateway::backend::{BackendRegistry, TextGenerator};
use oracle_gateway::cache::{CacheService, MemoryStore};
use oracle_gateway::inference::{InferenceLimits, InferenceService};
use oracle_gateway::test_util::MockBackend;
use oracle_gateway::{routes, AppState, AuthGate, Config};

const SECRET: &str = "test-secret";

fn test_config() -> Config {
    serde_json::from_value(serde_json::json!({
        "auth_key": hex::encode(Sha256::digest(SECRET.as_bytes())),
    }))
    .unwrap()
}

fn app_with(backends: Vec<Arc<dyn TextGenerator>>) -> (axum::Router, Arc<CacheService>) {
    let config = test_config();
    let cache = Arc::new(CacheService::new(
        Some(Arc::new(MemoryStore::new())),
        "oracle",
        config.cache_ttl(),
        config.auth_cache_ttl(),
    ));
    let auth = Arc::new(AuthGate::new(&config.auth_key, cache.clone()).unwrap());
    let registry = Arc::new(BackendRegistry::new(backends, Duration::from_secs(30)));
    let slots = Arc::new(Semaphore::new(config.max_concurrent_requests));
    let inference = Arc::new(InferenceService::new(
        auth.clone(),
        cache.clone(),
        registry,
        slots,
        InferenceLimits::from(&config),
    ));
    let state = Arc::new(AppState::new(config, cache.clone(), auth, inference));

    (routes::router(state), cache)
}

async fn send(
    app: &axum::Router,
    method: Method,
    uri: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header("Content-Type", "application/json");
            Body::from(Bytes::from(serde_json::to_vec(&json).unwrap()))
        }
        None => Body::empty(),
    };

    let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
    };

    (status, json)
}

#[tokio::test]
async fn test_health_reports_cache_state() {
    let (app, _) = app_with(vec![Arc::new(MockBackend::succeeding("local", "t"))]);

    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["cache_status"], "connected");
    assert_eq!(body["cache_enabled"], true);
}

#[tokio::test]
async fn test_inference_requires_valid_auth_key() {
    let backend = Arc::new(MockBackend::succeeding("local", "t"));
    let (app, _) = app_with(vec![backend.clone()]);

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/v1/inference?input_context=test&auth_key=wrong",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["type"], "unauthenticated");
    assert_eq!(backend.calls(), 0);
}

#[tokio::test]
async fn test_inference_end_to_end_second_call_hits_cache() {
    let backend = Arc::new(MockBackend::succeeding("local", "generated T"));
    let (app, _) = app_with(vec![backend.clone()]);

    let uri = format!(
        "/api/v1/inference?input_context=test&auth_key={SECRET}&max_length=50&temperature=0.5"
    );

    let (status, body) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["generated_text"], "generated T");

    let (status, body) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["generated_text"], "generated T");

    // The second call never reached a backend.
    assert_eq!(backend.calls(), 1);
}

#[tokio::test]
async fn test_inference_rejects_out_of_bounds_params() {
    let backend = Arc::new(MockBackend::succeeding("local", "t"));
    let (app, _) = app_with(vec![backend.clone()]);

    let uri = format!("/api/v1/inference?input_context=test&auth_key={SECRET}&temperature=5.0");
    let (status, body) = send(&app, Method::GET, &uri, None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["type"], "invalid_request");
    assert_eq!(backend.calls(), 0);
}

#[tokio::test]
async fn test_inference_fallback_masks_first_backend_failure() {
    let first = Arc::new(MockBackend::failing("local"));
    let second = Arc::new(MockBackend::succeeding("openai", "from fallback"));
    let (app, _) = app_with(vec![first, second]);

    let uri = format!("/api/v1/inference?input_context=test&auth_key={SECRET}");
    let (status, body) = send(&app, Method::GET, &uri, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["generated_text"], "from fallback");
}

#[tokio::test]
async fn test_inference_all_backends_failed() {
    let (app, _) = app_with(vec![
        Arc::new(MockBackend::failing("local")),
        Arc::new(MockBackend::failing("openai")),
    ]);

    let uri = format!("/api/v1/inference?input_context=test&auth_key={SECRET}");
    let (status, body) = send(&app, Method::GET, &uri, None).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["type"], "all_backends_failed");
}

#[tokio::test]
async fn test_batch_inference_returns_requested_count() {
    let backend = Arc::new(MockBackend::succeeding("local", "unit"));
    let (app, _) = app_with(vec![backend]);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/batch_inference",
        Some(serde_json::json!({
            "input_context": "test",
            "auth_key": SECRET,
            "num_batches": 3
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["generated_texts"],
        serde_json::json!(["unit", "unit", "unit"])
    );
}

#[tokio::test]
async fn test_batch_inference_partial_failure_fails_whole_batch() {
    let backend = Arc::new(MockBackend::flaky_after("local", 2));
    let (app, _) = app_with(vec![backend]);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/batch_inference",
        Some(serde_json::json!({
            "input_context": "test",
            "auth_key": SECRET,
            "num_batches": 3
        })),
    )
    .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["type"], "all_backends_failed");
}

#[tokio::test]
async fn test_login_answers_instead_of_erroring() {
    let (app, _) = app_with(vec![Arc::new(MockBackend::succeeding("local", "t"))]);

    let uri = format!("/api/v1/login?auth_key={SECRET}");
    let (status, body) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["authenticated"], true);

    let (status, body) = send(&app, Method::GET, "/api/v1/login?auth_key=bogus", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["authenticated"], false);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/login",
        Some(serde_json::json!({"auth_key": SECRET})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["authenticated"], true);
}

#[tokio::test]
async fn test_cache_stats_requires_auth() {
    let (app, _) = app_with(vec![Arc::new(MockBackend::succeeding("local", "t"))]);

    let (status, _) = send(&app, Method::GET, "/api/v1/cache/stats?auth_key=nope", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let uri = format!("/api/v1/cache/stats?auth_key={SECRET}");
    let (status, body) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cache_stats"]["enabled"], true);
    assert_eq!(body["cache_stats"]["connected"], true);
}

#[tokio::test]
async fn test_cache_health_never_fails() {
    let (app, _) = app_with(vec![Arc::new(MockBackend::succeeding("local", "t"))]);

    let (status, body) = send(&app, Method::GET, "/api/v1/cache/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["connected"], true);
}

#[tokio::test]
async fn test_cache_invalidate_forces_regeneration() {
    let backend = Arc::new(MockBackend::succeeding("local", "t"));
    let (app, _) = app_with(vec![backend.clone()]);

    let uri = format!("/api/v1/inference?input_context=test&auth_key={SECRET}");
    send(&app, Method::GET, &uri, None).await;
    assert_eq!(backend.calls(), 1);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/cache/invalidate",
        Some(serde_json::json!({"auth_key": SECRET, "pattern": "inference:*"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Invalidated 1 cache entries");
    assert_eq!(body["pattern"], "inference:*");

    send(&app, Method::GET, &uri, None).await;
    assert_eq!(backend.calls(), 2);
}

#[tokio::test]
async fn test_metrics_exposes_cache_counters() {
    let backend = Arc::new(MockBackend::succeeding("local", "t"));
    let (app, _) = app_with(vec![backend]);

    let uri = format!("/api/v1/inference?input_context=test&auth_key={SECRET}");
    send(&app, Method::GET, &uri, None).await;
    send(&app, Method::GET, &uri, None).await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("oracle_gateway_up 1"));
    assert!(text.contains("oracle_gateway_cache_hits_total 1"));
    assert!(text.contains("oracle_gateway_cache_misses_total 1"));
}
