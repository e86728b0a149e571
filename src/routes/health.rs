//! Service liveness and metrics endpoints.
//!
//! Both answer from in-memory state only, so they stay useful exactly when
//! the rest of the system is struggling.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    cache_status: &'static str,
    cache_enabled: bool,
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        cache_status: state.cache.status_label(),
        cache_enabled: state.cache.enabled(),
    })
}

async fn metrics(State(state): State<Arc<AppState>>) -> Response {
    let version = env!("CARGO_PKG_VERSION");
    let body = format!(
        "# HELP oracle_gateway_up Whether the service is up\n\
         # TYPE oracle_gateway_up gauge\n\
         oracle_gateway_up 1\n\
         # HELP oracle_gateway_info Service information\n\
         # TYPE oracle_gateway_info gauge\n\
         oracle_gateway_info{{version=\"{}\"}} 1\n\
         # HELP oracle_gateway_cache_hits_total Result cache hits\n\
         # TYPE oracle_gateway_cache_hits_total counter\n\
         oracle_gateway_cache_hits_total {}\n\
         # HELP oracle_gateway_cache_misses_total Result cache misses\n\
         # TYPE oracle_gateway_cache_misses_total counter\n\
         oracle_gateway_cache_misses_total {}\n",
        version,
        state.cache.hits(),
        state.cache.misses(),
    );

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        body,
    )
        .into_response()
}
