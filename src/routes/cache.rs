//! Cache administration endpoints.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::cache::CacheStats;
use crate::error::{Error, Result};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/stats", get(stats))
        .route("/health", get(health))
        .route("/invalidate", post(invalidate))
}

#[derive(Debug, Deserialize)]
struct StatsParams {
    auth_key: String,
}

#[derive(Debug, Serialize)]
struct StatsResponse {
    cache_stats: CacheStats,
}

/// GET /api/v1/cache/stats - store and gateway cache counters.
async fn stats(
    State(state): State<Arc<AppState>>,
    Query(params): Query<StatsParams>,
) -> Result<Json<StatsResponse>> {
    if !state.auth.authenticate(&params.auth_key).await {
        return Err(Error::Unauthenticated);
    }

    Ok(Json(StatsResponse {
        cache_stats: state.cache.stats().await,
    }))
}

/// GET /api/v1/cache/health - live store connectivity. Never fails.
async fn health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    if !state.cache.enabled() {
        return Json(json!({
            "status": "disabled",
            "cache_enabled": false,
            "connected": false,
        }));
    }

    let connected = state.cache.ping().await;
    let stats = state.cache.stats().await;

    Json(json!({
        "status": if connected { "healthy" } else { "unhealthy" },
        "cache_enabled": true,
        "connected": connected,
        "stats": stats,
    }))
}

#[derive(Debug, Deserialize)]
struct InvalidateParams {
    auth_key: String,
    pattern: Option<String>,
}

#[derive(Debug, Serialize)]
struct InvalidateResponse {
    message: String,
    pattern: String,
}

/// POST /api/v1/cache/invalidate - delete entries matching a glob pattern
/// within the gateway's namespace. Defaults to everything.
async fn invalidate(
    State(state): State<Arc<AppState>>,
    Json(params): Json<InvalidateParams>,
) -> Result<Json<InvalidateResponse>> {
    if !state.auth.authenticate(&params.auth_key).await {
        return Err(Error::Unauthenticated);
    }

    let pattern = params.pattern.unwrap_or_else(|| "*".to_string());

    if !state.cache.enabled() {
        return Ok(Json(InvalidateResponse {
            message: "Cache is disabled, nothing to invalidate".to_string(),
            pattern,
        }));
    }

    let deleted = state.cache.invalidate(&pattern).await;

    Ok(Json(InvalidateResponse {
        message: format!("Invalidated {} cache entries", deleted),
        pattern,
    }))
}
