//! Login endpoint.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/login", get(login_query).post(login_body))
}

#[derive(Debug, Deserialize)]
struct LoginParams {
    auth_key: String,
}

#[derive(Debug, Serialize)]
struct LoginResponse {
    authenticated: bool,
}

/// GET /api/v1/login - credential check via query string.
///
/// A bad credential is a `false` answer, not an error.
async fn login_query(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LoginParams>,
) -> Json<LoginResponse> {
    let authenticated = state.auth.authenticate(&params.auth_key).await;
    Json(LoginResponse { authenticated })
}

/// POST /api/v1/login - credential check via JSON body.
async fn login_body(
    State(state): State<Arc<AppState>>,
    Json(params): Json<LoginParams>,
) -> Json<LoginResponse> {
    let authenticated = state.auth.authenticate(&params.auth_key).await;
    Json(LoginResponse { authenticated })
}
