//! HTTP surface.

pub mod auth;
pub mod cache;
pub mod health;
pub mod inference;

use std::sync::Arc;

use axum::Router;

use crate::state::AppState;

/// Build the full application router.
pub fn router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .merge(inference::router())
        .merge(auth::router())
        .nest("/cache", cache::router());

    Router::new()
        .merge(health::router())
        .nest("/api/v1", api)
        .with_state(state)
}
