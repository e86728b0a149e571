//! Shared application state.

use std::sync::Arc;

use crate::auth::AuthGate;
use crate::cache::CacheService;
use crate::config::Config;
use crate::inference::InferenceService;

/// Shared application state passed to all handlers.
pub struct AppState {
    pub config: Config,
    pub cache: Arc<CacheService>,
    pub auth: Arc<AuthGate>,
    pub inference: Arc<InferenceService>,
}

impl AppState {
    pub fn new(
        config: Config,
        cache: Arc<CacheService>,
        auth: Arc<AuthGate>,
        inference: Arc<InferenceService>,
    ) -> Self {
        Self {
            config,
            cache,
            auth,
            inference,
        }
    }
}
