pub mod auth;
pub mod backend;
pub mod cache;
pub mod config;
pub mod error;
pub mod inference;
pub mod logging;
pub mod models;
pub mod routes;
pub mod state;
pub mod test_util;

pub use auth::AuthGate;
pub use backend::{
    BackendRegistry, LocalModelBackend, OpenAiBackend, OpenRouterBackend, TextGenerator,
};
pub use cache::{CacheKey, CacheService, CacheStats, KeyValueStore, MemoryStore, RedisStore};
pub use config::Config;
pub use error::Error;
pub use inference::{InferenceLimits, InferenceService};
pub use models::{GenerationParams, InferenceRequest, InferenceResult};
pub use state::AppState;
