//! Inference gateway: authenticates callers, serves repeated requests from
//! a result cache, and routes the rest through a prioritized backend chain.

use std::env;
use std::sync::Arc;

use axum::middleware;
use tokio::net::TcpListener;
use tokio::sync::Semaphore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use oracle_gateway::backend::{
    BackendRegistry, LocalModelBackend, OpenAiBackend, OpenRouterBackend, TextGenerator,
};
use oracle_gateway::cache::{CacheService, KeyValueStore, RedisStore};
use oracle_gateway::inference::{InferenceLimits, InferenceService};
use oracle_gateway::logging::request_logger;
use oracle_gateway::{AppState, AuthGate, Config};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Namespace prefix for every key this gateway writes to the store.
const CACHE_PREFIX: &str = "oracle";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();
    if args.iter().any(|a| a == "--version" || a == "-V") {
        println!("oracle-gateway {}", VERSION);
        return Ok(());
    }

    // Load configuration first so its log level can seed the filter.
    let config = Config::load().map_err(|e| {
        format!(
            "Failed to load configuration: {}. \
             Make sure AUTH_KEY is set to the hex-encoded SHA-256 digest of the caller secret.",
            e
        )
    })?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting oracle-gateway {}", VERSION);

    // Connect the cache store. An unreachable store is not fatal: the
    // gateway runs degraded, every lookup misses.
    let cache = if config.cache_enabled {
        let store: Option<Arc<dyn KeyValueStore>> =
            match RedisStore::connect(&config.redis_url).await {
                Ok(store) => Some(Arc::new(store)),
                Err(e) => {
                    tracing::warn!(error = %e, "cache store unreachable, continuing without cache");
                    None
                }
            };
        Arc::new(CacheService::new(
            store,
            CACHE_PREFIX,
            config.cache_ttl(),
            config.auth_cache_ttl(),
        ))
    } else {
        tracing::info!("Caching disabled by configuration");
        Arc::new(CacheService::disabled())
    };

    // Register backends in priority order: local model, then remote providers.
    let mut backends: Vec<Arc<dyn TextGenerator>> = Vec::new();
    if let Some(ref url) = config.local_model_url {
        backends.push(Arc::new(LocalModelBackend::new(url)));
        tracing::info!("Registered local model backend at {}", url);
    }
    if let Some(ref key) = config.openai_api_key {
        backends.push(Arc::new(OpenAiBackend::new(
            key,
            &config.openai_base_url,
            &config.openai_model,
        )));
        tracing::info!("Registered OpenAI backend, model {}", config.openai_model);
    }
    if let Some(ref key) = config.openrouter_api_key {
        backends.push(Arc::new(OpenRouterBackend::new(
            key,
            &config.openrouter_base_url,
            &config.openrouter_model,
        )));
        tracing::info!("Registered OpenRouter backend, model {}", config.openrouter_model);
    }
    if backends.is_empty() {
        return Err("No generation backends configured. \
             Set LOCAL_MODEL_URL, OPENAI_API_KEY, or OPENROUTER_API_KEY."
            .into());
    }

    let registry = Arc::new(BackendRegistry::new(backends, config.backend_timeout()));
    let auth = Arc::new(AuthGate::new(&config.auth_key, cache.clone())?);
    let slots = Arc::new(Semaphore::new(config.max_concurrent_requests));
    let inference = Arc::new(InferenceService::new(
        auth.clone(),
        cache.clone(),
        registry,
        slots,
        InferenceLimits::from(&config),
    ));

    let state = Arc::new(AppState::new(config.clone(), cache, auth, inference));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = oracle_gateway::routes::router(state)
        .layer(middleware::from_fn(request_logger))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
