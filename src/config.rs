//! Gateway configuration.

use std::time::Duration;

use config::{Config as ConfigLoader, ConfigError, Environment};
use serde::Deserialize;

/// Main configuration for the gateway.
///
/// Every field maps to an environment variable of the same name in upper
/// case (`AUTH_KEY`, `REDIS_URL`, ...). `AUTH_KEY` is the only required
/// option: the hex-encoded SHA-256 digest of the shared secret.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,

    /// Hex-encoded SHA-256 digest of the caller secret.
    pub auth_key: String,

    // Cache store
    #[serde(default = "default_redis_url")]
    pub redis_url: String,
    #[serde(default = "default_true")]
    pub cache_enabled: bool,
    /// Result cache TTL in seconds.
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl: u64,
    /// Auth decision cache TTL in seconds.
    #[serde(default = "default_auth_cache_ttl")]
    pub auth_cache_ttl: u64,

    // Request bounds
    #[serde(default = "default_max_generation_length")]
    pub max_generation_length: u32,
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,
    #[serde(default = "default_max_temperature")]
    pub max_temperature: f32,
    #[serde(default = "default_max_num_batches")]
    pub max_num_batches: u32,

    // Concurrency and timeouts
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_requests: usize,
    /// Overall per-request budget in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
    /// Per-backend-call timeout in seconds.
    #[serde(default = "default_backend_timeout")]
    pub backend_timeout: u64,

    // Backends, in priority order: local model, then remote providers.
    #[serde(default)]
    pub local_model_url: Option<String>,
    #[serde(default)]
    pub openai_api_key: Option<String>,
    #[serde(default = "default_openai_base_url")]
    pub openai_base_url: String,
    #[serde(default = "default_openai_model")]
    pub openai_model: String,
    #[serde(default)]
    pub openrouter_api_key: Option<String>,
    #[serde(default = "default_openrouter_base_url")]
    pub openrouter_base_url: String,
    #[serde(default = "default_openrouter_model")]
    pub openrouter_model: String,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let config = ConfigLoader::builder()
            .add_source(Environment::default().try_parsing(true))
            .build()?;

        config.try_deserialize()
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl)
    }

    pub fn auth_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.auth_cache_ttl)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    pub fn backend_timeout(&self) -> Duration {
        Duration::from_secs(self.backend_timeout)
    }
}

// Default values
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_redis_url() -> String {
    "redis://localhost:6379/0".to_string()
}
fn default_true() -> bool {
    true
}
fn default_cache_ttl() -> u64 {
    3600
}
fn default_auth_cache_ttl() -> u64 {
    300
}
fn default_max_generation_length() -> u32 {
    512
}
fn default_temperature() -> f32 {
    0.3
}
fn default_max_temperature() -> f32 {
    2.0
}
fn default_max_num_batches() -> u32 {
    8
}
fn default_max_concurrent() -> usize {
    10
}
fn default_request_timeout() -> u64 {
    300
}
fn default_backend_timeout() -> u64 {
    120
}
fn default_openai_base_url() -> String {
    "https://api.openai.com".to_string()
}
fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_openrouter_base_url() -> String {
    "https://openrouter.ai/api".to_string()
}
fn default_openrouter_model() -> String {
    "meta-llama/llama-3.1-8b-instruct".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
