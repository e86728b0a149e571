//! Result and auth-decision caching.
//!
//! Caching is an optimization, never a correctness dependency: every store
//! failure is swallowed, logged, and reflected in a degraded flag, and the
//! request proceeds as if the lookup missed.

mod key;
mod memory;
mod redis;
mod store;

pub use key::CacheKey;
pub use memory::MemoryStore;
pub use self::redis::RedisStore;
pub use store::{KeyValueStore, StoreError, StoreInfo};

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{InferenceRequest, InferenceResult};

/// Payload stored under a result key.
#[derive(Debug, Serialize, Deserialize)]
struct CachedResult {
    texts: Vec<String>,
    created_at: DateTime<Utc>,
}

/// Caching state reported by `stats()` and the health endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub enabled: bool,
    pub connected: bool,
    pub hits: u64,
    pub misses: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store: Option<StoreInfo>,
}

/// Cache service holding an explicit handle to the external store.
///
/// `store` is `None` either because caching is disabled by configuration or
/// because the store was unreachable at startup; both cases behave as a
/// permanent miss.
pub struct CacheService {
    store: Option<Arc<dyn KeyValueStore>>,
    enabled: bool,
    prefix: String,
    result_ttl: Duration,
    auth_ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
    degraded: AtomicBool,
}

impl CacheService {
    pub fn new(
        store: Option<Arc<dyn KeyValueStore>>,
        prefix: impl Into<String>,
        result_ttl: Duration,
        auth_ttl: Duration,
    ) -> Self {
        let degraded = store.is_none();
        Self {
            store,
            enabled: true,
            prefix: prefix.into(),
            result_ttl,
            auth_ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            degraded: AtomicBool::new(degraded),
        }
    }

    /// A cache that is off by configuration: every read misses, every write
    /// is a no-op.
    pub fn disabled() -> Self {
        Self {
            store: None,
            enabled: false,
            prefix: "oracle".to_string(),
            result_ttl: Duration::from_secs(0),
            auth_ttl: Duration::from_secs(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            degraded: AtomicBool::new(false),
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Cheap status label from in-memory flags only, for the liveness
    /// endpoint: no store round-trip.
    pub fn status_label(&self) -> &'static str {
        if !self.enabled {
            "disabled"
        } else if self.degraded.load(Ordering::Relaxed) {
            "degraded"
        } else {
            "connected"
        }
    }

    /// Derive the result key for a request under this cache's namespace.
    pub fn key_for(&self, request: &InferenceRequest) -> CacheKey {
        CacheKey::derive(&self.prefix, request)
    }

    /// Look up a cached result. Store failures count as misses.
    pub async fn get_result(&self, key: &CacheKey) -> Option<InferenceResult> {
        let store = self.store.as_ref()?;

        match store.get(key.as_str()).await {
            Ok(Some(raw)) => {
                self.degraded.store(false, Ordering::Relaxed);
                match serde_json::from_str::<CachedResult>(&raw) {
                    Ok(cached) => {
                        self.hits.fetch_add(1, Ordering::Relaxed);
                        tracing::debug!(key = %key, "cache hit");
                        Some(InferenceResult {
                            texts: cached.texts,
                        })
                    }
                    Err(e) => {
                        // Unreadable entry, e.g. written by an incompatible
                        // deployment. Treat as a miss; TTL will reap it.
                        tracing::warn!(key = %key, error = %e, "discarding undecodable cache entry");
                        self.misses.fetch_add(1, Ordering::Relaxed);
                        None
                    }
                }
            }
            Ok(None) => {
                self.degraded.store(false, Ordering::Relaxed);
                self.misses.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(key = %key, "cache miss");
                None
            }
            Err(e) => {
                self.degraded.store(true, Ordering::Relaxed);
                self.misses.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(key = %key, error = %e, "cache read failed, continuing without cache");
                None
            }
        }
    }

    /// Store a result, best-effort. Write failures are logged and swallowed.
    pub async fn put_result(&self, key: &CacheKey, result: &InferenceResult) {
        let Some(store) = self.store.as_ref() else {
            return;
        };

        let payload = CachedResult {
            texts: result.texts.clone(),
            created_at: Utc::now(),
        };
        let raw = match serde_json::to_string(&payload) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "failed to encode cache entry");
                return;
            }
        };

        match store.set_ex(key.as_str(), &raw, self.result_ttl).await {
            Ok(()) => {
                self.degraded.store(false, Ordering::Relaxed);
                tracing::debug!(key = %key, ttl_secs = self.result_ttl.as_secs(), "cached result");
            }
            Err(e) => {
                self.degraded.store(true, Ordering::Relaxed);
                tracing::warn!(key = %key, error = %e, "cache write failed");
            }
        }
    }

    /// Look up a cached auth decision by credential fingerprint.
    pub async fn get_auth(&self, fingerprint: &str) -> Option<bool> {
        let store = self.store.as_ref()?;
        let key = self.auth_key(fingerprint);

        match store.get(&key).await {
            Ok(Some(raw)) => {
                self.degraded.store(false, Ordering::Relaxed);
                Some(raw == "true")
            }
            Ok(None) => {
                self.degraded.store(false, Ordering::Relaxed);
                None
            }
            Err(e) => {
                self.degraded.store(true, Ordering::Relaxed);
                tracing::warn!(error = %e, "auth cache read failed, falling back to direct check");
                None
            }
        }
    }

    /// Store an auth decision, best-effort.
    pub async fn set_auth(&self, fingerprint: &str, valid: bool) {
        let Some(store) = self.store.as_ref() else {
            return;
        };
        let key = self.auth_key(fingerprint);
        let value = if valid { "true" } else { "false" };

        if let Err(e) = store.set_ex(&key, value, self.auth_ttl).await {
            self.degraded.store(true, Ordering::Relaxed);
            tracing::warn!(error = %e, "auth cache write failed");
        }
    }

    /// Delete entries matching a glob pattern within this cache's namespace,
    /// returning the count removed. Returns 0 when the store is unavailable.
    pub async fn invalidate(&self, pattern: &str) -> u64 {
        let Some(store) = self.store.as_ref() else {
            return 0;
        };
        let namespaced = format!("{}:{}", self.prefix, pattern);

        match store.delete_matching(&namespaced).await {
            Ok(count) => {
                tracing::info!(pattern = %namespaced, count, "invalidated cache entries");
                count
            }
            Err(e) => {
                self.degraded.store(true, Ordering::Relaxed);
                tracing::warn!(pattern = %namespaced, error = %e, "cache invalidation failed");
                0
            }
        }
    }

    /// Live connectivity check against the store.
    pub async fn ping(&self) -> bool {
        match self.store.as_ref() {
            Some(store) => store.ping().await.is_ok(),
            None => false,
        }
    }

    /// Usage statistics. Never fails: on store error the stats report a
    /// disconnected store instead.
    pub async fn stats(&self) -> CacheStats {
        let (connected, store_info) = match self.store.as_ref() {
            Some(store) => match store.info().await {
                Ok(info) => (true, Some(info)),
                Err(e) => {
                    tracing::warn!(error = %e, "cache stats unavailable");
                    (false, None)
                }
            },
            None => (false, None),
        };

        CacheStats {
            enabled: self.enabled,
            connected,
            hits: self.hits(),
            misses: self.misses(),
            store: store_info,
        }
    }

    fn auth_key(&self, fingerprint: &str) -> String {
        format!("{}:auth:{}", self.prefix, fingerprint)
    }
}
