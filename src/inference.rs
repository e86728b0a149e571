//! Inference orchestration.
//!
//! Top-level entry point for a request: authentication, bounds validation,
//! the cache-aside read, the concurrency bound, generation through the
//! fallback chain, and the best-effort cache write-back.

use std::sync::Arc;

use futures_util::future::try_join_all;
use tokio::sync::Semaphore;
use tokio::time::{timeout_at, Instant};

use crate::auth::AuthGate;
use crate::backend::BackendRegistry;
use crate::cache::CacheService;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::models::{InferenceRequest, InferenceResult};

/// Request bounds and the overall per-request budget.
#[derive(Debug, Clone)]
pub struct InferenceLimits {
    pub max_generation_length: u32,
    pub max_temperature: f32,
    pub max_num_batches: u32,
    pub request_timeout: std::time::Duration,
}

impl From<&Config> for InferenceLimits {
    fn from(config: &Config) -> Self {
        Self {
            max_generation_length: config.max_generation_length,
            max_temperature: config.max_temperature,
            max_num_batches: config.max_num_batches,
            request_timeout: config.request_timeout(),
        }
    }
}

pub struct InferenceService {
    auth: Arc<AuthGate>,
    cache: Arc<CacheService>,
    registry: Arc<BackendRegistry>,
    /// Process-wide bound on in-flight units of generation. Each single
    /// request and each batch unit holds one permit for the duration of its
    /// backend call; auth and cache round-trips are not subject to it.
    slots: Arc<Semaphore>,
    limits: InferenceLimits,
}

impl InferenceService {
    pub fn new(
        auth: Arc<AuthGate>,
        cache: Arc<CacheService>,
        registry: Arc<BackendRegistry>,
        slots: Arc<Semaphore>,
        limits: InferenceLimits,
    ) -> Self {
        Self {
            auth,
            cache,
            registry,
            slots,
            limits,
        }
    }

    /// Single inference: exactly one generated text.
    pub async fn infer(&self, auth_key: &str, request: &InferenceRequest) -> Result<InferenceResult> {
        if request.num_batches != 1 {
            return Err(Error::InvalidRequest(
                "single inference cannot request multiple batches".to_string(),
            ));
        }
        self.execute(auth_key, request).await
    }

    /// Batch inference: `num_batches` independent generations, all-or-nothing.
    pub async fn batch_infer(
        &self,
        auth_key: &str,
        request: &InferenceRequest,
    ) -> Result<InferenceResult> {
        self.execute(auth_key, request).await
    }

    async fn execute(&self, auth_key: &str, request: &InferenceRequest) -> Result<InferenceResult> {
        let deadline = Instant::now() + self.limits.request_timeout;

        if !self.auth.authenticate(auth_key).await {
            return Err(Error::Unauthenticated);
        }

        self.validate(request)?;

        let key = self.cache.key_for(request);
        if let Some(cached) = self.cache.get_result(&key).await {
            return Ok(cached);
        }

        let result = if request.num_batches == 1 {
            InferenceResult::single(self.generate_unit(request, deadline).await?)
        } else {
            // Independent units, each with its own slot and fallback chain.
            // try_join_all keeps results in request order and drops the
            // remaining units as soon as one fails: partial batches are
            // discarded, never returned.
            let units = (0..request.num_batches).map(|_| self.generate_unit(request, deadline));
            let texts = try_join_all(units).await?;
            InferenceResult { texts }
        };

        // Write-back is best-effort: failures are logged inside the cache
        // service and never surface here.
        self.cache.put_result(&key, &result).await;

        Ok(result)
    }

    /// One unit of generation: slot acquisition and the fallback chain, both
    /// bounded by the request deadline.
    async fn generate_unit(&self, request: &InferenceRequest, deadline: Instant) -> Result<String> {
        let _permit = match timeout_at(deadline, Arc::clone(&self.slots).acquire_owned()).await {
            Err(_) => return Err(Error::Overloaded),
            Ok(Err(_)) => return Err(Error::Internal("concurrency limiter closed".to_string())),
            Ok(Ok(permit)) => permit,
        };

        // The permit is held across the backend call and released on every
        // exit path when it drops, including cancellation at the deadline.
        timeout_at(
            deadline,
            self.registry
                .generate(&request.input_context, request.params(), request.backend.as_deref()),
        )
        .await
        .map_err(|_| Error::Timeout)?
    }

    fn validate(&self, request: &InferenceRequest) -> Result<()> {
        if request.max_length == 0 || request.max_length > self.limits.max_generation_length {
            return Err(Error::InvalidRequest(format!(
                "max_length must be between 1 and {}",
                self.limits.max_generation_length
            )));
        }

        if !request.temperature.is_finite()
            || request.temperature < 0.0
            || request.temperature > self.limits.max_temperature
        {
            return Err(Error::InvalidRequest(format!(
                "temperature must be between 0.0 and {}",
                self.limits.max_temperature
            )));
        }

        if request.num_batches == 0 || request.num_batches > self.limits.max_num_batches {
            return Err(Error::InvalidRequest(format!(
                "num_batches must be between 1 and {}",
                self.limits.max_num_batches
            )));
        }

        if let Some(name) = request.backend.as_deref() {
            if !self.registry.contains(name) {
                return Err(Error::InvalidRequest(format!(
                    "unknown backend: {} (available: {})",
                    name,
                    self.registry.names().join(", ")
                )));
            }
        }

        Ok(())
    }
}
