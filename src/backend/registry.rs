//! Backend registry and fallback chain.

use std::sync::Arc;
use std::time::Duration;

use super::{BackendError, TextGenerator};
use crate::error::Error;
use crate::models::GenerationParams;

/// Ordered set of generation backends.
///
/// The order is the priority order and is fixed at startup; reads take no
/// lock. One unit of generation walks the chain until a backend succeeds or
/// every backend has failed.
pub struct BackendRegistry {
    backends: Vec<Arc<dyn TextGenerator>>,
    call_timeout: Duration,
}

impl BackendRegistry {
    /// Build the registry from backends in priority order. Each backend call
    /// runs under `call_timeout`, independent of the caller's own deadline,
    /// so a hanging backend cannot starve the rest of the chain.
    pub fn new(backends: Vec<Arc<dyn TextGenerator>>, call_timeout: Duration) -> Self {
        Self {
            backends,
            call_timeout,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.backends.iter().map(|b| b.name()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.backends.iter().any(|b| b.name() == name)
    }

    /// Run one unit of generation through the fallback chain.
    ///
    /// With `pinned` set, only the named backend is tried and its failure is
    /// final. Otherwise each failure advances to the next backend; only total
    /// exhaustion surfaces to the caller, carrying the last error.
    pub async fn generate(
        &self,
        input_context: &str,
        params: GenerationParams,
        pinned: Option<&str>,
    ) -> Result<String, Error> {
        let mut last_error: Option<(&'static str, BackendError)> = None;
        let mut attempted = 0usize;

        for backend in &self.backends {
            if pinned.is_some_and(|name| name != backend.name()) {
                continue;
            }
            attempted += 1;

            match tokio::time::timeout(self.call_timeout, backend.generate(input_context, params))
                .await
            {
                Ok(Ok(text)) => {
                    tracing::debug!(backend = backend.name(), "generation succeeded");
                    return Ok(text);
                }
                Ok(Err(e)) => {
                    tracing::warn!(backend = backend.name(), error = %e, "backend failed, trying next");
                    last_error = Some((backend.name(), e));
                }
                Err(_) => {
                    tracing::warn!(
                        backend = backend.name(),
                        timeout_secs = self.call_timeout.as_secs(),
                        "backend timed out, trying next"
                    );
                    last_error = Some((backend.name(), BackendError::Timeout(self.call_timeout)));
                }
            }
        }

        match last_error {
            Some((name, e)) => Err(Error::AllBackendsFailed(format!(
                "{} backend(s) exhausted, last error from {}: {}",
                attempted, name, e
            ))),
            None => Err(Error::AllBackendsFailed(
                "no backend matched the request".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::MockBackend;

    fn params() -> GenerationParams {
        GenerationParams {
            max_length: 50,
            temperature: 0.5,
        }
    }

    fn registry_of(backends: Vec<Arc<MockBackend>>) -> BackendRegistry {
        let dyn_backends = backends
            .into_iter()
            .map(|b| b as Arc<dyn TextGenerator>)
            .collect();
        BackendRegistry::new(dyn_backends, Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_first_healthy_backend_wins() {
        let first = Arc::new(MockBackend::succeeding("local", "from local"));
        let second = Arc::new(MockBackend::succeeding("openai", "from openai"));
        let registry = registry_of(vec![first.clone(), second.clone()]);

        let text = registry.generate("ctx", params(), None).await.unwrap();
        assert_eq!(text, "from local");
        assert_eq!(first.calls(), 1);
        assert_eq!(second.calls(), 0);
    }

    #[tokio::test]
    async fn test_failure_falls_back_to_next() {
        let first = Arc::new(MockBackend::failing("local"));
        let second = Arc::new(MockBackend::succeeding("openai", "recovered"));
        let registry = registry_of(vec![first.clone(), second.clone()]);

        let text = registry.generate("ctx", params(), None).await.unwrap();
        assert_eq!(text, "recovered");
        assert_eq!(first.calls(), 1);
        assert_eq!(second.calls(), 1);
    }

    #[tokio::test]
    async fn test_exhaustion_carries_last_error() {
        let first = Arc::new(MockBackend::failing("local"));
        let second = Arc::new(MockBackend::failing("openai"));
        let registry = registry_of(vec![first, second]);

        let err = registry.generate("ctx", params(), None).await.unwrap_err();
        match err {
            Error::AllBackendsFailed(message) => {
                assert!(message.contains("openai"), "got: {message}");
                assert!(message.contains("2 backend(s)"), "got: {message}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_pinned_backend_skips_fallback() {
        let first = Arc::new(MockBackend::failing("local"));
        let second = Arc::new(MockBackend::succeeding("openai", "unused"));
        let registry = registry_of(vec![first.clone(), second.clone()]);

        let err = registry
            .generate("ctx", params(), Some("local"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::AllBackendsFailed(_)));
        assert_eq!(second.calls(), 0);

        let text = registry
            .generate("ctx", params(), Some("openai"))
            .await
            .unwrap();
        assert_eq!(text, "unused");
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_backend_times_out_and_falls_back() {
        let slow = Arc::new(MockBackend::slow(
            "local",
            Duration::from_secs(30),
            "too late",
        ));
        let fast = Arc::new(MockBackend::succeeding("openai", "in time"));
        let registry = BackendRegistry::new(
            vec![
                slow.clone() as Arc<dyn TextGenerator>,
                fast.clone() as Arc<dyn TextGenerator>,
            ],
            Duration::from_secs(5),
        );

        let text = registry.generate("ctx", params(), None).await.unwrap();
        assert_eq!(text, "in time");
    }
}
