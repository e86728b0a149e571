//! Shared test doubles for unit and integration tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::backend::{BackendError, TextGenerator};
use crate::cache::{KeyValueStore, StoreError, StoreInfo};
use crate::models::GenerationParams;

/// Scripted generation backend that counts its calls.
pub struct MockBackend {
    name: &'static str,
    behavior: MockBehavior,
    calls: AtomicUsize,
}

enum MockBehavior {
    Succeed(String),
    Fail,
    Slow(Duration, String),
    /// nth call returns "gen-<n>", later calls completing first.
    ReverseCompleting(u32),
    /// Succeeds for the first n calls, fails afterwards.
    FlakyAfter(usize),
}

impl MockBackend {
    pub fn succeeding(name: &'static str, text: &str) -> Self {
        Self {
            name,
            behavior: MockBehavior::Succeed(text.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(name: &'static str) -> Self {
        Self {
            name,
            behavior: MockBehavior::Fail,
            calls: AtomicUsize::new(0),
        }
    }

    /// Succeeds with `text`, but only after `latency` elapses.
    pub fn slow(name: &'static str, latency: Duration, text: &str) -> Self {
        Self {
            name,
            behavior: MockBehavior::Slow(latency, text.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Each of `total` expected calls returns a distinct text, and calls
    /// issued later complete earlier, to expose ordering mistakes.
    pub fn reverse_completing(name: &'static str, total: u32) -> Self {
        Self {
            name,
            behavior: MockBehavior::ReverseCompleting(total),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn flaky_after(name: &'static str, successes: usize) -> Self {
        Self {
            name,
            behavior: MockBehavior::FlakyAfter(successes),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextGenerator for MockBackend {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn generate(
        &self,
        _input_context: &str,
        _params: GenerationParams,
    ) -> Result<String, BackendError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            MockBehavior::Succeed(text) => Ok(text.clone()),
            MockBehavior::Fail => Err(BackendError::Api {
                status: 500,
                message: "mock backend failure".to_string(),
            }),
            MockBehavior::Slow(latency, text) => {
                tokio::time::sleep(*latency).await;
                Ok(text.clone())
            }
            MockBehavior::ReverseCompleting(total) => {
                let remaining = total.saturating_sub(n as u32);
                tokio::time::sleep(Duration::from_millis(u64::from(remaining) * 10)).await;
                Ok(format!("gen-{n}"))
            }
            MockBehavior::FlakyAfter(successes) => {
                if n < *successes {
                    Ok(format!("gen-{n}"))
                } else {
                    Err(BackendError::Api {
                        status: 500,
                        message: "mock backend failure".to_string(),
                    })
                }
            }
        }
    }
}

/// Key-value store whose every operation fails, for degraded-path tests.
pub struct UnavailableStore;

#[async_trait]
impl KeyValueStore for UnavailableStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
        Err(StoreError::Connection("store offline".to_string()))
    }

    async fn set_ex(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<(), StoreError> {
        Err(StoreError::Connection("store offline".to_string()))
    }

    async fn delete_matching(&self, _pattern: &str) -> Result<u64, StoreError> {
        Err(StoreError::Connection("store offline".to_string()))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Err(StoreError::Connection("store offline".to_string()))
    }

    async fn info(&self) -> Result<StoreInfo, StoreError> {
        Err(StoreError::Connection("store offline".to_string()))
    }
}
