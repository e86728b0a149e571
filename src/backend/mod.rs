//! Text-generation backend abstraction.
//!
//! Each backend (the local model server and the remote providers) implements
//! `TextGenerator`; the registry tries them in priority order. Adding a
//! backend means adding an implementation here, not branching logic in the
//! orchestrator.

mod local;
mod openai;
mod openrouter;
mod registry;

pub use local::LocalModelBackend;
pub use openai::OpenAiBackend;
pub use openrouter::OpenRouterBackend;
pub use registry::BackendRegistry;

use std::time::Duration;

use async_trait::async_trait;

use crate::models::GenerationParams;

/// Errors from a single backend call. Any of these advances the fallback
/// chain to the next backend.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("backend returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("no response within {0:?}")]
    Timeout(Duration),
}

/// One unit of text generation.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Stable backend identifier ("local", "openai", "openrouter").
    fn name(&self) -> &'static str;

    /// Generate a completion for the given context.
    async fn generate(
        &self,
        input_context: &str,
        params: GenerationParams,
    ) -> Result<String, BackendError>;
}
