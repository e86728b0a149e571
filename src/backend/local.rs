//! Local model backend.
//!
//! Talks to a llama-server-compatible process over HTTP. The server owns the
//! model weights and its own request scheduling, so concurrent calls from the
//! gateway are safe regardless of how many are in flight.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{BackendError, TextGenerator};
use crate::models::GenerationParams;

pub struct LocalModelBackend {
    http_client: Client,
    base_url: String,
}

impl LocalModelBackend {
    pub fn new(base_url: &str) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    prompt: &'a str,
    n_predict: u32,
    temperature: f32,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    content: String,
}

#[async_trait]
impl TextGenerator for LocalModelBackend {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn generate(
        &self,
        input_context: &str,
        params: GenerationParams,
    ) -> Result<String, BackendError> {
        let request = CompletionRequest {
            prompt: input_context,
            n_predict: params.max_length,
            temperature: params.temperature,
            stream: false,
        };

        let response = self
            .http_client
            .post(format!("{}/completion", self.base_url))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(BackendError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .map_err(|e| BackendError::MalformedResponse(e.to_string()))?;

        if completion.content.is_empty() {
            return Err(BackendError::MalformedResponse(
                "empty completion content".to_string(),
            ));
        }

        Ok(completion.content)
    }
}
