//! OpenRouter backend.
//!
//! OpenRouter speaks the OpenAI chat-completions shape but reports failures
//! in an `{"error": {...}}` envelope, sometimes with a 200 status, so the
//! response handling differs from the OpenAI adapter.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{BackendError, TextGenerator};
use crate::models::GenerationParams;

pub struct OpenRouterBackend {
    http_client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenRouterBackend {
    pub fn new(api_key: &str, base_url: &str, model: &str) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct RouterRequest<'a> {
    model: &'a str,
    messages: Vec<RouterMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct RouterMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct RouterResponse {
    #[serde(default)]
    choices: Vec<RouterChoice>,
    #[serde(default)]
    error: Option<RouterError>,
}

#[derive(Debug, Deserialize)]
struct RouterChoice {
    message: RouterResponseMessage,
}

#[derive(Debug, Deserialize)]
struct RouterResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RouterError {
    #[serde(default)]
    code: Option<u16>,
    message: String,
}

#[async_trait]
impl TextGenerator for OpenRouterBackend {
    fn name(&self) -> &'static str {
        "openrouter"
    }

    async fn generate(
        &self,
        input_context: &str,
        params: GenerationParams,
    ) -> Result<String, BackendError> {
        let request = RouterRequest {
            model: &self.model,
            messages: vec![RouterMessage {
                role: "user",
                content: input_context,
            }],
            max_tokens: params.max_length,
            temperature: params.temperature,
        };

        let response = self
            .http_client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
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

        let router: RouterResponse = response
            .json()
            .await
            .map_err(|e| BackendError::MalformedResponse(e.to_string()))?;

        if let Some(error) = router.error {
            return Err(BackendError::Api {
                status: error.code.unwrap_or(status.as_u16()),
                message: error.message,
            });
        }

        router
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|content| !content.is_empty())
            .ok_or_else(|| BackendError::MalformedResponse("no completion choices".to_string()))
    }
}
