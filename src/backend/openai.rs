//! OpenAI chat-completions backend.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{BackendError, TextGenerator};
use crate::models::GenerationParams;

pub struct OpenAiBackend {
    http_client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiBackend {
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
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl TextGenerator for OpenAiBackend {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn generate(
        &self,
        input_context: &str,
        params: GenerationParams,
    ) -> Result<String, BackendError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
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

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| BackendError::MalformedResponse(e.to_string()))?;

        chat.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|content| !content.is_empty())
            .ok_or_else(|| BackendError::MalformedResponse("no completion choices".to_string()))
    }
}
