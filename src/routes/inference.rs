//! Inference endpoints.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::InferenceRequest;
use crate::state::AppState;

// Endpoint-level defaults for POST /batch_inference. The single-inference
// endpoint takes its defaults from configuration instead.
const BATCH_DEFAULT_MAX_LENGTH: u32 = 128;
const BATCH_DEFAULT_TEMPERATURE: f32 = 0.7;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/inference", get(inference))
        .route("/batch_inference", post(batch_inference))
}

#[derive(Debug, Deserialize)]
struct InferenceParams {
    input_context: String,
    auth_key: String,
    max_length: Option<u32>,
    temperature: Option<f32>,
    backend: Option<String>,
}

#[derive(Debug, Serialize)]
struct InferenceResponse {
    generated_text: String,
}

/// GET /api/v1/inference - single inference, batch size 1.
async fn inference(
    State(state): State<Arc<AppState>>,
    Query(params): Query<InferenceParams>,
) -> Result<Json<InferenceResponse>> {
    let request = InferenceRequest {
        input_context: params.input_context,
        max_length: params.max_length.unwrap_or(state.config.max_generation_length),
        temperature: params.temperature.unwrap_or(state.config.default_temperature),
        num_batches: 1,
        backend: params.backend,
    };

    let result = state.inference.infer(&params.auth_key, &request).await?;

    let generated_text = result
        .texts
        .into_iter()
        .next()
        .ok_or_else(|| Error::Internal("empty inference result".to_string()))?;

    Ok(Json(InferenceResponse { generated_text }))
}

#[derive(Debug, Deserialize)]
struct BatchInferenceParams {
    input_context: String,
    auth_key: String,
    #[serde(default = "default_num_batches")]
    num_batches: u32,
    #[serde(default = "default_batch_max_length")]
    max_length: u32,
    #[serde(default = "default_batch_temperature")]
    temperature: f32,
    backend: Option<String>,
}

fn default_num_batches() -> u32 {
    1
}
fn default_batch_max_length() -> u32 {
    BATCH_DEFAULT_MAX_LENGTH
}
fn default_batch_temperature() -> f32 {
    BATCH_DEFAULT_TEMPERATURE
}

#[derive(Debug, Serialize)]
struct BatchInferenceResponse {
    generated_texts: Vec<String>,
}

/// POST /api/v1/batch_inference - N independent generations, all-or-nothing.
async fn batch_inference(
    State(state): State<Arc<AppState>>,
    Json(params): Json<BatchInferenceParams>,
) -> Result<Json<BatchInferenceResponse>> {
    let request = InferenceRequest {
        input_context: params.input_context,
        max_length: params.max_length,
        temperature: params.temperature,
        num_batches: params.num_batches,
        backend: params.backend,
    };

    let result = state
        .inference
        .batch_infer(&params.auth_key, &request)
        .await?;

    Ok(Json(BatchInferenceResponse {
        generated_texts: result.texts,
    }))
}
