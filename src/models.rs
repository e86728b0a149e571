//! Request and result types for the inference path.

use serde::{Deserialize, Serialize};

/// A validated unit of inference work.
///
/// The caller's credential is deliberately not part of this type: it travels
/// beside the request so it can never end up in a cache key.
#[derive(Debug, Clone, PartialEq)]
pub struct InferenceRequest {
    /// Input context for generation, taken verbatim.
    pub input_context: String,
    /// Maximum generation length in tokens.
    pub max_length: u32,
    /// Sampling temperature.
    pub temperature: f32,
    /// Number of independent generations. 1 for single inference.
    pub num_batches: u32,
    /// Pin generation to a named backend, skipping the fallback chain.
    pub backend: Option<String>,
}

impl InferenceRequest {
    pub fn is_batch(&self) -> bool {
        self.num_batches > 1
    }

    pub fn params(&self) -> GenerationParams {
        GenerationParams {
            max_length: self.max_length,
            temperature: self.temperature,
        }
    }
}

/// Generation parameters handed to a backend for one unit of work.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub max_length: u32,
    pub temperature: f32,
}

/// Ordered generation output: one text per requested batch unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceResult {
    pub texts: Vec<String>,
}

impl InferenceResult {
    pub fn single(text: String) -> Self {
        Self { texts: vec![text] }
    }
}
