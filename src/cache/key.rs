//! Cache key derivation.
//!
//! Every output-affecting request field is folded into a canonical string,
//! hashed, and namespaced. Identical logical requests always map to the same
//! key; changing any field changes the key.

use sha2::{Digest, Sha256};

use crate::models::InferenceRequest;

/// Version tag for the canonical field set. Bump when the set of hashed
/// fields changes, so stale entries from older deployments cannot be served.
const KEY_VERSION: &str = "v1";

/// A fully namespaced store key: `<prefix>:<kind>:<hex digest>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derive the key for a request under the given namespace prefix.
    pub fn derive(prefix: &str, request: &InferenceRequest) -> Self {
        // Fixed field order; the free-form context goes last so a crafted
        // context can never collide with another request's field encoding.
        let canonical = format!(
            "{}|backend={}|max_length={}|num_batches={}|temperature={:.4}|context={}",
            KEY_VERSION,
            request.backend.as_deref().unwrap_or(""),
            request.max_length,
            request.num_batches,
            request.temperature,
            request.input_context,
        );

        let digest = Sha256::digest(canonical.as_bytes());
        let kind = if request.is_batch() { "batch" } else { "inference" };

        CacheKey(format!("{}:{}:{}", prefix, kind, hex::encode(digest)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
