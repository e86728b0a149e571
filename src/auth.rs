//! Credential validation with a short-TTL decision cache.

use std::sync::Arc;

use sha2::{Digest, Sha256};

use crate::cache::CacheService;

/// Validates caller credentials against the configured secret digest.
///
/// The raw credential is hashed immediately and only its digest is compared,
/// cached, or logged; the plaintext never outlives the comparison.
pub struct AuthGate {
    expected_digest: [u8; 32],
    cache: Arc<CacheService>,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthConfigError {
    #[error("AUTH_KEY is not valid hex: {0}")]
    InvalidHex(String),
    #[error("AUTH_KEY must be a hex-encoded SHA-256 digest (64 hex chars), got {0} bytes")]
    WrongLength(usize),
}

impl AuthGate {
    /// Build the gate from the configured hex-encoded SHA-256 digest.
    pub fn new(expected_hex: &str, cache: Arc<CacheService>) -> Result<Self, AuthConfigError> {
        let bytes = hex::decode(expected_hex.trim())
            .map_err(|e| AuthConfigError::InvalidHex(e.to_string()))?;
        let expected_digest: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| AuthConfigError::WrongLength(bytes.len()))?;

        Ok(Self {
            expected_digest,
            cache,
        })
    }

    /// Check a credential, consulting the decision cache first.
    ///
    /// Cache-store failures are not fatal: the gate falls back to the direct
    /// digest comparison, so legitimate callers are never rejected by a store
    /// outage.
    pub async fn authenticate(&self, credential: &str) -> bool {
        let digest: [u8; 32] = Sha256::digest(credential.as_bytes()).into();
        let fingerprint = hex::encode(digest);

        if let Some(valid) = self.cache.get_auth(&fingerprint).await {
            return valid;
        }

        let valid = constant_time_eq(&digest, &self.expected_digest);
        self.cache.set_auth(&fingerprint, valid).await;
        valid
    }
}

/// Constant-time comparison of two byte slices.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryStore;
    use crate::test_util::UnavailableStore;
    use std::time::Duration;

    const SECRET: &str = "letmein";

    fn digest_hex(secret: &str) -> String {
        hex::encode(Sha256::digest(secret.as_bytes()))
    }

    fn cache() -> Arc<CacheService> {
        Arc::new(CacheService::new(
            Some(Arc::new(MemoryStore::new())),
            "oracle",
            Duration::from_secs(3600),
            Duration::from_secs(300),
        ))
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"hello", b"hello"));
        assert!(!constant_time_eq(b"hello", b"world"));
        assert!(!constant_time_eq(b"hello", b"hell"));
        assert!(constant_time_eq(b"", b""));
    }

    #[test]
    fn test_rejects_malformed_configured_digest() {
        assert!(matches!(
            AuthGate::new("not hex", cache()),
            Err(AuthConfigError::InvalidHex(_))
        ));
        assert!(matches!(
            AuthGate::new("abcd", cache()),
            Err(AuthConfigError::WrongLength(2))
        ));
    }

    #[tokio::test]
    async fn test_matching_credential_authenticates() {
        let gate = AuthGate::new(&digest_hex(SECRET), cache()).unwrap();
        assert!(gate.authenticate(SECRET).await);
        assert!(!gate.authenticate("wrong").await);
        assert!(!gate.authenticate("").await);
    }

    #[tokio::test]
    async fn test_decision_is_cached() {
        let shared = cache();
        let gate = AuthGate::new(&digest_hex(SECRET), shared.clone()).unwrap();

        assert!(gate.authenticate(SECRET).await);

        // The cached decision is served even if the configured secret
        // changes, until its TTL window elapses.
        let rotated = AuthGate::new(&digest_hex("other"), shared).unwrap();
        assert!(rotated.authenticate(SECRET).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_secret_rotation_visible_within_one_ttl() {
        let store = Arc::new(MemoryStore::new());
        let shared = Arc::new(CacheService::new(
            Some(store),
            "oracle",
            Duration::from_secs(3600),
            Duration::from_secs(300),
        ));

        let gate = AuthGate::new(&digest_hex(SECRET), shared.clone()).unwrap();
        assert!(gate.authenticate(SECRET).await);

        let rotated = AuthGate::new(&digest_hex("other"), shared).unwrap();
        tokio::time::advance(Duration::from_secs(301)).await;
        assert!(!rotated.authenticate(SECRET).await);
    }

    #[tokio::test]
    async fn test_store_outage_falls_back_to_direct_check() {
        let degraded = Arc::new(CacheService::new(
            Some(Arc::new(UnavailableStore)),
            "oracle",
            Duration::from_secs(3600),
            Duration::from_secs(300),
        ));
        let gate = AuthGate::new(&digest_hex(SECRET), degraded).unwrap();

        assert!(gate.authenticate(SECRET).await);
        assert!(!gate.authenticate("wrong").await);
    }
}
