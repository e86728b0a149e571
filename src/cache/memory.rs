//! In-memory key-value store with TTL and glob deletion.
//!
//! Drop-in stand-in for the Redis store: backs tests and local development
//! where no store is running. Expiry uses `tokio::time::Instant`, so paused
//! clocks in tests advance it.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use super::store::{KeyValueStore, StoreError, StoreInfo};

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Instant,
}

#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (non-expired) entries.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .lock()
            .unwrap()
            .values()
            .filter(|e| e.expires_at > now)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut entries = self.entries.lock().unwrap();
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        let entry = Entry {
            value: value.to_string(),
            expires_at: Instant::now() + ttl,
        };
        self.entries.lock().unwrap().insert(key.to_string(), entry);
        Ok(())
    }

    async fn delete_matching(&self, pattern: &str) -> Result<u64, StoreError> {
        let now = Instant::now();
        let mut entries = self.entries.lock().unwrap();
        let matching: Vec<String> = entries
            .iter()
            .filter(|(key, entry)| entry.expires_at > now && glob_match(pattern, key))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &matching {
            entries.remove(key);
        }

        Ok(matching.len() as u64)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn info(&self) -> Result<StoreInfo, StoreError> {
        let entries = self.entries.lock().unwrap();
        let used: usize = entries.values().map(|e| e.value.len()).sum();
        Ok(StoreInfo {
            connected_clients: 1,
            used_memory: used as u64,
            used_memory_human: format!("{}B", used),
            ..StoreInfo::default()
        })
    }
}

/// Glob matching over `*` (any run) and `?` (any one character), the subset
/// of Redis patterns the gateway emits.
fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();

    let (mut p, mut t) = (0usize, 0usize);
    let mut star: Option<(usize, usize)> = None;

    while t < text.len() {
        if p < pattern.len() && (pattern[p] == '?' || pattern[p] == text[t]) {
            p += 1;
            t += 1;
        } else if p < pattern.len() && pattern[p] == '*' {
            star = Some((p, t));
            p += 1;
        } else if let Some((sp, st)) = star {
            // Backtrack: let the last '*' consume one more character.
            p = sp + 1;
            t = st + 1;
            star = Some((sp, st + 1));
        } else {
            return false;
        }
    }

    while p < pattern.len() && pattern[p] == '*' {
        p += 1;
    }
    p == pattern.len()
}
