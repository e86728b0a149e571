//! Redis-backed key-value store.
//!
//! Uses a `ConnectionManager`, which multiplexes and reconnects internally;
//! it is cheap to clone, so each operation works on its own clone.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use super::store::{KeyValueStore, StoreError, StoreInfo};

/// Page size for cursor-based pattern scans.
const SCAN_COUNT: u64 = 100;

pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    /// Connect to Redis at the given URL (`redis://host:port/db`).
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(url)
            .map_err(|e| StoreError::Connection(format!("invalid redis url: {}", e)))?;

        let conn = ConnectionManager::new(client).await?;

        tracing::info!(url = %url, "Connected to Redis");

        Ok(Self { conn })
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let secs = ttl.as_secs().max(1);
        let _: () = conn.set_ex(key, value, secs).await?;
        Ok(())
    }

    async fn delete_matching(&self, pattern: &str) -> Result<u64, StoreError> {
        let mut conn = self.conn.clone();
        let mut cursor: u64 = 0;
        let mut deleted: u64 = 0;

        // SCAN instead of KEYS so the server is never blocked on large keyspaces.
        loop {
            let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(SCAN_COUNT)
                .query_async(&mut conn)
                .await?;

            if !keys.is_empty() {
                let removed: u64 = conn.del(&keys).await?;
                deleted += removed;
            }

            cursor = next;
            if cursor == 0 {
                break;
            }
        }

        Ok(deleted)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        if pong == "PONG" {
            Ok(())
        } else {
            Err(StoreError::Command(format!("unexpected PING reply: {}", pong)))
        }
    }

    async fn info(&self) -> Result<StoreInfo, StoreError> {
        let mut conn = self.conn.clone();
        let raw: String = redis::cmd("INFO").query_async(&mut conn).await?;
        Ok(parse_info(&raw))
    }
}

/// Parse the fields we report out of a raw `INFO` reply.
fn parse_info(raw: &str) -> StoreInfo {
    let mut info = StoreInfo::default();

    for line in raw.lines() {
        let Some((field, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();

        match field {
            "connected_clients" => info.connected_clients = value.parse().unwrap_or(0),
            "used_memory" => info.used_memory = value.parse().unwrap_or(0),
            "used_memory_human" => info.used_memory_human = value.to_string(),
            "keyspace_hits" => info.keyspace_hits = value.parse().unwrap_or(0),
            "keyspace_misses" => info.keyspace_misses = value.parse().unwrap_or(0),
            "total_commands_processed" => {
                info.total_commands_processed = value.parse().unwrap_or(0)
            }
            _ => {}
        }
    }

    info
}
