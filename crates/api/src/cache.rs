//! Read-through cache for rendered catalog pages.
//!
//! Pages are stored as the exact JSON body served by `GET /events` under
//! `events:page:{page}:limit:{limit}`. Every catalog or roster mutation
//! drops all keys under [`EVENT_LIST_PREFIX`]. Cache failures are logged and
//! treated as misses; they never fail a request.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};

/// Key prefix shared by every cached catalog page.
pub const EVENT_LIST_PREFIX: &str = "events:";

/// Keys scanned per `SCAN` round trip during prefix deletion.
const SCAN_BATCH: usize = 100;

/// Cache key for one catalog page.
pub fn page_key(page: i64, limit: i64) -> String {
    format!("{EVENT_LIST_PREFIX}page:{page}:limit:{limit}")
}

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

#[async_trait]
pub trait EventListCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;

    /// Delete every key starting with `prefix`, returning how many went.
    async fn delete_prefix(&self, prefix: &str) -> Result<u64, CacheError>;
}

/// Drop every cached catalog page. Failures are logged.
pub async fn invalidate_event_list(cache: &dyn EventListCache) {
    match cache.delete_prefix(EVENT_LIST_PREFIX).await {
        Ok(removed) => tracing::debug!(removed, "Event list cache invalidated"),
        Err(e) => tracing::warn!(error = %e, "Failed to invalidate event list cache"),
    }
}

// ---------------------------------------------------------------------------
// Redis
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct RedisEventListCache {
    conn_manager: ConnectionManager,
}

impl RedisEventListCache {
    pub async fn connect(redis_url: &str) -> Result<Self, CacheError> {
        let client = Client::open(redis_url)?;
        let conn_manager = ConnectionManager::new(client).await?;
        Ok(Self { conn_manager })
    }
}

#[async_trait]
impl EventListCache for RedisEventListCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.conn_manager.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.conn_manager.clone();
        let _: () = conn.set_ex(key, value, ttl.as_secs().max(1)).await?;
        Ok(())
    }

    async fn delete_prefix(&self, prefix: &str) -> Result<u64, CacheError> {
        let mut conn = self.conn_manager.clone();
        let pattern = format!("{prefix}*");
        let mut cursor: u64 = 0;
        let mut removed: u64 = 0;
        loop {
            let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await?;
            if !keys.is_empty() {
                let deleted: u64 = conn.del(&keys).await?;
                removed += deleted;
            }
            if next == 0 {
                break;
            }
            cursor = next;
        }
        Ok(removed)
    }
}

// ---------------------------------------------------------------------------
// In-process
// ---------------------------------------------------------------------------

/// Process-local cache used when no Redis is configured.
#[derive(Default)]
pub struct InMemoryEventListCache {
    entries: Mutex<HashMap<String, (String, Instant)>>,
}

impl InMemoryEventListCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EventListCache for InMemoryEventListCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut entries = self.entries.lock().unwrap_or_else(|p| p.into_inner());
        match entries.get(key) {
            Some((value, expires_at)) if *expires_at > Instant::now() => Ok(Some(value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let mut entries = self.entries.lock().unwrap_or_else(|p| p.into_inner());
        entries.insert(key.to_string(), (value.to_string(), Instant::now() + ttl));
        Ok(())
    }

    async fn delete_prefix(&self, prefix: &str) -> Result<u64, CacheError> {
        let mut entries = self.entries.lock().unwrap_or_else(|p| p.into_inner());
        let before = entries.len();
        entries.retain(|k, _| !k.starts_with(prefix));
        Ok((before - entries.len()) as u64)
    }
}
