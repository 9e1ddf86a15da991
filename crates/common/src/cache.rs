//! Key/value cache with TTL.
//!
//! Services talk to the [`Cache`] trait only. [`RedisCache`] is the shared
//! production backend; [`MemoryCache`] keeps entries in process memory and
//! follows tokio's clock, so tests can move time with `tokio::time::advance`.
//!
//! The cache is an accelerator. Nothing correctness-critical may rely on an
//! entry being present.

use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use fred::clients::Client as RedisClient;
use fred::interfaces::KeysInterface;
use fred::types::Expiration;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

/// Generic key/value cache.
#[async_trait]
pub trait Cache: Send + Sync {
    /// Read a string value.
    async fn get_string(&self, key: &str) -> AppResult<Option<String>>;

    /// Write a string value with a TTL.
    async fn set_string(&self, key: &str, value: &str, ttl: Duration) -> AppResult<()>;

    /// Read an integer value.
    async fn get_int64(&self, key: &str) -> AppResult<Option<i64>>;

    /// Write an integer value with a TTL.
    async fn set_int64(&self, key: &str, value: i64, ttl: Duration) -> AppResult<()>;

    /// Add one to a window counter and return the new count.
    ///
    /// A counter created by this call expires after `window`; an existing one
    /// keeps its remaining TTL.
    async fn increase_in_window(&self, key: &str, window: Duration) -> AppResult<i64>;

    /// Remove a key.
    async fn del(&self, key: &str) -> AppResult<()>;
}

/// Shared cache handle.
pub type SharedCache = Arc<dyn Cache>;

fn ttl_secs(ttl: Duration) -> i64 {
    i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX).max(1)
}

/// Redis-backed cache.
#[derive(Clone)]
pub struct RedisCache {
    redis: Arc<RedisClient>,
    prefix: String,
}

impl RedisCache {
    /// Create a cache that namespaces every key with `prefix`.
    #[must_use]
    pub fn new(redis: Arc<RedisClient>, prefix: impl Into<String>) -> Self {
        Self {
            redis,
            prefix: prefix.into(),
        }
    }

    fn key(&self, key: &str) -> String {
        format!("{}:{key}", self.prefix)
    }
}

fn redis_err(e: &fred::error::Error) -> AppError {
    AppError::Cache(e.to_string())
}

#[async_trait]
impl Cache for RedisCache {
    async fn get_string(&self, key: &str) -> AppResult<Option<String>> {
        let value: Option<String> = self
            .redis
            .get(self.key(key))
            .await
            .map_err(|e| redis_err(&e))?;
        debug!(key = %key, hit = value.is_some(), "Cache lookup");
        Ok(value)
    }

    async fn set_string(&self, key: &str, value: &str, ttl: Duration) -> AppResult<()> {
        self.redis
            .set::<(), _, _>(
                self.key(key),
                value,
                Some(Expiration::EX(ttl_secs(ttl))),
                None,
                false,
            )
            .await
            .map_err(|e| redis_err(&e))
    }

    async fn get_int64(&self, key: &str) -> AppResult<Option<i64>> {
        self.redis
            .get::<Option<i64>, _>(self.key(key))
            .await
            .map_err(|e| redis_err(&e))
    }

    async fn set_int64(&self, key: &str, value: i64, ttl: Duration) -> AppResult<()> {
        self.redis
            .set::<(), _, _>(
                self.key(key),
                value,
                Some(Expiration::EX(ttl_secs(ttl))),
                None,
                false,
            )
            .await
            .map_err(|e| redis_err(&e))
    }

    async fn increase_in_window(&self, key: &str, window: Duration) -> AppResult<i64> {
        let key = self.key(key);
        let count: i64 = self.redis.incr(key.clone()).await.map_err(|e| redis_err(&e))?;
        if count == 1 {
            self.redis
                .expire::<(), _>(key, ttl_secs(window), None)
                .await
                .map_err(|e| redis_err(&e))?;
        }
        Ok(count)
    }

    async fn del(&self, key: &str) -> AppResult<()> {
        self.redis
            .del::<(), _>(self.key(key))
            .await
            .map_err(|e| redis_err(&e))
    }
}

#[derive(Debug, Clone)]
struct MemoryEntry {
    value: String,
    expires_at: Option<Instant>,
}

impl MemoryEntry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|at| at > now)
    }
}

/// In-process cache.
#[derive(Clone, Default)]
pub struct MemoryCache {
    entries: Arc<RwLock<HashMap<String, MemoryEntry>>>,
}

impl MemoryCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    async fn live(&self, key: &str) -> Option<String> {
        let now = Instant::now();
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|e| e.is_live(now))
            .map(|e| e.value.clone())
    }

    async fn put(&self, key: &str, value: String, ttl: Duration) {
        let entry = MemoryEntry {
            value,
            expires_at: Some(Instant::now() + ttl),
        };
        self.entries.write().await.insert(key.to_string(), entry);
    }
}

#[async_trait]
impl Cache for MemoryCache {
    async fn get_string(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.live(key).await)
    }

    async fn set_string(&self, key: &str, value: &str, ttl: Duration) -> AppResult<()> {
        self.put(key, value.to_string(), ttl).await;
        Ok(())
    }

    async fn get_int64(&self, key: &str) -> AppResult<Option<i64>> {
        self.live(key)
            .await
            .map(|v| {
                v.parse::<i64>()
                    .map_err(|e| AppError::Cache(format!("{key} is not an integer: {e}")))
            })
            .transpose()
    }

    async fn set_int64(&self, key: &str, value: i64, ttl: Duration) -> AppResult<()> {
        self.put(key, value.to_string(), ttl).await;
        Ok(())
    }

    async fn increase_in_window(&self, key: &str, window: Duration) -> AppResult<i64> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let entry = entries
            .entry(key.to_string())
            .and_modify(|e| {
                if !e.is_live(now) {
                    e.value = "0".to_string();
                    e.expires_at = Some(now + window);
                }
            })
            .or_insert_with(|| MemoryEntry {
                value: "0".to_string(),
                expires_at: Some(now + window),
            });
        let current = entry
            .value
            .parse::<i64>()
            .map_err(|e| AppError::Cache(format!("{key} is not an integer: {e}")))?;
        let next = current + 1;
        entry.value = next.to_string();
        Ok(next)
    }

    async fn del(&self, key: &str) -> AppResult<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}
