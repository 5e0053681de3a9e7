//! Redis-backed cache (optional).
//!
//! Entries are plain string keys written with `SET key value PX ttl_ms`, so
//! expiry is enforced by Redis itself. A zero TTL stores nothing and drops any
//! previous entry, matching the in-memory cache.

use std::time::Duration;

use async_trait::async_trait;

use super::{Cache, CacheError};

fn backend(err: ::redis::RedisError) -> CacheError {
    CacheError::Backend(err.to_string())
}

/// TTL in whole milliseconds, rounded up. `None` when nothing should be stored.
fn expiry_millis(ttl: Duration) -> Option<u64> {
    if ttl.is_zero() {
        return None;
    }
    let millis = ttl.as_nanos().div_ceil(1_000_000);
    Some(u64::try_from(millis).unwrap_or(u64::MAX))
}

/// Redis cache sharing one client; a multiplexed connection is opened per call.
#[derive(Debug, Clone)]
pub struct RedisCache {
    client: ::redis::Client,
    prefix: String,
}

impl RedisCache {
    /// `prefix` is prepended to every key (e.g. `"stockroom:"`).
    pub fn new(redis_url: impl AsRef<str>, prefix: impl Into<String>) -> Result<Self, CacheError> {
        let client = ::redis::Client::open(redis_url.as_ref()).map_err(backend)?;
        Ok(Self {
            client,
            prefix: prefix.into(),
        })
    }

    fn key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    async fn connection(&self) -> Result<::redis::aio::MultiplexedConnection, CacheError> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(backend)
    }
}

#[async_trait]
impl Cache for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.connection().await?;
        ::redis::cmd("GET")
            .arg(self.key(key))
            .query_async::<_, Option<String>>(&mut conn)
            .await
            .map_err(backend)
    }

    async fn put(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        let Some(millis) = expiry_millis(ttl) else {
            return self.forget(key).await;
        };
        let mut conn = self.connection().await?;
        ::redis::cmd("SET")
            .arg(self.key(key))
            .arg(value)
            .arg("PX")
            .arg(millis)
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(backend)
    }

    async fn forget(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.connection().await?;
        ::redis::cmd("DEL")
            .arg(self.key(key))
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(backend)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_ttl_is_never_written() {
        assert_eq!(expiry_millis(Duration::ZERO), None);
    }

    #[test]
    fn ttl_keeps_sub_second_precision() {
        assert_eq!(expiry_millis(Duration::from_secs(600)), Some(600_000));
        assert_eq!(expiry_millis(Duration::from_millis(1500)), Some(1500));
        assert_eq!(expiry_millis(Duration::from_micros(1)), Some(1));
        assert_eq!(expiry_millis(Duration::from_micros(2_500)), Some(3));
    }

    #[test]
    fn huge_ttl_saturates() {
        assert_eq!(expiry_millis(Duration::MAX), Some(u64::MAX));
    }
}
