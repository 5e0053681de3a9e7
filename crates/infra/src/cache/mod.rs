//! Time-bounded key/value cache.
//!
//! Values cross the [`Cache`] boundary as serialized JSON so any backend can
//! hold any serde type. [`remember`] is the read-through helper handlers use.

pub mod in_memory;
#[cfg(feature = "redis")]
pub mod redis;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

pub use in_memory::InMemoryCache;
#[cfg(feature = "redis")]
pub use self::redis::RedisCache;

/// Cache key for the full product listing.
pub const PRODUCTS_KEY: &str = "products";

/// Default lifetime of the cached product listing.
pub const PRODUCTS_TTL: Duration = Duration::from_secs(10 * 60);

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend error: {0}")]
    Backend(String),
}

/// Injected cache capability.
#[async_trait]
pub trait Cache: Send + Sync {
    /// Live (non-expired) value under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Store `value` under `key`, expiring `ttl` from now.
    async fn put(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError>;

    async fn forget(&self, key: &str) -> Result<(), CacheError>;
}

#[async_trait]
impl<C> Cache for Arc<C>
where
    C: Cache + ?Sized,
{
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        (**self).get(key).await
    }

    async fn put(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        (**self).put(key, value, ttl).await
    }

    async fn forget(&self, key: &str) -> Result<(), CacheError> {
        (**self).forget(key).await
    }
}

/// Return the live value under `key`, or run `compute`, store its result for
/// `ttl` and return it.
///
/// Cache failures (backend down, undecodable entry) degrade to a miss and are
/// logged; they never fail the caller. A failing `compute` stores nothing.
pub async fn remember<T, E, F, Fut>(
    cache: &dyn Cache,
    key: &str,
    ttl: Duration,
    compute: F,
) -> Result<T, E>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    match cache.get(key).await {
        Ok(Some(raw)) => match serde_json::from_str::<T>(&raw) {
            Ok(value) => {
                tracing::debug!(key, "cache hit");
                return Ok(value);
            }
            Err(e) => tracing::warn!(key, error = %e, "discarding undecodable cache entry"),
        },
        Ok(None) => tracing::debug!(key, "cache miss"),
        Err(e) => tracing::warn!(key, error = %e, "cache read failed; computing value"),
    }

    let value = compute().await?;

    match serde_json::to_string(&value) {
        Ok(raw) => {
            if let Err(e) = cache.put(key, raw, ttl).await {
                tracing::warn!(key, error = %e, "cache write failed");
            }
        }
        Err(e) => tracing::warn!(key, error = %e, "value not cacheable"),
    }

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Backend that always fails.
    struct BrokenCache;

    #[async_trait]
    impl Cache for BrokenCache {
        async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
            Err(CacheError::Backend("down".to_string()))
        }

        async fn put(&self, _key: &str, _value: String, _ttl: Duration) -> Result<(), CacheError> {
            Err(CacheError::Backend("down".to_string()))
        }

        async fn forget(&self, _key: &str) -> Result<(), CacheError> {
            Err(CacheError::Backend("down".to_string()))
        }
    }

    async fn counted(calls: &AtomicUsize, value: Vec<u32>) -> Result<Vec<u32>, String> {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(value)
    }

    #[tokio::test(start_paused = true)]
    async fn second_call_within_ttl_skips_compute() {
        let cache = InMemoryCache::new();
        let calls = AtomicUsize::new(0);
        let ttl = Duration::from_secs(600);

        let first = remember(&cache, "k", ttl, || counted(&calls, vec![1])).await.unwrap();
        let second = remember(&cache, "k", ttl, || counted(&calls, vec![2])).await.unwrap();

        assert_eq!(first, vec![1]);
        assert_eq!(second, vec![1]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_entry_is_recomputed() {
        let cache = InMemoryCache::new();
        let calls = AtomicUsize::new(0);
        let ttl = Duration::from_secs(600);

        remember(&cache, "k", ttl, || counted(&calls, vec![1])).await.unwrap();
        tokio::time::advance(Duration::from_secs(601)).await;
        let again = remember(&cache, "k", ttl, || counted(&calls, vec![2])).await.unwrap();

        assert_eq!(again, vec![2]);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn compute_errors_propagate_and_are_not_cached() {
        let cache = InMemoryCache::new();
        let ttl = Duration::from_secs(60);

        let err = remember::<Vec<u32>, _, _, _>(&cache, "k", ttl, || async { Err("db down".to_string()) })
            .await
            .unwrap_err();
        assert_eq!(err, "db down");
        assert_eq!(cache.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn broken_backend_degrades_to_compute() {
        let calls = AtomicUsize::new(0);
        let ttl = Duration::from_secs(60);

        let v = remember(&BrokenCache, "k", ttl, || counted(&calls, vec![7])).await.unwrap();
        let v2 = remember(&BrokenCache, "k", ttl, || counted(&calls, vec![8])).await.unwrap();

        assert_eq!(v, vec![7]);
        assert_eq!(v2, vec![8]);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn undecodable_entry_is_replaced() {
        let cache = InMemoryCache::new();
        let ttl = Duration::from_secs(60);
        cache.put("k", "not json".to_string(), ttl).await.unwrap();

        let calls = AtomicUsize::new(0);
        let v = remember(&cache, "k", ttl, || counted(&calls, vec![3])).await.unwrap();

        assert_eq!(v, vec![3]);
        assert_eq!(cache.get("k").await.unwrap().as_deref(), Some("[3]"));
    }
}
