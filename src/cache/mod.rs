//! Cache-aside support for point lookups.
//!
//! Values are stored as JSON under `prefix:argument` keys. The cache only
//! ever speeds lookups up: read faults count as misses and write faults are
//! logged and dropped, so callers see the same results with or without it.

mod memory;
mod redis_store;

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

pub use self::memory::MemoryCache;
pub use self::redis_store::RedisCache;

pub const DEFAULT_TTL: Duration = Duration::from_secs(1200);

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), CacheError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(prefix: &str, argument: impl fmt::Display) -> Self {
        Self(format!("{prefix}:{argument}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Whether a lookup result is worth storing. Absent and empty results never are.
pub trait Cacheable {
    fn is_cacheable(&self) -> bool;
}

impl<T> Cacheable for Option<T> {
    fn is_cacheable(&self) -> bool {
        self.is_some()
    }
}

impl<T> Cacheable for Vec<T> {
    fn is_cacheable(&self) -> bool {
        !self.is_empty()
    }
}

#[derive(Clone)]
pub struct CacheAside {
    store: Arc<dyn CacheStore>,
    ttl: Duration,
}

impl CacheAside {
    pub fn new(store: Arc<dyn CacheStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Serves `key` from the cache, or runs `lookup` and stores its result.
    ///
    /// A hit never calls `lookup`. Only results accepted by [`Cacheable`] are
    /// written, and a failed write does not change what is returned.
    pub async fn get_or_fetch<T, E, F, Fut>(&self, key: &CacheKey, lookup: F) -> Result<T, E>
    where
        T: Cacheable + Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(cached) = self.read::<T>(key).await {
            debug!(%key, "cache hit");
            return Ok(cached);
        }
        debug!(%key, "cache miss");

        let value = lookup().await?;
        if value.is_cacheable() {
            self.write(key, &value).await;
        }
        Ok(value)
    }

    async fn read<T: DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        let bytes = match self.store.get(key.as_str()).await {
            Ok(bytes) => bytes?,
            Err(err) => {
                warn!(%key, error = %err, "cache read failed");
                return None;
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(%key, error = %err, "discarding undecodable cache entry");
                None
            }
        }
    }

    async fn write<T: Serialize>(&self, key: &CacheKey, value: &T) {
        let bytes = match serde_json::to_vec(value) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(%key, error = %err, "failed to encode cache entry");
                return;
            }
        };
        if let Err(err) = self.store.set(key.as_str(), &bytes, self.ttl).await {
            warn!(%key, error = %err, "cache write failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Item {
        name: String,
    }

    struct BrokenStore;

    #[async_trait]
    impl CacheStore for BrokenStore {
        async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, CacheError> {
            Err(redis::RedisError::from((redis::ErrorKind::IoError, "connection refused")).into())
        }

        async fn set(&self, _key: &str, _value: &[u8], _ttl: Duration) -> Result<(), CacheError> {
            Err(redis::RedisError::from((redis::ErrorKind::IoError, "connection refused")).into())
        }
    }

    fn item(name: &str) -> Item {
        Item { name: name.into() }
    }

    #[test]
    fn keys_join_prefix_and_argument() {
        assert_eq!(CacheKey::new("film", "42").as_str(), "film:42");
    }

    #[tokio::test]
    async fn second_lookup_is_served_from_cache() {
        let cache = CacheAside::new(Arc::new(MemoryCache::new()), DEFAULT_TTL);
        let calls = AtomicUsize::new(0);
        let key = CacheKey::new("item", 1);

        for _ in 0..2 {
            let value: Result<Option<Item>, ()> = cache
                .get_or_fetch(&key, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(Some(item("first")))
                })
                .await;
            assert_eq!(value, Ok(Some(item("first"))));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn absent_and_empty_results_are_not_stored() {
        let store = Arc::new(MemoryCache::new());
        let cache = CacheAside::new(store.clone(), DEFAULT_TTL);

        let absent: Result<Option<Item>, ()> =
            cache.get_or_fetch(&CacheKey::new("item", 1), || async { Ok(None) }).await;
        let empty: Result<Vec<Item>, ()> =
            cache.get_or_fetch(&CacheKey::new("items", 1), || async { Ok(Vec::new()) }).await;

        assert_eq!(absent, Ok(None));
        assert_eq!(empty, Ok(Vec::new()));
        assert!(store.get("item:1").await.unwrap().is_none());
        assert!(store.get("items:1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn lists_are_cached_as_lists() {
        let cache = CacheAside::new(Arc::new(MemoryCache::new()), DEFAULT_TTL);
        let key = CacheKey::new("items", "all");
        let _: Result<Vec<Item>, ()> = cache
            .get_or_fetch(&key, || async { Ok(vec![item("a"), item("b")]) })
            .await;

        let cached: Result<Vec<Item>, ()> =
            cache.get_or_fetch(&key, || async { Ok(Vec::new()) }).await;
        assert_eq!(cached, Ok(vec![item("a"), item("b")]));
    }

    #[tokio::test]
    async fn lookup_errors_propagate_and_are_not_cached() {
        let store = Arc::new(MemoryCache::new());
        let cache = CacheAside::new(store.clone(), DEFAULT_TTL);
        let result: Result<Option<Item>, &str> = cache
            .get_or_fetch(&CacheKey::new("item", 1), || async { Err("index down") })
            .await;
        assert_eq!(result, Err("index down"));
        assert!(store.get("item:1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unavailable_cache_falls_through_to_lookup() {
        let cache = CacheAside::new(Arc::new(BrokenStore), DEFAULT_TTL);
        let value: Result<Option<Item>, ()> = cache
            .get_or_fetch(&CacheKey::new("item", 1), || async { Ok(Some(item("live"))) })
            .await;
        assert_eq!(value, Ok(Some(item("live"))));
    }

    #[tokio::test]
    async fn undecodable_entry_counts_as_miss() {
        let store = Arc::new(MemoryCache::new());
        store.set("item:1", b"not json", DEFAULT_TTL).await.unwrap();
        let cache = CacheAside::new(store, DEFAULT_TTL);
        let value: Result<Option<Item>, ()> = cache
            .get_or_fetch(&CacheKey::new("item", 1), || async { Ok(Some(item("fresh"))) })
            .await;
        assert_eq!(value, Ok(Some(item("fresh"))));
    }
}
