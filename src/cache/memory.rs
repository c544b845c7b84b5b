use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

use super::{CacheError, CacheStore};

/// How often a write also drops every expired entry.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug)]
struct Entry {
    value: Vec<u8>,
    expires_at: Instant,
}

#[derive(Debug, Default)]
struct Entries {
    map: HashMap<String, Entry>,
    next_sweep: Option<Instant>,
}

/// In-process cache store. Expired entries read as absent; they are dropped
/// when read and swept from the whole map on writes at most once per interval.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<Entries>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let now = Instant::now();
        {
            let entries = self.entries.read().await;
            match entries.map.get(key) {
                None => return Ok(None),
                Some(entry) if entry.expires_at > now => return Ok(Some(entry.value.clone())),
                Some(_) => {}
            }
        }

        let mut entries = self.entries.write().await;
        if entries.map.get(key).is_some_and(|entry| entry.expires_at <= now) {
            entries.map.remove(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), CacheError> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        if entries.next_sweep.is_none_or(|at| now >= at) {
            let before = entries.map.len();
            entries.map.retain(|_, entry| entry.expires_at > now);
            let swept = before - entries.map.len();
            if swept > 0 {
                debug!(swept, "dropped expired cache entries");
            }
            entries.next_sweep = Some(now + SWEEP_INTERVAL);
        }

        let entry = Entry {
            value: value.to_vec(),
            expires_at: now + ttl,
        };
        entries.map.insert(key.to_string(), entry);
        Ok(())
    }
}
