use crate::config::CacheConfig;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

// Errors raised by cache writes
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Cache lock error: {0}")]
    LockError(String),
    #[error("Invalid cache key: {0}")]
    InvalidKey(String),
}

// Stored value plus bookkeeping used for expiry and eviction
#[derive(Debug, Clone)]
struct CacheEntry<T> {
    value: T,
    created_at: Instant,
    access_count: u64,
}

impl<T: Clone> CacheEntry<T> {
    fn new(value: T) -> Self {
        Self {
            value,
            created_at: Instant::now(),
            access_count: 1,
        }
    }

    fn is_expired(&self, ttl: Duration) -> bool {
        self.created_at.elapsed() > ttl
    }

    fn access(&mut self) -> T {
        self.access_count += 1;
        self.value.clone()
    }
}

/// Memoizing store for remote lookups, keyed by resource URL.
///
/// Writes are idempotent: two tasks racing on the same key both fetch and the
/// second insert simply replaces an equal value.
pub trait CacheTrait<T>: Send + Sync
where
    T: Clone + Send + Sync,
{
    fn get(&self, key: &str) -> Option<T>;
    fn insert(&self, key: String, value: T) -> Result<(), CacheError>;
    fn size(&self) -> usize;
    fn stats(&self) -> CacheStats;
    fn cleanup_expired(&self);
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub inserts: u64,
    pub evictions: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        if self.hits + self.misses == 0 {
            0.0
        } else {
            self.hits as f64 / (self.hits + self.misses) as f64
        }
    }
}

pub struct InmemoryCache<T>
where
    T: Clone + Send + Sync,
{
    store: Arc<Mutex<HashMap<String, CacheEntry<T>>>>,
    stats: Arc<Mutex<CacheStats>>,
    max_size: usize,
    ttl: Duration,
}

impl<T> InmemoryCache<T>
where
    T: Clone + Send + Sync,
{
    pub fn new(config: &CacheConfig) -> Self {
        tracing::debug!(
            "Initializing response cache with max_size: {}, expiration: {}s",
            config.max_size,
            config.expiration
        );

        Self {
            store: Arc::new(Mutex::new(HashMap::new())),
            stats: Arc::new(Mutex::new(CacheStats::default())),
            max_size: config.max_size.max(1) as usize,
            ttl: Duration::from_secs(config.expiration as u64),
        }
    }

    fn record(&self, update: impl FnOnce(&mut CacheStats)) {
        if let Ok(mut stats) = self.stats.lock() {
            update(&mut stats);
        }
    }

    // Drops the oldest entry, preferring the least accessed one on ties
    fn evict_oldest(&self, store: &mut HashMap<String, CacheEntry<T>>) {
        let oldest = store
            .iter()
            .min_by(|a, b| {
                a.1.created_at
                    .cmp(&b.1.created_at)
                    .then_with(|| a.1.access_count.cmp(&b.1.access_count))
            })
            .map(|(key, _)| key.clone());

        if let Some(key) = oldest {
            store.remove(&key);
            tracing::trace!("Evicted cache entry: {}", key);
            self.record(|stats| stats.evictions += 1);
        }
    }
}

impl<T> CacheTrait<T> for InmemoryCache<T>
where
    T: Clone + Send + Sync,
{
    fn get(&self, key: &str) -> Option<T> {
        if key.is_empty() {
            return None;
        }

        let mut store = match self.store.lock() {
            Ok(store) => store,
            Err(e) => {
                tracing::error!("Failed to acquire cache lock for key {}: {}", key, e);
                return None;
            }
        };

        let ttl = self.ttl;
        let hit = store
            .get_mut(key)
            .and_then(|entry| (!entry.is_expired(ttl)).then(|| entry.access()));

        if hit.is_some() {
            tracing::trace!("Cache hit for key: {}", key);
        } else if store.remove(key).is_some() {
            tracing::trace!("Cache entry expired for key: {}", key);
        } else {
            tracing::trace!("Cache miss for key: {}", key);
        }
        drop(store);

        match hit {
            Some(_) => self.record(|stats| stats.hits += 1),
            None => self.record(|stats| stats.misses += 1),
        }
        hit
    }

    fn insert(&self, key: String, value: T) -> Result<(), CacheError> {
        if key.is_empty() {
            return Err(CacheError::InvalidKey("key cannot be empty".to_string()));
        }

        let mut store = self.store.lock().map_err(|e| {
            let msg = format!("Failed to acquire cache write lock: {}", e);
            tracing::error!("{}", msg);
            CacheError::LockError(msg)
        })?;

        if store.len() >= self.max_size && !store.contains_key(&key) {
            self.evict_oldest(&mut store);
        }
        store.insert(key, CacheEntry::new(value));
        drop(store);

        self.record(|stats| stats.inserts += 1);
        Ok(())
    }

    fn size(&self) -> usize {
        self.store.lock().map(|store| store.len()).unwrap_or(0)
    }

    fn stats(&self) -> CacheStats {
        self.stats
            .lock()
            .map(|stats| stats.clone())
            .unwrap_or_default()
    }

    fn cleanup_expired(&self) {
        let Ok(mut store) = self.store.lock() else {
            tracing::error!("Failed to acquire lock for cache cleanup");
            return;
        };
        let before = store.len();
        store.retain(|_, entry| !entry.is_expired(self.ttl));
        let removed = before - store.len();
        drop(store);

        if removed > 0 {
            tracing::debug!("Cleaned up {} expired cache entries", removed);
            self.record(|stats| stats.evictions += removed as u64);
        }
    }
}
