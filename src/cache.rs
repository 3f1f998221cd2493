use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::sync::Mutex;

use crate::Result;

#[derive(Clone, Debug)]
struct CacheEntry<V> {
    value: V,
    computed_at: u64,
}

/// Keyed store of computed view results, each kept for a fixed freshness
/// window. Entries are overwritten whole on recompute.
#[derive(Debug)]
pub struct TtlCache<V> {
    ttl_seconds: u64,
    entries: HashMap<String, CacheEntry<V>>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(ttl_seconds: u64) -> Self {
        Self {
            ttl_seconds,
            entries: HashMap::new(),
        }
    }

    /// Fresh iff `now - computed_at < ttl_seconds`. A TTL of zero never
    /// serves from the cache.
    pub fn get(&self, key: &str, now: u64) -> Option<V> {
        let entry = self.entries.get(key)?;
        (now.saturating_sub(entry.computed_at) < self.ttl_seconds).then(|| entry.value.clone())
    }

    pub fn insert(&mut self, key: String, value: V, now: u64) {
        self.entries.insert(
            key,
            CacheEntry {
                value,
                computed_at: now,
            },
        );
    }

    #[cfg(test)]
    fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }
}

/// Cloneable handle to a [`TtlCache`] shared across concurrent view calls.
#[derive(Clone)]
pub struct SharedCache<V> {
    inner: Arc<Mutex<TtlCache<V>>>,
}

impl<V: Clone> SharedCache<V> {
    pub fn new(ttl_seconds: u64) -> Self {
        Self {
            inner: Arc::new(Mutex::new(TtlCache::new(ttl_seconds))),
        }
    }

    pub async fn get(&self, key: &str) -> Option<V> {
        self.inner.lock().await.get(key, now_epoch_seconds())
    }

    pub async fn insert(&self, key: impl Into<String>, value: V) {
        self.inner
            .lock()
            .await
            .insert(key.into(), value, now_epoch_seconds());
    }

    /// Returns the stored value while fresh, otherwise runs `compute` and
    /// stores its result. No single-flight: callers racing on a missing or
    /// expired key may all run `compute`; the last write wins. A failed
    /// compute is not stored and leaves any prior value untouched.
    pub async fn get_or_try_compute<F, Fut>(&self, key: &str, compute: F) -> Result<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>>,
    {
        if let Some(hit) = self.inner.lock().await.get(key, now_epoch_seconds()) {
            return Ok(hit);
        }
        let value = compute().await?;
        self.inner
            .lock()
            .await
            .insert(key.to_string(), value.clone(), now_epoch_seconds());
        Ok(value)
    }
}

pub(crate) fn now_epoch_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_enforces_ttl() {
        let mut cache = TtlCache::new(15);
        cache.insert("counts".to_string(), 3u64, 100);

        assert_eq!(cache.get("counts", 100), Some(3));
        assert_eq!(cache.get("counts", 114), Some(3));
        assert_eq!(cache.get("counts", 115), None);
    }

    #[test]
    fn zero_ttl_never_serves() {
        let mut cache = TtlCache::new(0);
        cache.insert("k".to_string(), 1u64, 10);
        assert_eq!(cache.get("k", 10), None);
    }

    #[test]
    fn recompute_overwrites_whole_entry() {
        let mut cache = TtlCache::new(15);
        cache.insert("k".to_string(), 1u64, 10);
        cache.insert("k".to_string(), 2u64, 40);
        assert_eq!(cache.get("k", 41), Some(2));
    }

    #[tokio::test]
    async fn shared_cache_round_trips_values() {
        let cache = SharedCache::new(60);
        assert_eq!(cache.get("k").await, None);
        cache.insert("k", 9u64).await;
        assert_eq!(cache.get("k").await, Some(9));
    }

    #[tokio::test]
    async fn fresh_entry_skips_compute() {
        let cache = SharedCache::new(60);
        let first = cache
            .get_or_try_compute("k", || async { Ok(7u64) })
            .await
            .unwrap();
        assert_eq!(first, 7);

        let second = cache
            .get_or_try_compute("k", || async {
                panic!("compute must not run within the ttl")
            })
            .await
            .unwrap();
        assert_eq!(second, 7);
    }

    #[tokio::test]
    async fn failed_compute_is_not_stored() {
        let cache = SharedCache::<u64>::new(0);
        let result = cache
            .get_or_try_compute("k", || async {
                Err(crate::GateviewError::Config("boom".to_string()))
            })
            .await;
        assert!(result.is_err());
        assert!(!cache.inner.lock().await.contains("k"));
    }
}
