//! In-process cache store.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::cache::CacheStore;

/// Cache store that keeps entries in memory.
///
/// Unbounded by default. A bounded cache evicts the oldest inserted key once
/// it is full; overwriting an existing key does not change its position.
/// Clones share the same entries.
///
/// # Example
///
/// ```
/// use post_parser::{CacheStore, MemoryCache};
///
/// # async fn example() {
/// let cache = MemoryCache::bounded(1000);
/// cache.set("12", "<p>rendered</p>".into()).await;
/// assert_eq!(cache.get("12").await.as_deref(), Some("<p>rendered</p>"));
/// # }
/// ```
#[derive(Clone, Default)]
pub struct MemoryCache {
    inner: Arc<RwLock<Entries>>,
}

#[derive(Default)]
struct Entries {
    map: HashMap<String, String>,
    order: VecDeque<String>,
    capacity: Option<usize>,
}

impl MemoryCache {
    /// Create an unbounded cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cache holding at most `capacity` entries.
    pub fn bounded(capacity: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Entries {
                capacity: Some(capacity),
                ..Entries::default()
            })),
        }
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.map.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.map.is_empty()
    }

    /// Drop every entry.
    pub async fn clear(&self) {
        let mut entries = self.inner.write().await;
        entries.map.clear();
        entries.order.clear();
    }
}

impl CacheStore for MemoryCache {
    async fn get(&self, key: &str) -> Option<String> {
        self.inner.read().await.map.get(key).cloned()
    }

    async fn set(&self, key: &str, value: String) {
        let mut entries = self.inner.write().await;
        if entries.capacity == Some(0) {
            return;
        }
        if entries.map.insert(key.to_string(), value).is_some() {
            return;
        }
        entries.order.push_back(key.to_string());

        if let Some(capacity) = entries.capacity {
            while entries.map.len() > capacity {
                let Some(oldest) = entries.order.pop_front() else {
                    break;
                };
                entries.map.remove(&oldest);
                tracing::debug!("Evicted cached content for {oldest}");
            }
        }
    }

    async fn remove(&self, key: &str) {
        let mut entries = self.inner.write().await;
        if entries.map.remove(key).is_some() {
            entries.order.retain(|k| k != key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_then_get() {
        let cache = MemoryCache::new();
        assert!(cache.is_empty().await);
        cache.set("1", "one".into()).await;
        assert_eq!(cache.get("1").await.as_deref(), Some("one"));
        assert_eq!(cache.get("2").await, None);
    }

    #[tokio::test]
    async fn set_overwrites() {
        let cache = MemoryCache::new();
        cache.set("1", "old".into()).await;
        cache.set("1", "new".into()).await;
        assert_eq!(cache.get("1").await.as_deref(), Some("new"));
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn remove_invalidates() {
        let cache = MemoryCache::new();
        cache.set("1", "one".into()).await;
        cache.remove("1").await;
        assert_eq!(cache.get("1").await, None);
        cache.remove("missing").await;
    }

    #[tokio::test]
    async fn bounded_evicts_oldest() {
        let cache = MemoryCache::bounded(2);
        cache.set("a", "1".into()).await;
        cache.set("b", "2".into()).await;
        cache.set("a", "1b".into()).await;
        cache.set("c", "3".into()).await;

        assert_eq!(cache.len().await, 2);
        assert_eq!(cache.get("a").await, None);
        assert_eq!(cache.get("b").await.as_deref(), Some("2"));
        assert_eq!(cache.get("c").await.as_deref(), Some("3"));
    }

    #[tokio::test]
    async fn removed_key_does_not_count_against_capacity() {
        let cache = MemoryCache::bounded(2);
        cache.set("a", "1".into()).await;
        cache.set("b", "2".into()).await;
        cache.remove("a").await;
        cache.set("c", "3".into()).await;

        assert_eq!(cache.get("b").await.as_deref(), Some("2"));
        assert_eq!(cache.get("c").await.as_deref(), Some("3"));
    }

    #[tokio::test]
    async fn zero_capacity_stores_nothing() {
        let cache = MemoryCache::bounded(0);
        cache.set("a", "1".into()).await;
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn clones_share_entries() {
        let cache = MemoryCache::new();
        let other = cache.clone();
        cache.set("k", "v".into()).await;
        assert_eq!(other.get("k").await.as_deref(), Some("v"));
        other.clear().await;
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn concurrent_writers_do_not_corrupt() {
        let cache = MemoryCache::new();
        let futs = (0..50).map(|i| {
            let cache = cache.clone();
            async move { cache.set(&format!("k{}", i % 5), format!("v{i}")).await }
        });
        futures::future::join_all(futs).await;
        assert_eq!(cache.len().await, 5);
    }
}
