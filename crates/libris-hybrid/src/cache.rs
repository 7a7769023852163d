//! Bounded LRU memo for pure functions of the query string (embeddings,
//! expansions). Keys are the exact input text.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use lru::LruCache;

pub struct QueryMemo<V> {
    /// `None` when memoization is disabled (capacity 0).
    entries: Option<Mutex<LruCache<String, V>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<V: Clone> QueryMemo<V> {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: NonZeroUsize::new(capacity).map(|c| Mutex::new(LruCache::new(c))),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn get(&self, key: &str) -> Option<V> {
        let entries = self.entries.as_ref()?;
        let found = entries.lock().unwrap_or_else(PoisonError::into_inner).get(key).cloned();
        let counter = if found.is_some() { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
        found
    }

    pub fn put(&self, key: &str, value: V) {
        if let Some(entries) = &self.entries {
            entries.lock().unwrap_or_else(PoisonError::into_inner).put(key.to_string(), value);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.as_ref().map_or(0, |e| e.lock().unwrap_or_else(PoisonError::into_inner).len())
    }

    pub fn is_empty(&self) -> bool { self.len() == 0 }

    /// `(hits, misses)` since creation.
    pub fn stats(&self) -> (u64, u64) { (self.hits.load(Ordering::Relaxed), self.misses.load(Ordering::Relaxed)) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evicts_least_recently_used() {
        let memo = QueryMemo::new(2);
        memo.put("a", 1);
        memo.put("b", 2);
        assert_eq!(memo.get("a"), Some(1));
        memo.put("c", 3);
        assert_eq!(memo.get("b"), None);
        assert_eq!(memo.get("a"), Some(1));
        assert_eq!(memo.get("c"), Some(3));
        assert_eq!(memo.len(), 2);
        assert_eq!(memo.stats(), (3, 1));
    }

    #[test]
    fn zero_capacity_disables_memoization() {
        let memo = QueryMemo::new(0);
        memo.put("a", 1);
        assert_eq!(memo.get("a"), None);
        assert!(memo.is_empty());
    }

    #[test]
    fn keys_are_exact_strings() {
        let memo = QueryMemo::new(4);
        memo.put("Banach", vec![1.0f32]);
        assert!(memo.get("banach").is_none());
        assert!(memo.get("Banach ").is_none());
    }
}
