//! Short-lived response cache.
//!
//! Stands in for the host platform's transient store: values expire after a
//! per-entry TTL and a missing or expired key is a plain miss.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Duration, Utc};
use lru::LruCache;
use serde_json::Value;

use crate::clock::Clock;

/// Key-value store whose entries expire.
pub trait TransientStore: Send + Sync {
    /// Returns the value if present and not yet expired.
    fn get(&self, key: &str) -> Option<Value>;

    /// Stores `value` for `ttl`, replacing any previous entry.
    fn set(&self, key: &str, value: Value, ttl: Duration);

    /// Drops an entry. Returns whether a live entry was removed.
    fn delete(&self, key: &str) -> bool;
}

#[derive(Debug, Clone)]
struct CachedValue {
    value: Value,
    expires_at: DateTime<Utc>,
}

/// In-process [`TransientStore`] bounded by an LRU policy.
pub struct MemoryTransientStore {
    entries: Mutex<LruCache<String, CachedValue>>,
    clock: Arc<dyn Clock>,
}

impl MemoryTransientStore {
    pub fn new(capacity: NonZeroUsize, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            clock,
        }
    }

    /// Number of stored entries, expired ones included until they are touched.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TransientStore for MemoryTransientStore {
    fn get(&self, key: &str) -> Option<Value> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);

        let lookup = entries
            .get(key)
            .map(|entry| (now < entry.expires_at).then(|| entry.value.clone()));

        match lookup {
            Some(Some(value)) => Some(value),
            Some(None) => {
                entries.pop(key);
                None
            }
            None => None,
        }
    }

    fn set(&self, key: &str, value: Value, ttl: Duration) {
        let expires_at = self.clock.now() + ttl;
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .put(key.to_string(), CachedValue { value, expires_at });
    }

    fn delete(&self, key: &str) -> bool {
        let now = self.clock.now();
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop(key)
            .is_some_and(|entry| now < entry.expires_at)
    }
}
