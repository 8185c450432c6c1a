//! A single cache tier: a lazily created LRU store behind a mutex.
//!
//! Groups hold two of these (main and hot). The underlying store is only
//! allocated on first write, so a group configured with an unused hot tier
//! costs nothing. All operations are bounded CPU work; the lock is never
//! held across a suspension point.

use std::sync::{Mutex, PoisonError};
use std::time::{Duration, SystemTime};

use super::byteview::ByteView;
use super::lru::LruCache;

pub struct CacheTier {
    inner: Mutex<Option<LruCache>>,
    cache_bytes: usize,
    expire_jitter: Duration,
}

impl CacheTier {
    pub fn new(cache_bytes: usize, expire_jitter: Duration) -> Self {
        Self {
            inner: Mutex::new(None),
            cache_bytes,
            expire_jitter,
        }
    }

    pub fn add(&self, key: &str, value: ByteView, expire: SystemTime) {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let cache = guard.get_or_insert_with(|| {
            let mut cache = LruCache::new(self.cache_bytes, None);
            cache.set_expire_jitter(self.expire_jitter);
            cache
        });
        cache.add(key, value, expire);
    }

    pub fn get(&self, key: &str) -> Option<ByteView> {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        guard.as_mut()?.get(key)
    }

    pub fn len(&self) -> usize {
        let guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        guard.as_ref().map(|cache| cache.len()).unwrap_or(0)
    }

    pub fn used_bytes(&self) -> usize {
        let guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        guard.as_ref().map(|cache| cache.used_bytes()).unwrap_or(0)
    }
}
