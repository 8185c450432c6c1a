//! Size-bounded LRU store with per-entry TTL.
//!
//! ## Mechanism
//! - **Recency**: A `VecDeque` tracks access order (front = most recently
//!   used); a `HashMap` holds the entries themselves. Both always contain the
//!   same key set.
//! - **Budget**: The store accounts `len(key) + value.len()` bytes per entry
//!   and evicts from the LRU end until the configured budget is satisfied.
//! - **Expiry**: Every entry carries an effective expiry = caller expiry plus
//!   a random jitter, which de-synchronizes mass expiry across entries that
//!   were inserted together. Expired entries are removed at read time.
//! - **Sliding TTL**: A hit renews the entry's lifetime by its original
//!   window, so frequently read keys stay resident longer.

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, SystemTime};

use rand::Rng;

use super::byteview::ByteView;

/// Default width of the random window added to every entry's expiry.
pub const DEFAULT_EXPIRE_JITTER: Duration = Duration::from_secs(180);

/// Invoked with the key and value of every entry leaving the store, whether
/// by budget eviction, explicit removal, or expiry at read.
pub type EvictionCallback = Box<dyn Fn(&str, &ByteView) + Send + Sync>;

/// Clock source; replaced in tests to drive expiry deterministically.
pub type NowFn = Box<dyn Fn() -> SystemTime + Send + Sync>;

struct Entry {
    value: ByteView,
    expires_at: SystemTime,
    inserted_at: SystemTime,
}

/// A byte-budgeted LRU cache. Not internally synchronized; callers wrap it in
/// a lock (see `CacheTier`).
pub struct LruCache {
    max_bytes: usize,
    used_bytes: usize,
    entries: HashMap<String, Entry>,
    /// Access order, front = most recently used.
    order: VecDeque<String>,
    on_evicted: Option<EvictionCallback>,
    expire_jitter: Duration,
    now: NowFn,
}

impl LruCache {
    /// Creates a cache with the given byte budget. `max_bytes == 0` means
    /// unbounded.
    pub fn new(max_bytes: usize, on_evicted: Option<EvictionCallback>) -> Self {
        Self {
            max_bytes,
            used_bytes: 0,
            entries: HashMap::new(),
            order: VecDeque::new(),
            on_evicted,
            expire_jitter: DEFAULT_EXPIRE_JITTER,
            now: Box::new(SystemTime::now),
        }
    }

    /// Overrides the jitter window. Zero disables jitter entirely.
    pub fn set_expire_jitter(&mut self, jitter: Duration) {
        self.expire_jitter = jitter;
    }

    /// Overrides the clock source.
    pub fn set_now(&mut self, now: NowFn) {
        self.now = now;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bytes currently accounted for across all entries.
    pub fn used_bytes(&self) -> usize {
        self.used_bytes
    }

    /// Looks up a key. An entry whose effective expiry lies strictly before
    /// now is removed (firing the eviction callback) and reported as a miss.
    /// A hit promotes the entry to most-recently-used and renews its expiry
    /// by the window it was inserted with.
    pub fn get(&mut self, key: &str) -> Option<ByteView> {
        let now = (self.now)();

        let expired = match self.entries.get(key) {
            Some(entry) => entry.expires_at < now,
            None => return None,
        };
        if expired {
            self.remove(key);
            return None;
        }

        if let Some(entry) = self.entries.get_mut(key) {
            let window = entry
                .expires_at
                .duration_since(entry.inserted_at)
                .unwrap_or_default();
            entry.expires_at = now + window;
            entry.inserted_at = now;
            let value = entry.value.clone();
            self.touch(key);
            return Some(value);
        }
        None
    }

    /// Inserts or updates an entry. The stored expiry is `expire` plus a
    /// random jitter from `[0, expire_jitter)`. Updating an existing key
    /// adjusts the byte count by the value-length delta and promotes the
    /// entry. Inserting past the budget evicts from the LRU end until the
    /// budget is satisfied again.
    pub fn add(&mut self, key: &str, value: ByteView, expire: SystemTime) {
        let effective = expire + self.random_jitter();

        if let Some(entry) = self.entries.get_mut(key) {
            self.used_bytes = self.used_bytes - entry.value.len() + value.len();
            entry.value = value;
            entry.expires_at = effective;
            self.touch(key);
        } else {
            self.used_bytes += key.len() + value.len();
            self.entries.insert(
                key.to_string(),
                Entry {
                    value,
                    expires_at: effective,
                    inserted_at: (self.now)(),
                },
            );
            self.order.push_front(key.to_string());
        }

        while self.max_bytes > 0 && self.used_bytes > self.max_bytes {
            self.remove_oldest();
        }
    }

    /// Removes a key if present, firing the eviction callback.
    pub fn remove(&mut self, key: &str) {
        if let Some(entry) = self.entries.remove(key) {
            if let Some(pos) = self.order.iter().position(|k| k == key) {
                self.order.remove(pos);
            }
            self.used_bytes -= key.len() + entry.value.len();
            if let Some(on_evicted) = &self.on_evicted {
                on_evicted(key, &entry.value);
            }
        }
    }

    /// Evicts the least recently used entry, firing the eviction callback.
    pub fn remove_oldest(&mut self) {
        if let Some(key) = self.order.pop_back()
            && let Some(entry) = self.entries.remove(&key)
        {
            self.used_bytes -= key.len() + entry.value.len();
            if let Some(on_evicted) = &self.on_evicted {
                on_evicted(&key, &entry.value);
            }
        }
    }

    fn touch(&mut self, key: &str) {
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            self.order.remove(pos);
        }
        self.order.push_front(key.to_string());
    }

    fn random_jitter(&self) -> Duration {
        let window_ms = self.expire_jitter.as_millis() as u64;
        if window_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::thread_rng().gen_range(0..window_ms))
    }
}
