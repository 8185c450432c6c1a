//! Immutable byte-valued cache entries.

use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// An immutable view of a cached value: a byte sequence plus the absolute
/// instant at which it expires.
///
/// Views are what the cache hands out to callers and what crosses the peer
/// RPC boundary. `bytes()` returns a defensive copy so no caller can mutate
/// cached state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ByteView {
    bytes: Vec<u8>,
    expire: SystemTime,
}

impl ByteView {
    pub fn new(bytes: Vec<u8>, expire: SystemTime) -> Self {
        Self { bytes, expire }
    }

    /// Builds a view from an expiry expressed as Unix seconds, the form used
    /// on the peer RPC wire.
    pub fn with_unix_expire(bytes: Vec<u8>, expire_unix: i64) -> Self {
        let expire = UNIX_EPOCH + Duration::from_secs(expire_unix.max(0) as u64);
        Self { bytes, expire }
    }

    /// Number of bytes held by the view.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn expire(&self) -> SystemTime {
        self.expire
    }

    /// The expiry as Unix seconds, for the peer RPC wire.
    pub fn expire_unix(&self) -> i64 {
        self.expire
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0)
    }

    /// Returns a copy of the underlying bytes.
    pub fn bytes(&self) -> Vec<u8> {
        self.bytes.clone()
    }
}

impl fmt::Display for ByteView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.bytes))
    }
}
