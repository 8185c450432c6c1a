//! Peer Transport Module
//!
//! Connects the node-local cache engine to the rest of the cluster.
//!
//! ## Core Pieces
//! - **Contracts**: `PeerPicker` (which peer owns a key) and `PeerClient`
//!   (fetch/store a key on that peer). The group layer depends only on these
//!   two traits; any transport satisfying them is valid.
//! - **`pool`**: `HttpPeerPool` maps keys to peers through the consistent-hash
//!   ring and hands out one HTTP client per remote peer.
//! - **`client`**: `HttpPeerClient`, a reqwest-based adapter with per-call
//!   timeout and bounded retry.
//! - **`protocol`**: endpoint constants and DTOs for the inter-node HTTP API.
//! - **`handlers`**: axum handlers exposing the cache over HTTP, both the
//!   public read surface and the internal peer RPCs.

pub mod client;
pub mod handlers;
pub mod pool;
pub mod protocol;

#[cfg(test)]
mod tests;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::Result;

/// Boxed future returned by peer RPCs.
pub type PeerFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// A handle to one remote peer. Timeouts, retries and connection pooling are
/// the implementation's concern; the core never retries on its own.
pub trait PeerClient: Send + Sync {
    /// Fetches the value for `key` in `group` from the peer.
    fn get<'a>(&'a self, group: &'a str, key: &'a str) -> PeerFuture<'a, Vec<u8>>;

    /// Stores a value on the peer, addressed at its main or hot tier.
    fn set<'a>(
        &'a self,
        group: &'a str,
        key: &'a str,
        value: Vec<u8>,
        expire_unix: i64,
        is_hot: bool,
    ) -> PeerFuture<'a, ()>;
}

/// Maps a key to the peer that owns it.
///
/// Contract: returns `None` iff no peers are registered or the current node
/// owns the key. The group layer relies on `None` meaning "serve locally".
pub trait PeerPicker: Send + Sync {
    fn pick_peer(&self, key: &str) -> Option<Arc<dyn PeerClient>>;
}
