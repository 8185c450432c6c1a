//! The consistent-hash ring data structure.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Ring hash function. Must be deterministic and identical on every node.
pub type HashFn = fn(&[u8]) -> u32;

fn crc32_hash(data: &[u8]) -> u32 {
    crc32fast::hash(data)
}

#[derive(Default)]
struct RingState {
    /// Virtual-node positions, kept sorted ascending.
    positions: Vec<u32>,
    /// Position -> owning peer identity.
    owners: HashMap<u32, String>,
}

/// A consistent-hash ring with virtual nodes.
///
/// The virtual-node key for peer `p` at index `i` is `format!("{i}{p}")`, for
/// insertion and removal alike; using different keys on the two paths would
/// leave orphaned positions behind every `remove`.
pub struct HashRing {
    replicas: usize,
    hash: HashFn,
    state: RwLock<RingState>,
}

impl HashRing {
    /// Creates a ring with CRC32 hashing and `replicas` virtual nodes per peer.
    pub fn new(replicas: usize) -> Self {
        Self::with_hash(replicas, crc32_hash)
    }

    /// Creates a ring with a custom hash function.
    pub fn with_hash(replicas: usize, hash: HashFn) -> Self {
        Self {
            replicas,
            hash,
            state: RwLock::new(RingState::default()),
        }
    }

    /// Adds peers to the ring.
    pub fn add<S: AsRef<str>>(&self, peers: &[S]) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        for peer in peers {
            let peer = peer.as_ref();
            for i in 0..self.replicas {
                let position = (self.hash)(format!("{i}{peer}").as_bytes());
                state.positions.push(position);
                state.owners.insert(position, peer.to_string());
            }
        }
        state.positions.sort_unstable();
    }

    /// Removes a peer's virtual nodes from the ring.
    pub fn remove(&self, peer: &str) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        for i in 0..self.replicas {
            let position = (self.hash)(format!("{i}{peer}").as_bytes());
            if let Ok(idx) = state.positions.binary_search(&position) {
                state.positions.remove(idx);
            }
            state.owners.remove(&position);
        }
    }

    /// Replaces the entire peer set in one step; readers never observe an
    /// intermediate ring.
    pub fn reset<S: AsRef<str>>(&self, peers: &[S]) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.positions.clear();
        state.owners.clear();
        for peer in peers {
            let peer = peer.as_ref();
            for i in 0..self.replicas {
                let position = (self.hash)(format!("{i}{peer}").as_bytes());
                state.positions.push(position);
                state.owners.insert(position, peer.to_string());
            }
        }
        state.positions.sort_unstable();
    }

    /// Returns the peer owning `key`, or `None` on an empty ring.
    pub fn get(&self, key: &str) -> Option<String> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        if state.positions.is_empty() {
            return None;
        }

        let hash = (self.hash)(key.as_bytes());
        // First position >= hash, wrapping to the start of the ring.
        let idx = match state.positions.binary_search(&hash) {
            Ok(idx) => idx,
            Err(idx) => idx,
        };
        let idx = if idx == state.positions.len() { 0 } else { idx };
        state.owners.get(&state.positions[idx]).cloned()
    }

    pub fn is_empty(&self) -> bool {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .positions
            .is_empty()
    }

    /// Number of virtual-node positions on the ring.
    pub fn len(&self) -> usize {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .positions
            .len()
    }
}
