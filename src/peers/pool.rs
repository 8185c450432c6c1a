//! Peer pool: the consistent-hash ring plus one client per remote peer.
//!
//! The pool is rebuilt whenever the registry observes a membership change;
//! `set_peers` swaps both the ring contents and the client table in place.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use super::client::HttpPeerClient;
use super::{PeerClient, PeerPicker};
use crate::ring::hash_ring::HashRing;

pub struct HttpPeerPool {
    /// This node's own HTTP address; keys the ring maps here are served locally.
    self_addr: String,
    ring: HashRing,
    clients: RwLock<HashMap<String, Arc<HttpPeerClient>>>,
    rpc_timeout: Duration,
}

impl HttpPeerPool {
    pub fn new(self_addr: String, replicas: usize, rpc_timeout: Duration) -> Arc<Self> {
        Arc::new(Self {
            self_addr,
            ring: HashRing::new(replicas),
            clients: RwLock::new(HashMap::new()),
            rpc_timeout,
        })
    }

    /// Replaces the peer set. `addrs` must include this node's own address so
    /// the ring can assign it keys.
    pub fn set_peers<S: AsRef<str>>(&self, addrs: &[S]) {
        self.ring.reset(addrs);

        let mut clients = self.clients.write().unwrap_or_else(PoisonError::into_inner);
        clients.clear();
        for addr in addrs {
            let addr = addr.as_ref();
            if addr == self.self_addr {
                continue;
            }
            clients.insert(
                addr.to_string(),
                Arc::new(HttpPeerClient::new(addr.to_string(), self.rpc_timeout)),
            );
        }

        tracing::info!(
            "peer pool updated: {} peer(s), {} remote",
            addrs.len(),
            clients.len()
        );
    }

    pub fn self_addr(&self) -> &str {
        &self.self_addr
    }
}

impl PeerPicker for HttpPeerPool {
    fn pick_peer(&self, key: &str) -> Option<Arc<dyn PeerClient>> {
        let owner = self.ring.get(key)?;
        if owner == self.self_addr {
            return None;
        }

        let clients = self.clients.read().unwrap_or_else(PoisonError::into_inner);
        match clients.get(&owner) {
            Some(client) => {
                let client: Arc<dyn PeerClient> = client.clone();
                Some(client)
            }
            None => {
                // Ring and client table are swapped under separate locks; a
                // reader can land between the two swaps. Serve locally.
                tracing::warn!("no client for ring owner {owner}, serving locally");
                None
            }
        }
    }
}
