use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Instant;

/// Unique identifier for a registered instance; survives address reuse.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct InstanceId(pub String);

impl InstanceId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl Default for InstanceId {
    fn default() -> Self {
        Self::new()
    }
}

/// One advertised service instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceInstance {
    pub id: InstanceId,
    /// Service name this instance is registered under.
    pub service: String,
    /// UDP address keepalive frames are exchanged on.
    pub udp_addr: SocketAddr,
    /// HTTP address peers connect to.
    pub http_addr: SocketAddr,

    /// Local receipt time of the last frame from this instance; the lease
    /// clock. Never sent over the wire.
    #[serde(skip)]
    pub last_seen: Option<Instant>,
}

/// Wire protocol for registry traffic, bincode-encoded over UDP.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RegistryMessage {
    /// Full advertisement, sent on join and to previously unknown peers.
    Register { instance: ServiceInstance },

    /// Lease renewal from an already-known instance.
    Keepalive { from: InstanceId },

    /// Reply carrying the sender's complete view of the cluster.
    Ack {
        from: InstanceId,
        instances: Vec<ServiceInstance>,
    },
}
