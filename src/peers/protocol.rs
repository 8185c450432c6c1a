//! Inter-node HTTP API: endpoint paths and DTOs.
//!
//! Values travel as raw bytes: reads respond with `application/octet-stream`
//! bodies, writes carry the bytes inside a JSON envelope together with the
//! expiry (Unix seconds) and the target tier.

use serde::{Deserialize, Serialize};

// --- API Endpoints ---

/// Public read surface: `/cache/:group/:key` returns the raw value bytes.
pub const ENDPOINT_CACHE: &str = "/cache";
/// Internal peer read: runs the authoritative read path on the owning node.
pub const ENDPOINT_PEER_GET: &str = "/internal/get";
/// Internal peer write.
pub const ENDPOINT_PEER_SET: &str = "/internal/set";
/// Node health and cache statistics.
pub const ENDPOINT_STATS: &str = "/health/stats";

// --- Data Transfer Objects ---

/// Payload for a peer write.
#[derive(Debug, Serialize, Deserialize)]
pub struct SetRequest {
    pub group: String,
    pub key: String,
    /// Raw value bytes.
    pub value: Vec<u8>,
    /// Absolute expiry as Unix seconds.
    pub expire_unix: i64,
    /// `true` targets the receiver's hot tier, `false` its main tier.
    pub is_hot: bool,
}

/// Acknowledgment for a peer write.
#[derive(Debug, Serialize, Deserialize)]
pub struct SetResponse {
    pub success: bool,
}

/// Per-group tier sizes reported by `/health/stats`.
#[derive(Debug, Serialize, Deserialize)]
pub struct GroupStatsEntry {
    pub name: String,
    pub main_entries: usize,
    pub hot_entries: usize,
}

/// Response format for `/health/stats`.
#[derive(Debug, Serialize, Deserialize)]
pub struct NodeStatsResponse {
    pub node_id: String,
    pub service: String,
    pub http_addr: String,
    pub alive_peers: usize,
    pub peers: Vec<String>,
    pub groups: Vec<GroupStatsEntry>,
    pub cpu_usage: f32,
    pub mem_used_mb: u64,
    pub mem_total_mb: u64,
}
