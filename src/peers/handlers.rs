//! HTTP handlers for the cache surface.
//!
//! Three surfaces share one router:
//! - the public read path (`/cache/:group/:key`), returning raw value bytes,
//! - the internal peer RPCs (`/internal/get`, `/internal/set`),
//! - the node health surface (`/health/stats`).
//!
//! Handlers translate HTTP into group calls; routing decisions (local vs
//! remote) live entirely inside the group layer.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use sysinfo::{CpuExt, System, SystemExt};

use super::protocol::{GroupStatsEntry, NodeStatsResponse, SetRequest, SetResponse};
use crate::cache::byteview::ByteView;
use crate::cache::group;
use crate::error::CacheError;
use crate::registry::service::RegistryService;

/// Public read surface. Serves the full read path: local tiers, then the
/// owning peer or the origin loader.
pub async fn handle_cache_get(Path((group_name, key)): Path<(String, String)>) -> Response {
    let Some(group) = group::lookup(&group_name) else {
        return CacheError::GroupNotFound(group_name).into_response();
    };

    match group.get(&key).await {
        Ok(view) => (
            [(header::CONTENT_TYPE, "application/octet-stream")],
            view.bytes(),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("cache get {}/{} failed: {}", group.name(), key, e);
            e.into_response()
        }
    }
}

/// Internal peer read. The caller already decided this node owns the key, so
/// the read is pinned to the local tiers and origin loader; it never forwards
/// again, which keeps a momentarily inconsistent ring from bouncing a request
/// between nodes.
pub async fn handle_peer_get(Path((group_name, key)): Path<(String, String)>) -> Response {
    let Some(group) = group::lookup(&group_name) else {
        return CacheError::GroupNotFound(group_name).into_response();
    };

    match group.get_owned(&key).await {
        Ok(view) => (
            [(header::CONTENT_TYPE, "application/octet-stream")],
            view.bytes(),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("peer get {}/{} failed: {}", group.name(), key, e);
            e.into_response()
        }
    }
}

/// Internal peer write. Addresses the tier named in the request; a write that
/// reaches a node which no longer owns the key is re-routed by the group.
pub async fn handle_peer_set(Json(req): Json<SetRequest>) -> (StatusCode, Json<SetResponse>) {
    let Some(group) = group::lookup(&req.group) else {
        return (StatusCode::NOT_FOUND, Json(SetResponse { success: false }));
    };

    let view = ByteView::with_unix_expire(req.value, req.expire_unix);
    match group.set(&req.key, view, req.is_hot).await {
        Ok(_) => (StatusCode::OK, Json(SetResponse { success: true })),
        Err(e) => {
            tracing::error!("peer set {}/{} failed: {}", req.group, req.key, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(SetResponse { success: false }),
            )
        }
    }
}

/// Node health and cache statistics.
pub async fn handle_stats(
    Extension(registry): Extension<Arc<RegistryService>>,
) -> Json<NodeStatsResponse> {
    let peers: Vec<String> = registry
        .resolve(&registry.local.service)
        .into_iter()
        .map(|addr| addr.to_string())
        .collect();

    let groups: Vec<GroupStatsEntry> = group::all_groups()
        .into_iter()
        .map(|g| {
            let stats = g.stats();
            GroupStatsEntry {
                name: g.name().to_string(),
                main_entries: stats.main_entries,
                hot_entries: stats.hot_entries,
            }
        })
        .collect();

    let mut sys = System::new_all();
    sys.refresh_cpu();
    sys.refresh_memory();
    let cpu_usage = sys.global_cpu_info().cpu_usage();
    // sysinfo reports memory in bytes.
    let mem_total_mb = sys.total_memory() / (1024 * 1024);
    let mem_used_mb = sys.used_memory() / (1024 * 1024);

    Json(NodeStatsResponse {
        node_id: registry.local.id.0.clone(),
        service: registry.local.service.clone(),
        http_addr: registry.local.http_addr.to_string(),
        alive_peers: peers.len(),
        peers,
        groups,
        cpu_usage,
        mem_used_mb,
        mem_total_mb,
    })
}
