//! Peer Transport Tests
//!
//! ## Test Scopes
//! - **Picker contract**: the pool answers `None` exactly when the ring is
//!   empty or maps the key to this node, checked against the ring directly.
//! - **Handlers**: the axum handlers are plain async functions, so they are
//!   invoked directly with constructed extractors; transport-level behavior
//!   (timeouts, retries) needs a live cluster and is exercised in
//!   integration runs.

#[cfg(test)]
mod tests {
    use crate::cache::byteview::ByteView;
    use crate::cache::group::{FnLoader, Group};
    use crate::peers::PeerPicker;
    use crate::peers::handlers::{handle_cache_get, handle_peer_set};
    use crate::peers::pool::HttpPeerPool;
    use crate::peers::protocol::{SetRequest, SetResponse};
    use crate::ring::hash_ring::HashRing;
    use axum::Json;
    use axum::extract::Path;
    use axum::http::StatusCode;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    const RPC_TIMEOUT: Duration = Duration::from_millis(500);

    // ============================================================
    // PEER POOL TESTS
    // ============================================================

    #[test]
    fn test_empty_pool_picks_nobody() {
        let pool = HttpPeerPool::new("127.0.0.1:9100".to_string(), 50, RPC_TIMEOUT);
        assert!(pool.pick_peer("any-key").is_none());
    }

    #[test]
    fn test_pool_never_picks_self() {
        let pool = HttpPeerPool::new("127.0.0.1:9100".to_string(), 50, RPC_TIMEOUT);
        pool.set_peers(&["127.0.0.1:9100"]);

        // With only this node registered every key is locally owned.
        for i in 0..100 {
            assert!(pool.pick_peer(&format!("key-{i}")).is_none());
        }
    }

    #[test]
    fn test_pool_agrees_with_the_ring() {
        let peers = ["127.0.0.1:9100", "127.0.0.1:9101", "127.0.0.1:9102"];
        let pool = HttpPeerPool::new(peers[0].to_string(), 50, RPC_TIMEOUT);
        pool.set_peers(&peers);

        // Reference ring with identical parameters.
        let ring = HashRing::new(50);
        ring.add(&peers);

        let mut remote = 0;
        for i in 0..1000 {
            let key = format!("key-{i}");
            let owner = ring.get(&key).expect("ring is not empty");
            match pool.pick_peer(&key) {
                Some(_) => {
                    assert_ne!(owner, peers[0], "picked a peer for a self-owned key");
                    remote += 1;
                }
                None => assert_eq!(owner, peers[0], "key {key} should be remote"),
            }
        }

        // Three evenly weighted peers: roughly two thirds of keys are remote.
        assert!(remote > 400, "only {remote} of 1000 keys were remote");
    }

    #[test]
    fn test_set_peers_replaces_the_previous_set() {
        let pool = HttpPeerPool::new("127.0.0.1:9100".to_string(), 50, RPC_TIMEOUT);
        pool.set_peers(&["127.0.0.1:9100", "127.0.0.1:9101"]);
        pool.set_peers(&["127.0.0.1:9100"]);

        for i in 0..100 {
            assert!(pool.pick_peer(&format!("key-{i}")).is_none());
        }
    }

    // ============================================================
    // HANDLER TESTS (direct invocation)
    // ============================================================

    fn upper_loader(counter: Arc<AtomicUsize>) -> Arc<FnLoader> {
        Arc::new(FnLoader::new(move |key: String| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(key.to_uppercase().into_bytes())
            }
        }))
    }

    #[tokio::test]
    async fn test_cache_get_unknown_group_is_not_found() {
        let response =
            handle_cache_get(Path(("peers-no-such-group".to_string(), "k".to_string()))).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_cache_get_serves_loader_bytes() {
        let counter = Arc::new(AtomicUsize::new(0));
        let _group = Group::new("peers-http-get", 1024, 1024, upper_loader(counter.clone()));

        let response =
            handle_cache_get(Path(("peers-http-get".to_string(), "abc".to_string()))).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cache_get_loader_failure_is_internal_error() {
        let loader = Arc::new(FnLoader::new(|key: String| async move {
            anyhow::bail!("origin rejected {key}")
        }));
        let _group = Group::new("peers-http-get-err", 1024, 1024, loader);

        let response =
            handle_cache_get(Path(("peers-http-get-err".to_string(), "k".to_string()))).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_peer_set_stores_into_the_addressed_tier() {
        let counter = Arc::new(AtomicUsize::new(0));
        let group = Group::new("peers-http-set", 1024, 1024, upper_loader(counter.clone()));

        let view = ByteView::new(b"warm".to_vec(), std::time::SystemTime::now() + Duration::from_secs(60));
        let (status, Json(SetResponse { success })) = handle_peer_set(Json(SetRequest {
            group: "peers-http-set".to_string(),
            key: "k".to_string(),
            value: view.bytes(),
            expire_unix: view.expire_unix(),
            is_hot: true,
        }))
        .await;

        assert_eq!(status, StatusCode::OK);
        assert!(success);
        assert_eq!(group.stats().hot_entries, 1);
        assert_eq!(group.stats().main_entries, 0);

        let got = group.get("k").await.unwrap();
        assert_eq!(got.bytes(), b"warm".to_vec());
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_peer_set_unknown_group_is_not_found() {
        let (status, Json(SetResponse { success })) = handle_peer_set(Json(SetRequest {
            group: "peers-set-no-group".to_string(),
            key: "k".to_string(),
            value: b"v".to_vec(),
            expire_unix: 0,
            is_hot: false,
        }))
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(!success);
    }
}
