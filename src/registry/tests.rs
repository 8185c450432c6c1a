//! Service Registry Tests
//!
//! ## Test Scopes
//! - **Bookkeeping**: instance identity, registration state after startup,
//!   resolve filtering and ordering.
//! - **Leases**: the expiry sweep drops instances whose lease ran out and
//!   never drops the local instance. Cross-node keepalive traffic needs a
//!   running cluster and is exercised in integration runs.

#[cfg(test)]
mod tests {
    use crate::registry::service::RegistryService;
    use crate::registry::types::{InstanceId, ServiceInstance};
    use std::net::SocketAddr;
    use std::time::{Duration, Instant};

    fn addr(port: u16) -> SocketAddr {
        format!("127.0.0.1:{port}").parse().unwrap()
    }

    fn instance(service: &str, port: u16, last_seen: Option<Instant>) -> ServiceInstance {
        ServiceInstance {
            id: InstanceId::new(),
            service: service.to_string(),
            udp_addr: addr(port),
            http_addr: addr(port + 1000),
            last_seen,
        }
    }

    // ============================================================
    // INSTANCE ID TESTS
    // ============================================================

    #[test]
    fn test_instance_id_is_unique() {
        let id1 = InstanceId::new();
        let id2 = InstanceId::new();
        assert_ne!(id1, id2, "each InstanceId should be unique");
    }

    // ============================================================
    // REGISTRY SERVICE TESTS
    // ============================================================

    #[tokio::test]
    async fn test_new_registry_contains_itself() {
        let registry = RegistryService::new("cache", addr(0), addr(19100), vec![])
            .await
            .expect("failed to create registry");

        let instances = registry.live_instances();
        assert_eq!(instances.len(), 1);
        assert_eq!(instances[0].id, registry.local.id);
        assert_eq!(instances[0].http_addr, addr(19100));
    }

    #[tokio::test]
    async fn test_resolve_filters_by_service_and_sorts() {
        let registry = RegistryService::new("cache", addr(0), addr(19200), vec![])
            .await
            .expect("failed to create registry");

        registry.insert_for_test(instance("cache", 18150, Some(Instant::now())));
        registry.insert_for_test(instance("cache", 18050, Some(Instant::now())));
        registry.insert_for_test(instance("metrics", 18060, Some(Instant::now())));

        let addrs = registry.resolve("cache");
        assert_eq!(addrs, vec![addr(19050), addr(19150), addr(19200)]);

        assert_eq!(registry.resolve("metrics"), vec![addr(19060)]);
        assert!(registry.resolve("unknown").is_empty());
    }

    #[tokio::test]
    async fn test_expired_lease_drops_the_instance() {
        let registry = RegistryService::with_lease(
            "cache",
            addr(0),
            addr(19300),
            vec![],
            Duration::from_secs(10),
        )
        .await
        .expect("failed to create registry");

        let stale_seen = Instant::now().checked_sub(Duration::from_secs(60));
        assert!(stale_seen.is_some(), "process uptime shorter than 60s");
        registry.insert_for_test(instance("cache", 18250, stale_seen));
        registry.insert_for_test(instance("cache", 18350, Some(Instant::now())));

        registry.sweep_for_test();

        let addrs = registry.resolve("cache");
        assert!(!addrs.contains(&addr(19250)), "stale instance survived");
        assert!(addrs.contains(&addr(19350)));
        assert!(addrs.contains(&addr(19300)), "local instance must survive");
    }

    #[tokio::test]
    async fn test_sweep_never_drops_the_local_instance() {
        let registry = RegistryService::with_lease(
            "cache",
            addr(0),
            addr(19400),
            vec![],
            Duration::from_millis(1),
        )
        .await
        .expect("failed to create registry");

        tokio::time::sleep(Duration::from_millis(10)).await;
        registry.sweep_for_test();

        assert_eq!(registry.live_instances().len(), 1);
        assert_eq!(registry.resolve("cache"), vec![addr(19400)]);
    }
}
