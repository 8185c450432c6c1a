use anyhow::Result;
use dashmap::DashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::UdpSocket;
use tracing::info;

use super::types::{InstanceId, RegistryMessage, ServiceInstance};

/// Default lease duration; a silent instance is dropped after this long.
pub const DEFAULT_LEASE_TTL: Duration = Duration::from_secs(10);

/// Sweep cadence for expired leases.
const EXPIRY_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

/// Lease-based service registry.
///
/// Every node runs one; together they form the cluster's discovery plane.
pub struct RegistryService {
    pub local: ServiceInstance,
    instances: Arc<DashMap<InstanceId, ServiceInstance>>,
    socket: Arc<UdpSocket>,
    lease_ttl: Duration,
}

impl RegistryService {
    /// Creates a registry with the default lease and advertises to the seeds.
    pub async fn new(
        service: &str,
        bind_addr: SocketAddr,
        http_addr: SocketAddr,
        seeds: Vec<SocketAddr>,
    ) -> Result<Arc<Self>> {
        Self::with_lease(service, bind_addr, http_addr, seeds, DEFAULT_LEASE_TTL).await
    }

    /// Creates a registry with an explicit lease duration.
    pub async fn with_lease(
        service: &str,
        bind_addr: SocketAddr,
        http_addr: SocketAddr,
        seeds: Vec<SocketAddr>,
        lease_ttl: Duration,
    ) -> Result<Arc<Self>> {
        let socket = UdpSocket::bind(bind_addr).await?;
        // Binding to port 0 resolves here, so the advertised address is real.
        let udp_addr = socket.local_addr()?;

        let local = ServiceInstance {
            id: InstanceId::new(),
            service: service.to_string(),
            udp_addr,
            http_addr,
            last_seen: Some(Instant::now()),
        };

        let instances = Arc::new(DashMap::new());
        instances.insert(local.id.clone(), local.clone());

        if !seeds.is_empty() {
            info!("registering with {} seed node(s)", seeds.len());
            let msg = RegistryMessage::Register {
                instance: local.clone(),
            };
            let encoded = bincode::serialize(&msg)?;
            for seed in &seeds {
                socket.send_to(&encoded, seed).await?;
                info!("sent registration to {}", seed);
            }
        }

        Ok(Arc::new(Self {
            local,
            instances,
            socket: Arc::new(socket),
            lease_ttl,
        }))
    }

    /// Spawns the keepalive, receive and lease-expiry loops.
    pub async fn start(self: Arc<Self>) {
        tracing::info!("starting registry service (lease {:?})", self.lease_ttl);

        let service = self.clone();
        tokio::spawn(async move {
            service.keepalive_loop().await;
        });

        let service = self.clone();
        tokio::spawn(async move {
            service.receive_loop().await;
        });

        let service = self.clone();
        tokio::spawn(async move {
            service.expiry_loop().await;
        });
    }

    /// HTTP addresses of live instances of `service`, self included, in a
    /// deterministic order.
    pub fn resolve(&self, service: &str) -> Vec<SocketAddr> {
        let mut addrs: Vec<SocketAddr> = self
            .instances
            .iter()
            .filter(|entry| entry.value().service == service)
            .map(|entry| entry.value().http_addr)
            .collect();
        addrs.sort();
        addrs
    }

    /// All live instances, self included.
    pub fn live_instances(&self) -> Vec<ServiceInstance> {
        self.instances
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    async fn keepalive_loop(self: Arc<Self>) {
        // A third of the lease, so one lost datagram cannot expire us.
        let mut interval = tokio::time::interval(self.lease_ttl / 3);

        loop {
            interval.tick().await;

            let targets: Vec<ServiceInstance> = self
                .instances
                .iter()
                .filter(|entry| entry.value().id != self.local.id)
                .map(|entry| entry.value().clone())
                .collect();

            if targets.is_empty() {
                continue;
            }

            let msg = RegistryMessage::Keepalive {
                from: self.local.id.clone(),
            };
            let Ok(encoded) = bincode::serialize(&msg) else {
                tracing::error!("failed to serialize keepalive frame");
                continue;
            };

            for target in targets {
                if let Err(e) = self.socket.send_to(&encoded, target.udp_addr).await {
                    tracing::warn!("keepalive to {:?} failed: {}", target.id, e);
                }
            }
        }
    }

    async fn receive_loop(self: Arc<Self>) {
        let mut buf = vec![0u8; 65536];

        loop {
            match self.socket.recv_from(&mut buf).await {
                Ok((len, src)) => match bincode::deserialize::<RegistryMessage>(&buf[..len]) {
                    Ok(msg) => {
                        if let Err(e) = self.handle_message(msg, src).await {
                            tracing::error!("error handling frame from {}: {}", src, e);
                        }
                    }
                    Err(e) => {
                        tracing::warn!("undecodable frame from {}: {}", src, e);
                    }
                },
                Err(e) => {
                    tracing::error!("failed to receive UDP frame: {}", e);
                    tokio::time::sleep(Duration::from_millis(100)).await;
                }
            }
        }
    }

    async fn handle_message(&self, msg: RegistryMessage, src: SocketAddr) -> Result<()> {
        match msg {
            RegistryMessage::Register { mut instance } => {
                instance.last_seen = Some(Instant::now());
                info!(
                    "instance {:?} ({}) registered from {}",
                    instance.id, instance.service, src
                );
                self.instances.insert(instance.id.clone(), instance);
                self.send_ack(src).await?;
            }

            RegistryMessage::Keepalive { from } => {
                if let Some(mut entry) = self.instances.get_mut(&from) {
                    entry.last_seen = Some(Instant::now());
                } else {
                    // A keepalive from an instance we never saw register;
                    // the Ack below prompts it to learn us and re-announce.
                    tracing::debug!("keepalive from unknown instance {:?}", from);
                }
                self.send_ack(src).await?;
            }

            RegistryMessage::Ack { from, instances } => {
                if let Some(mut entry) = self.instances.get_mut(&from) {
                    entry.last_seen = Some(Instant::now());
                }
                for instance in instances {
                    self.merge_instance(instance);
                }
            }
        }

        Ok(())
    }

    /// Adopts a previously unknown instance from a peer's view. Known
    /// instances keep their own lease clock; a second-hand sighting is not a
    /// lease renewal.
    fn merge_instance(&self, instance: ServiceInstance) {
        if instance.id == self.local.id || self.instances.contains_key(&instance.id) {
            return;
        }
        info!(
            "discovered instance {:?} ({}) at {}",
            instance.id, instance.service, instance.http_addr
        );
        let mut instance = instance;
        instance.last_seen = Some(Instant::now());
        self.instances.insert(instance.id.clone(), instance);
    }

    async fn send_ack(&self, to: SocketAddr) -> Result<()> {
        let reply = RegistryMessage::Ack {
            from: self.local.id.clone(),
            instances: self.live_instances(),
        };
        let encoded = bincode::serialize(&reply)?;
        self.socket.send_to(&encoded, to).await?;
        Ok(())
    }

    async fn expiry_loop(self: Arc<Self>) {
        let mut interval = tokio::time::interval(EXPIRY_SWEEP_INTERVAL.min(self.lease_ttl / 2));

        loop {
            interval.tick().await;
            self.sweep_expired();
        }
    }

    /// Drops every instance whose lease ran out.
    fn sweep_expired(&self) {
        let lease_ttl = self.lease_ttl;
        let local_id = self.local.id.clone();
        self.instances.retain(|id, instance| {
            if *id == local_id {
                return true;
            }
            let expired = match instance.last_seen {
                Some(last_seen) => last_seen.elapsed() > lease_ttl,
                None => false,
            };
            if expired {
                info!(
                    "lease expired for instance {:?} ({})",
                    instance.id, instance.http_addr
                );
            }
            !expired
        });
    }

    #[cfg(test)]
    pub(crate) fn insert_for_test(&self, instance: ServiceInstance) {
        self.instances.insert(instance.id.clone(), instance);
    }

    #[cfg(test)]
    pub(crate) fn sweep_for_test(&self) {
        self.sweep_expired();
    }
}
