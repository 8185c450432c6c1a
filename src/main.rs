use axum::{
    Router,
    extract::Extension,
    routing::{get, post},
};
use distributed_cache::cache::group::{FnLoader, Group, GroupOptions};
use distributed_cache::config::Config;
use distributed_cache::peers::handlers::{
    handle_cache_get, handle_peer_get, handle_peer_set, handle_stats,
};
use distributed_cache::peers::pool::HttpPeerPool;
use distributed_cache::peers::protocol::{
    ENDPOINT_CACHE, ENDPOINT_PEER_GET, ENDPOINT_PEER_SET, ENDPOINT_STATS,
};
use distributed_cache::registry::service::RegistryService;

use anyhow::Context;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 3 {
        eprintln!("Usage: {} --bind <addr:port> [--seed <addr:port>]", args[0]);
        eprintln!("Example: {} --bind 127.0.0.1:5000", args[0]);
        eprintln!(
            "Example: {} --bind 127.0.0.1:5001 --seed 127.0.0.1:5000",
            args[0]
        );

        std::process::exit(1);
    }

    let mut bind_addr: Option<SocketAddr> = None;
    let mut seed_nodes: Vec<SocketAddr> = vec![];

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--bind" => {
                bind_addr = Some(args[i + 1].parse()?);
                i += 2;
            }
            "--seed" => {
                seed_nodes.push(args[i + 1].parse()?);
                i += 2;
            }
            _ => {
                i += 1;
            }
        }
    }

    let bind_addr = bind_addr.context("--bind is required")?;
    let config = Config::from_env();

    tracing::info!("starting cache node on {}", bind_addr);
    if !seed_nodes.is_empty() {
        tracing::info!("seed nodes: {:?}", seed_nodes);
    } else {
        tracing::info!("starting as seed node (founder)");
    }

    // The HTTP server lives next to the registry's UDP port.
    let http_port = bind_addr.port() + 1000;
    let http_addr = SocketAddr::new(bind_addr.ip(), http_port);

    // 1. Registry (UDP leases):
    let registry = RegistryService::with_lease(
        &config.service_name,
        bind_addr,
        http_addr,
        seed_nodes,
        config.lease_ttl,
    )
    .await?;
    tracing::info!("instance id: {:?}", registry.local.id);

    // 2. Peer pool over the consistent-hash ring:
    let pool = HttpPeerPool::new(
        http_addr.to_string(),
        config.ring_replicas,
        config.rpc_timeout,
    );

    // 3. Cache group backed by the file origin:
    let origin_dir = config.origin_dir.clone();
    let loader = Arc::new(FnLoader::new(move |key: String| {
        let dir = origin_dir.clone();
        async move {
            let path = Path::new(&dir).join(&key);
            let bytes = tokio::fs::read(&path)
                .await
                .with_context(|| format!("origin read failed for key {key}"))?;
            Ok(bytes)
        }
    }));

    let group = Group::with_options(
        &config.group_name,
        config.main_cache_bytes,
        config.hot_cache_bytes,
        loader,
        GroupOptions {
            default_ttl: config.default_ttl,
            expire_jitter: config.expire_jitter,
        },
    );
    group.register_peers(pool.clone());

    // 4. HTTP router:
    let app = Router::new()
        .route(
            &format!("{}/:group/:key", ENDPOINT_CACHE),
            get(handle_cache_get),
        )
        .route(
            &format!("{}/:group/:key", ENDPOINT_PEER_GET),
            get(handle_peer_get),
        )
        .route(ENDPOINT_PEER_SET, post(handle_peer_set))
        .route(ENDPOINT_STATS, get(handle_stats))
        .layer(Extension(registry.clone()));

    // 5. Spawn registry loops:
    registry.clone().start().await;

    // 6. Spawn the peer watcher; it rebuilds the ring on membership changes:
    let watch_registry = registry.clone();
    let watch_pool = pool.clone();
    let service_name = config.service_name.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(1));
        let mut known: Vec<SocketAddr> = vec![];

        loop {
            interval.tick().await;
            let addrs = watch_registry.resolve(&service_name);
            if addrs != known {
                tracing::info!("peer set changed: {} node(s)", addrs.len());
                known = addrs.clone();
                let addrs: Vec<String> = addrs.iter().map(|a| a.to_string()).collect();
                watch_pool.set_peers(&addrs);
            }
        }
    });

    // 7. Start HTTP server:
    tracing::info!("HTTP server listening on {}", http_addr);
    tracing::info!("Press Ctrl+C to shutdown");

    let listener = tokio::net::TcpListener::bind(http_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[allow(dead_code)]
fn assert_send_probe() {
    fn is_send<T: Send>(_: T) {}
    let g: std::sync::Arc<distributed_cache::cache::group::Group> = unimplemented!();
    is_send(async move {
        let _ = g.get_owned("k").await;
    });
}
