//! Cache groups: named namespaces over the two-tier local cache.
//!
//! A group owns a main tier (keys this node serves authoritatively from its
//! origin loader), a hot tier (keys owned elsewhere but accessed often here),
//! an origin loader, and an in-flight coalescer. Reads probe both tiers and
//! fall into a coalesced load that either fetches from the owning peer or
//! invokes the loader locally.
//!
//! Groups are created once at bootstrap and looked up process-wide by name.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, LazyLock, OnceLock, PoisonError, RwLock};
use std::time::{Duration, SystemTime};

use super::byteview::ByteView;
use super::lru::DEFAULT_EXPIRE_JITTER;
use super::singleflight::FlightGroup;
use super::tier::CacheTier;
use crate::error::{CacheError, Result};
use crate::peers::{PeerClient, PeerPicker};

/// Expiry applied to values fetched through the origin loader.
pub const DEFAULT_TTL: Duration = Duration::from_secs(30);

/// Boxed future returned by a loader.
pub type LoaderFuture<'a> = Pin<Box<dyn Future<Output = anyhow::Result<Vec<u8>>> + Send + 'a>>;

/// Origin of truth for a group's keys. Invoked at most once per concurrent
/// miss per node; failures are surfaced to every waiting caller and never
/// cached.
pub trait Loader: Send + Sync {
    fn load<'a>(&'a self, key: &'a str) -> LoaderFuture<'a>;
}

type BoxedLoaderFn =
    Box<dyn Fn(String) -> Pin<Box<dyn Future<Output = anyhow::Result<Vec<u8>>> + Send>> + Send + Sync>;

/// Lifts a plain async function into a `Loader`.
pub struct FnLoader {
    f: BoxedLoaderFn,
}

impl FnLoader {
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Vec<u8>>> + Send + 'static,
    {
        let f: BoxedLoaderFn = Box::new(move |key: String| {
            Box::pin(f(key)) as Pin<Box<dyn Future<Output = anyhow::Result<Vec<u8>>> + Send>>
        });
        Self { f }
    }
}

impl Loader for FnLoader {
    fn load<'a>(&'a self, key: &'a str) -> LoaderFuture<'a> {
        (self.f)(key.to_string())
    }
}

/// Per-group tuning; defaults match the cluster-wide constants.
#[derive(Debug, Clone)]
pub struct GroupOptions {
    pub default_ttl: Duration,
    pub expire_jitter: Duration,
}

impl Default for GroupOptions {
    fn default() -> Self {
        Self {
            default_ttl: DEFAULT_TTL,
            expire_jitter: DEFAULT_EXPIRE_JITTER,
        }
    }
}

static GROUPS: LazyLock<RwLock<HashMap<String, Arc<Group>>>> =
    LazyLock::new(|| RwLock::new(HashMap::new()));

/// Entry counts per tier, for the health surface.
#[derive(Debug, Clone, Copy)]
pub struct GroupStats {
    pub main_entries: usize,
    pub hot_entries: usize,
}

/// A named cache namespace with its own loader and byte budgets.
pub struct Group {
    name: String,
    loader: Arc<dyn Loader>,
    main_cache: CacheTier,
    hot_cache: CacheTier,
    peers: OnceLock<Arc<dyn PeerPicker>>,
    flight: FlightGroup,
    default_ttl: Duration,
}

impl Group {
    /// Creates a group and registers it process-wide.
    ///
    /// # Panics
    /// Panics if a group with the same name already exists; group creation is
    /// bootstrap-time and a duplicate name is a wiring error.
    pub fn new(name: &str, main_bytes: usize, hot_bytes: usize, loader: Arc<dyn Loader>) -> Arc<Group> {
        Self::with_options(name, main_bytes, hot_bytes, loader, GroupOptions::default())
    }

    /// Creates a group with explicit TTL and jitter settings.
    pub fn with_options(
        name: &str,
        main_bytes: usize,
        hot_bytes: usize,
        loader: Arc<dyn Loader>,
        options: GroupOptions,
    ) -> Arc<Group> {
        let group = Arc::new(Group {
            name: name.to_string(),
            loader,
            main_cache: CacheTier::new(main_bytes, options.expire_jitter),
            hot_cache: CacheTier::new(hot_bytes, options.expire_jitter),
            peers: OnceLock::new(),
            flight: FlightGroup::new(),
            default_ttl: options.default_ttl,
        });

        let mut groups = GROUPS.write().unwrap_or_else(PoisonError::into_inner);
        if groups.contains_key(name) {
            panic!("group {name} already registered");
        }
        groups.insert(name.to_string(), group.clone());
        tracing::info!("registered group {name}");
        group
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Installs the peer picker. Single-shot: a second call is a wiring error.
    ///
    /// The picker contract: `pick_peer` returns `None` iff the ring is empty
    /// or the current node owns the key, so a `None` always means "serve
    /// locally".
    pub fn register_peers(&self, picker: Arc<dyn PeerPicker>) {
        if self.peers.set(picker).is_err() {
            panic!("register_peers called more than once for group {}", self.name);
        }
    }

    /// Fetches the value for a key: main tier, hot tier, then a coalesced
    /// load from the owning peer or the local origin.
    pub async fn get(&self, key: &str) -> Result<ByteView> {
        if key.is_empty() {
            return Err(CacheError::EmptyKey);
        }

        if let Some(view) = self.lookup_cache(key) {
            tracing::debug!(group = %self.name, key, "cache hit");
            return Ok(view);
        }

        tracing::debug!(group = %self.name, key, "cache miss");
        self.load(key).await
    }

    /// Read path for peer RPCs: serves from the local tiers or the origin,
    /// never forwarding to another peer. While a membership change is
    /// propagating, two nodes can briefly disagree about ownership; a
    /// forwarded read that could forward again would bounce between them.
    pub async fn get_owned(&self, key: &str) -> Result<ByteView> {
        if key.is_empty() {
            return Err(CacheError::EmptyKey);
        }

        if let Some(view) = self.lookup_cache(key) {
            return Ok(view);
        }

        self.flight
            .run(key, || async { self.load_locally(key).await })
            .await
    }

    /// Writes a value. `is_hot` targets the local hot tier; otherwise the
    /// write is routed to the owning peer, or into the local main tier when
    /// this node owns the key.
    pub async fn set(&self, key: &str, value: ByteView, is_hot: bool) -> Result<()> {
        if key.is_empty() {
            return Err(CacheError::EmptyKey);
        }

        if is_hot {
            self.flight
                .run(key, || async {
                    self.hot_cache.add(key, value.clone(), value.expire());
                    Ok(value.clone())
                })
                .await?;
            return Ok(());
        }

        self.flight
            .run(key, || async {
                if let Some(peer) = self.pick_peer(key) {
                    peer.set(&self.name, key, value.bytes(), value.expire_unix(), false)
                        .await?;
                    return Ok(value.clone());
                }
                self.main_cache.add(key, value.clone(), value.expire());
                Ok(value.clone())
            })
            .await?;
        Ok(())
    }

    /// Entry counts per tier.
    pub fn stats(&self) -> GroupStats {
        GroupStats {
            main_entries: self.main_cache.len(),
            hot_entries: self.hot_cache.len(),
        }
    }

    fn lookup_cache(&self, key: &str) -> Option<ByteView> {
        self.main_cache
            .get(key)
            .or_else(|| self.hot_cache.get(key))
    }

    fn pick_peer(&self, key: &str) -> Option<Arc<dyn PeerClient>> {
        self.peers.get().and_then(|picker| picker.pick_peer(key))
    }

    async fn load(&self, key: &str) -> Result<ByteView> {
        self.flight
            .run(key, || async {
                if let Some(peer) = self.pick_peer(key) {
                    return self.get_from_peer(peer.as_ref(), key).await;
                }
                self.load_locally(key).await
            })
            .await
    }

    /// Fetches a key from its owning peer. The result is returned to the
    /// caller but not stored: the main tier is reserved for keys this node
    /// owns, and hot-tier population is an explicit, externally driven `set`.
    async fn get_from_peer(&self, peer: &dyn PeerClient, key: &str) -> Result<ByteView> {
        let bytes = peer.get(&self.name, key).await?;
        tracing::debug!(group = %self.name, key, "served from peer");
        Ok(ByteView::new(bytes, SystemTime::now() + self.default_ttl))
    }

    async fn load_locally(&self, key: &str) -> Result<ByteView> {
        let bytes = self
            .loader
            .load(key)
            .await
            .map_err(|e| CacheError::Loader {
                key: key.to_string(),
                message: format!("{e:#}"),
            })?;
        let expire = SystemTime::now() + self.default_ttl;
        let view = ByteView::new(bytes, expire);
        self.main_cache.add(key, view.clone(), expire);
        tracing::debug!(group = %self.name, key, "loaded from origin");
        Ok(view)
    }
}

/// Looks up a group by name.
pub fn lookup(name: &str) -> Option<Arc<Group>> {
    GROUPS
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(name)
        .cloned()
}

/// All registered groups, for the health surface.
pub fn all_groups() -> Vec<Arc<Group>> {
    GROUPS
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .values()
        .cloned()
        .collect()
}
