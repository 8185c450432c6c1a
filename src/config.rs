//! Node configuration.
//!
//! Every knob is read from an environment variable with a sensible default,
//! so a node can run with no configuration at all. The ring hash function is
//! deliberately not configurable here: it must agree cluster-wide and is
//! overridable only in code (`HashRing::with_hash`).

use std::env;
use std::time::Duration;

/// Cluster node configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Expiry applied to values fetched through the local origin loader.
    pub default_ttl: Duration,
    /// Width of the random jitter window added to every entry's expiry.
    pub expire_jitter: Duration,
    /// Byte budget of the main (owned-keys) cache tier. 0 = unbounded.
    pub main_cache_bytes: usize,
    /// Byte budget of the hot (foreign-keys) cache tier. 0 = unbounded.
    pub hot_cache_bytes: usize,
    /// Virtual nodes per peer on the consistent-hash ring.
    pub ring_replicas: usize,
    /// Per-call timeout for peer RPCs.
    pub rpc_timeout: Duration,
    /// Registry lease duration; a silent peer is dropped after this long.
    pub lease_ttl: Duration,
    /// Service name advertised to and resolved from the registry.
    pub service_name: String,
    /// Name of the cache group this node serves.
    pub group_name: String,
    /// Directory the file-backed origin loader reads from.
    pub origin_dir: String,
}

impl Config {
    /// Loads the configuration from environment variables.
    ///
    /// # Environment Variables
    /// - `DEFAULT_TTL_SECS` - loader-value TTL in seconds (default: 30)
    /// - `EXPIRE_JITTER_SECS` - expiry jitter window in seconds (default: 180)
    /// - `MAIN_CACHE_BYTES` - main tier byte budget (default: 64 MiB)
    /// - `HOT_CACHE_BYTES` - hot tier byte budget (default: 8 MiB)
    /// - `RING_REPLICAS` - virtual nodes per peer (default: 50)
    /// - `RPC_TIMEOUT_MS` - peer RPC timeout in milliseconds (default: 2000)
    /// - `LEASE_TTL_SECS` - registry lease in seconds (default: 10)
    /// - `SERVICE_NAME` - advertised service name (default: "cache")
    /// - `GROUP_NAME` - cache group served by this node (default: "default")
    /// - `ORIGIN_DIR` - origin loader directory (default: "./origin")
    pub fn from_env() -> Self {
        Self {
            default_ttl: Duration::from_secs(env_parse("DEFAULT_TTL_SECS", 30)),
            expire_jitter: Duration::from_secs(env_parse("EXPIRE_JITTER_SECS", 180)),
            main_cache_bytes: env_parse("MAIN_CACHE_BYTES", 64 * 1024 * 1024),
            hot_cache_bytes: env_parse("HOT_CACHE_BYTES", 8 * 1024 * 1024),
            ring_replicas: env_parse("RING_REPLICAS", 50),
            rpc_timeout: Duration::from_millis(env_parse("RPC_TIMEOUT_MS", 2000)),
            lease_ttl: Duration::from_secs(env_parse("LEASE_TTL_SECS", 10)),
            service_name: env::var("SERVICE_NAME").unwrap_or_else(|_| "cache".to_string()),
            group_name: env::var("GROUP_NAME").unwrap_or_else(|_| "default".to_string()),
            origin_dir: env::var("ORIGIN_DIR").unwrap_or_else(|_| "./origin".to_string()),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_ttl: Duration::from_secs(30),
            expire_jitter: Duration::from_secs(180),
            main_cache_bytes: 64 * 1024 * 1024,
            hot_cache_bytes: 8 * 1024 * 1024,
            ring_replicas: 50,
            rpc_timeout: Duration::from_millis(2000),
            lease_ttl: Duration::from_secs(10),
            service_name: "cache".to_string(),
            group_name: "default".to_string(),
            origin_dir: "./origin".to_string(),
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.default_ttl, Duration::from_secs(30));
        assert_eq!(config.expire_jitter, Duration::from_secs(180));
        assert_eq!(config.ring_replicas, 50);
        assert_eq!(config.rpc_timeout, Duration::from_millis(2000));
        assert_eq!(config.lease_ttl, Duration::from_secs(10));
        assert_eq!(config.service_name, "cache");
        assert_eq!(config.group_name, "default");
    }

    #[test]
    fn test_config_from_env_uses_defaults_when_unset() {
        unsafe {
            env::remove_var("DEFAULT_TTL_SECS");
            env::remove_var("RING_REPLICAS");
        }

        let config = Config::from_env();
        assert_eq!(config.default_ttl, Duration::from_secs(30));
        assert_eq!(config.ring_replicas, 50);
    }
}
