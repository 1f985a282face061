//! Process configuration read from the environment.
//!
//! Every setting has a default, so an empty environment yields a working
//! local configuration. Unparseable numeric values fall back to the default
//! rather than failing startup.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

/// Bind address variable.
pub const ENV_HOST: &str = "WEBHOOK_HOST";
/// Bind port variable.
pub const ENV_PORT: &str = "WEBHOOK_PORT";
/// Storage connection URL variable.
pub const ENV_STORE_URL: &str = "WEBHOOK_STORE_URL";
/// Database name variable.
pub const ENV_STORE_DB: &str = "WEBHOOK_STORE_DB";
/// Collection name variable.
pub const ENV_STORE_COLLECTION: &str = "WEBHOOK_STORE_COLLECTION";

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_STORE_URL: &str = "file://data";
pub const DEFAULT_STORE_DB: &str = "github-webhooks";
pub const DEFAULT_STORE_COLLECTION: &str = "events";

/// Where and how events are stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Storage connection URL (`file://<dir>` or `memory://`).
    pub url: String,
    /// Database name; a subdirectory of the storage root.
    pub database: String,
    /// Collection name; the log file is `<collection>.jsonl`.
    pub collection: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            url: DEFAULT_STORE_URL.to_string(),
            database: DEFAULT_STORE_DB.to_string(),
            collection: DEFAULT_STORE_COLLECTION.to_string(),
        }
    }
}

/// Full server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub store: StoreConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), DEFAULT_PORT),
            store: StoreConfig::default(),
        }
    }
}

impl Config {
    /// Reads configuration from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through an arbitrary key lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Config::default();

        let host = get(ENV_HOST)
            .and_then(|s| s.trim().parse::<IpAddr>().ok())
            .unwrap_or(defaults.bind_addr.ip());
        let port = get(ENV_PORT)
            .and_then(|s| s.trim().parse::<u16>().ok())
            .unwrap_or(defaults.bind_addr.port());

        Config {
            bind_addr: SocketAddr::new(host, port),
            store: StoreConfig {
                url: get(ENV_STORE_URL).unwrap_or(defaults.store.url),
                database: get(ENV_STORE_DB).unwrap_or(defaults.store.database),
                collection: get(ENV_STORE_COLLECTION).unwrap_or(defaults.store.collection),
            },
        }
    }
}
