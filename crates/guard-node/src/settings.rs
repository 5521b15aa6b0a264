//! Process settings read from the environment.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::warn;

pub const DEFAULT_CONFIG_PATH: &str = "data/guard/config.yml";
pub const DEFAULT_LISTEN: &str = "0.0.0.0:7000";
pub const DEFAULT_UPSTREAM: &str = "127.0.0.1:7001";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeSettings {
    /// Admission config file (`GUARD_CONFIG`)
    pub config_path: PathBuf,
    /// Address the gate listens on (`GUARD_LISTEN`)
    pub listen: SocketAddr,
    /// Service admitted connections are relayed to (`GUARD_UPSTREAM`)
    pub upstream: SocketAddr,
}

impl Default for NodeSettings {
    fn default() -> Self {
        Self {
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
            listen: SocketAddr::from(([0, 0, 0, 0], 7000)),
            upstream: SocketAddr::from(([127, 0, 0, 1], 7001)),
        }
    }
}

impl NodeSettings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Unparsable addresses are logged and replaced by the default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut settings = Self::default();

        if let Some(path) = lookup("GUARD_CONFIG").filter(|p| !p.trim().is_empty()) {
            settings.config_path = PathBuf::from(path);
        }
        if let Some(addr) = lookup("GUARD_LISTEN") {
            match addr.parse() {
                Ok(addr) => settings.listen = addr,
                Err(_) => warn!(value = %addr, default = DEFAULT_LISTEN, "invalid GUARD_LISTEN"),
            }
        }
        if let Some(addr) = lookup("GUARD_UPSTREAM") {
            match addr.parse() {
                Ok(addr) => settings.upstream = addr,
                Err(_) => warn!(value = %addr, default = DEFAULT_UPSTREAM, "invalid GUARD_UPSTREAM"),
            }
        }

        settings
    }
}
