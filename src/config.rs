use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use std::path::Path;
use thiserror::Error;

use crate::http::parser::READ_BUDGET;
use crate::net::pool::DEFAULT_POOL_SIZE;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
}

/// Server settings. Every field has a default, so a config file only needs
/// the keys it changes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub address: IpAddr,
    pub port: u16,

    /// Number of connections served at once.
    pub pool_size: usize,

    /// Accepted connections allowed to wait for a worker; unlimited if absent.
    pub queue_capacity: Option<usize>,

    /// Bytes available for the request line and headers.
    pub read_budget: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)),
            port: 9999,
            pool_size: DEFAULT_POOL_SIZE,
            queue_capacity: None,
            read_budget: READ_BUDGET,
        }
    }
}

impl ServerConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        toml::from_str::<ServerConfig>(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }
}
