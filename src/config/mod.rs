use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

const DEFAULT_CONFIRMATIONS: u64 = 1;
const DEFAULT_RECEIPT_TIMEOUT_SECS: u64 = 120;
const DEFAULT_LOG_CHUNK_SIZE: u64 = 10_000;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// HTTP or WebSocket JSON-RPC endpoint
    pub rpc: Option<String>,
    /// IPC socket path, used when `rpc` is unset
    pub ipc: Option<String>,
    /// Address of the deployed registry
    pub contract: Option<String>,
    /// Environment variable holding the signing key
    pub private_key_env: Option<String>,
    /// Expected chain id; checked on connect when set
    pub chain_id: Option<u64>,

    #[serde(default = "default_confirmations")]
    pub confirmations: u64,
    #[serde(default = "default_receipt_timeout")]
    pub receipt_timeout_secs: u64,
    /// Maximum block span of a single `eth_getLogs` request
    #[serde(default = "default_log_chunk_size")]
    pub log_chunk_size: u64,
    /// First block to scan for events (usually the deployment block)
    #[serde(default)]
    pub start_block: u64,

    /// Event index database path
    pub database: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rpc: None,
            ipc: None,
            contract: None,
            private_key_env: None,
            chain_id: None,
            confirmations: DEFAULT_CONFIRMATIONS,
            receipt_timeout_secs: DEFAULT_RECEIPT_TIMEOUT_SECS,
            log_chunk_size: DEFAULT_LOG_CHUNK_SIZE,
            start_block: 0,
            database: None,
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

fn default_confirmations() -> u64 {
    DEFAULT_CONFIRMATIONS
}

fn default_receipt_timeout() -> u64 {
    DEFAULT_RECEIPT_TIMEOUT_SECS
}

fn default_log_chunk_size() -> u64 {
    DEFAULT_LOG_CHUNK_SIZE
}

impl Config {
    /// Endpoint to connect to: `rpc` first, then `ipc`
    pub fn endpoint(&self) -> Option<&str> {
        non_empty(self.rpc.as_deref()).or_else(|| non_empty(self.ipc.as_deref()))
    }

    /// Event index path, falling back to the data dir
    pub fn database_path(&self) -> Option<PathBuf> {
        self.database.clone().or_else(events_db_path)
    }
}

/// Load the configuration file
///
/// A missing file yields defaults; a malformed one is an error.
pub fn load(explicit: Option<&Path>) -> Result<Config> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match config_path() {
            Some(path) if path.exists() => path,
            _ => return Ok(Config::default()),
        },
    };
    let content = fs::read_to_string(&path)
        .with_context(|| format!("read config {}", path.display()))?;
    parse(&content).with_context(|| format!("parse config {}", path.display()))
}

pub fn parse(content: &str) -> Result<Config> {
    Ok(toml::from_str::<Config>(content)?)
}

pub fn config_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os("NODEREGISTRY_CONFIG").map(PathBuf::from) {
        return Some(path);
    }
    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from) {
        return Some(xdg.join("noderegistry").join("config.toml"));
    }
    if let Some(home) = std::env::var_os("HOME").map(PathBuf::from) {
        return Some(home.join(".config").join("noderegistry").join("config.toml"));
    }

    directories::ProjectDirs::from("io", "noderegistry", "noderegistry")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

pub fn data_dir() -> Option<PathBuf> {
    if let Some(xdg) = std::env::var_os("XDG_DATA_HOME").map(PathBuf::from) {
        return Some(xdg.join("noderegistry"));
    }
    if let Some(home) = std::env::var_os("HOME").map(PathBuf::from) {
        return Some(home.join(".local").join("share").join("noderegistry"));
    }
    directories::ProjectDirs::from("io", "noderegistry", "noderegistry")
        .map(|dirs| dirs.data_dir().to_path_buf())
}

pub fn events_db_path() -> Option<PathBuf> {
    data_dir().map(|dir| dir.join("events.sqlite3"))
}

pub fn export_dir() -> Option<PathBuf> {
    data_dir().map(|dir| dir.join("exports"))
}
