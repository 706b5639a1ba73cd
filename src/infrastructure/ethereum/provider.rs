//! Provider configuration and Alloy connection setup
//!
//! Every transport is erased into a `DynProvider` so the registry proxy
//! does not carry the transport or filler stack in its type.

use std::path::PathBuf;

use alloy::network::EthereumWallet;
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::signers::local::PrivateKeySigner;
use anyhow::{bail, Context, Result};
use tracing::{debug, info};

/// Provider configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderConfig {
    /// HTTP JSON-RPC endpoint
    Http(String),
    /// WebSocket endpoint
    WebSocket(String),
    /// IPC socket path (Unix only)
    #[cfg(unix)]
    Ipc(PathBuf),
}

impl ProviderConfig {
    /// Infer the transport from an endpoint string
    ///
    /// `http(s)://` and `ws(s)://` URLs map to their transports; anything
    /// else is treated as an IPC socket path.
    pub fn parse(endpoint: &str) -> Result<Self> {
        let endpoint = endpoint.trim();
        if endpoint.is_empty() {
            bail!("empty endpoint");
        }
        let lower = endpoint.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            return Ok(ProviderConfig::Http(endpoint.to_string()));
        }
        if lower.starts_with("ws://") || lower.starts_with("wss://") {
            return Ok(ProviderConfig::WebSocket(endpoint.to_string()));
        }
        #[cfg(unix)]
        {
            Ok(ProviderConfig::Ipc(PathBuf::from(endpoint)))
        }
        #[cfg(not(unix))]
        {
            bail!("unsupported endpoint '{endpoint}' (expected http(s):// or ws(s)://)")
        }
    }

    /// Get display name for this endpoint
    pub fn display(&self) -> String {
        match self {
            ProviderConfig::Http(url) => url.clone(),
            ProviderConfig::WebSocket(url) => url.clone(),
            #[cfg(unix)]
            ProviderConfig::Ipc(path) => path.display().to_string(),
        }
    }

    /// Check if this is a WebSocket endpoint
    pub fn is_websocket(&self) -> bool {
        matches!(self, ProviderConfig::WebSocket(_))
    }

    /// Whether `eth_subscribe` is available on this transport
    pub fn supports_subscriptions(&self) -> bool {
        !matches!(self, ProviderConfig::Http(_))
    }
}

/// Load a local signer from a hex private key
pub fn signer_from_key(key: &str) -> Result<PrivateKeySigner> {
    let key = key.trim();
    key.parse::<PrivateKeySigner>()
        .context("Invalid private key (expected 32-byte hex)")
}

/// Create a provider from configuration
///
/// With a signer the provider fills and signs transactions locally;
/// without one it can still call, read logs and subscribe.
pub async fn connect(config: &ProviderConfig, signer: Option<PrivateKeySigner>) -> Result<DynProvider> {
    debug!(endpoint = %config.display(), signing = signer.is_some(), "connecting");

    let provider = match signer {
        Some(signer) => {
            let from = signer.address();
            let wallet = EthereumWallet::from(signer);
            let provider = match config {
                ProviderConfig::Http(url) => {
                    let rpc_url = url.parse().context("Invalid HTTP URL")?;
                    ProviderBuilder::new().wallet(wallet).connect_http(rpc_url).erased()
                }
                ProviderConfig::WebSocket(url) => ProviderBuilder::new()
                    .wallet(wallet)
                    .connect(url)
                    .await
                    .context("Failed to create WebSocket provider")?
                    .erased(),
                #[cfg(unix)]
                ProviderConfig::Ipc(path) => {
                    use alloy::providers::IpcConnect;
                    let ipc = IpcConnect::new(path.to_string_lossy().to_string());
                    ProviderBuilder::new()
                        .wallet(wallet)
                        .connect_ipc(ipc)
                        .await
                        .context("Failed to create IPC provider")?
                        .erased()
                }
            };
            info!(endpoint = %config.display(), %from, "connected with signer");
            provider
        }
        None => {
            let provider = match config {
                ProviderConfig::Http(url) => {
                    let rpc_url = url.parse().context("Invalid HTTP URL")?;
                    ProviderBuilder::new().connect_http(rpc_url).erased()
                }
                ProviderConfig::WebSocket(url) => ProviderBuilder::new()
                    .connect(url)
                    .await
                    .context("Failed to create WebSocket provider")?
                    .erased(),
                #[cfg(unix)]
                ProviderConfig::Ipc(path) => {
                    use alloy::providers::IpcConnect;
                    let ipc = IpcConnect::new(path.to_string_lossy().to_string());
                    ProviderBuilder::new()
                        .connect_ipc(ipc)
                        .await
                        .context("Failed to create IPC provider")?
                        .erased()
                }
            };
            info!(endpoint = %config.display(), "connected read-only");
            provider
        }
    };

    Ok(provider)
}

/// Fail if the node serves a different chain than configured
pub async fn verify_chain_id(provider: &DynProvider, expected: Option<u64>) -> Result<u64> {
    let chain_id = provider.get_chain_id().await.context("Failed to fetch chain id")?;
    if let Some(expected) = expected {
        if chain_id != expected {
            bail!("endpoint serves chain {chain_id}, configuration expects {expected}");
        }
    }
    Ok(chain_id)
}
