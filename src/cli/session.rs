//! Connection state shared by commands

use std::path::PathBuf;
use std::time::Duration;

use alloy::primitives::Address;
use alloy::providers::DynProvider;
use anyhow::{bail, Context, Result};
use tracing::debug;

use super::GlobalArgs;
use crate::config::Config;
use crate::infrastructure::ethereum::{connect, signer_from_key, verify_chain_id, ProviderConfig};
use crate::registry::{ReceiptPolicy, RegistryClient, TxOptions};
use crate::store::EventStore;

const DEFAULT_ENDPOINT: &str = "http://localhost:8545";
const DEFAULT_KEY_ENV: &str = "NODEREGISTRY_PRIVATE_KEY";

pub struct Session {
    pub config: Config,
    pub endpoint: ProviderConfig,
    pub provider: DynProvider,
    pub chain_id: u64,
    /// Signing account, when a key was loaded
    pub sender: Option<Address>,
    contract: Option<Address>,
}

impl Session {
    /// Connect using flags first, then the configuration file
    ///
    /// `signing` requires a private key in the configured environment variable.
    pub async fn connect(globals: &GlobalArgs, config: Config, signing: bool) -> Result<Self> {
        let endpoint = resolve_endpoint(globals, &config)?;

        let key_env = globals
            .private_key_env
            .clone()
            .or_else(|| config.private_key_env.clone())
            .unwrap_or_else(|| DEFAULT_KEY_ENV.to_string());
        let signer = match std::env::var(&key_env) {
            Ok(key) if !key.trim().is_empty() => Some(
                signer_from_key(&key).with_context(|| format!("load signing key from ${key_env}"))?,
            ),
            _ if signing => bail!("this command sends a transaction; set ${key_env} to a private key"),
            _ => None,
        };
        let sender = signer.as_ref().map(|s| s.address());

        let provider = connect(&endpoint, signer).await?;
        let chain_id = verify_chain_id(&provider, config.chain_id).await?;

        let contract = match globals.contract {
            Some(address) => Some(address),
            None => config
                .contract
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| s.parse::<Address>().context("Invalid contract address in config"))
                .transpose()?,
        };
        debug!(chain_id, contract = ?contract, "session ready");

        Ok(Self {
            config,
            endpoint,
            provider,
            chain_id,
            sender,
            contract,
        })
    }

    pub fn contract(&self) -> Result<Address> {
        self.contract
            .context("no registry address; pass --contract or set `contract` in the config")
    }

    pub fn receipt_policy(&self) -> ReceiptPolicy {
        ReceiptPolicy {
            confirmations: self.config.confirmations,
            timeout: Duration::from_secs(self.config.receipt_timeout_secs),
        }
    }

    pub fn tx_options(&self) -> TxOptions {
        TxOptions {
            from: self.sender,
            ..TxOptions::default()
        }
    }

    /// Registry client configured from the session
    pub fn registry(&self) -> Result<RegistryClient<DynProvider>> {
        Ok(RegistryClient::new(self.contract()?, self.provider.clone())
            .with_tx_options(self.tx_options())
            .with_receipt_policy(self.receipt_policy())
            .with_log_chunk_size(self.config.log_chunk_size)
            .with_subscriptions(self.endpoint.supports_subscriptions()))
    }

    pub fn store_path(&self) -> Result<PathBuf> {
        self.config
            .database_path()
            .context("no data directory; set `database` in the config")
    }

    pub fn open_store(&self) -> Result<EventStore> {
        EventStore::open(&self.store_path()?, self.chain_id, self.contract()?)
    }
}

/// Endpoint from `--rpc`, `--ws`, `--ipc`, then the config, then localhost
pub fn resolve_endpoint(globals: &GlobalArgs, config: &Config) -> Result<ProviderConfig> {
    if let Some(rpc) = &globals.rpc {
        return ProviderConfig::parse(rpc);
    }
    if let Some(ws) = &globals.ws {
        return ProviderConfig::parse(ws);
    }
    if let Some(ipc) = &globals.ipc {
        #[cfg(unix)]
        {
            return Ok(ProviderConfig::Ipc(ipc.clone()));
        }
        #[cfg(not(unix))]
        {
            bail!("IPC endpoints are not supported on this platform ({})", ipc.display());
        }
    }
    ProviderConfig::parse(config.endpoint().unwrap_or(DEFAULT_ENDPOINT))
}
