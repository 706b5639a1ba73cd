//! Typed proxy over the deployed NodeRegistry contract
//!
//! `RegistryClient` wraps the `sol!` generated instance. Every operation
//! encodes its arguments through the bindings, hands the request to the
//! provider and decodes the reply; no registry rule is evaluated here.
//! The surface is split by concern:
//!
//! - [`caller`]: `view` functions (`eth_call`)
//! - [`transactor`]: state-changing functions (`eth_sendTransaction`)
//! - [`filterer`]: historical and live event logs
//! - [`deploy`]: deployment of the embedded bytecode

mod caller;
mod deploy;
mod filterer;
mod transactor;

use std::time::Duration;

use alloy::eips::BlockId;
use alloy::network::Ethereum;
use alloy::primitives::{Address, TxHash, U256};
use alloy::providers::{PendingTransactionBuilder, Provider};
use alloy::rpc::types::TransactionReceipt;
use tracing::{debug, info, warn};

use crate::bindings::{NodeRegistry, NodeRegistryInstance};
use crate::domain::events::EventRecord;
use crate::error::{RegistryError, RegistryResult};

pub use deploy::{deploy, deploy_data, predict_address, Deployment};
pub use filterer::{BlockRange, Decoded, EventFilter, TopicFilter, TopicValue, WATCH_CHANNEL_CAPACITY};
pub use transactor::added_node_id;

/// Options applied to every `eth_call`
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    /// Block to evaluate at; latest when unset
    pub block: Option<BlockId>,
    /// Caller address seen by the contract
    pub from: Option<Address>,
}

/// Options applied to every submitted transaction
#[derive(Debug, Clone, Default)]
pub struct TxOptions {
    pub from: Option<Address>,
    pub gas_limit: Option<u64>,
    pub max_fee_per_gas: Option<u128>,
    pub max_priority_fee_per_gas: Option<u128>,
    pub nonce: Option<u64>,
    pub value: Option<U256>,
}

/// How long and how deep to wait for receipts
#[derive(Debug, Clone, Copy)]
pub struct ReceiptPolicy {
    pub confirmations: u64,
    pub timeout: Duration,
}

impl Default for ReceiptPolicy {
    fn default() -> Self {
        Self {
            confirmations: 1,
            timeout: Duration::from_secs(120),
        }
    }
}

/// Typed client for one NodeRegistry deployment
#[derive(Clone)]
pub struct RegistryClient<P> {
    instance: NodeRegistryInstance<P>,
    call_options: CallOptions,
    tx_options: TxOptions,
    receipts: ReceiptPolicy,
    log_chunk_size: u64,
    subscriptions: bool,
}

impl<P: Provider + Clone> RegistryClient<P> {
    /// Bind to the registry deployed at `address`
    pub fn new(address: Address, provider: P) -> Self {
        Self {
            instance: NodeRegistry::new(address, provider),
            call_options: CallOptions::default(),
            tx_options: TxOptions::default(),
            receipts: ReceiptPolicy::default(),
            log_chunk_size: 10_000,
            subscriptions: false,
        }
    }

    pub fn with_call_options(mut self, options: CallOptions) -> Self {
        self.call_options = options;
        self
    }

    pub fn with_tx_options(mut self, options: TxOptions) -> Self {
        self.tx_options = options;
        self
    }

    pub fn with_receipt_policy(mut self, policy: ReceiptPolicy) -> Self {
        self.receipts = policy;
        self
    }

    /// Maximum block span per `eth_getLogs` request; zero is treated as one
    pub fn with_log_chunk_size(mut self, blocks: u64) -> Self {
        self.log_chunk_size = blocks.max(1);
        self
    }

    /// Use `eth_subscribe` for live logs instead of filter polling
    pub fn with_subscriptions(mut self, enabled: bool) -> Self {
        self.subscriptions = enabled;
        self
    }

    pub fn address(&self) -> Address {
        *self.instance.address()
    }

    pub fn provider(&self) -> &P {
        self.instance.provider()
    }

    pub fn instance(&self) -> &NodeRegistryInstance<P> {
        &self.instance
    }

    pub fn call_options(&self) -> &CallOptions {
        &self.call_options
    }

    pub fn tx_options(&self) -> &TxOptions {
        &self.tx_options
    }
}

/// A submitted transaction that has not been waited on
pub struct PendingTx {
    inner: PendingTransactionBuilder<Ethereum>,
    registry: Address,
    policy: ReceiptPolicy,
    method: &'static str,
}

impl PendingTx {
    pub(crate) fn new(
        inner: PendingTransactionBuilder<Ethereum>,
        registry: Address,
        policy: ReceiptPolicy,
        method: &'static str,
    ) -> Self {
        Self {
            inner,
            registry,
            policy,
            method,
        }
    }

    pub fn tx_hash(&self) -> TxHash {
        *self.inner.tx_hash()
    }

    /// Contract function this transaction calls
    pub fn method(&self) -> &'static str {
        self.method
    }

    /// Wait for the receipt under the configured confirmation policy
    pub async fn wait(self) -> RegistryResult<TxOutcome> {
        let tx_hash = self.tx_hash();
        let receipt = wait_for_receipt(self.inner.provider(), tx_hash, self.policy).await?;
        let outcome = TxOutcome::from_receipt(&receipt, self.registry)?;
        info!(
            method = self.method,
            %tx_hash,
            block = ?outcome.block_number,
            gas_used = outcome.gas_used,
            events = outcome.events.len(),
            "transaction confirmed"
        );
        Ok(outcome)
    }
}

/// Poll `eth_getTransactionReceipt` until the transaction is mined under
/// `policy.confirmations` blocks, or fail after `policy.timeout`
pub(crate) async fn wait_for_receipt<P: Provider>(
    provider: &P,
    tx_hash: TxHash,
    policy: ReceiptPolicy,
) -> RegistryResult<TransactionReceipt> {
    tokio::time::timeout(policy.timeout, poll_receipt(provider, tx_hash, policy.confirmations))
        .await
        .map_err(|_| RegistryError::ReceiptTimeout {
            tx_hash,
            timeout: policy.timeout,
        })?
}

async fn poll_receipt<P: Provider>(
    provider: &P,
    tx_hash: TxHash,
    confirmations: u64,
) -> RegistryResult<TransactionReceipt> {
    let interval = provider.client().poll_interval();
    loop {
        if let Some(receipt) = provider.get_transaction_receipt(tx_hash).await? {
            let confirmed = match receipt.block_number {
                Some(mined) if confirmations > 1 => {
                    provider.get_block_number().await? >= mined + confirmations - 1
                }
                _ => true,
            };
            if confirmed {
                return Ok(receipt);
            }
        }
        debug!(%tx_hash, "waiting for receipt");
        tokio::time::sleep(interval).await;
    }
}

/// Result of a mined transaction
#[derive(Debug, Clone)]
pub struct TxOutcome {
    pub tx_hash: TxHash,
    pub block_number: Option<u64>,
    pub gas_used: u64,
    /// Always true; failed receipts become [`RegistryError::TransactionFailed`]
    pub success: bool,
    /// Registry events emitted by the transaction, in log order
    pub events: Vec<EventRecord>,
}

impl TxOutcome {
    /// Build an outcome from a receipt; a reverted receipt is an error
    pub fn from_receipt(receipt: &TransactionReceipt, registry: Address) -> RegistryResult<Self> {
        if !receipt.status() {
            return Err(RegistryError::TransactionFailed {
                tx_hash: receipt.transaction_hash,
            });
        }

        let mut events = Vec::new();
        for log in receipt.inner.logs() {
            if log.address() != registry {
                continue;
            }
            match EventRecord::from_log(log, registry) {
                Ok(record) => events.push(record),
                Err(err) => warn!(tx_hash = %receipt.transaction_hash, %err, "skipping undecodable log"),
            }
        }

        Ok(Self {
            tx_hash: receipt.transaction_hash,
            block_number: receipt.block_number,
            gas_used: receipt.gas_used,
            success: true,
            events,
        })
    }
}
