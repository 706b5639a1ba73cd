//! Deployment of the embedded contract

use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes, TxHash};
use alloy::providers::Provider;
use alloy::rpc::types::TransactionRequest;
use alloy::sol_types::SolConstructor;
use tracing::{debug, info};

use super::{wait_for_receipt, ReceiptPolicy, RegistryClient, TxOptions};
use crate::bindings::{self, NodeRegistry};
use crate::error::{RegistryError, RegistryResult};

/// A freshly deployed registry
pub struct Deployment<P> {
    pub client: RegistryClient<P>,
    pub tx_hash: TxHash,
    pub block_number: Option<u64>,
    pub gas_used: u64,
}

/// Creation bytecode followed by the encoded constructor argument
pub fn deploy_data(initial_admin: Address) -> RegistryResult<Bytes> {
    let mut code = bindings::bytecode()?.to_vec();
    code.extend_from_slice(
        &NodeRegistry::constructorCall {
            initialAdmin: initial_admin,
        }
        .abi_encode(),
    );
    Ok(code.into())
}

/// CREATE address of the contract `deployer` would deploy at `nonce`
pub fn predict_address(deployer: Address, nonce: u64) -> Address {
    deployer.create(nonce)
}

/// Deploy a new registry owned by `initial_admin` and bind a client to it
pub async fn deploy<P: Provider + Clone>(
    provider: P,
    initial_admin: Address,
    options: &TxOptions,
    policy: ReceiptPolicy,
) -> RegistryResult<Deployment<P>> {
    let mut tx = TransactionRequest::default().with_deploy_code(deploy_data(initial_admin)?);
    if let Some(from) = options.from {
        tx = tx.with_from(from);
    }
    if let Some(gas) = options.gas_limit {
        tx = tx.with_gas_limit(gas);
    }
    if let Some(fee) = options.max_fee_per_gas {
        tx = tx.with_max_fee_per_gas(fee);
    }
    if let Some(tip) = options.max_priority_fee_per_gas {
        tx = tx.with_max_priority_fee_per_gas(tip);
    }
    if let Some(nonce) = options.nonce {
        tx = tx.with_nonce(nonce);
    }
    if let Some(value) = options.value {
        tx = tx.with_value(value);
    }

    let pending = provider.send_transaction(tx).await?;
    let tx_hash = *pending.tx_hash();
    debug!(%tx_hash, %initial_admin, "deployment submitted");

    let receipt = wait_for_receipt(&provider, tx_hash, policy).await?;
    if !receipt.status() {
        return Err(RegistryError::TransactionFailed { tx_hash });
    }
    let address = receipt
        .contract_address
        .ok_or(RegistryError::NoContractAddress(tx_hash))?;
    info!(%address, %tx_hash, gas_used = receipt.gas_used, "registry deployed");

    Ok(Deployment {
        client: RegistryClient::new(address, provider).with_receipt_policy(policy),
        tx_hash,
        block_number: receipt.block_number,
        gas_used: receipt.gas_used,
    })
}
