//! State-changing contract calls
//!
//! Every method submits one transaction and returns a [`PendingTx`]
//! as soon as the node accepts it. Access rules are enforced on chain;
//! a rejected call surfaces as [`RegistryError::Revert`] either when
//! the node estimates gas or when the receipt is read.

use alloy::contract::SolCallBuilder;
use alloy::primitives::{aliases::U48, Address, Bytes, U256};
use alloy::providers::Provider;
use alloy::sol_types::SolCall;
use tracing::debug;

use super::{PendingTx, RegistryClient, TxOutcome};
use crate::bindings::{NodeRegistry, NodeRegistryEvents};
use crate::domain::roles::Role;
use crate::error::{RegistryError, RegistryResult};

impl<P: Provider + Clone> RegistryClient<P> {
    /// Apply the session transaction options, submit, and wrap the handle
    async fn write<C: SolCall>(
        &self,
        method: &'static str,
        call: SolCallBuilder<&P, C>,
    ) -> RegistryResult<PendingTx> {
        let options = &self.tx_options;
        let mut call = call;
        if let Some(from) = options.from {
            call = call.from(from);
        }
        if let Some(gas) = options.gas_limit {
            call = call.gas(gas);
        }
        if let Some(fee) = options.max_fee_per_gas {
            call = call.max_fee_per_gas(fee);
        }
        if let Some(tip) = options.max_priority_fee_per_gas {
            call = call.max_priority_fee_per_gas(tip);
        }
        if let Some(nonce) = options.nonce {
            call = call.nonce(nonce);
        }
        if let Some(value) = options.value {
            call = call.value(value);
        }

        let pending = call.send().await?;
        debug!(method, tx_hash = %pending.tx_hash(), "transaction submitted");
        Ok(PendingTx::new(pending, self.address(), self.receipts, method))
    }

    // ---- default admin rules ----

    pub async fn accept_default_admin_transfer(&self) -> RegistryResult<PendingTx> {
        self.write(
            "acceptDefaultAdminTransfer",
            self.instance.acceptDefaultAdminTransfer(),
        )
        .await
    }

    pub async fn begin_default_admin_transfer(&self, new_admin: Address) -> RegistryResult<PendingTx> {
        self.write(
            "beginDefaultAdminTransfer",
            self.instance.beginDefaultAdminTransfer(new_admin),
        )
        .await
    }

    pub async fn cancel_default_admin_transfer(&self) -> RegistryResult<PendingTx> {
        self.write(
            "cancelDefaultAdminTransfer",
            self.instance.cancelDefaultAdminTransfer(),
        )
        .await
    }

    pub async fn change_default_admin_delay(&self, new_delay: U48) -> RegistryResult<PendingTx> {
        self.write(
            "changeDefaultAdminDelay",
            self.instance.changeDefaultAdminDelay(new_delay),
        )
        .await
    }

    pub async fn rollback_default_admin_delay(&self) -> RegistryResult<PendingTx> {
        self.write(
            "rollbackDefaultAdminDelay",
            self.instance.rollbackDefaultAdminDelay(),
        )
        .await
    }

    // ---- access control ----

    pub async fn grant_role(&self, role: Role, account: Address) -> RegistryResult<PendingTx> {
        self.write("grantRole", self.instance.grantRole(role.id(), account))
            .await
    }

    /// `account` must be the sender; the contract rejects anything else
    pub async fn renounce_role(&self, role: Role, account: Address) -> RegistryResult<PendingTx> {
        self.write("renounceRole", self.instance.renounceRole(role.id(), account))
            .await
    }

    pub async fn revoke_role(&self, role: Role, account: Address) -> RegistryResult<PendingTx> {
        self.write("revokeRole", self.instance.revokeRole(role.id(), account))
            .await
    }

    // ---- nodes ----

    /// Mint a node NFT to `to`
    pub async fn add_node(
        &self,
        to: Address,
        signing_key_pub: Bytes,
        http_address: String,
        min_monthly_fee_micro_dollars: U256,
    ) -> RegistryResult<PendingTx> {
        self.write(
            "addNode",
            self.instance.addNode(
                to,
                signing_key_pub,
                http_address,
                min_monthly_fee_micro_dollars,
            ),
        )
        .await
    }

    /// [`Self::add_node`], then read the assigned id from the `NodeAdded` event
    pub async fn add_node_and_wait(
        &self,
        to: Address,
        signing_key_pub: Bytes,
        http_address: String,
        min_monthly_fee_micro_dollars: U256,
    ) -> RegistryResult<(U256, TxOutcome)> {
        let outcome = self
            .add_node(to, signing_key_pub, http_address, min_monthly_fee_micro_dollars)
            .await?
            .wait()
            .await?;
        let node_id = added_node_id(&outcome).ok_or(RegistryError::MissingEvent("NodeAdded"))?;
        Ok((node_id, outcome))
    }

    pub async fn disable_node(&self, node_id: U256) -> RegistryResult<PendingTx> {
        self.write("disableNode", self.instance.disableNode(node_id))
            .await
    }

    pub async fn enable_node(&self, node_id: U256) -> RegistryResult<PendingTx> {
        self.write("enableNode", self.instance.enableNode(node_id))
            .await
    }

    pub async fn remove_from_api_nodes(&self, node_id: U256) -> RegistryResult<PendingTx> {
        self.write("removeFromApiNodes", self.instance.removeFromApiNodes(node_id))
            .await
    }

    pub async fn remove_from_replication_nodes(&self, node_id: U256) -> RegistryResult<PendingTx> {
        self.write(
            "removeFromReplicationNodes",
            self.instance.removeFromReplicationNodes(node_id),
        )
        .await
    }

    pub async fn set_http_address(
        &self,
        node_id: U256,
        http_address: String,
    ) -> RegistryResult<PendingTx> {
        self.write(
            "setHttpAddress",
            self.instance.setHttpAddress(node_id, http_address),
        )
        .await
    }

    pub async fn set_is_api_enabled(&self, node_id: U256, enabled: bool) -> RegistryResult<PendingTx> {
        self.write("setIsApiEnabled", self.instance.setIsApiEnabled(node_id, enabled))
            .await
    }

    pub async fn set_is_replication_enabled(
        &self,
        node_id: U256,
        enabled: bool,
    ) -> RegistryResult<PendingTx> {
        self.write(
            "setIsReplicationEnabled",
            self.instance.setIsReplicationEnabled(node_id, enabled),
        )
        .await
    }

    pub async fn set_min_monthly_fee(
        &self,
        node_id: U256,
        min_monthly_fee_micro_dollars: U256,
    ) -> RegistryResult<PendingTx> {
        self.write(
            "setMinMonthlyFee",
            self.instance
                .setMinMonthlyFee(node_id, min_monthly_fee_micro_dollars),
        )
        .await
    }

    pub async fn set_max_active_nodes(&self, max_active_nodes: u8) -> RegistryResult<PendingTx> {
        self.write(
            "setMaxActiveNodes",
            self.instance.setMaxActiveNodes(max_active_nodes),
        )
        .await
    }

    /// Commission in basis points, bounded by `MAX_BPS` on chain
    pub async fn set_node_operator_commission_percent(
        &self,
        commission_bps: U256,
    ) -> RegistryResult<PendingTx> {
        self.write(
            "setNodeOperatorCommissionPercent",
            self.instance.setNodeOperatorCommissionPercent(commission_bps),
        )
        .await
    }

    pub async fn set_base_uri(&self, base_uri: String) -> RegistryResult<PendingTx> {
        self.write("setBaseURI", self.instance.setBaseURI(base_uri))
            .await
    }

    // ---- ERC-721 ----

    pub async fn approve(&self, to: Address, token_id: U256) -> RegistryResult<PendingTx> {
        self.write("approve", self.instance.approve(to, token_id))
            .await
    }

    pub async fn set_approval_for_all(
        &self,
        operator: Address,
        approved: bool,
    ) -> RegistryResult<PendingTx> {
        self.write(
            "setApprovalForAll",
            self.instance.setApprovalForAll(operator, approved),
        )
        .await
    }

    pub async fn transfer_from(
        &self,
        from: Address,
        to: Address,
        node_id: U256,
    ) -> RegistryResult<PendingTx> {
        self.write("transferFrom", self.instance.transferFrom(from, to, node_id))
            .await
    }

    /// `safeTransferFrom(address,address,uint256)`
    pub async fn safe_transfer_from(
        &self,
        from: Address,
        to: Address,
        token_id: U256,
    ) -> RegistryResult<PendingTx> {
        self.write(
            "safeTransferFrom",
            self.instance.safeTransferFrom_0(from, to, token_id),
        )
        .await
    }

    /// `safeTransferFrom(address,address,uint256,bytes)`
    pub async fn safe_transfer_from_with_data(
        &self,
        from: Address,
        to: Address,
        token_id: U256,
        data: Bytes,
    ) -> RegistryResult<PendingTx> {
        self.write(
            "safeTransferFrom",
            self.instance.safeTransferFrom_1(from, to, token_id, data),
        )
        .await
    }
}

/// Node id from the first `NodeAdded` event of a receipt
pub fn added_node_id(outcome: &TxOutcome) -> Option<U256> {
    outcome.events.iter().find_map(|record| match &record.event {
        NodeRegistryEvents::NodeAdded(NodeRegistry::NodeAdded { nodeId, .. }) => Some(*nodeId),
        _ => None,
    })
}
