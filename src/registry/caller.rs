//! Read-only contract calls

use alloy::contract::SolCallBuilder;
use alloy::primitives::{aliases::U48, Address, FixedBytes, B256, U256};
use alloy::providers::Provider;
use alloy::sol_types::SolCall;

use super::RegistryClient;
use crate::domain::node::{Commission, Node, NodeWithId};
use crate::domain::roles::{PendingAdminTransfer, PendingDelayChange, Role};
use crate::error::RegistryResult;

impl<P: Provider + Clone> RegistryClient<P> {
    /// Apply the session call options to a call builder
    fn read<'a, C: SolCall>(&self, call: SolCallBuilder<&'a P, C>) -> SolCallBuilder<&'a P, C> {
        let call = match self.call_options.block {
            Some(block) => call.block(block),
            None => call,
        };
        match self.call_options.from {
            Some(from) => call.from(from),
            None => call,
        }
    }

    // ---- constants ----

    pub async fn admin_role(&self) -> RegistryResult<B256> {
        Ok(self.read(self.instance.ADMIN_ROLE()).call().await?)
    }

    pub async fn default_admin_role(&self) -> RegistryResult<B256> {
        Ok(self.read(self.instance.DEFAULT_ADMIN_ROLE()).call().await?)
    }

    pub async fn max_bps(&self) -> RegistryResult<U256> {
        Ok(self.read(self.instance.MAX_BPS()).call().await?)
    }

    /// Step between consecutive node ids
    pub async fn node_increment(&self) -> RegistryResult<u32> {
        Ok(self.read(self.instance.NODE_INCREMENT()).call().await?)
    }

    pub async fn node_manager_role(&self) -> RegistryResult<B256> {
        Ok(self.read(self.instance.NODE_MANAGER_ROLE()).call().await?)
    }

    // ---- default admin rules ----

    pub async fn default_admin(&self) -> RegistryResult<Address> {
        Ok(self.read(self.instance.defaultAdmin()).call().await?)
    }

    pub async fn default_admin_delay(&self) -> RegistryResult<U48> {
        Ok(self.read(self.instance.defaultAdminDelay()).call().await?)
    }

    pub async fn default_admin_delay_increase_wait(&self) -> RegistryResult<U48> {
        Ok(self
            .read(self.instance.defaultAdminDelayIncreaseWait())
            .call()
            .await?)
    }

    pub async fn pending_default_admin(&self) -> RegistryResult<PendingAdminTransfer> {
        let pending = self.read(self.instance.pendingDefaultAdmin()).call().await?;
        Ok(PendingAdminTransfer {
            new_admin: pending.newAdmin,
            schedule: pending.schedule,
        })
    }

    pub async fn pending_default_admin_delay(&self) -> RegistryResult<PendingDelayChange> {
        let pending = self
            .read(self.instance.pendingDefaultAdminDelay())
            .call()
            .await?;
        Ok(PendingDelayChange {
            new_delay: pending.newDelay,
            schedule: pending.schedule,
        })
    }

    /// ERC-5313 owner, which is the default admin
    pub async fn owner(&self) -> RegistryResult<Address> {
        Ok(self.read(self.instance.owner()).call().await?)
    }

    // ---- access control ----

    pub async fn get_role_admin(&self, role: Role) -> RegistryResult<Role> {
        let admin = self.read(self.instance.getRoleAdmin(role.id())).call().await?;
        Ok(Role::from_id(admin))
    }

    pub async fn has_role(&self, role: Role, account: Address) -> RegistryResult<bool> {
        Ok(self
            .read(self.instance.hasRole(role.id(), account))
            .call()
            .await?)
    }

    // ---- nodes ----

    pub async fn get_node(&self, node_id: U256) -> RegistryResult<Node> {
        let node = self.read(self.instance.getNode(node_id)).call().await?;
        Ok(node.into())
    }

    pub async fn get_all_nodes(&self) -> RegistryResult<Vec<NodeWithId>> {
        let nodes = self.read(self.instance.getAllNodes()).call().await?;
        Ok(nodes.into_iter().map(NodeWithId::from).collect())
    }

    pub async fn get_all_nodes_count(&self) -> RegistryResult<U256> {
        Ok(self.read(self.instance.getAllNodesCount()).call().await?)
    }

    pub async fn get_active_api_nodes(&self) -> RegistryResult<Vec<NodeWithId>> {
        let nodes = self.read(self.instance.getActiveApiNodes()).call().await?;
        Ok(nodes.into_iter().map(NodeWithId::from).collect())
    }

    pub async fn get_active_api_nodes_count(&self) -> RegistryResult<U256> {
        Ok(self
            .read(self.instance.getActiveApiNodesCount())
            .call()
            .await?)
    }

    pub async fn get_active_api_nodes_ids(&self) -> RegistryResult<Vec<U256>> {
        Ok(self.read(self.instance.getActiveApiNodesIDs()).call().await?)
    }

    pub async fn get_active_replication_nodes(&self) -> RegistryResult<Vec<NodeWithId>> {
        let nodes = self
            .read(self.instance.getActiveReplicationNodes())
            .call()
            .await?;
        Ok(nodes.into_iter().map(NodeWithId::from).collect())
    }

    pub async fn get_active_replication_nodes_count(&self) -> RegistryResult<U256> {
        Ok(self
            .read(self.instance.getActiveReplicationNodesCount())
            .call()
            .await?)
    }

    pub async fn get_active_replication_nodes_ids(&self) -> RegistryResult<Vec<U256>> {
        Ok(self
            .read(self.instance.getActiveReplicationNodesIDs())
            .call()
            .await?)
    }

    pub async fn get_api_node_is_active(&self, node_id: U256) -> RegistryResult<bool> {
        Ok(self
            .read(self.instance.getApiNodeIsActive(node_id))
            .call()
            .await?)
    }

    pub async fn get_replication_node_is_active(&self, node_id: U256) -> RegistryResult<bool> {
        Ok(self
            .read(self.instance.getReplicationNodeIsActive(node_id))
            .call()
            .await?)
    }

    /// Commission in basis points
    pub async fn get_node_operator_commission_percent(&self) -> RegistryResult<U256> {
        Ok(self
            .read(self.instance.getNodeOperatorCommissionPercent())
            .call()
            .await?)
    }

    /// Public storage getter; same value as [`Self::get_node_operator_commission_percent`]
    pub async fn node_operator_commission_percent(&self) -> RegistryResult<U256> {
        Ok(self
            .read(self.instance.nodeOperatorCommissionPercent())
            .call()
            .await?)
    }

    /// Commission together with `MAX_BPS`, for display
    pub async fn commission(&self) -> RegistryResult<Commission> {
        let bps = self.get_node_operator_commission_percent().await?;
        let max_bps = self.max_bps().await?;
        Ok(Commission::new(bps, max_bps))
    }

    pub async fn max_active_nodes(&self) -> RegistryResult<u8> {
        Ok(self.read(self.instance.maxActiveNodes()).call().await?)
    }

    // ---- ERC-721 ----

    pub async fn balance_of(&self, owner: Address) -> RegistryResult<U256> {
        Ok(self.read(self.instance.balanceOf(owner)).call().await?)
    }

    pub async fn get_approved(&self, token_id: U256) -> RegistryResult<Address> {
        Ok(self.read(self.instance.getApproved(token_id)).call().await?)
    }

    pub async fn is_approved_for_all(&self, owner: Address, operator: Address) -> RegistryResult<bool> {
        Ok(self
            .read(self.instance.isApprovedForAll(owner, operator))
            .call()
            .await?)
    }

    pub async fn name(&self) -> RegistryResult<String> {
        Ok(self.read(self.instance.name()).call().await?)
    }

    pub async fn symbol(&self) -> RegistryResult<String> {
        Ok(self.read(self.instance.symbol()).call().await?)
    }

    pub async fn owner_of(&self, token_id: U256) -> RegistryResult<Address> {
        Ok(self.read(self.instance.ownerOf(token_id)).call().await?)
    }

    pub async fn supports_interface(&self, interface_id: FixedBytes<4>) -> RegistryResult<bool> {
        Ok(self
            .read(self.instance.supportsInterface(interface_id))
            .call()
            .await?)
    }

    pub async fn token_uri(&self, token_id: U256) -> RegistryResult<String> {
        Ok(self.read(self.instance.tokenURI(token_id)).call().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::CallOptions;
    use alloy::eips::BlockId;
    use alloy::primitives::address;
    use alloy::providers::ProviderBuilder;
    use alloy::transports::mock::Asserter;

    fn client(options: CallOptions) -> RegistryClient<impl Provider + Clone> {
        let provider = ProviderBuilder::new()
            .disable_recommended_fillers()
            .connect_mocked_client(Asserter::new());
        RegistryClient::new(Address::ZERO, provider).with_call_options(options)
    }

    #[test]
    fn test_call_options_reach_the_builder() {
        let caller = address!("0x70997970C51812dc3A010C7d01b50e0d17dc79C8");
        let registry = client(CallOptions {
            block: Some(BlockId::number(42)),
            from: Some(caller),
        });

        let call = registry.read(registry.instance.maxActiveNodes());
        assert_eq!(call.as_ref().from, Some(caller));
        assert!(format!("{call:?}").contains("block: 0x2a"));
    }

    #[test]
    fn test_default_call_options_read_latest() {
        let registry = client(CallOptions::default());

        let call = registry.read(registry.instance.maxActiveNodes());
        assert_eq!(call.as_ref().from, None);
        assert!(format!("{call:?}").contains("block: latest"));
    }
}
