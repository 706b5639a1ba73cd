//! Contract bindings for NodeRegistry
//!
//! The interface below mirrors `abi/NodeRegistry.json` one-to-one. Selectors,
//! topics and error signatures are derived by `sol!`, so any edit here must be
//! matched by the JSON artifact (see the consistency tests at the bottom).

#![allow(clippy::too_many_arguments)]

use alloy::primitives::Bytes;
use alloy_json_abi::JsonAbi;

use crate::error::{RegistryError, RegistryResult};

/// JSON ABI of the deployed contract
pub const ABI_JSON: &str = include_str!("../../abi/NodeRegistry.json");

/// Deployment (creation) bytecode, hex encoded with `0x` prefix
pub const BYTECODE_HEX: &str = include_str!("../../abi/NodeRegistry.bin");

alloy::sol! {
    #[sol(rpc, all_derives)]
    contract NodeRegistry {
        struct Node {
            bytes signingKeyPub;
            string httpAddress;
            bool isReplicationEnabled;
            bool isApiEnabled;
            bool isDisabled;
            uint256 minMonthlyFeeMicroDollars;
        }

        struct NodeWithId {
            uint256 nodeId;
            Node node;
        }

        constructor(address initialAdmin);

        // Constants
        function ADMIN_ROLE() external view returns (bytes32);
        function DEFAULT_ADMIN_ROLE() external view returns (bytes32);
        function MAX_BPS() external view returns (uint256);
        function NODE_INCREMENT() external view returns (uint32);
        function NODE_MANAGER_ROLE() external view returns (bytes32);

        // Default admin rules
        function acceptDefaultAdminTransfer() external;
        function beginDefaultAdminTransfer(address newAdmin) external;
        function cancelDefaultAdminTransfer() external;
        function changeDefaultAdminDelay(uint48 newDelay) external;
        function rollbackDefaultAdminDelay() external;
        function defaultAdmin() external view returns (address);
        function defaultAdminDelay() external view returns (uint48);
        function defaultAdminDelayIncreaseWait() external view returns (uint48);
        function pendingDefaultAdmin() external view returns (address newAdmin, uint48 schedule);
        function pendingDefaultAdminDelay() external view returns (uint48 newDelay, uint48 schedule);
        function owner() external view returns (address);

        // Access control
        function getRoleAdmin(bytes32 role) external view returns (bytes32);
        function grantRole(bytes32 role, address account) external;
        function hasRole(bytes32 role, address account) external view returns (bool);
        function renounceRole(bytes32 role, address account) external;
        function revokeRole(bytes32 role, address account) external;

        // Node lifecycle
        function addNode(address to, bytes signingKeyPub, string httpAddress, uint256 minMonthlyFeeMicroDollars) external returns (uint256 nodeId);
        function disableNode(uint256 nodeId) external;
        function enableNode(uint256 nodeId) external;
        function removeFromApiNodes(uint256 nodeId) external;
        function removeFromReplicationNodes(uint256 nodeId) external;
        function setHttpAddress(uint256 nodeId, string httpAddress) external;
        function setIsApiEnabled(uint256 nodeId, bool isApiEnabled) external;
        function setIsReplicationEnabled(uint256 nodeId, bool isReplicationEnabled) external;
        function setMinMonthlyFee(uint256 nodeId, uint256 minMonthlyFeeMicroDollars) external;
        function setMaxActiveNodes(uint8 newMaxActiveNodes) external;
        function setNodeOperatorCommissionPercent(uint256 newCommissionPercent) external;
        function setBaseURI(string newBaseURI) external;

        // Node queries
        function getActiveApiNodes() external view returns (NodeWithId[] activeNodes);
        function getActiveApiNodesCount() external view returns (uint256 activeNodesCount);
        function getActiveApiNodesIDs() external view returns (uint256[] activeNodesIDs);
        function getActiveReplicationNodes() external view returns (NodeWithId[] activeNodes);
        function getActiveReplicationNodesCount() external view returns (uint256 activeNodesCount);
        function getActiveReplicationNodesIDs() external view returns (uint256[] activeNodesIDs);
        function getAllNodes() external view returns (NodeWithId[] allNodes);
        function getAllNodesCount() external view returns (uint256 nodeCount);
        function getApiNodeIsActive(uint256 nodeId) external view returns (bool isActive);
        function getReplicationNodeIsActive(uint256 nodeId) external view returns (bool isActive);
        function getNode(uint256 nodeId) external view returns (Node node);
        function getNodeOperatorCommissionPercent() external view returns (uint256 commissionPercent);
        function nodeOperatorCommissionPercent() external view returns (uint256);
        function maxActiveNodes() external view returns (uint8);

        // ERC-721
        function approve(address to, uint256 tokenId) external;
        function balanceOf(address owner) external view returns (uint256);
        function getApproved(uint256 tokenId) external view returns (address);
        function isApprovedForAll(address owner, address operator) external view returns (bool);
        function name() external view returns (string);
        function ownerOf(uint256 tokenId) external view returns (address);
        function safeTransferFrom(address from, address to, uint256 tokenId) external;
        function safeTransferFrom(address from, address to, uint256 tokenId, bytes data) external;
        function setApprovalForAll(address operator, bool approved) external;
        function supportsInterface(bytes4 interfaceId) external view returns (bool supported);
        function symbol() external view returns (string);
        function tokenURI(uint256 tokenId) external view returns (string);
        function transferFrom(address from, address to, uint256 nodeId) external;

        // Events
        event ApiDisabled(uint256 indexed nodeId);
        event ApiEnabled(uint256 indexed nodeId);
        event Approval(address indexed owner, address indexed approved, uint256 indexed tokenId);
        event ApprovalForAll(address indexed owner, address indexed operator, bool approved);
        event BaseURIUpdated(string newBaseURI);
        event DefaultAdminDelayChangeCanceled();
        event DefaultAdminDelayChangeScheduled(uint48 newDelay, uint48 effectSchedule);
        event DefaultAdminTransferCanceled();
        event DefaultAdminTransferScheduled(address indexed newAdmin, uint48 acceptSchedule);
        event HttpAddressUpdated(uint256 indexed nodeId, string newHttpAddress);
        event MaxActiveNodesUpdated(uint8 newMaxActiveNodes);
        event MinMonthlyFeeUpdated(uint256 indexed nodeId, uint256 minMonthlyFeeMicroDollars);
        event NodeAdded(uint256 indexed nodeId, address indexed owner, bytes signingKeyPub, string httpAddress, uint256 minMonthlyFeeMicroDollars);
        event NodeDisabled(uint256 indexed nodeId);
        event NodeEnabled(uint256 indexed nodeId);
        event NodeOperatorCommissionPercentUpdated(uint256 newCommissionPercent);
        event NodeTransferred(uint256 indexed nodeId, address indexed from, address indexed to);
        event ReplicationDisabled(uint256 indexed nodeId);
        event ReplicationEnabled(uint256 indexed nodeId);
        event RoleAdminChanged(bytes32 indexed role, bytes32 indexed previousAdminRole, bytes32 indexed newAdminRole);
        event RoleGranted(bytes32 indexed role, address indexed account, address indexed sender);
        event RoleRevoked(bytes32 indexed role, address indexed account, address indexed sender);
        event Transfer(address indexed from, address indexed to, uint256 indexed tokenId);

        // Errors
        error AccessControlBadConfirmation();
        error AccessControlEnforcedDefaultAdminDelay(uint48 schedule);
        error AccessControlEnforcedDefaultAdminRules();
        error AccessControlInvalidDefaultAdmin(address defaultAdmin);
        error AccessControlUnauthorizedAccount(address account, bytes32 neededRole);
        error ERC721IncorrectOwner(address sender, uint256 tokenId, address owner);
        error ERC721InsufficientApproval(address operator, uint256 tokenId);
        error ERC721InvalidApprover(address approver);
        error ERC721InvalidOperator(address operator);
        error ERC721InvalidOwner(address owner);
        error ERC721InvalidReceiver(address receiver);
        error ERC721InvalidSender(address sender);
        error ERC721NonexistentToken(uint256 tokenId);
        error InvalidAddress();
        error InvalidCommissionPercent();
        error InvalidHttpAddress();
        error InvalidInputLength();
        error InvalidNodeConfig();
        error InvalidSigningKey();
        error InvalidURI();
        error MaxActiveNodesBelowCurrentCount();
        error MaxActiveNodesReached();
        error NodeDoesNotExist();
        error NodeIsDisabled();
        error SafeCastOverflowedUintDowncast(uint8 bits, uint256 value);
        error Unauthorized();
    }
}

pub use NodeRegistry::{NodeRegistryErrors, NodeRegistryEvents, NodeRegistryInstance};

/// Parse the embedded JSON ABI
pub fn abi() -> RegistryResult<JsonAbi> {
    serde_json::from_str(ABI_JSON).map_err(|err| RegistryError::InvalidArtifact(err.to_string()))
}

/// Decode the embedded deployment bytecode
pub fn bytecode() -> RegistryResult<Bytes> {
    let trimmed = BYTECODE_HEX.trim();
    let payload = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    hex::decode(payload)
        .map(Bytes::from)
        .map_err(|err| RegistryError::InvalidArtifact(format!("bytecode: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::sol_types::{SolCall, SolError, SolEvent};

    #[test]
    fn test_abi_parses() {
        let abi = abi().unwrap();
        assert_eq!(abi.functions().count(), 60);
        assert_eq!(abi.events().count(), 23);
        assert_eq!(abi.errors().count(), 26);
        assert!(abi.constructor().is_some());
    }

    #[test]
    fn test_selectors_match_json_abi() {
        let abi = abi().unwrap();
        let from_json = |name: &str| abi.function(name).unwrap()[0].selector().0;

        assert_eq!(from_json("getNode"), NodeRegistry::getNodeCall::SELECTOR);
        assert_eq!(from_json("addNode"), NodeRegistry::addNodeCall::SELECTOR);
        assert_eq!(from_json("getAllNodes"), NodeRegistry::getAllNodesCall::SELECTOR);
        assert_eq!(
            from_json("pendingDefaultAdmin"),
            NodeRegistry::pendingDefaultAdminCall::SELECTOR
        );
    }

    #[test]
    fn test_every_event_and_error_is_bound() {
        let abi = abi().unwrap();
        for event in abi.events() {
            let topic = event.selector();
            assert!(
                NodeRegistryEvents::SELECTORS.contains(&topic.0),
                "event {} not bound",
                event.name
            );
        }
        for error in abi.errors() {
            let selector = error.selector();
            assert!(
                NodeRegistryErrors::SELECTORS.contains(&selector.0),
                "error {} not bound",
                error.name
            );
        }
    }

    #[test]
    fn test_event_signatures() {
        assert_eq!(
            NodeRegistry::NodeAdded::SIGNATURE,
            "NodeAdded(uint256,address,bytes,string,uint256)"
        );
        assert_eq!(
            NodeRegistry::AccessControlUnauthorizedAccount::SIGNATURE,
            "AccessControlUnauthorizedAccount(address,bytes32)"
        );
    }

    #[test]
    fn test_bytecode_decodes() {
        let code = bytecode().unwrap();
        // PUSH1 0x80 PUSH1 0x40 MSTORE
        assert_eq!(&code[..5], &[0x60, 0x80, 0x60, 0x40, 0x52]);
    }
}
