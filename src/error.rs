//! Error types for the NodeRegistry client

use std::time::Duration;

use alloy::primitives::{Address, Bytes, TxHash, B256};
use alloy::sol_types::SolInterface;
use thiserror::Error;

use crate::bindings::NodeRegistryErrors;

pub type RegistryResult<T> = Result<T, RegistryError>;

#[derive(Debug, Error)]
pub enum RegistryError {
    /// The contract reverted with one of its own custom errors
    #[error("contract reverted: {}", describe_revert(.0))]
    Revert(NodeRegistryErrors),

    /// The contract reverted with `Error(string)`, a panic code, or raw data
    #[error("contract reverted: {0}")]
    RevertReason(String),

    #[error(transparent)]
    Contract(alloy::contract::Error),

    #[error("rpc: {0}")]
    Transport(#[from] alloy::transports::TransportError),

    #[error("no receipt for {tx_hash} after {timeout:?}")]
    ReceiptTimeout { tx_hash: TxHash, timeout: Duration },

    #[error("transaction {tx_hash} failed on chain")]
    TransactionFailed { tx_hash: TxHash },

    #[error("abi decode: {0}")]
    Decode(#[from] alloy::sol_types::Error),

    #[error("log topic {0} does not belong to NodeRegistry")]
    UnknownEvent(B256),

    #[error("log emitted by {0}, not by the registry")]
    ForeignLog(Address),

    #[error("receipt does not contain a {0} event")]
    MissingEvent(&'static str),

    #[error("receipt of deployment {0} has no contract address")]
    NoContractAddress(TxHash),

    #[error("invalid embedded artifact: {0}")]
    InvalidArtifact(String),

    #[error("log subscriptions need a WebSocket or IPC endpoint")]
    SubscriptionsUnsupported,
}

impl From<alloy::contract::Error> for RegistryError {
    fn from(err: alloy::contract::Error) -> Self {
        match err.as_revert_data() {
            Some(data) => classify_revert(&data).unwrap_or(Self::Contract(err)),
            None => Self::Contract(err),
        }
    }
}

impl RegistryError {
    /// The decoded custom error, if the contract reverted with one
    pub fn revert(&self) -> Option<&NodeRegistryErrors> {
        match self {
            Self::Revert(err) => Some(err),
            _ => None,
        }
    }
}

/// Classify raw revert data as a registry error or a standard revert reason
pub fn classify_revert(data: &Bytes) -> Option<RegistryError> {
    if let Ok(decoded) = NodeRegistryErrors::abi_decode(data) {
        return Some(RegistryError::Revert(decoded));
    }
    alloy::sol_types::decode_revert_reason(data).map(RegistryError::RevertReason)
}

/// Render a custom error as `Name(arg, ...)`
pub fn describe_revert(err: &NodeRegistryErrors) -> String {
    use NodeRegistryErrors as E;
    match err {
        E::AccessControlEnforcedDefaultAdminDelay(e) => {
            format!("AccessControlEnforcedDefaultAdminDelay(schedule: {})", e.schedule)
        }
        E::AccessControlInvalidDefaultAdmin(e) => {
            format!("AccessControlInvalidDefaultAdmin(defaultAdmin: {})", e.defaultAdmin)
        }
        E::AccessControlUnauthorizedAccount(e) => format!(
            "AccessControlUnauthorizedAccount(account: {}, neededRole: {})",
            e.account, e.neededRole
        ),
        E::ERC721IncorrectOwner(e) => format!(
            "ERC721IncorrectOwner(sender: {}, tokenId: {}, owner: {})",
            e.sender, e.tokenId, e.owner
        ),
        E::ERC721InsufficientApproval(e) => format!(
            "ERC721InsufficientApproval(operator: {}, tokenId: {})",
            e.operator, e.tokenId
        ),
        E::ERC721InvalidApprover(e) => format!("ERC721InvalidApprover(approver: {})", e.approver),
        E::ERC721InvalidOperator(e) => format!("ERC721InvalidOperator(operator: {})", e.operator),
        E::ERC721InvalidOwner(e) => format!("ERC721InvalidOwner(owner: {})", e.owner),
        E::ERC721InvalidReceiver(e) => format!("ERC721InvalidReceiver(receiver: {})", e.receiver),
        E::ERC721InvalidSender(e) => format!("ERC721InvalidSender(sender: {})", e.sender),
        E::ERC721NonexistentToken(e) => format!("ERC721NonexistentToken(tokenId: {})", e.tokenId),
        E::SafeCastOverflowedUintDowncast(e) => format!(
            "SafeCastOverflowedUintDowncast(bits: {}, value: {})",
            e.bits, e.value
        ),
        // Argument-less errors are fully described by their name
        other => format!("{}()", error_name(other)),
    }
}

/// Solidity name of a custom error
pub fn error_name(err: &NodeRegistryErrors) -> &'static str {
    use NodeRegistryErrors as E;
    match err {
        E::AccessControlBadConfirmation(_) => "AccessControlBadConfirmation",
        E::AccessControlEnforcedDefaultAdminDelay(_) => "AccessControlEnforcedDefaultAdminDelay",
        E::AccessControlEnforcedDefaultAdminRules(_) => "AccessControlEnforcedDefaultAdminRules",
        E::AccessControlInvalidDefaultAdmin(_) => "AccessControlInvalidDefaultAdmin",
        E::AccessControlUnauthorizedAccount(_) => "AccessControlUnauthorizedAccount",
        E::ERC721IncorrectOwner(_) => "ERC721IncorrectOwner",
        E::ERC721InsufficientApproval(_) => "ERC721InsufficientApproval",
        E::ERC721InvalidApprover(_) => "ERC721InvalidApprover",
        E::ERC721InvalidOperator(_) => "ERC721InvalidOperator",
        E::ERC721InvalidOwner(_) => "ERC721InvalidOwner",
        E::ERC721InvalidReceiver(_) => "ERC721InvalidReceiver",
        E::ERC721InvalidSender(_) => "ERC721InvalidSender",
        E::ERC721NonexistentToken(_) => "ERC721NonexistentToken",
        E::InvalidAddress(_) => "InvalidAddress",
        E::InvalidCommissionPercent(_) => "InvalidCommissionPercent",
        E::InvalidHttpAddress(_) => "InvalidHttpAddress",
        E::InvalidInputLength(_) => "InvalidInputLength",
        E::InvalidNodeConfig(_) => "InvalidNodeConfig",
        E::InvalidSigningKey(_) => "InvalidSigningKey",
        E::InvalidURI(_) => "InvalidURI",
        E::MaxActiveNodesBelowCurrentCount(_) => "MaxActiveNodesBelowCurrentCount",
        E::MaxActiveNodesReached(_) => "MaxActiveNodesReached",
        E::NodeDoesNotExist(_) => "NodeDoesNotExist",
        E::NodeIsDisabled(_) => "NodeIsDisabled",
        E::SafeCastOverflowedUintDowncast(_) => "SafeCastOverflowedUintDowncast",
        E::Unauthorized(_) => "Unauthorized",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bindings::NodeRegistry;
    use alloy::primitives::{address, U256};
    use alloy::sol_types::{Revert, SolError};

    #[test]
    fn test_classify_custom_error() {
        let data: Bytes = NodeRegistry::MaxActiveNodesReached {}.abi_encode().into();
        let err = classify_revert(&data).unwrap();
        assert!(matches!(
            err.revert(),
            Some(NodeRegistryErrors::MaxActiveNodesReached(_))
        ));
        assert_eq!(err.to_string(), "contract reverted: MaxActiveNodesReached()");
    }

    #[test]
    fn test_classify_error_with_args() {
        let account = address!("0x00000000000000000000000000000000000000aa");
        let data: Bytes = NodeRegistry::AccessControlUnauthorizedAccount {
            account,
            neededRole: B256::ZERO,
        }
        .abi_encode()
        .into();

        let err = classify_revert(&data).unwrap();
        let message = err.to_string();
        assert!(message.contains("AccessControlUnauthorizedAccount"));
        assert!(message.contains(&account.to_string()));
    }

    #[test]
    fn test_classify_revert_string() {
        let data: Bytes = Revert {
            reason: "paused".to_string(),
        }
        .abi_encode()
        .into();
        let err = classify_revert(&data).unwrap();
        assert!(matches!(err, RegistryError::RevertReason(ref reason) if reason.contains("paused")));
    }

    #[test]
    fn test_classify_unknown_data() {
        let data = Bytes::from(vec![0xff, 0xff, 0xff, 0xff]);
        assert!(classify_revert(&data).is_none());
    }

    #[test]
    fn test_nonexistent_token_description() {
        let err = NodeRegistryErrors::ERC721NonexistentToken(NodeRegistry::ERC721NonexistentToken {
            tokenId: U256::from(300),
        });
        assert_eq!(describe_revert(&err), "ERC721NonexistentToken(tokenId: 300)");
    }
}
