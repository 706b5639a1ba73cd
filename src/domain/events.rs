//! Decoded registry events

use alloy::primitives::{Address, TxHash, B256, U256};
use alloy::rpc::types::Log;
use alloy::sol_types::{SolEvent, SolEventInterface};
use serde::Serialize;
use serde_json::{json, Value};

use crate::bindings::{NodeRegistry, NodeRegistryEvents};
use crate::error::{RegistryError, RegistryResult};

/// Any event emitted by the registry
pub type RegistryEvent = NodeRegistryEvents;

macro_rules! registry_events {
    ($($name:ident),* $(,)?) => {
        /// Names of every registry event, in ABI order
        pub const EVENT_NAMES: &[&str] = &[$(stringify!($name)),*];

        /// Solidity name of a decoded event
        pub fn event_name(event: &RegistryEvent) -> &'static str {
            match event {
                $(NodeRegistryEvents::$name(_) => stringify!($name),)*
            }
        }

        /// Topic0 of the event with the given name
        pub fn event_topic(name: &str) -> Option<B256> {
            match name {
                $(stringify!($name) => Some(NodeRegistry::$name::SIGNATURE_HASH),)*
                _ => None,
            }
        }
    };
}

registry_events!(
    ApiDisabled,
    ApiEnabled,
    Approval,
    ApprovalForAll,
    BaseURIUpdated,
    DefaultAdminDelayChangeCanceled,
    DefaultAdminDelayChangeScheduled,
    DefaultAdminTransferCanceled,
    DefaultAdminTransferScheduled,
    HttpAddressUpdated,
    MaxActiveNodesUpdated,
    MinMonthlyFeeUpdated,
    NodeAdded,
    NodeDisabled,
    NodeEnabled,
    NodeOperatorCommissionPercentUpdated,
    NodeTransferred,
    ReplicationDisabled,
    ReplicationEnabled,
    RoleAdminChanged,
    RoleGranted,
    RoleRevoked,
    Transfer,
);

/// Look up an event topic by name, ignoring ASCII case
pub fn resolve_event(name: &str) -> Option<(&'static str, B256)> {
    EVENT_NAMES
        .iter()
        .find(|candidate| candidate.eq_ignore_ascii_case(name.trim()))
        .and_then(|candidate| event_topic(candidate).map(|topic| (*candidate, topic)))
}

/// Node id the event refers to, if any
pub fn event_node_id(event: &RegistryEvent) -> Option<U256> {
    use NodeRegistryEvents as E;
    match event {
        E::ApiDisabled(e) => Some(e.nodeId),
        E::ApiEnabled(e) => Some(e.nodeId),
        E::HttpAddressUpdated(e) => Some(e.nodeId),
        E::MinMonthlyFeeUpdated(e) => Some(e.nodeId),
        E::NodeAdded(e) => Some(e.nodeId),
        E::NodeDisabled(e) => Some(e.nodeId),
        E::NodeEnabled(e) => Some(e.nodeId),
        E::NodeTransferred(e) => Some(e.nodeId),
        E::ReplicationDisabled(e) => Some(e.nodeId),
        E::ReplicationEnabled(e) => Some(e.nodeId),
        E::Approval(e) => Some(e.tokenId),
        E::Transfer(e) => Some(e.tokenId),
        _ => None,
    }
}

/// Event arguments as a JSON object keyed by Solidity parameter name
pub fn event_fields(event: &RegistryEvent) -> Value {
    use NodeRegistryEvents as E;
    match event {
        E::ApiDisabled(e) => json!({ "nodeId": e.nodeId.to_string() }),
        E::ApiEnabled(e) => json!({ "nodeId": e.nodeId.to_string() }),
        E::Approval(e) => json!({
            "owner": e.owner.to_string(),
            "approved": e.approved.to_string(),
            "tokenId": e.tokenId.to_string(),
        }),
        E::ApprovalForAll(e) => json!({
            "owner": e.owner.to_string(),
            "operator": e.operator.to_string(),
            "approved": e.approved,
        }),
        E::BaseURIUpdated(e) => json!({ "newBaseURI": e.newBaseURI }),
        E::DefaultAdminDelayChangeCanceled(_) => json!({}),
        E::DefaultAdminDelayChangeScheduled(e) => json!({
            "newDelay": e.newDelay.to::<u64>(),
            "effectSchedule": e.effectSchedule.to::<u64>(),
        }),
        E::DefaultAdminTransferCanceled(_) => json!({}),
        E::DefaultAdminTransferScheduled(e) => json!({
            "newAdmin": e.newAdmin.to_string(),
            "acceptSchedule": e.acceptSchedule.to::<u64>(),
        }),
        E::HttpAddressUpdated(e) => json!({
            "nodeId": e.nodeId.to_string(),
            "newHttpAddress": e.newHttpAddress,
        }),
        E::MaxActiveNodesUpdated(e) => json!({ "newMaxActiveNodes": e.newMaxActiveNodes }),
        E::MinMonthlyFeeUpdated(e) => json!({
            "nodeId": e.nodeId.to_string(),
            "minMonthlyFeeMicroDollars": e.minMonthlyFeeMicroDollars.to_string(),
        }),
        E::NodeAdded(e) => json!({
            "nodeId": e.nodeId.to_string(),
            "owner": e.owner.to_string(),
            "signingKeyPub": format!("0x{}", hex::encode(&e.signingKeyPub)),
            "httpAddress": e.httpAddress,
            "minMonthlyFeeMicroDollars": e.minMonthlyFeeMicroDollars.to_string(),
        }),
        E::NodeDisabled(e) => json!({ "nodeId": e.nodeId.to_string() }),
        E::NodeEnabled(e) => json!({ "nodeId": e.nodeId.to_string() }),
        E::NodeOperatorCommissionPercentUpdated(e) => json!({
            "newCommissionPercent": e.newCommissionPercent.to_string(),
        }),
        E::NodeTransferred(e) => json!({
            "nodeId": e.nodeId.to_string(),
            "from": e.from.to_string(),
            "to": e.to.to_string(),
        }),
        E::ReplicationDisabled(e) => json!({ "nodeId": e.nodeId.to_string() }),
        E::ReplicationEnabled(e) => json!({ "nodeId": e.nodeId.to_string() }),
        E::RoleAdminChanged(e) => json!({
            "role": e.role.to_string(),
            "previousAdminRole": e.previousAdminRole.to_string(),
            "newAdminRole": e.newAdminRole.to_string(),
        }),
        E::RoleGranted(e) => json!({
            "role": e.role.to_string(),
            "account": e.account.to_string(),
            "sender": e.sender.to_string(),
        }),
        E::RoleRevoked(e) => json!({
            "role": e.role.to_string(),
            "account": e.account.to_string(),
            "sender": e.sender.to_string(),
        }),
        E::Transfer(e) => json!({
            "from": e.from.to_string(),
            "to": e.to.to_string(),
            "tokenId": e.tokenId.to_string(),
        }),
    }
}

/// A decoded event together with where it was emitted
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    pub address: Address,
    pub block_number: Option<u64>,
    pub block_hash: Option<B256>,
    pub transaction_hash: Option<TxHash>,
    pub log_index: Option<u64>,
    pub removed: bool,
    pub event: RegistryEvent,
}

/// Flat, serialisable view of an [`EventRecord`]
#[derive(Debug, Clone, Serialize)]
pub struct EventRow {
    pub event: &'static str,
    pub block_number: Option<u64>,
    pub log_index: Option<u64>,
    pub transaction_hash: Option<String>,
    pub block_hash: Option<String>,
    pub address: String,
    pub fields: Value,
}

impl EventRecord {
    /// Decode an RPC log emitted by `registry`
    pub fn from_log(log: &Log, registry: Address) -> RegistryResult<Self> {
        if log.address() != registry {
            return Err(RegistryError::ForeignLog(log.address()));
        }
        let event = decode_event(log)?;
        Ok(Self {
            address: log.address(),
            block_number: log.block_number,
            block_hash: log.block_hash,
            transaction_hash: log.transaction_hash,
            log_index: log.log_index,
            removed: log.removed,
            event,
        })
    }

    pub fn name(&self) -> &'static str {
        event_name(&self.event)
    }

    pub fn fields(&self) -> Value {
        event_fields(&self.event)
    }

    pub fn node_id(&self) -> Option<U256> {
        event_node_id(&self.event)
    }

    /// Position of the log in the chain, for ordering
    pub fn position(&self) -> (u64, u64) {
        (
            self.block_number.unwrap_or(u64::MAX),
            self.log_index.unwrap_or(u64::MAX),
        )
    }

    pub fn to_row(&self) -> EventRow {
        EventRow {
            event: self.name(),
            block_number: self.block_number,
            log_index: self.log_index,
            transaction_hash: self.transaction_hash.map(|h| h.to_string()),
            block_hash: self.block_hash.map(|h| h.to_string()),
            address: self.address.to_string(),
            fields: self.fields(),
        }
    }
}

/// Decode the payload of a registry log, without checking its emitter
pub fn decode_event(log: &Log) -> RegistryResult<RegistryEvent> {
    let topics = log.topics();
    let Some(topic0) = topics.first().copied() else {
        return Err(RegistryError::UnknownEvent(B256::ZERO));
    };
    if !NodeRegistryEvents::SELECTORS.contains(&topic0.0) {
        return Err(RegistryError::UnknownEvent(topic0));
    }
    Ok(NodeRegistryEvents::decode_raw_log(topics, &log.data().data)?)
}
