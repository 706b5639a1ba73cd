//! Registry node models

use alloy::primitives::{Bytes, U256};
use serde::{Deserialize, Serialize};

use crate::bindings::NodeRegistry;

/// A node entry as stored by the registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Public key the node signs envelopes with
    pub signing_key_pub: Bytes,
    /// Public HTTP endpoint of the node
    pub http_address: String,
    pub is_replication_enabled: bool,
    pub is_api_enabled: bool,
    pub is_disabled: bool,
    /// Minimum monthly fee, in micro-dollars
    pub min_monthly_fee_micro_dollars: U256,
}

/// A node paired with its id (also its ERC-721 token id)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeWithId {
    pub node_id: U256,
    #[serde(flatten)]
    pub node: Node,
}

impl Node {
    /// Signing key as `0x`-prefixed hex
    pub fn signing_key_hex(&self) -> String {
        format!("0x{}", hex::encode(&self.signing_key_pub))
    }

    /// Short status label used by listings
    pub fn status(&self) -> &'static str {
        match (self.is_disabled, self.is_api_enabled, self.is_replication_enabled) {
            (true, _, _) => "disabled",
            (false, true, true) => "api+replication",
            (false, true, false) => "api",
            (false, false, true) => "replication",
            (false, false, false) => "idle",
        }
    }

    /// Fee converted to whole dollars, for display only
    pub fn min_monthly_fee_dollars(&self) -> String {
        format_micro_dollars(self.min_monthly_fee_micro_dollars)
    }
}

impl From<NodeRegistry::Node> for Node {
    fn from(node: NodeRegistry::Node) -> Self {
        Self {
            signing_key_pub: node.signingKeyPub,
            http_address: node.httpAddress,
            is_replication_enabled: node.isReplicationEnabled,
            is_api_enabled: node.isApiEnabled,
            is_disabled: node.isDisabled,
            min_monthly_fee_micro_dollars: node.minMonthlyFeeMicroDollars,
        }
    }
}

impl From<Node> for NodeRegistry::Node {
    fn from(node: Node) -> Self {
        Self {
            signingKeyPub: node.signing_key_pub,
            httpAddress: node.http_address,
            isReplicationEnabled: node.is_replication_enabled,
            isApiEnabled: node.is_api_enabled,
            isDisabled: node.is_disabled,
            minMonthlyFeeMicroDollars: node.min_monthly_fee_micro_dollars,
        }
    }
}

impl From<NodeRegistry::NodeWithId> for NodeWithId {
    fn from(entry: NodeRegistry::NodeWithId) -> Self {
        Self {
            node_id: entry.nodeId,
            node: entry.node.into(),
        }
    }
}

/// Format a micro-dollar amount as `D.DDDDDD`
pub fn format_micro_dollars(amount: U256) -> String {
    let unit = U256::from(1_000_000u64);
    let whole = amount / unit;
    let frac = amount % unit;
    format!("{}.{:0>6}", whole, frac.to_string())
}

/// Commission in basis points, relative to the contract's `MAX_BPS`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commission {
    pub bps: U256,
    pub max_bps: U256,
}

impl Commission {
    pub fn new(bps: U256, max_bps: U256) -> Self {
        Self { bps, max_bps }
    }

    /// Commission as a percentage with two decimals (e.g. "12.50%")
    pub fn percent(&self) -> String {
        if self.max_bps.is_zero() {
            return format!("{} bps", self.bps);
        }
        // hundredths of a percent
        let scaled = self.bps * U256::from(10_000u64) / self.max_bps;
        let whole = scaled / U256::from(100u64);
        let frac = scaled % U256::from(100u64);
        format!("{}.{:0>2}%", whole, frac.to_string())
    }
}
