//! JSON Export

use std::io::Write;

use anyhow::Result;
use serde::Serialize;

use crate::domain::events::EventRow;
use crate::domain::node::NodeWithId;

/// Exportable node, with derived columns a reader would otherwise recompute
#[derive(Serialize)]
struct ExportableNode<'a> {
    #[serde(flatten)]
    node: &'a NodeWithId,
    status: &'static str,
    min_monthly_fee_dollars: String,
}

impl<'a> From<&'a NodeWithId> for ExportableNode<'a> {
    fn from(node: &'a NodeWithId) -> Self {
        Self {
            node,
            status: node.node.status(),
            min_monthly_fee_dollars: node.node.min_monthly_fee_dollars(),
        }
    }
}

pub fn write_nodes<W: Write>(mut writer: W, nodes: &[NodeWithId]) -> Result<usize> {
    let exportable: Vec<ExportableNode<'_>> = nodes.iter().map(ExportableNode::from).collect();
    serde_json::to_writer_pretty(&mut writer, &exportable)?;
    writer.flush()?;
    Ok(nodes.len())
}

pub fn write_events<W: Write>(mut writer: W, events: &[EventRow]) -> Result<usize> {
    serde_json::to_writer_pretty(&mut writer, events)?;
    writer.flush()?;
    Ok(events.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::node::Node;
    use alloy::primitives::{Bytes, U256};
    use serde_json::Value;

    #[test]
    fn test_nodes_json_has_status() {
        let nodes = vec![NodeWithId {
            node_id: U256::from(200),
            node: Node {
                signing_key_pub: Bytes::from(vec![0x02]),
                http_address: "http://n".to_string(),
                is_replication_enabled: false,
                is_api_enabled: false,
                is_disabled: true,
                min_monthly_fee_micro_dollars: U256::from(1_500_000u64),
            },
        }];

        let mut out = Vec::new();
        write_nodes(&mut out, &nodes).unwrap();
        let value: Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value[0]["http_address"], "http://n");
        assert_eq!(value[0]["status"], "disabled");
        assert_eq!(value[0]["min_monthly_fee_dollars"], "1.500000");
    }
}
