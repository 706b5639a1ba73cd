//! CSV Export

use std::io::Write;

use anyhow::Result;

use crate::domain::events::EventRow;
use crate::domain::node::NodeWithId;

/// Write nodes as CSV, returning the number of rows
pub fn write_nodes<W: Write>(writer: W, nodes: &[NodeWithId]) -> Result<usize> {
    let mut wtr = csv::Writer::from_writer(writer);

    wtr.write_record([
        "node_id",
        "http_address",
        "signing_key",
        "replication",
        "api",
        "disabled",
        "min_monthly_fee_micro_dollars",
    ])?;

    for entry in nodes {
        let node = &entry.node;
        wtr.write_record([
            entry.node_id.to_string(),
            node.http_address.clone(),
            node.signing_key_hex(),
            node.is_replication_enabled.to_string(),
            node.is_api_enabled.to_string(),
            node.is_disabled.to_string(),
            node.min_monthly_fee_micro_dollars.to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(nodes.len())
}

/// Write events as CSV; arguments go into one JSON column
pub fn write_events<W: Write>(writer: W, events: &[EventRow]) -> Result<usize> {
    let mut wtr = csv::Writer::from_writer(writer);

    wtr.write_record(["block", "log_index", "tx_hash", "event", "fields"])?;

    for row in events {
        wtr.write_record([
            row.block_number.map(|b| b.to_string()).unwrap_or_default(),
            row.log_index.map(|i| i.to_string()).unwrap_or_default(),
            row.transaction_hash.clone().unwrap_or_default(),
            row.event.to_string(),
            row.fields.to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(events.len())
}
