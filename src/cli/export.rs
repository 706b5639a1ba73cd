//! `export` commands

use anyhow::Result;

use super::events::event_filter;
use super::node::list_nodes;
use super::{ExportCommand, Session};
use crate::domain::events::EventRecord;
use crate::export::{export_events, export_nodes};
use crate::registry::BlockRange;
use crate::store::EventQuery;

pub async fn run(session: &Session, cmd: ExportCommand) -> Result<()> {
    match cmd {
        ExportCommand::Nodes { format, out } => {
            let registry = session.registry()?;
            let nodes = list_nodes(&registry, None).await?;
            let path = export_nodes(&nodes, format, out.as_deref())?;
            println!("exported {} nodes to {}", nodes.len(), path.display());
        }
        ExportCommand::Events { format, out, store } => {
            let rows = if store {
                let contract = session.contract()?;
                session
                    .open_store()?
                    .events(&EventQuery::default())?
                    .iter()
                    .map(|event| event.to_row(contract))
                    .collect::<Result<Vec<_>>>()?
            } else {
                let registry = session.registry()?;
                registry
                    .query_events(
                        BlockRange::since(session.config.start_block),
                        &event_filter(&[])?,
                    )
                    .await?
                    .iter()
                    .map(EventRecord::to_row)
                    .collect()
            };
            let path = export_events(&rows, format, out.as_deref())?;
            println!("exported {} events to {}", rows.len(), path.display());
        }
    }
    Ok(())
}
