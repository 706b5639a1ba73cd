//! `info`, `node` and `deploy` commands

use alloy::primitives::{Address, U256};
use alloy::providers::{DynProvider, Provider};
use anyhow::{Context, Result};

use super::{ActiveSet, NodeCommand, Session};
use crate::domain::node::{Node, NodeWithId};
use crate::domain::roles::format_delay;
use crate::registry::{self, PendingTx, RegistryClient};

pub async fn info(session: &Session) -> Result<()> {
    let registry = session.registry()?;

    let name = registry.name().await?;
    let symbol = registry.symbol().await?;
    let total = registry.get_all_nodes_count().await?;
    let api = registry.get_active_api_nodes_count().await?;
    let replication = registry.get_active_replication_nodes_count().await?;
    let max_active = registry.max_active_nodes().await?;
    let commission = registry.commission().await?;
    let admin = registry.default_admin().await?;
    let delay = registry.default_admin_delay().await?;
    let pending_admin = registry.pending_default_admin().await?;
    let pending_delay = registry.pending_default_admin_delay().await?;

    println!("contract        {}", registry.address());
    println!("chain           {}", session.chain_id);
    println!("token           {name} ({symbol})");
    println!("nodes           {total}");
    println!("active api      {api} / {max_active}");
    println!("active repl.    {replication} / {max_active}");
    println!("commission      {}", commission.percent());
    println!("default admin   {admin}");
    println!("admin delay     {}", format_delay(delay));
    if pending_admin.is_pending() {
        println!(
            "pending admin   {} (acceptable from {})",
            pending_admin.new_admin,
            pending_admin
                .scheduled_at()
                .map(|t| t.to_rfc3339())
                .unwrap_or_default()
        );
    }
    if pending_delay.is_pending() {
        println!(
            "pending delay   {} (effective {})",
            format_delay(pending_delay.new_delay),
            pending_delay
                .scheduled_at()
                .map(|t| t.to_rfc3339())
                .unwrap_or_default()
        );
    }
    Ok(())
}

pub async fn run(session: &Session, cmd: NodeCommand) -> Result<()> {
    let registry = session.registry()?;

    let pending = match cmd {
        NodeCommand::Get { node_id } => {
            let node = registry.get_node(node_id).await?;
            let owner = registry.owner_of(node_id).await?;
            print_node(node_id, &node, Some(owner));
            return Ok(());
        }
        NodeCommand::List { active, json } => {
            let nodes = list_nodes(&registry, active).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&nodes)?);
            } else {
                for entry in &nodes {
                    println!(
                        "{:>8}  {:<16} {:>14}  {}",
                        entry.node_id,
                        entry.node.status(),
                        entry.node.min_monthly_fee_dollars(),
                        entry.node.http_address
                    );
                }
                println!("{} node(s)", nodes.len());
            }
            return Ok(());
        }
        NodeCommand::Add {
            owner,
            signing_key,
            http_address,
            min_monthly_fee,
        } => {
            let (node_id, outcome) = registry
                .add_node_and_wait(owner, signing_key, http_address, min_monthly_fee)
                .await?;
            println!("node {node_id} added to {owner} in tx {}", outcome.tx_hash);
            return Ok(());
        }
        NodeCommand::Enable { node_id } => registry.enable_node(node_id).await?,
        NodeCommand::Disable { node_id } => registry.disable_node(node_id).await?,
        NodeCommand::SetHttp {
            node_id,
            http_address,
        } => registry.set_http_address(node_id, http_address).await?,
        NodeCommand::SetFee {
            node_id,
            min_monthly_fee,
        } => registry.set_min_monthly_fee(node_id, min_monthly_fee).await?,
        NodeCommand::SetApi { node_id, enabled } => {
            registry.set_is_api_enabled(node_id, enabled).await?
        }
        NodeCommand::SetReplication { node_id, enabled } => {
            registry.set_is_replication_enabled(node_id, enabled).await?
        }
        NodeCommand::RemoveApi { node_id } => registry.remove_from_api_nodes(node_id).await?,
        NodeCommand::RemoveReplication { node_id } => {
            registry.remove_from_replication_nodes(node_id).await?
        }
        NodeCommand::Transfer { from, to, node_id } => {
            registry.transfer_from(from, to, node_id).await?
        }
    };

    confirm(pending).await
}

pub(super) async fn list_nodes(
    registry: &RegistryClient<DynProvider>,
    active: Option<ActiveSet>,
) -> Result<Vec<NodeWithId>> {
    let nodes = match active {
        None => registry.get_all_nodes().await?,
        Some(ActiveSet::Api) => registry.get_active_api_nodes().await?,
        Some(ActiveSet::Replication) => registry.get_active_replication_nodes().await?,
    };
    Ok(nodes)
}

fn print_node(node_id: U256, node: &Node, owner: Option<Address>) {
    println!("node            {node_id}");
    if let Some(owner) = owner {
        println!("owner           {owner}");
    }
    println!("http address    {}", node.http_address);
    println!("signing key     {}", node.signing_key_hex());
    println!("status          {}", node.status());
    println!("api             {}", node.is_api_enabled);
    println!("replication     {}", node.is_replication_enabled);
    println!(
        "min monthly fee {} USD ({} micro-dollars)",
        node.min_monthly_fee_dollars(),
        node.min_monthly_fee_micro_dollars
    );
}

/// Print the hash, wait for the receipt and print the emitted events
pub(super) async fn confirm(pending: PendingTx) -> Result<()> {
    println!("{} submitted: {}", pending.method(), pending.tx_hash());
    let outcome = pending.wait().await?;
    println!(
        "confirmed in block {} (gas {})",
        outcome
            .block_number
            .map(|b| b.to_string())
            .unwrap_or_else(|| "?".to_string()),
        outcome.gas_used
    );
    for record in &outcome.events {
        println!("  {} {}", record.name(), record.fields());
    }
    Ok(())
}

pub async fn deploy(session: &Session, initial_admin: Address) -> Result<()> {
    let deployer = session.sender.context("deploy needs a signing key")?;
    let nonce = session
        .provider
        .get_transaction_count(deployer)
        .await
        .context("fetch deployer nonce")?;
    println!(
        "deploying from {deployer}, expected address {}",
        registry::predict_address(deployer, nonce)
    );

    let deployment = registry::deploy(
        session.provider.clone(),
        initial_admin,
        &session.tx_options(),
        session.receipt_policy(),
    )
    .await?;
    println!(
        "registry deployed at {} in tx {} (block {}, gas {})",
        deployment.client.address(),
        deployment.tx_hash,
        deployment
            .block_number
            .map(|b| b.to_string())
            .unwrap_or_else(|| "?".to_string()),
        deployment.gas_used
    );
    Ok(())
}
