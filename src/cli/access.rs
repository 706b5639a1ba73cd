//! `role` and `admin` commands

use anyhow::Result;

use super::node::confirm;
use super::{AdminCommand, RoleCommand, Session};

pub async fn run_role(session: &Session, cmd: RoleCommand) -> Result<()> {
    let registry = session.registry()?;

    let pending = match cmd {
        RoleCommand::Has { role, account } => {
            let has = registry.has_role(role, account).await?;
            let admin = registry.get_role_admin(role).await?;
            println!("{account} {} {role} (administered by {admin})", if has { "has" } else { "lacks" });
            return Ok(());
        }
        RoleCommand::Grant { role, account } => registry.grant_role(role, account).await?,
        RoleCommand::Revoke { role, account } => registry.revoke_role(role, account).await?,
        RoleCommand::Renounce { role, account } => registry.renounce_role(role, account).await?,
    };

    confirm(pending).await
}

pub async fn run_admin(session: &Session, cmd: AdminCommand) -> Result<()> {
    let registry = session.registry()?;

    let pending = match cmd {
        AdminCommand::BeginTransfer { new_admin } => {
            registry.begin_default_admin_transfer(new_admin).await?
        }
        AdminCommand::AcceptTransfer => registry.accept_default_admin_transfer().await?,
        AdminCommand::CancelTransfer => registry.cancel_default_admin_transfer().await?,
        AdminCommand::ChangeDelay { new_delay } => {
            registry.change_default_admin_delay(new_delay).await?
        }
        AdminCommand::RollbackDelay => registry.rollback_default_admin_delay().await?,
        AdminCommand::SetMaxActive { max_active_nodes } => {
            registry.set_max_active_nodes(max_active_nodes).await?
        }
        AdminCommand::SetCommission { bps } => {
            registry.set_node_operator_commission_percent(bps).await?
        }
        AdminCommand::SetBaseUri { base_uri } => registry.set_base_uri(base_uri).await?,
    };

    confirm(pending).await
}
