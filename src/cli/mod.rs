//! Command-line interface

mod access;
mod decode;
mod events;
mod export;
mod node;
mod session;
mod sink;

use std::path::PathBuf;

use alloy::primitives::{aliases::U48, Address, Bytes, U256};
use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::config;
use crate::domain::roles::Role;
use crate::export::Format;

pub use session::Session;
pub use sink::{EventSink, StdoutSink, StoreSink};

#[derive(Debug, Parser)]
#[command(
    name = "noderegistry",
    version,
    about = "Query and administer a NodeRegistry deployment"
)]
pub struct Cli {
    #[command(flatten)]
    pub globals: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Default, Args)]
pub struct GlobalArgs {
    /// HTTP JSON-RPC endpoint (e.g. http://localhost:8545)
    #[arg(long, global = true)]
    pub rpc: Option<String>,

    /// WebSocket endpoint (e.g. ws://localhost:8546)
    #[arg(long, global = true, conflicts_with = "rpc")]
    pub ws: Option<String>,

    /// IPC path (e.g. ~/.ethereum/geth.ipc). Unix only.
    #[arg(long, global = true, conflicts_with_all = ["rpc", "ws"])]
    pub ipc: Option<PathBuf>,

    /// Registry contract address
    #[arg(long, global = true)]
    pub contract: Option<Address>,

    /// Environment variable holding the signing key
    #[arg(long, global = true, value_name = "VAR")]
    pub private_key_env: Option<String>,

    /// Configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Contract metadata, counts and admin state
    Info,
    /// Node queries and management
    #[command(subcommand)]
    Node(NodeCommand),
    /// Access-control roles
    #[command(subcommand)]
    Role(RoleCommand),
    /// Default-admin and registry settings
    #[command(subcommand)]
    Admin(AdminCommand),
    /// Historical events
    Events(EventsArgs),
    /// Follow new events
    Watch(WatchArgs),
    /// Decode raw calldata, revert data or logs
    Decode(DecodeArgs),
    /// Write nodes or events to a file
    #[command(subcommand)]
    Export(ExportCommand),
    /// Deploy a new registry
    Deploy {
        /// Account receiving the default admin role
        initial_admin: Address,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ActiveSet {
    Api,
    Replication,
}

#[derive(Debug, Subcommand)]
pub enum NodeCommand {
    /// Show one node
    Get { node_id: U256 },
    /// List all nodes, or only the active API or replication set
    List {
        #[arg(long, value_enum)]
        active: Option<ActiveSet>,
        #[arg(long)]
        json: bool,
    },
    /// Mint a new node to `owner`
    Add {
        owner: Address,
        /// Public signing key, hex
        signing_key: Bytes,
        http_address: String,
        /// Minimum monthly fee in micro-dollars
        min_monthly_fee: U256,
    },
    Enable { node_id: U256 },
    Disable { node_id: U256 },
    SetHttp { node_id: U256, http_address: String },
    /// Set the minimum monthly fee in micro-dollars
    SetFee { node_id: U256, min_monthly_fee: U256 },
    SetApi {
        node_id: U256,
        #[arg(action = clap::ArgAction::Set)]
        enabled: bool,
    },
    SetReplication {
        node_id: U256,
        #[arg(action = clap::ArgAction::Set)]
        enabled: bool,
    },
    RemoveApi { node_id: U256 },
    RemoveReplication { node_id: U256 },
    /// Transfer the node NFT
    Transfer { from: Address, to: Address, node_id: U256 },
}

#[derive(Debug, Subcommand)]
pub enum RoleCommand {
    /// Role names: default-admin, admin, node-manager, or a 32-byte id
    Has { role: Role, account: Address },
    Grant { role: Role, account: Address },
    Revoke { role: Role, account: Address },
    /// Renounce a role held by the signing account
    Renounce { role: Role, account: Address },
}

#[derive(Debug, Subcommand)]
pub enum AdminCommand {
    BeginTransfer { new_admin: Address },
    AcceptTransfer,
    CancelTransfer,
    /// New default-admin delay, in seconds
    ChangeDelay { new_delay: U48 },
    RollbackDelay,
    SetMaxActive { max_active_nodes: u8 },
    /// Node operator commission, in basis points
    SetCommission { bps: U256 },
    SetBaseUri { base_uri: String },
}

#[derive(Debug, Clone, Args)]
pub struct EventsArgs {
    /// First block; defaults to the configured start block
    #[arg(long)]
    pub from: Option<u64>,
    /// Last block; defaults to latest
    #[arg(long)]
    pub to: Option<u64>,
    /// Only these events (repeatable)
    #[arg(long = "event", value_name = "NAME")]
    pub events: Vec<String>,
    /// Index results into the local event database
    #[arg(long)]
    pub store: bool,
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Args)]
pub struct WatchArgs {
    #[arg(long = "event", value_name = "NAME")]
    pub events: Vec<String>,
    #[arg(long)]
    pub store: bool,
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct DecodeArgs {
    /// Extra JSON ABI files to consult after the registry's own
    #[arg(long = "abi", value_name = "PATH")]
    pub extra_abis: Vec<PathBuf>,

    #[command(subcommand)]
    pub command: DecodeCommand,
}

#[derive(Debug, Subcommand)]
pub enum DecodeCommand {
    /// List known function selectors
    Selectors,
    /// Decode transaction input
    Calldata { data: Bytes },
    /// Decode revert data
    Error { data: Bytes },
    /// Decode a log from its topics and data
    Log {
        #[arg(long = "topic", required = true)]
        topics: Vec<alloy::primitives::B256>,
        #[arg(long, default_value = "0x")]
        data: Bytes,
    },
}

#[derive(Debug, Subcommand)]
pub enum ExportCommand {
    Nodes {
        #[arg(long, value_enum, default_value_t)]
        format: Format,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    Events {
        #[arg(long, value_enum, default_value_t)]
        format: Format,
        #[arg(long)]
        out: Option<PathBuf>,
        /// Read from the local event database instead of the chain
        #[arg(long)]
        store: bool,
    },
}

/// Execute a parsed command line
pub async fn run(cli: Cli) -> Result<()> {
    let config = config::load(cli.globals.config.as_deref())?;

    match cli.command {
        Command::Decode(args) => decode::run(args),
        Command::Deploy { initial_admin } => {
            let session = Session::connect(&cli.globals, config, true).await?;
            node::deploy(&session, initial_admin).await
        }
        Command::Info => {
            let session = Session::connect(&cli.globals, config, false).await?;
            node::info(&session).await
        }
        Command::Node(cmd) => {
            let session = Session::connect(&cli.globals, config, cmd.is_write()).await?;
            node::run(&session, cmd).await
        }
        Command::Role(cmd) => {
            let write = !matches!(cmd, RoleCommand::Has { .. });
            let session = Session::connect(&cli.globals, config, write).await?;
            access::run_role(&session, cmd).await
        }
        Command::Admin(cmd) => {
            let session = Session::connect(&cli.globals, config, true).await?;
            access::run_admin(&session, cmd).await
        }
        Command::Events(args) => {
            let session = Session::connect(&cli.globals, config, false).await?;
            events::query(&session, args).await
        }
        Command::Watch(args) => {
            let session = Session::connect(&cli.globals, config, false).await?;
            events::watch(&session, args).await
        }
        Command::Export(cmd) => {
            let session = Session::connect(&cli.globals, config, false).await?;
            export::run(&session, cmd).await
        }
    }
}

impl NodeCommand {
    fn is_write(&self) -> bool {
        !matches!(self, NodeCommand::Get { .. } | NodeCommand::List { .. })
    }
}
