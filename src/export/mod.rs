//! Export of node listings and event history
//!
//! - Nodes and events → CSV or JSON
//! - Files default to `<data dir>/exports/<kind>-<timestamp>.<ext>`

mod csv_export;
mod json_export;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use clap::ValueEnum;

use crate::config;
use crate::domain::events::EventRow;
use crate::domain::node::NodeWithId;

pub use csv_export::{write_events as write_events_csv, write_nodes as write_nodes_csv};
pub use json_export::{write_events as write_events_json, write_nodes as write_nodes_json};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Format {
    #[default]
    Csv,
    Json,
}

impl Format {
    pub fn extension(self) -> &'static str {
        match self {
            Format::Csv => "csv",
            Format::Json => "json",
        }
    }
}

/// Get the export directory path, creating it if needed
pub fn export_dir() -> Result<PathBuf> {
    let dir = config::export_dir().unwrap_or_else(|| PathBuf::from(".noderegistry").join("exports"));
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}

/// Generate a timestamped filename
pub fn generate_filename(prefix: &str, format: Format) -> String {
    let timestamp = Local::now().format("%Y-%m-%d-%H%M%S");
    format!("{}-{}.{}", prefix, timestamp, format.extension())
}

fn target(out: Option<&Path>, prefix: &str, format: Format) -> Result<PathBuf> {
    match out {
        Some(path) => Ok(path.to_path_buf()),
        None => Ok(export_dir()?.join(generate_filename(prefix, format))),
    }
}

/// Write nodes to `out`, or a timestamped file in the export directory
pub fn export_nodes(nodes: &[NodeWithId], format: Format, out: Option<&Path>) -> Result<PathBuf> {
    let path = target(out, "nodes", format)?;
    let file = fs::File::create(&path).with_context(|| format!("create {}", path.display()))?;
    match format {
        Format::Csv => write_nodes_csv(file, nodes)?,
        Format::Json => write_nodes_json(file, nodes)?,
    };
    Ok(path)
}

/// Write events to `out`, or a timestamped file in the export directory
pub fn export_events(events: &[EventRow], format: Format, out: Option<&Path>) -> Result<PathBuf> {
    let path = target(out, "events", format)?;
    let file = fs::File::create(&path).with_context(|| format!("create {}", path.display()))?;
    match format {
        Format::Csv => write_events_csv(file, events)?,
        Format::Json => write_events_json(file, events)?,
    };
    Ok(path)
}
