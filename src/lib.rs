//! Typed client for the NodeRegistry contract
//!
//! The registry is an ERC-721 collection of network nodes with
//! OpenZeppelin default-admin access control. This crate exposes:
//!
//! - [`bindings`]: the `sol!` generated contract types and embedded artifacts
//! - [`registry`]: [`RegistryClient`], a proxy split into caller,
//!   transactor and filterer surfaces, plus deployment
//! - [`domain`]: node, role and event models and dynamic ABI decoding
//! - [`store`] / [`export`]: local event index and file exports
//! - [`cli`]: the `noderegistry` command line

pub mod bindings;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod export;
pub mod infrastructure;
pub mod registry;
pub mod store;

pub use bindings::{NodeRegistry, NodeRegistryErrors, NodeRegistryEvents};
pub use error::{RegistryError, RegistryResult};
pub use registry::{PendingTx, RegistryClient, TxOutcome};
