//! Ethereum infrastructure - Alloy provider setup

mod provider;

pub use provider::{connect, signer_from_key, verify_chain_id, ProviderConfig};
