//! Infrastructure layer - External service integrations
//!
//! This layer contains:
//! - Alloy provider setup for HTTP, WebSocket and IPC endpoints
//! - Dynamic ABI decoding using alloy-dyn-abi

pub mod abi;
pub mod ethereum;
