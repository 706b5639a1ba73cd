//! ABI domain models and contracts
//!
//! This module defines the traits and types for dynamic ABI decoding,
//! independent of the underlying implementation (alloy-dyn-abi).

mod decoder;
mod registry;

pub use decoder::{AbiDecoder, DecodedArg, DecodedCall};
pub use registry::{
    parse_selector, AbiRegistry, ErrorSignature, EventSignature, FunctionSignature, ParamSpec,
};
