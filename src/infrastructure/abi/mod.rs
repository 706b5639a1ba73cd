//! ABI infrastructure - alloy-dyn-abi based decoding

mod decoder;

pub use decoder::{format_dyn_sol_value, AlloyAbiDecoder};
