//! ABI decoder trait and types

use serde::{Deserialize, Serialize};

use super::FunctionSignature;

/// A decoded argument
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecodedArg {
    /// Parameter name (or "arg{n}" if unnamed)
    pub name: String,
    /// Solidity type (e.g., "address", "uint256", "(uint256,address)")
    pub kind: String,
    /// Decoded value as a formatted string
    pub value: String,
}

/// Result of decoding calldata, revert data or a log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecodedCall {
    /// Function, error or event name
    pub function_name: String,
    /// Full signature (e.g., "setMinMonthlyFee(uint256,uint256)")
    pub signature: String,
    pub arguments: Vec<DecodedArg>,
}

impl DecodedCall {
    /// One-line rendering: `name(arg=value, ...)`
    pub fn display(&self) -> String {
        let args: Vec<String> = self
            .arguments
            .iter()
            .map(|arg| format!("{}={}", arg.name, arg.value))
            .collect();
        format!("{}({})", self.function_name, args.join(", "))
    }
}

/// Trait for ABI decoding implementations
///
/// Abstracts over the dynamic decoding library so the typed bindings
/// stay the only place that knows the contract's layout at compile time.
pub trait AbiDecoder: Send + Sync {
    /// Decode calldata given a function signature
    ///
    /// `data` includes the 4-byte selector.
    fn decode_calldata(
        &self,
        function: &FunctionSignature,
        data: &[u8],
    ) -> anyhow::Result<DecodedCall>;

    /// Decode calldata by looking up the selector
    ///
    /// Returns `Ok(None)` when the selector is unknown.
    fn decode_by_selector(&self, data: &[u8]) -> anyhow::Result<Option<DecodedCall>>;

    /// Decode revert data against a custom error, `Error(string)` or `Panic(uint256)`
    fn decode_error(&self, data: &[u8]) -> anyhow::Result<Option<DecodedCall>>;

    /// Decode a log given its topics and data
    fn decode_log(&self, topics: &[[u8; 32]], data: &[u8]) -> anyhow::Result<Option<DecodedCall>>;
}

