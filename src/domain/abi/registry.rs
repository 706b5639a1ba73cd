//! ABI registry - stores function, event and error signatures by selector

use std::collections::HashMap;

use alloy_json_abi::{JsonAbi, Param};
use serde::{Deserialize, Serialize};

/// A parameter specification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamSpec {
    /// Parameter name (may be empty)
    pub name: String,
    /// Solidity type, tuples expanded (e.g. "(uint256,(bytes,string))")
    pub kind: String,
    /// Whether the parameter is an indexed event topic
    #[serde(default)]
    pub indexed: bool,
}

/// A function signature with its metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionSignature {
    /// 4-byte function selector
    pub selector: [u8; 4],
    pub name: String,
    /// Full signature string (e.g., "getNode(uint256)")
    pub signature: String,
    pub inputs: Vec<ParamSpec>,
    pub outputs: Vec<ParamSpec>,
    /// Artifact this signature was loaded from
    pub source: String,
}

/// An event signature
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventSignature {
    /// keccak256 of the signature (topic0)
    pub topic: [u8; 32],
    pub name: String,
    pub signature: String,
    pub inputs: Vec<ParamSpec>,
    pub anonymous: bool,
}

/// A custom error signature
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorSignature {
    pub selector: [u8; 4],
    pub name: String,
    pub signature: String,
    pub inputs: Vec<ParamSpec>,
}

impl FunctionSignature {
    /// Get selector as hex string
    pub fn selector_hex(&self) -> String {
        format!("0x{}", hex::encode(self.selector))
    }
}

impl ErrorSignature {
    pub fn selector_hex(&self) -> String {
        format!("0x{}", hex::encode(self.selector))
    }
}

/// Registry of signatures indexed by selector or topic
#[derive(Debug, Default, Clone)]
pub struct AbiRegistry {
    functions: HashMap<[u8; 4], FunctionSignature>,
    events: HashMap<[u8; 32], EventSignature>,
    errors: HashMap<[u8; 4], ErrorSignature>,
}

impl AbiRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a parsed JSON ABI
    pub fn from_abi(abi: &JsonAbi, source: &str) -> Self {
        let mut registry = Self::new();

        for function in abi.functions() {
            registry.insert(FunctionSignature {
                selector: function.selector().0,
                name: function.name.clone(),
                signature: function.signature(),
                inputs: function.inputs.iter().map(param_spec).collect(),
                outputs: function.outputs.iter().map(param_spec).collect(),
                source: source.to_string(),
            });
        }

        for event in abi.events() {
            registry.insert_event(EventSignature {
                topic: event.selector().0,
                name: event.name.clone(),
                signature: event.signature(),
                inputs: event
                    .inputs
                    .iter()
                    .map(|input| ParamSpec {
                        name: input.name.clone(),
                        kind: input.selector_type().into_owned(),
                        indexed: input.indexed,
                    })
                    .collect(),
                anonymous: event.anonymous,
            });
        }

        for error in abi.errors() {
            registry.insert_error(ErrorSignature {
                selector: error.selector().0,
                name: error.name.clone(),
                signature: error.signature(),
                inputs: error.inputs.iter().map(param_spec).collect(),
            });
        }

        registry
    }

    /// Insert a function signature
    ///
    /// Note: First function for a given selector wins (no overwrite)
    pub fn insert(&mut self, function: FunctionSignature) {
        self.functions.entry(function.selector).or_insert(function);
    }

    pub fn insert_event(&mut self, event: EventSignature) {
        self.events.entry(event.topic).or_insert(event);
    }

    pub fn insert_error(&mut self, error: ErrorSignature) {
        self.errors.entry(error.selector).or_insert(error);
    }

    /// Look up a function by selector
    pub fn lookup(&self, selector: [u8; 4]) -> Option<&FunctionSignature> {
        self.functions.get(&selector)
    }

    /// Look up a function by selector hex string (e.g., "0x4f0f4aa9")
    pub fn lookup_hex(&self, selector_hex: &str) -> Option<&FunctionSignature> {
        self.lookup(parse_selector(selector_hex)?)
    }

    pub fn lookup_event(&self, topic: [u8; 32]) -> Option<&EventSignature> {
        self.events.get(&topic)
    }

    pub fn lookup_error(&self, selector: [u8; 4]) -> Option<&ErrorSignature> {
        self.errors.get(&selector)
    }

    /// Find a function by name; overloads resolve to the one with fewest inputs
    pub fn function_by_name(&self, name: &str) -> Option<&FunctionSignature> {
        self.functions
            .values()
            .filter(|function| function.name == name)
            .min_by_key(|function| function.inputs.len())
    }

    /// Get the number of registered functions
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty() && self.events.is_empty() && self.errors.is_empty()
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Merge another registry into this one
    ///
    /// Entries from the other registry are only added if their
    /// selector is not already present (first wins).
    pub fn merge(&mut self, other: Self) {
        for (selector, function) in other.functions {
            self.functions.entry(selector).or_insert(function);
        }
        for (topic, event) in other.events {
            self.events.entry(topic).or_insert(event);
        }
        for (selector, error) in other.errors {
            self.errors.entry(selector).or_insert(error);
        }
    }

    /// Get all functions, sorted by name
    pub fn functions(&self) -> Vec<&FunctionSignature> {
        let mut functions: Vec<_> = self.functions.values().collect();
        functions.sort_by(|a, b| a.name.cmp(&b.name).then(a.inputs.len().cmp(&b.inputs.len())));
        functions
    }
}

fn param_spec(param: &Param) -> ParamSpec {
    ParamSpec {
        name: param.name.clone(),
        kind: param.selector_type().into_owned(),
        indexed: false,
    }
}

/// Parse "0x"-prefixed or bare 8-char hex into a selector
pub fn parse_selector(selector_hex: &str) -> Option<[u8; 4]> {
    let normalized = selector_hex
        .strip_prefix("0x")
        .or_else(|| selector_hex.strip_prefix("0X"))
        .unwrap_or(selector_hex);

    if normalized.len() != 8 {
        return None;
    }

    let bytes = hex::decode(normalized).ok()?;
    bytes.try_into().ok()
}
