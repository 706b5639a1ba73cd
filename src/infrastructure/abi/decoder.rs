//! ABI decoder implementation using alloy-dyn-abi

use alloy_dyn_abi::{DynSolType, DynSolValue};
use anyhow::{bail, Context, Result};

use crate::domain::abi::{AbiDecoder, AbiRegistry, DecodedArg, DecodedCall, FunctionSignature, ParamSpec};

/// `Error(string)`
const REVERT_SELECTOR: [u8; 4] = [0x08, 0xc3, 0x79, 0xa0];
/// `Panic(uint256)`
const PANIC_SELECTOR: [u8; 4] = [0x4e, 0x48, 0x7b, 0x71];

/// ABI decoder implementation using alloy-dyn-abi
pub struct AlloyAbiDecoder {
    registry: AbiRegistry,
}

impl AlloyAbiDecoder {
    /// Create a new decoder with the given registry
    pub fn new(registry: AbiRegistry) -> Self {
        Self { registry }
    }

    /// Get the underlying registry
    pub fn registry(&self) -> &AbiRegistry {
        &self.registry
    }
}

impl AbiDecoder for AlloyAbiDecoder {
    fn decode_calldata(&self, function: &FunctionSignature, data: &[u8]) -> Result<DecodedCall> {
        if data.len() < 4 {
            bail!("calldata too short (need at least 4 bytes for selector)");
        }

        let selector = selector_of(data);
        if selector != function.selector {
            bail!(
                "selector mismatch: got 0x{}, expected 0x{}",
                hex::encode(selector),
                hex::encode(function.selector)
            );
        }

        let arguments = decode_params(&function.inputs, &data[4..])
            .with_context(|| format!("Failed to decode calldata for {}", function.signature))?;

        Ok(DecodedCall {
            function_name: function.name.clone(),
            signature: function.signature.clone(),
            arguments,
        })
    }

    fn decode_by_selector(&self, data: &[u8]) -> Result<Option<DecodedCall>> {
        if data.len() < 4 {
            bail!("calldata too short (need at least 4 bytes for selector)");
        }
        match self.registry.lookup(selector_of(data)) {
            Some(function) => Ok(Some(self.decode_calldata(function, data)?)),
            None => Ok(None),
        }
    }

    fn decode_error(&self, data: &[u8]) -> Result<Option<DecodedCall>> {
        if data.len() < 4 {
            bail!("revert data too short (need at least 4 bytes for selector)");
        }
        let selector = selector_of(data);

        if let Some(error) = self.registry.lookup_error(selector) {
            let arguments = decode_params(&error.inputs, &data[4..])
                .with_context(|| format!("Failed to decode error {}", error.signature))?;
            return Ok(Some(DecodedCall {
                function_name: error.name.clone(),
                signature: error.signature.clone(),
                arguments,
            }));
        }

        let builtin = match selector {
            REVERT_SELECTOR => Some(("Error", "Error(string)", "reason", "string")),
            PANIC_SELECTOR => Some(("Panic", "Panic(uint256)", "code", "uint256")),
            _ => None,
        };
        let Some((name, signature, param, kind)) = builtin else {
            return Ok(None);
        };

        let inputs = [ParamSpec {
            name: param.to_string(),
            kind: kind.to_string(),
            indexed: false,
        }];
        let arguments = decode_params(&inputs, &data[4..])
            .with_context(|| format!("Failed to decode {signature}"))?;
        Ok(Some(DecodedCall {
            function_name: name.to_string(),
            signature: signature.to_string(),
            arguments,
        }))
    }

    fn decode_log(&self, topics: &[[u8; 32]], data: &[u8]) -> Result<Option<DecodedCall>> {
        let Some(topic0) = topics.first() else {
            bail!("log has no topics");
        };
        let Some(event) = self.registry.lookup_event(*topic0) else {
            return Ok(None);
        };

        let indexed: Vec<&ParamSpec> = event.inputs.iter().filter(|p| p.indexed).collect();
        if topics.len() != indexed.len() + 1 {
            bail!(
                "{} expects {} indexed topics, log has {}",
                event.name,
                indexed.len(),
                topics.len() - 1
            );
        }

        let body: Vec<ParamSpec> = event.inputs.iter().filter(|p| !p.indexed).cloned().collect();
        let mut body_values = decode_params(&body, data)
            .with_context(|| format!("Failed to decode {} data", event.name))?
            .into_iter();
        let mut topic_values = topics[1..].iter();

        let mut arguments = Vec::with_capacity(event.inputs.len());
        for (idx, param) in event.inputs.iter().enumerate() {
            if param.indexed {
                let topic = topic_values.next().context("missing topic")?;
                arguments.push(DecodedArg {
                    name: arg_name(param, idx),
                    kind: param.kind.clone(),
                    value: decode_topic(&param.kind, topic)?,
                });
            } else if let Some(value) = body_values.next() {
                arguments.push(value);
            }
        }

        Ok(Some(DecodedCall {
            function_name: event.name.clone(),
            signature: event.signature.clone(),
            arguments,
        }))
    }
}

fn selector_of(data: &[u8]) -> [u8; 4] {
    [data[0], data[1], data[2], data[3]]
}

fn arg_name(param: &ParamSpec, idx: usize) -> String {
    if param.name.trim().is_empty() {
        format!("arg{}", idx)
    } else {
        param.name.clone()
    }
}

/// Decode a head/tail encoded parameter list
fn decode_params(params: &[ParamSpec], data: &[u8]) -> Result<Vec<DecodedArg>> {
    if params.is_empty() {
        return Ok(Vec::new());
    }

    let types: Vec<DynSolType> = params
        .iter()
        .map(|param| {
            param.kind.parse::<DynSolType>().with_context(|| {
                format!("Failed to parse type '{}' for param '{}'", param.kind, param.name)
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let decoded = DynSolType::Tuple(types)
        .abi_decode_sequence(data)
        .context("Failed to decode parameters")?;
    let values = match decoded {
        DynSolValue::Tuple(values) => values,
        other => vec![other],
    };

    Ok(params
        .iter()
        .zip(values.iter())
        .enumerate()
        .map(|(idx, (param, value))| DecodedArg {
            name: arg_name(param, idx),
            kind: param.kind.clone(),
            value: format_dyn_sol_value(value),
        })
        .collect())
}

/// Indexed value types decode from their topic; reference types are only a hash
fn decode_topic(kind: &str, topic: &[u8; 32]) -> Result<String> {
    let ty: DynSolType = kind
        .parse()
        .with_context(|| format!("Failed to parse topic type '{kind}'"))?;
    let is_word = matches!(
        ty,
        DynSolType::Bool
            | DynSolType::Address
            | DynSolType::Uint(_)
            | DynSolType::Int(_)
            | DynSolType::FixedBytes(_)
    );
    if !is_word {
        return Ok(format!("keccak256:0x{}", hex::encode(topic)));
    }
    let value = ty.abi_decode(topic).context("Failed to decode topic")?;
    Ok(format_dyn_sol_value(&value))
}

/// Format a DynSolValue for display
pub fn format_dyn_sol_value(value: &DynSolValue) -> String {
    match value {
        DynSolValue::Bool(b) => b.to_string(),
        DynSolValue::Int(i, _) => i.to_string(),
        DynSolValue::Uint(u, _) => {
            let s = u.to_string();
            // For very large numbers, show hex instead
            if s.len() > 20 {
                format!("0x{:x}", u)
            } else {
                s
            }
        }
        DynSolValue::FixedBytes(word, size) => {
            let bytes = &word.as_slice()[..(*size).min(32)];
            format!("0x{}", hex::encode(bytes))
        }
        DynSolValue::Address(addr) => format!("{:?}", addr),
        DynSolValue::Function(func) => format!("0x{}", hex::encode(func.as_slice())),
        DynSolValue::Bytes(bytes) => {
            if bytes.len() <= 32 {
                format!("0x{}", hex::encode(bytes))
            } else {
                format!("0x{}… ({} bytes)", hex::encode(&bytes[..32]), bytes.len())
            }
        }
        DynSolValue::String(s) => {
            if s.chars().count() <= 64 {
                format!("\"{}\"", s)
            } else {
                let head: String = s.chars().take(64).collect();
                format!("\"{}…\" ({} chars)", head, s.chars().count())
            }
        }
        DynSolValue::Array(arr) | DynSolValue::FixedArray(arr) => {
            let max_items = 10;
            let items: Vec<String> = arr
                .iter()
                .take(max_items)
                .map(format_dyn_sol_value)
                .collect();
            if arr.len() > max_items {
                format!("[{}, …] ({} items)", items.join(", "), arr.len())
            } else {
                format!("[{}]", items.join(", "))
            }
        }
        DynSolValue::Tuple(fields) => {
            let items: Vec<String> = fields.iter().map(format_dyn_sol_value).collect();
            format!("({})", items.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bindings::{self, NodeRegistry};
    use alloy::primitives::{Address, Bytes, U256};
    use alloy::sol_types::{Panic, PanicKind, Revert, SolCall, SolError, SolEvent};

    fn decoder() -> AlloyAbiDecoder {
        let registry = AbiRegistry::from_abi(&bindings::abi().unwrap(), "NodeRegistry");
        AlloyAbiDecoder::new(registry)
    }

    #[test]
    fn test_decode_set_min_monthly_fee() {
        let calldata = NodeRegistry::setMinMonthlyFeeCall {
            nodeId: U256::from(200),
            minMonthlyFeeMicroDollars: U256::from(1_000_000u64),
        }
        .abi_encode();

        let result = decoder().decode_by_selector(&calldata).unwrap().unwrap();

        assert_eq!(result.function_name, "setMinMonthlyFee");
        assert_eq!(result.arguments.len(), 2);
        assert_eq!(result.arguments[0].name, "nodeId");
        assert_eq!(result.arguments[0].value, "200");
        assert_eq!(result.arguments[1].value, "1000000");
        assert_eq!(result.display(), "setMinMonthlyFee(nodeId=200, minMonthlyFeeMicroDollars=1000000)");
    }

    #[test]
    fn test_decode_add_node() {
        let owner = Address::repeat_byte(0xab);
        let calldata = NodeRegistry::addNodeCall {
            to: owner,
            signingKeyPub: Bytes::from(vec![0x02; 33]),
            httpAddress: "https://node.example".to_string(),
            minMonthlyFeeMicroDollars: U256::from(5u64),
        }
        .abi_encode();

        let result = decoder().decode_by_selector(&calldata).unwrap().unwrap();
        assert_eq!(result.signature, "addNode(address,bytes,string,uint256)");
        assert!(result.arguments[1].value.contains("(33 bytes)"));
        assert_eq!(result.arguments[2].value, "\"https://node.example\"");
    }

    #[test]
    fn test_selector_mismatch() {
        let decoder = decoder();
        let function = decoder.registry().function_by_name("getNode").unwrap().clone();

        let calldata = hex::decode("deadbeef").unwrap();
        let result = decoder.decode_calldata(&function, &calldata);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("selector mismatch"));
    }

    #[test]
    fn test_unknown_selector() {
        let calldata = hex::decode("deadbeef").unwrap();
        assert!(decoder().decode_by_selector(&calldata).unwrap().is_none());
    }

    #[test]
    fn test_decode_custom_error() {
        let data = NodeRegistry::ERC721NonexistentToken {
            tokenId: U256::from(7),
        }
        .abi_encode();
        let result = decoder().decode_error(&data).unwrap().unwrap();
        assert_eq!(result.display(), "ERC721NonexistentToken(tokenId=7)");
    }

    #[test]
    fn test_decode_builtin_reverts() {
        let decoder = decoder();

        let data = Revert {
            reason: "not allowed".to_string(),
        }
        .abi_encode();
        let result = decoder.decode_error(&data).unwrap().unwrap();
        assert_eq!(result.function_name, "Error");
        assert_eq!(result.arguments[0].value, "\"not allowed\"");

        let data = Panic::from(PanicKind::UnderOverflow).abi_encode();
        let result = decoder.decode_error(&data).unwrap().unwrap();
        assert_eq!(result.function_name, "Panic");
        assert_eq!(result.arguments[0].value, "17");
    }

    #[test]
    fn test_decode_log_with_indexed_topics() {
        let event = NodeRegistry::HttpAddressUpdated {
            nodeId: U256::from(300),
            newHttpAddress: "https://moved.example".to_string(),
        };
        let log = event.encode_log_data();
        let topics: Vec<[u8; 32]> = log.topics().iter().map(|t| t.0).collect();

        let result = decoder().decode_log(&topics, &log.data).unwrap().unwrap();
        assert_eq!(result.function_name, "HttpAddressUpdated");
        assert_eq!(result.arguments[0].name, "nodeId");
        assert_eq!(result.arguments[0].value, "300");
        assert_eq!(result.arguments[1].value, "\"https://moved.example\"");
    }

    #[test]
    fn test_decode_log_topic_count_mismatch() {
        let topic0 = NodeRegistry::NodeTransferred::SIGNATURE_HASH.0;
        let result = decoder().decode_log(&[topic0], &[]);
        assert!(result.is_err());
    }
}
