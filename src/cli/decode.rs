//! `decode` commands; work offline against the embedded ABI

use std::fs;
use std::path::Path;

use alloy_json_abi::JsonAbi;
use anyhow::{bail, Context, Result};

use super::{DecodeArgs, DecodeCommand};
use crate::bindings;
use crate::domain::abi::{AbiDecoder, AbiRegistry, DecodedCall};
use crate::infrastructure::abi::AlloyAbiDecoder;

/// Registry ABI first, then each extra file; earlier entries win on collisions
pub fn load_registry(extra_abis: &[impl AsRef<Path>]) -> Result<AbiRegistry> {
    let mut registry = AbiRegistry::from_abi(&bindings::abi()?, "NodeRegistry");
    for path in extra_abis {
        let path = path.as_ref();
        let content =
            fs::read_to_string(path).with_context(|| format!("read ABI {}", path.display()))?;
        let abi: JsonAbi = serde_json::from_str(&content)
            .with_context(|| format!("parse ABI {}", path.display()))?;
        registry.merge(AbiRegistry::from_abi(&abi, &path.display().to_string()));
    }
    Ok(registry)
}

pub fn run(args: DecodeArgs) -> Result<()> {
    let decoder = AlloyAbiDecoder::new(load_registry(args.extra_abis.as_slice())?);

    let decoded = match args.command {
        DecodeCommand::Selectors => {
            for function in decoder.registry().functions() {
                println!("{}  {}", function.selector_hex(), function.signature);
            }
            return Ok(());
        }
        DecodeCommand::Calldata { data } => decoder.decode_by_selector(&data)?,
        DecodeCommand::Error { data } => decoder.decode_error(&data)?,
        DecodeCommand::Log { topics, data } => {
            let topics: Vec<[u8; 32]> = topics.iter().map(|t| t.0).collect();
            decoder.decode_log(&topics, &data)?
        }
    };

    match decoded {
        Some(call) => print_decoded(&call),
        None => bail!("no matching function, error or event in the loaded ABIs"),
    }
    Ok(())
}

fn print_decoded(call: &DecodedCall) {
    println!("{}", call.signature);
    for arg in &call.arguments {
        println!("  {} {} = {}", arg.kind, arg.name, arg.value);
    }
}
