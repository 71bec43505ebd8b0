//! Creation bytecode loading.

use std::fs;
use std::path::Path;

use alloy::primitives::Bytes;
use anyhow::{Context, bail};
use serde::Deserialize;
use tracing::debug;

#[derive(Deserialize)]
struct Artifact {
    #[serde(default, rename = "contractName")]
    contract_name: Option<String>,
    bytecode: BytecodeField,
}

/// Hardhat stores a hex string, Foundry an object with `object`.
#[derive(Deserialize)]
#[serde(untagged)]
enum BytecodeField {
    Hex(String),
    Object { object: String },
}

impl BytecodeField {
    fn into_hex(self) -> String {
        match self {
            BytecodeField::Hex(hex) | BytecodeField::Object { object: hex } => hex,
        }
    }
}

pub fn load(path: &Path) -> anyhow::Result<Bytes> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read artifact {}", path.display()))?;
    parse(&text).with_context(|| format!("invalid artifact {}", path.display()))
}

pub fn parse(text: &str) -> anyhow::Result<Bytes> {
    let trimmed = text.trim();
    let hex = if trimmed.starts_with('{') {
        let artifact: Artifact =
            serde_json::from_str(trimmed).context("artifact is not valid JSON")?;
        debug!(contract = ?artifact.contract_name, "parsed contract artifact");
        artifact.bytecode.into_hex()
    } else {
        trimmed.to_string()
    };

    if hex.contains("__$") {
        bail!("bytecode has unlinked library references");
    }
    let bytes: Bytes = hex
        .trim()
        .parse()
        .context("bytecode is not valid hex")?;
    if bytes.is_empty() {
        bail!("artifact has no creation bytecode; is the contract abstract?");
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn reads_hardhat_and_foundry_layouts() {
        let hardhat = r#"{"contractName":"TodoList","abi":[],"bytecode":"0x6080604052"}"#;
        let foundry = r#"{"abi":[],"bytecode":{"object":"0x6080604052","linkReferences":{}}}"#;

        let expected = Bytes::from(vec![0x60, 0x80, 0x60, 0x40, 0x52]);
        assert_eq!(parse(hardhat).expect("hardhat"), expected);
        assert_eq!(parse(foundry).expect("foundry"), expected);
    }

    #[test]
    fn accepts_bare_hex_with_trailing_newline() {
        let bytes = parse("0x6080\n").expect("raw hex");
        assert_eq!(bytes.as_ref(), &[0x60, 0x80]);
    }

    #[test]
    fn rejects_empty_and_unlinked_bytecode() {
        assert!(parse(r#"{"bytecode":"0x"}"#).is_err());
        assert!(parse("0x6080__$abcdef$__").is_err());
        assert!(parse("not hex").is_err());
    }

    #[test]
    fn load_reports_missing_file() {
        let temp = tempdir().expect("tempdir");
        let err = load(&temp.path().join("TodoList.json")).expect_err("missing");
        assert!(format!("{err:#}").contains("TodoList.json"));

        let path = temp.path().join("TodoList.bin");
        fs::write(&path, "6080").expect("write artifact");
        assert_eq!(load(&path).expect("load").len(), 2);
    }
}
