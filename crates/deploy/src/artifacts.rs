//! Resolution of contract identifiers to creation bytecode.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use alloy_core::primitives::Bytes;
use serde::Deserialize;

/// Default Foundry output directory.
pub const DEFAULT_ARTIFACTS_DIR: &str = "out";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("bytecode not found for `{contract}`: {reason}")]
pub struct ArtifactError {
    pub contract: String,
    pub reason: String,
}

impl ArtifactError {
    fn new(contract: &str, reason: impl Into<String>) -> Self {
        Self {
            contract: contract.to_string(),
            reason: reason.into(),
        }
    }
}

/// Source of contract creation bytecode.
pub trait ArtifactResolver {
    /// Resolve an identifier such as `"Counter.sol"` or `"Counter.sol:Counter"`.
    fn get_code(&self, contract: &str) -> Result<Bytes, ArtifactError>;
}

/// Reads artifacts from a Foundry `out/` directory.
///
/// `File.sol:Name` maps to `<out>/File.sol/Name.json`; `File.sol` alone uses the file
/// stem as the contract name. A path ending in `.json` is read as-is.
#[derive(Debug, Clone)]
pub struct FoundryArtifacts {
    out_dir: PathBuf,
}

#[derive(Debug, Deserialize)]
struct FoundryArtifact {
    bytecode: Option<FoundryBytecode>,
}

#[derive(Debug, Deserialize)]
struct FoundryBytecode {
    object: Option<String>,
}

impl FoundryArtifacts {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }

    /// Path of the JSON artifact an identifier refers to.
    pub fn artifact_path(&self, contract: &str) -> Result<PathBuf, ArtifactError> {
        if contract.ends_with(".json") {
            return Ok(PathBuf::from(contract));
        }

        let (source, name) = match contract.split_once(':') {
            Some((source, name)) => (source, Some(name)),
            None => (contract, None),
        };

        // Foundry keys artifacts by source file name, not by full path.
        let file_name = Path::new(source)
            .file_name()
            .and_then(|f| f.to_str())
            .filter(|f| !f.is_empty())
            .ok_or_else(|| ArtifactError::new(contract, "missing source file name"))?;

        let name = match name {
            Some(name) if !name.is_empty() => name,
            Some(_) => return Err(ArtifactError::new(contract, "empty contract name")),
            None => Path::new(file_name)
                .file_stem()
                .and_then(|s| s.to_str())
                .ok_or_else(|| ArtifactError::new(contract, "cannot derive contract name"))?,
        };

        Ok(self.out_dir.join(file_name).join(format!("{name}.json")))
    }
}

impl ArtifactResolver for FoundryArtifacts {
    fn get_code(&self, contract: &str) -> Result<Bytes, ArtifactError> {
        let path = self.artifact_path(contract)?;

        let content = std::fs::read_to_string(&path).map_err(|e| {
            ArtifactError::new(contract, format!("failed to read {}: {e}", path.display()))
        })?;

        let artifact: FoundryArtifact = serde_json::from_str(&content).map_err(|e| {
            ArtifactError::new(contract, format!("failed to parse {}: {e}", path.display()))
        })?;

        let object = artifact
            .bytecode
            .and_then(|b| b.object)
            .ok_or_else(|| ArtifactError::new(contract, "artifact has no bytecode object"))?;

        let code: Bytes = object
            .parse()
            .map_err(|e| ArtifactError::new(contract, format!("invalid bytecode hex: {e}")))?;

        // Interfaces and abstract contracts compile to empty bytecode.
        if code.is_empty() {
            return Err(ArtifactError::new(contract, "bytecode is empty"));
        }

        tracing::debug!(contract, path = %path.display(), size = code.len(), "Loaded contract bytecode");

        Ok(code)
    }
}

/// In-memory artifact table.
#[derive(Debug, Clone, Default)]
pub struct StaticArtifacts {
    code: HashMap<String, Bytes>,
}

impl StaticArtifacts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, contract: impl Into<String>, code: impl Into<Bytes>) -> Self {
        self.code.insert(contract.into(), code.into());
        self
    }
}

impl ArtifactResolver for StaticArtifacts {
    fn get_code(&self, contract: &str) -> Result<Bytes, ArtifactError> {
        self.code
            .get(contract)
            .cloned()
            .ok_or_else(|| ArtifactError::new(contract, "no such contract"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    fn write_artifact(out: &Path, source: &str, name: &str, object: &str) {
        let dir = out.join(source);
        std::fs::create_dir_all(&dir).expect("Failed to create artifact dir");
        let json = serde_json::json!({
            "abi": [],
            "bytecode": { "object": object, "sourceMap": "" },
            "deployedBytecode": { "object": "0x" }
        });
        std::fs::write(dir.join(format!("{name}.json")), json.to_string())
            .expect("Failed to write artifact");
    }

    #[test]
    fn test_artifact_path_forms() {
        let artifacts = FoundryArtifacts::new("out");

        assert_eq!(
            artifacts.artifact_path("Counter.sol").unwrap(),
            PathBuf::from("out/Counter.sol/Counter.json")
        );
        assert_eq!(
            artifacts.artifact_path("src/Tokens.sol:Token").unwrap(),
            PathBuf::from("out/Tokens.sol/Token.json")
        );
        assert_eq!(
            artifacts.artifact_path("build/Custom.json").unwrap(),
            PathBuf::from("build/Custom.json")
        );
        assert!(artifacts.artifact_path("Counter.sol:").is_err());
        assert!(artifacts.artifact_path("").is_err());
    }

    #[test]
    fn test_get_code_reads_bytecode_object() {
        let temp_dir = TempDir::new("fanout-test").expect("Failed to create temp dir");
        write_artifact(temp_dir.path(), "Counter.sol", "Counter", "0x6080604052");
        write_artifact(temp_dir.path(), "Tokens.sol", "Token", "0x60016002");

        let artifacts = FoundryArtifacts::new(temp_dir.path());

        assert_eq!(
            artifacts.get_code("Counter.sol").unwrap(),
            Bytes::from_static(&[0x60, 0x80, 0x60, 0x40, 0x52])
        );
        assert_eq!(
            artifacts.get_code("Tokens.sol:Token").unwrap(),
            Bytes::from_static(&[0x60, 0x01, 0x60, 0x02])
        );
    }

    #[test]
    fn test_get_code_missing_artifact() {
        let temp_dir = TempDir::new("fanout-test").expect("Failed to create temp dir");
        let artifacts = FoundryArtifacts::new(temp_dir.path());

        let err = artifacts.get_code("Missing.sol").unwrap_err();
        assert_eq!(err.contract, "Missing.sol");
    }

    #[test]
    fn test_get_code_rejects_empty_bytecode() {
        let temp_dir = TempDir::new("fanout-test").expect("Failed to create temp dir");
        write_artifact(temp_dir.path(), "IAdapter.sol", "IAdapter", "0x");

        let artifacts = FoundryArtifacts::new(temp_dir.path());
        let err = artifacts.get_code("IAdapter.sol").unwrap_err();

        assert!(err.reason.contains("empty"));
    }

    #[test]
    fn test_get_code_rejects_corrupted_artifact() {
        let temp_dir = TempDir::new("fanout-test").expect("Failed to create temp dir");
        let dir = temp_dir.path().join("Broken.sol");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("Broken.json"), "{ invalid json }").unwrap();

        let artifacts = FoundryArtifacts::new(temp_dir.path());
        assert!(artifacts.get_code("Broken.sol").is_err());
    }

    #[test]
    fn test_static_artifacts() {
        let artifacts = StaticArtifacts::new().with("Counter.sol", vec![0x60, 0x80]);

        assert_eq!(artifacts.get_code("Counter.sol").unwrap().len(), 2);
        assert!(artifacts.get_code("Other.sol").is_err());
    }
}
