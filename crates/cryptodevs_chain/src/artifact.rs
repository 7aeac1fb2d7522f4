use std::path::Path;

use alloy_primitives::Bytes;
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("failed to read artifact {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse artifact {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// Interfaces and abstract contracts compile to empty bytecode.
    #[error("artifact {0} has no deployable bytecode")]
    EmptyBytecode(String),
}

/// Compiled contract ABI and creation bytecode, in the layout Hardhat writes
/// to `artifacts/contracts/<File>.sol/<Name>.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractArtifact {
    #[serde(default)]
    pub contract_name: String,
    #[serde(default)]
    pub abi: serde_json::Value,
    pub bytecode: Bytes,
}

impl ContractArtifact {
    pub fn load(path: &Path) -> Result<Self, ArtifactError> {
        let display = path.display().to_string();
        let content = std::fs::read_to_string(path).map_err(|source| ArtifactError::Io {
            path: display.clone(),
            source,
        })?;
        let artifact: Self =
            serde_json::from_str(&content).map_err(|source| ArtifactError::Parse {
                path: display.clone(),
                source,
            })?;
        if artifact.bytecode.is_empty() {
            return Err(ArtifactError::EmptyBytecode(display));
        }
        Ok(artifact)
    }
}
