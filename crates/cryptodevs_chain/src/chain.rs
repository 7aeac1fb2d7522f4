use std::fmt;

use serde::{Deserialize, Serialize};

/// Networks the mint page knows by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chain {
    Mainnet,
    Goerli,
    Sepolia,
    Localhost,
}

impl Chain {
    /// Human-readable label for the chain.
    pub fn label(&self) -> &'static str {
        match self {
            Chain::Mainnet => "Ethereum Mainnet",
            Chain::Goerli => "Goerli",
            Chain::Sepolia => "Sepolia",
            Chain::Localhost => "Localhost",
        }
    }

    /// EVM chain ID.
    pub fn chain_id(&self) -> u64 {
        match self {
            Chain::Mainnet => 1,
            Chain::Goerli => 5,
            Chain::Sepolia => 11_155_111,
            Chain::Localhost => 31_337,
        }
    }

    pub fn from_chain_id(id: u64) -> Option<Self> {
        [Chain::Mainnet, Chain::Goerli, Chain::Sepolia, Chain::Localhost]
            .into_iter()
            .find(|c| c.chain_id() == id)
    }

    /// Label for any chain id, named or not.
    pub fn label_for(id: u64) -> String {
        Self::from_chain_id(id)
            .map(|c| c.label().to_string())
            .unwrap_or_else(|| format!("chain {id}"))
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_ids() {
        assert_eq!(Chain::Goerli.chain_id(), 5);
        assert_eq!(Chain::Mainnet.chain_id(), 1);
        assert_eq!(Chain::from_chain_id(5), Some(Chain::Goerli));
        assert_eq!(Chain::from_chain_id(42), None);
    }

    #[test]
    fn labels() {
        assert_eq!(Chain::label_for(5), "Goerli");
        assert_eq!(Chain::label_for(42), "chain 42");
        assert_eq!(format!("{}", Chain::Sepolia), "Sepolia");
    }

    #[test]
    fn serde_uses_lowercase() {
        let json = serde_json::to_string(&Chain::Goerli).unwrap();
        assert_eq!(json, "\"goerli\"");
    }
}
