use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::MintError;

/// Goerli, the network the collection is deployed on.
pub const DEFAULT_CHAIN_ID: u64 = 5;

/// 0.01 ETH in wei.
pub const DEFAULT_MINT_PRICE_WEI: u128 = 10_000_000_000_000_000;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

// ---------------------------------------------------------------------------
// Wallet endpoints
// ---------------------------------------------------------------------------

/// A wallet the selection modal can offer: a JSON-RPC endpoint that holds
/// the user's accounts and signs on their behalf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletEndpoint {
    pub name: String,
    pub url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl WalletEndpoint {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Validate that a URL is well-formed and uses HTTP or HTTPS.
pub fn validate_url(url: &str) -> bool {
    match url::Url::parse(url) {
        Ok(parsed) => {
            let scheme = parsed.scheme();
            (scheme == "http" || scheme == "https") && parsed.host().is_some()
        }
        Err(_) => false,
    }
}

// ---------------------------------------------------------------------------
// DappConfig
// ---------------------------------------------------------------------------

/// Mint page configuration stored at `~/.cryptodevs/config.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DappConfig {
    /// Chain the wallet must be connected to.
    pub chain_id: u64,
    pub contract_address: Option<String>,

    // Wallet modal
    pub wallets: Vec<WalletEndpoint>,
    pub preferred_wallet: Option<String>,

    // Polling
    pub phase_poll_secs: u64,
    pub minted_poll_secs: u64,
    pub receipt_poll_ms: u64,

    // Collection
    pub mint_price_wei: u128,
    pub max_supply: u64,

    pub log_level: String,
}

impl Default for DappConfig {
    fn default() -> Self {
        Self {
            chain_id: DEFAULT_CHAIN_ID,
            contract_address: None,
            wallets: vec![WalletEndpoint::new("Frame", "http://127.0.0.1:1248")],
            preferred_wallet: None,
            phase_poll_secs: 5,
            minted_poll_secs: 5,
            receipt_poll_ms: 1_000,
            mint_price_wei: DEFAULT_MINT_PRICE_WEI,
            max_supply: 20,
            log_level: "info".into(),
        }
    }
}

impl DappConfig {
    /// Returns the base config directory: `~/.cryptodevs/`
    pub fn base_dir() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".cryptodevs"))
    }

    /// Returns the config file path: `~/.cryptodevs/config.json`
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::base_dir()?.join("config.json"))
    }

    /// Returns the logs directory: `~/.cryptodevs/logs/`
    pub fn logs_dir() -> Result<PathBuf> {
        Ok(Self::base_dir()?.join("logs"))
    }

    /// Ensures all required directories exist.
    pub fn ensure_dirs() -> Result<()> {
        for dir in [Self::base_dir()?, Self::logs_dir()?] {
            if !dir.exists() {
                std::fs::create_dir_all(&dir)
                    .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
            }
        }
        Ok(())
    }

    /// Loads config from disk (creating the default file if missing), then
    /// applies environment overrides and validates the result.
    pub fn load() -> Result<Self> {
        Self::ensure_dirs()?;
        let path = Self::config_path()?;
        let mut config = Self::load_from_path(&path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load config from a specific file path.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            let config: Self = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse {}", path.display()))?;
            info!("Loaded config from {}", path.display());
            Ok(config)
        } else {
            let config = Self::default();
            config.save_to_path(path)?;
            info!("Created default config at {}", path.display());
            Ok(config)
        }
    }

    /// Save config to a specific file path.
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }

    /// Override fields from `NFT_CONTRACT_ADDRESS`, `RPC_URL` and `LOG_LEVEL`.
    ///
    /// `RPC_URL` replaces the wallet list with a single endpoint named "RPC".
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(address) = lookup("NFT_CONTRACT_ADDRESS").filter(|v| !v.is_empty()) {
            self.contract_address = Some(address);
        }
        if let Some(url) = lookup("RPC_URL").filter(|v| !v.is_empty()) {
            self.wallets = vec![WalletEndpoint::new("RPC", url)];
            self.preferred_wallet = None;
        }
        if let Some(level) = lookup("LOG_LEVEL").filter(|v| !v.is_empty()) {
            self.log_level = level;
        }
    }

    pub fn validate(&self) -> Result<(), MintError> {
        if self.chain_id == 0 {
            return Err(MintError::Config("chain_id must be non-zero".into()));
        }
        if self.phase_poll_secs == 0 || self.minted_poll_secs == 0 || self.receipt_poll_ms == 0 {
            return Err(MintError::Config("poll intervals must be non-zero".into()));
        }
        if let Some(bad) = self.wallets.iter().find(|w| !validate_url(&w.url)) {
            return Err(MintError::Config(format!(
                "invalid URL for wallet '{}': {}",
                bad.name, bad.url
            )));
        }
        Ok(())
    }

    /// The NFT contract address, which must be configured before the page
    /// can read anything.
    pub fn require_contract_address(&self) -> Result<&str, MintError> {
        self.contract_address
            .as_deref()
            .filter(|a| !a.is_empty())
            .ok_or_else(|| {
                MintError::Config(
                    "contract_address is not set (config.json or NFT_CONTRACT_ADDRESS)".into(),
                )
            })
    }
}

// ---------------------------------------------------------------------------
// DeployConstants
// ---------------------------------------------------------------------------

/// Inputs of the deployment command, read from `constants.json` and then
/// overridden by environment variables of the same name.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "SCREAMING_SNAKE_CASE")]
pub struct DeployConstants {
    pub whitelist_contract_address: String,
    pub metadata_url: String,
    pub rpc_url: String,
    pub deployer_address: Option<String>,
    pub artifact_path: PathBuf,
    pub chain_id: u64,
    pub receipt_poll_ms: u64,
}

impl Default for DeployConstants {
    fn default() -> Self {
        Self {
            whitelist_contract_address: String::new(),
            metadata_url: String::new(),
            rpc_url: "http://127.0.0.1:8545".into(),
            deployer_address: None,
            artifact_path: PathBuf::from("artifacts/contracts/CryptoDevs.sol/CryptoDevs.json"),
            chain_id: DEFAULT_CHAIN_ID,
            receipt_poll_ms: 1_000,
        }
    }
}

impl DeployConstants {
    /// Load from `path` (defaults when the file is absent), apply overrides
    /// from `lookup`, and validate.
    pub fn load_from(path: &Path, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut constants = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read constants: {}", path.display()))?;
            serde_json::from_str::<Self>(&content)
                .with_context(|| format!("Failed to parse {}", path.display()))?
        } else {
            Self::default()
        };
        constants.apply_env_overrides(lookup);
        constants.validate()?;
        Ok(constants)
    }

    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());
        if let Some(v) = get("WHITELIST_CONTRACT_ADDRESS") {
            self.whitelist_contract_address = v;
        }
        if let Some(v) = get("METADATA_URL") {
            self.metadata_url = v;
        }
        if let Some(v) = get("RPC_URL") {
            self.rpc_url = v;
        }
        if let Some(v) = get("DEPLOYER_ADDRESS") {
            self.deployer_address = Some(v);
        }
        if let Some(v) = get("ARTIFACT_PATH") {
            self.artifact_path = PathBuf::from(v);
        }
    }

    pub fn validate(&self) -> Result<(), MintError> {
        if self.whitelist_contract_address.is_empty() {
            return Err(MintError::Config("WHITELIST_CONTRACT_ADDRESS is not set".into()));
        }
        if self.metadata_url.is_empty() {
            return Err(MintError::Config("METADATA_URL is not set".into()));
        }
        if !validate_url(&self.rpc_url) {
            return Err(MintError::Config(format!("invalid RPC_URL: {}", self.rpc_url)));
        }
        if self.receipt_poll_ms == 0 {
            return Err(MintError::Config("RECEIPT_POLL_MS must be non-zero".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn default_config_targets_goerli() {
        let config = DappConfig::default();
        assert_eq!(config.chain_id, 5);
        assert_eq!(config.phase_poll_secs, 5);
        assert_eq!(config.minted_poll_secs, 5);
        assert_eq!(config.mint_price_wei, 10u128.pow(16));
        assert_eq!(config.max_supply, 20);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn load_from_missing_path_writes_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let config = DappConfig::load_from_path(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.chain_id, DEFAULT_CHAIN_ID);
    }

    #[test]
    fn partial_config_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "contract_address": "0x1234", "max_supply": 50 }"#).unwrap();

        let config = DappConfig::load_from_path(&path).unwrap();
        assert_eq!(config.contract_address.as_deref(), Some("0x1234"));
        assert_eq!(config.max_supply, 50);
        assert_eq!(config.phase_poll_secs, 5);
    }

    #[test]
    fn env_overrides_replace_contract_and_wallets() {
        let mut config = DappConfig::default();
        config.preferred_wallet = Some("Frame".into());
        config.apply_env_overrides(env(&[
            ("NFT_CONTRACT_ADDRESS", "0xabc"),
            ("RPC_URL", "http://localhost:8545"),
        ]));

        assert_eq!(config.contract_address.as_deref(), Some("0xabc"));
        assert_eq!(config.wallets, vec![WalletEndpoint::new("RPC", "http://localhost:8545")]);
        assert!(config.preferred_wallet.is_none());
    }

    #[test]
    fn empty_env_values_are_ignored() {
        let mut config = DappConfig::default();
        config.apply_env_overrides(env(&[("NFT_CONTRACT_ADDRESS", ""), ("LOG_LEVEL", "")]));
        assert!(config.contract_address.is_none());
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn validate_rejects_bad_wallet_url() {
        let mut config = DappConfig::default();
        config.wallets.push(WalletEndpoint::new("Broken", "ftp://wallet"));
        let err = config.validate().unwrap_err();
        assert!(matches!(err, MintError::Config(ref m) if m.contains("Broken")));
    }

    #[test]
    fn validate_rejects_zero_interval() {
        let config = DappConfig {
            phase_poll_secs: 0,
            ..DappConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn require_contract_address_errors_when_unset() {
        let config = DappConfig::default();
        assert!(matches!(
            config.require_contract_address(),
            Err(MintError::Config(_))
        ));
    }

    #[test]
    fn deploy_constants_read_file_then_env() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("constants.json");
        std::fs::write(
            &path,
            r#"{
                "WHITELIST_CONTRACT_ADDRESS": "0x00000000000000000000000000000000000000aa",
                "METADATA_URL": "ipfs://file"
            }"#,
        )
        .unwrap();

        let constants =
            DeployConstants::load_from(&path, env(&[("METADATA_URL", "ipfs://env")])).unwrap();
        assert_eq!(
            constants.whitelist_contract_address,
            "0x00000000000000000000000000000000000000aa"
        );
        assert_eq!(constants.metadata_url, "ipfs://env");
        assert_eq!(constants.rpc_url, "http://127.0.0.1:8545");
    }

    #[test]
    fn deploy_constants_require_both_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.json");

        let err = DeployConstants::load_from(&path, env(&[("METADATA_URL", "ipfs://x")]))
            .unwrap_err();
        assert!(err.to_string().contains("WHITELIST_CONTRACT_ADDRESS"));
    }

    #[test]
    fn deploy_constants_reject_zero_receipt_poll() {
        let constants = DeployConstants {
            whitelist_contract_address: "0x00000000000000000000000000000000000000aa".into(),
            metadata_url: "ipfs://x".into(),
            receipt_poll_ms: 0,
            ..DeployConstants::default()
        };
        assert!(matches!(
            constants.validate(),
            Err(MintError::Config(ref m)) if m.contains("RECEIPT_POLL_MS")
        ));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("constants.json");
        std::fs::write(
            &path,
            r#"{
                "WHITELIST_CONTRACT_ADDRESS": "0x00000000000000000000000000000000000000aa",
                "METADATA_URL": "ipfs://file",
                "RECEIPT_POLL_MS": 0
            }"#,
        )
        .unwrap();
        assert!(DeployConstants::load_from(&path, env(&[])).is_err());
    }

    #[test]
    fn validate_url_accepts_http_and_https() {
        assert!(validate_url("https://rpc.example.com"));
        assert!(validate_url("http://localhost:8545"));
    }

    #[test]
    fn validate_url_rejects_garbage() {
        assert!(!validate_url(""));
        assert!(!validate_url("not a url"));
        assert!(!validate_url("ftp://server.com"));
        assert!(!validate_url("file:///etc/passwd"));
    }
}
