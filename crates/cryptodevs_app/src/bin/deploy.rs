//! One-shot deployment of the CryptoDevs collection.
//!
//! Reads `constants.json` from the current directory (environment variables
//! of the same name win), deploys through the configured RPC wallet and
//! prints the new contract address.

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{error, info};

use cryptodevs_chain::deploy::resolve_deployer;
use cryptodevs_chain::{
    Address, ContractArtifact, DeployParams, Eip1193Provider, HttpProvider, deploy_contract,
};
use cryptodevs_core::{DappConfig, DeployConstants, logging};

const CONSTANTS_FILE: &str = "constants.json";
const RPC_TIMEOUT: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let _log_guard = match DappConfig::logs_dir()
        .and_then(|dir| logging::init_logging(&dir, "info", "deploy.log"))
    {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Warning: logging disabled: {e:#}");
            None
        }
    };

    match run().await {
        Ok(address) => {
            println!("Crypto Devs Contract Address: {address}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Deployment failed: {e:#}");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<Address> {
    let constants = DeployConstants::load_from(Path::new(CONSTANTS_FILE), |key| std::env::var(key).ok())
        .context("Failed to load deployment constants")?;

    let whitelist: Address = constants
        .whitelist_contract_address
        .parse()
        .with_context(|| format!("Invalid WHITELIST_CONTRACT_ADDRESS: {}", constants.whitelist_contract_address))?;
    let configured_deployer = constants
        .deployer_address
        .as_deref()
        .map(str::parse::<Address>)
        .transpose()
        .context("Invalid DEPLOYER_ADDRESS")?;

    let artifact = ContractArtifact::load(&constants.artifact_path)?;
    info!(
        contract = %artifact.contract_name,
        bytecode_len = artifact.bytecode.len(),
        path = %constants.artifact_path.display(),
        "artifact loaded"
    );

    let provider: Arc<dyn Eip1193Provider> =
        Arc::new(HttpProvider::new("RPC", constants.rpc_url.clone(), RPC_TIMEOUT)?);
    let from = resolve_deployer(provider.as_ref(), configured_deployer).await?;

    let params = DeployParams {
        metadata_url: constants.metadata_url.clone(),
        whitelist_contract: whitelist,
    };
    let result = deploy_contract(
        provider,
        &artifact,
        &params,
        from,
        constants.chain_id,
        Duration::from_millis(constants.receipt_poll_ms),
    )
    .await?;

    info!(tx = %result.tx_hash, deployer = %result.deployer, "deployment confirmed");
    Ok(result.contract_address)
}
