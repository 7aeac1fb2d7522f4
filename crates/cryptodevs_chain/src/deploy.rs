use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::{Address, B256, Bytes, U256};
use alloy_sol_types::SolConstructor;
use cryptodevs_core::MintError;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::artifact::ContractArtifact;
use crate::chain::Chain;
use crate::contract::CryptoDevs;
use crate::eth::{self, PendingTransaction, TransactionRequest};
use crate::rpc::{Eip1193Provider, RpcError};

/// Constructor arguments of the collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployParams {
    /// Base URL the token URIs are built from.
    pub metadata_url: String,
    /// Address of the already-deployed whitelist registry.
    pub whitelist_contract: Address,
}

/// Result of a successful deployment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployResult {
    pub tx_hash: B256,
    pub contract_address: Address,
    pub deployer: Address,
    pub gas_used: U256,
}

/// Creation payload: bytecode followed by the ABI-encoded
/// `(metadata_url, whitelist_contract)` constructor arguments.
pub fn deployment_data(bytecode: &Bytes, params: &DeployParams) -> Bytes {
    let args = CryptoDevs::constructorCall::new((
        params.metadata_url.clone(),
        params.whitelist_contract,
    ))
    .abi_encode();
    [&bytecode[..], &args[..]].concat().into()
}

fn deployment_error(err: RpcError) -> MintError {
    MintError::Deployment(err.to_string())
}

/// The account to deploy from: the configured one, or the wallet's first.
pub async fn resolve_deployer(
    provider: &dyn Eip1193Provider,
    configured: Option<Address>,
) -> Result<Address, MintError> {
    if let Some(address) = configured {
        return Ok(address);
    }
    eth::accounts(provider)
        .await
        .map_err(deployment_error)?
        .into_iter()
        .next()
        .ok_or_else(|| MintError::Deployment(format!("wallet '{}' exposes no accounts", provider.name())))
}

/// Deploy the collection and wait for the creation receipt.
pub async fn deploy_contract(
    provider: Arc<dyn Eip1193Provider>,
    artifact: &ContractArtifact,
    params: &DeployParams,
    from: Address,
    expected_chain_id: u64,
    poll_interval: Duration,
) -> Result<DeployResult, MintError> {
    let actual = eth::chain_id(provider.as_ref())
        .await
        .map_err(deployment_error)?;
    if actual != expected_chain_id {
        return Err(MintError::WrongNetwork {
            expected: expected_chain_id,
            actual,
        });
    }

    let tx = TransactionRequest {
        from,
        to: None,
        data: deployment_data(&artifact.bytecode, params),
        value: None,
    };
    let hash = eth::send_transaction(provider.as_ref(), &tx)
        .await
        .map_err(deployment_error)?;
    info!(
        tx = %hash,
        %from,
        chain = %Chain::label_for(actual),
        metadata_url = %params.metadata_url,
        whitelist = %params.whitelist_contract,
        "deployment submitted"
    );

    let receipt = PendingTransaction::new(hash, provider)
        .wait(poll_interval)
        .await
        .map_err(deployment_error)?;
    let contract_address = receipt.contract_address.ok_or_else(|| {
        MintError::Deployment(format!("receipt for {hash} has no contract address"))
    })?;

    info!(%contract_address, gas_used = %receipt.gas_used, "contract deployed");
    Ok(DeployResult {
        tx_hash: hash,
        contract_address,
        deployer: from,
        gas_used: receipt.gas_used,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockWallet;
    use alloy_sol_types::SolValue;

    fn artifact() -> ContractArtifact {
        ContractArtifact {
            contract_name: "CryptoDevs".into(),
            abi: serde_json::Value::Null,
            bytecode: Bytes::from(vec![0x60, 0x80, 0x60, 0x40, 0x52]),
        }
    }

    fn params() -> DeployParams {
        DeployParams {
            metadata_url: "ipfs://x".into(),
            whitelist_contract: "0xABC0000000000000000000000000000000000123".parse().unwrap(),
        }
    }

    #[test]
    fn constructor_args_follow_bytecode_in_order() {
        let artifact = artifact();
        let params = params();
        let data = deployment_data(&artifact.bytecode, &params);

        let (code, args) = data.split_at(artifact.bytecode.len());
        assert_eq!(code, &artifact.bytecode[..]);
        let expected = (params.metadata_url.clone(), params.whitelist_contract).abi_encode_params();
        assert_eq!(args, expected.as_slice());
    }

    #[tokio::test]
    async fn deploy_reports_receipt_address() {
        let wallet = Arc::new(MockWallet::new());
        let deployed = Address::repeat_byte(0xd3);
        wallet.set_deployed_address(deployed);

        let result = deploy_contract(
            wallet.clone(),
            &artifact(),
            &params(),
            wallet.account(),
            5,
            Duration::from_millis(1),
        )
        .await
        .unwrap();

        assert_eq!(result.contract_address, deployed);
        assert_eq!(result.deployer, wallet.account());

        let sent = wallet.sent_transactions();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, None);
        assert_eq!(sent[0].data, deployment_data(&artifact().bytecode, &params()));
    }

    #[tokio::test]
    async fn deploy_refuses_wrong_chain_before_sending() {
        let wallet = Arc::new(MockWallet::new());
        wallet.set_chain_id(1);

        let err = deploy_contract(
            wallet.clone(),
            &artifact(),
            &params(),
            wallet.account(),
            5,
            Duration::from_millis(1),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, MintError::WrongNetwork { expected: 5, actual: 1 }));
        assert!(wallet.sent_transactions().is_empty());
    }

    #[tokio::test]
    async fn reverted_deployment_is_deployment_error() {
        let wallet = Arc::new(MockWallet::new());
        wallet.set_revert(true);

        let err = deploy_contract(
            wallet.clone(),
            &artifact(),
            &params(),
            wallet.account(),
            5,
            Duration::from_millis(1),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, MintError::Deployment(_)));
    }

    #[tokio::test]
    async fn resolve_deployer_prefers_configured_address() {
        let wallet = MockWallet::new();
        let configured = Address::repeat_byte(0x77);
        assert_eq!(resolve_deployer(&wallet, Some(configured)).await.unwrap(), configured);
        assert_eq!(resolve_deployer(&wallet, None).await.unwrap(), wallet.account());
    }

    #[tokio::test]
    async fn resolve_deployer_without_accounts_fails() {
        let wallet = MockWallet::new();
        wallet.set_accounts(vec![]);
        let err = resolve_deployer(&wallet, None).await.unwrap_err();
        assert!(matches!(err, MintError::Deployment(_)));
    }
}
