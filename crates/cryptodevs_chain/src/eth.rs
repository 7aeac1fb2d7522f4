//! Typed wrappers over the handful of `eth_*` methods the page uses.

use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::{Address, B256, Bytes, U64, U256};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::rpc::{Eip1193Provider, RpcError};

/// Parameters of `eth_sendTransaction`. The wallet fills in gas, nonce and
/// signature. A missing `to` deploys a contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    pub from: Address,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<Address>,
    pub data: Bytes,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<U256>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub transaction_hash: B256,
    #[serde(default)]
    pub status: Option<U64>,
    #[serde(default)]
    pub contract_address: Option<Address>,
    #[serde(default)]
    pub gas_used: U256,
    #[serde(default)]
    pub block_number: Option<U64>,
}

impl TransactionReceipt {
    /// Pre-Byzantium receipts have no status field; those count as success.
    pub fn succeeded(&self) -> bool {
        self.status.is_none_or(|s| s != U64::ZERO)
    }
}

fn decode<T: serde::de::DeserializeOwned>(method: &str, value: Value) -> Result<T, RpcError> {
    serde_json::from_value(value).map_err(|e| RpcError::Decode(format!("{method}: {e}")))
}

/// `eth_chainId`, accepting a hex quantity or a plain number.
pub async fn chain_id(provider: &dyn Eip1193Provider) -> Result<u64, RpcError> {
    let value = provider.request("eth_chainId", json!([])).await?;
    match &value {
        Value::String(s) => u64::from_str_radix(s.trim_start_matches("0x"), 16)
            .map_err(|e| RpcError::Decode(format!("eth_chainId: {s}: {e}"))),
        Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| RpcError::Decode(format!("eth_chainId: {n}"))),
        other => Err(RpcError::Decode(format!("eth_chainId: unexpected {other}"))),
    }
}

/// `eth_requestAccounts`: asks the wallet to expose its accounts, prompting
/// the user if needed.
pub async fn request_accounts(provider: &dyn Eip1193Provider) -> Result<Vec<Address>, RpcError> {
    let value = provider.request("eth_requestAccounts", json!([])).await?;
    decode("eth_requestAccounts", value)
}

/// `eth_accounts`: accounts already exposed, without prompting.
pub async fn accounts(provider: &dyn Eip1193Provider) -> Result<Vec<Address>, RpcError> {
    let value = provider.request("eth_accounts", json!([])).await?;
    decode("eth_accounts", value)
}

/// `eth_call` against the latest block.
pub async fn call(
    provider: &dyn Eip1193Provider,
    to: Address,
    data: Bytes,
) -> Result<Bytes, RpcError> {
    let value = provider
        .request("eth_call", json!([{ "to": to, "data": data }, "latest"]))
        .await?;
    decode("eth_call", value)
}

pub async fn send_transaction(
    provider: &dyn Eip1193Provider,
    tx: &TransactionRequest,
) -> Result<B256, RpcError> {
    let value = provider.request("eth_sendTransaction", json!([tx])).await?;
    decode("eth_sendTransaction", value)
}

/// `None` while the transaction is still pending.
pub async fn transaction_receipt(
    provider: &dyn Eip1193Provider,
    hash: B256,
) -> Result<Option<TransactionReceipt>, RpcError> {
    let value = provider
        .request("eth_getTransactionReceipt", json!([hash]))
        .await?;
    if value.is_null() {
        return Ok(None);
    }
    decode("eth_getTransactionReceipt", value).map(Some)
}

// ---------------------------------------------------------------------------
// PendingTransaction
// ---------------------------------------------------------------------------

/// A submitted transaction whose receipt has not been seen yet.
pub struct PendingTransaction {
    hash: B256,
    provider: Arc<dyn Eip1193Provider>,
}

impl PendingTransaction {
    pub fn new(hash: B256, provider: Arc<dyn Eip1193Provider>) -> Self {
        Self { hash, provider }
    }

    pub fn hash(&self) -> B256 {
        self.hash
    }

    /// Poll for the receipt every `poll_interval` until the transaction is
    /// mined. There is no deadline: a stalled chain keeps this waiting.
    ///
    /// A mined transaction whose execution failed is `RpcError::Reverted`.
    pub async fn wait(self, poll_interval: Duration) -> Result<TransactionReceipt, RpcError> {
        loop {
            match transaction_receipt(self.provider.as_ref(), self.hash).await? {
                Some(receipt) if receipt.succeeded() => {
                    info!(tx = %self.hash, gas_used = %receipt.gas_used, "transaction confirmed");
                    return Ok(receipt);
                }
                Some(_) => return Err(RpcError::Reverted(self.hash.to_string())),
                None => {
                    debug!(tx = %self.hash, "transaction pending");
                    tokio::time::sleep(poll_interval).await;
                }
            }
        }
    }
}
