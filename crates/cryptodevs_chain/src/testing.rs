//! Scripted in-memory wallet for tests.
//!
//! Answers the `eth_*` methods the page uses against a tiny simulated
//! CryptoDevs contract and records every request it sees.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use alloy_primitives::{Address, B256, Bytes, U256};
use alloy_sol_types::{SolCall, SolValue};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Value, json};

use crate::contract::CryptoDevs;
use crate::eth::TransactionRequest;
use crate::rpc::{Eip1193Provider, RpcError};

type RequestHook = Arc<dyn Fn(&str) + Send + Sync>;

struct MockState {
    chain_id: u64,
    accounts: Vec<Address>,
    raw_accounts: Option<Vec<String>>,
    presale_started: bool,
    presale_ended: U256,
    owner: Address,
    token_ids: U256,
    deployed_address: Address,
    revert: bool,
    offline: bool,
    pending_polls: u32,
    failing_methods: HashSet<String>,
    failing_selectors: HashSet<[u8; 4]>,
    requests: Vec<String>,
    sent: Vec<TransactionRequest>,
    remaining_polls: HashMap<B256, u32>,
    receipts_for: HashMap<B256, Option<Address>>,
}

pub struct MockWallet {
    state: Mutex<MockState>,
    hook: Mutex<Option<RequestHook>>,
}

impl MockWallet {
    /// Address the simulated collection lives at.
    pub const CONTRACT: Address = Address::repeat_byte(0xc0);
    /// First account the wallet exposes unless replaced.
    pub const ACCOUNT: Address = Address::repeat_byte(0xaa);

    /// A wallet on chain 5 with one account and a collection whose presale
    /// has not started.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState {
                chain_id: 5,
                accounts: vec![Self::ACCOUNT],
                raw_accounts: None,
                presale_started: false,
                presale_ended: U256::ZERO,
                owner: Address::repeat_byte(0x01),
                token_ids: U256::ZERO,
                deployed_address: Address::repeat_byte(0xde),
                revert: false,
                offline: false,
                pending_polls: 0,
                failing_methods: HashSet::new(),
                failing_selectors: HashSet::new(),
                requests: Vec::new(),
                sent: Vec::new(),
                remaining_polls: HashMap::new(),
                receipts_for: HashMap::new(),
            }),
            hook: Mutex::new(None),
        }
    }

    pub fn account(&self) -> Address {
        self.state.lock().accounts.first().copied().unwrap_or(Address::ZERO)
    }

    pub fn set_chain_id(&self, id: u64) {
        self.state.lock().chain_id = id;
    }

    pub fn set_accounts(&self, accounts: Vec<Address>) {
        let mut s = self.state.lock();
        s.accounts = accounts;
        s.raw_accounts = None;
    }

    /// Answer account requests with these strings verbatim, so callers see
    /// the exact hex casing a real wallet might use.
    pub fn set_raw_accounts(&self, accounts: Vec<String>) {
        self.state.lock().raw_accounts = Some(accounts);
    }

    pub fn set_presale(&self, started: bool, ends_at: U256) {
        let mut s = self.state.lock();
        s.presale_started = started;
        s.presale_ended = ends_at;
    }

    pub fn set_owner(&self, owner: Address) {
        self.state.lock().owner = owner;
    }

    pub fn set_token_ids(&self, n: u64) {
        self.state.lock().token_ids = U256::from(n);
    }

    pub fn token_ids(&self) -> U256 {
        self.state.lock().token_ids
    }

    pub fn set_deployed_address(&self, address: Address) {
        self.state.lock().deployed_address = address;
    }

    /// Mined transactions report `status = 0`.
    pub fn set_revert(&self, revert: bool) {
        self.state.lock().revert = revert;
    }

    /// Every request fails as if the wallet were unreachable.
    pub fn set_offline(&self, offline: bool) {
        self.state.lock().offline = offline;
    }

    /// Receipts of subsequent transactions stay `null` for `polls` lookups.
    pub fn set_pending_polls(&self, polls: u32) {
        self.state.lock().pending_polls = polls;
    }

    pub fn fail_method(&self, method: &str) {
        self.state.lock().failing_methods.insert(method.to_string());
    }

    /// Fail `eth_call` / `eth_sendTransaction` for one contract function.
    pub fn fail_selector(&self, selector: [u8; 4]) {
        self.state.lock().failing_selectors.insert(selector);
    }

    pub fn clear_failures(&self) {
        let mut s = self.state.lock();
        s.failing_methods.clear();
        s.failing_selectors.clear();
        s.offline = false;
    }

    /// Called with the method name before each request is answered.
    pub fn on_request(&self, hook: impl Fn(&str) + Send + Sync + 'static) {
        *self.hook.lock() = Some(Arc::new(hook));
    }

    pub fn requests(&self) -> Vec<String> {
        self.state.lock().requests.clone()
    }

    pub fn count_requests(&self, method: &str) -> usize {
        self.state.lock().requests.iter().filter(|m| *m == method).count()
    }

    /// Transactions submitted through `eth_sendTransaction`, oldest first.
    pub fn sent_transactions(&self) -> Vec<TransactionRequest> {
        self.state.lock().sent.clone()
    }

    fn rpc_failure(method: &str) -> RpcError {
        RpcError::Rpc {
            code: -32000,
            message: format!("mock failure: {method}"),
        }
    }

    fn encoded(bytes: Vec<u8>) -> Value {
        json!(Bytes::from(bytes))
    }

    fn hash_for(n: usize) -> B256 {
        let mut bytes = [0u8; 32];
        bytes[24..].copy_from_slice(&(n as u64).to_be_bytes());
        B256::from(bytes)
    }

    fn answer(&self, method: &str, params: &Value) -> Result<Value, RpcError> {
        let mut s = self.state.lock();
        s.requests.push(method.to_string());

        if s.offline {
            return Err(RpcError::Transport("mock wallet offline".into()));
        }
        if s.failing_methods.contains(method) {
            return Err(Self::rpc_failure(method));
        }

        match method {
            "eth_chainId" => Ok(json!(format!("0x{:x}", s.chain_id))),
            "eth_accounts" | "eth_requestAccounts" => match &s.raw_accounts {
                Some(raw) => Ok(json!(raw)),
                None => Ok(json!(s.accounts)),
            },
            "eth_call" => {
                let data: Bytes = serde_json::from_value(params[0]["data"].clone())
                    .map_err(|e| RpcError::Decode(e.to_string()))?;
                let selector = selector_of(&data);
                if s.failing_selectors.contains(&selector) {
                    return Err(Self::rpc_failure("eth_call"));
                }
                if selector == CryptoDevs::presaleStartedCall::SELECTOR {
                    Ok(Self::encoded(s.presale_started.abi_encode()))
                } else if selector == CryptoDevs::presaleEndedCall::SELECTOR {
                    Ok(Self::encoded(s.presale_ended.abi_encode()))
                } else if selector == CryptoDevs::ownerCall::SELECTOR {
                    Ok(Self::encoded(s.owner.abi_encode()))
                } else if selector == CryptoDevs::tokenIdsCall::SELECTOR {
                    Ok(Self::encoded(s.token_ids.abi_encode()))
                } else {
                    Err(RpcError::Rpc {
                        code: 3,
                        message: "execution reverted".into(),
                    })
                }
            }
            "eth_sendTransaction" => {
                let tx: TransactionRequest = serde_json::from_value(params[0].clone())
                    .map_err(|e| RpcError::Decode(e.to_string()))?;
                let selector = selector_of(&tx.data);
                if tx.to.is_some() && s.failing_selectors.contains(&selector) {
                    return Err(Self::rpc_failure("eth_sendTransaction"));
                }

                if !s.revert && tx.to.is_some() {
                    if selector == CryptoDevs::startPresaleCall::SELECTOR {
                        s.presale_started = true;
                    } else if selector == CryptoDevs::mintCall::SELECTOR
                        || selector == CryptoDevs::presaleMintCall::SELECTOR
                    {
                        s.token_ids += U256::from(1u64);
                    }
                }

                s.sent.push(tx.clone());
                let hash = Self::hash_for(s.sent.len());
                let polls = s.pending_polls;
                s.remaining_polls.insert(hash, polls);
                let created = tx.to.is_none().then_some(s.deployed_address);
                s.receipts_for.insert(hash, created);
                Ok(json!(hash))
            }
            "eth_getTransactionReceipt" => {
                let hash: B256 = serde_json::from_value(params[0].clone())
                    .map_err(|e| RpcError::Decode(e.to_string()))?;
                let Some(created) = s.receipts_for.get(&hash).copied() else {
                    return Ok(Value::Null);
                };
                if let Some(remaining) = s.remaining_polls.get_mut(&hash) {
                    if *remaining > 0 {
                        *remaining -= 1;
                        return Ok(Value::Null);
                    }
                }
                Ok(json!({
                    "transactionHash": hash,
                    "status": if s.revert { "0x0" } else { "0x1" },
                    "contractAddress": created,
                    "gasUsed": "0x5208",
                    "blockNumber": "0x1",
                }))
            }
            other => Err(RpcError::Rpc {
                code: -32601,
                message: format!("Method not found: {other}"),
            }),
        }
    }
}

fn selector_of(data: &[u8]) -> [u8; 4] {
    let mut selector = [0u8; 4];
    if data.len() >= 4 {
        selector.copy_from_slice(&data[..4]);
    }
    selector
}

impl Default for MockWallet {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Eip1193Provider for MockWallet {
    fn name(&self) -> &str {
        "Mock"
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        let hook = self.hook.lock().clone();
        if let Some(hook) = hook {
            hook(method);
        }
        self.answer(method, &params)
    }
}
