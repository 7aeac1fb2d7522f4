// EVM access for the Crypto Devs collection: wallet transport, contract
// bindings and deployment.

pub mod artifact;
pub mod chain;
pub mod contract;
pub mod deploy;
pub mod eth;
pub mod rpc;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

// Re-export primary types for convenient access.
pub use alloy_primitives::{Address, B256, Bytes, U256};
pub use artifact::{ArtifactError, ContractArtifact};
pub use chain::Chain;
pub use contract::CryptoDevsContract;
pub use deploy::{DeployParams, DeployResult, deploy_contract};
pub use eth::{PendingTransaction, TransactionReceipt, TransactionRequest};
pub use rpc::{Eip1193Provider, HttpProvider, RpcError};
