use thiserror::Error;

/// Errors surfaced by the mint page and the deployment command.
#[derive(Error, Debug)]
pub enum MintError {
    /// The wallet is connected to a different chain than the collection.
    #[error("Wrong network: expected chain id {expected}, wallet is on {actual}")]
    WrongNetwork { expected: u64, actual: u64 },

    #[error("Wallet connection error: {0}")]
    ProviderConnection(String),

    #[error("Contract call failed: {0}")]
    ContractCall(String),

    #[error("Deployment failed: {0}")]
    Deployment(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl MintError {
    /// Whether the error must stop the operation that triggered it even on
    /// the lenient read path.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::WrongNetwork { .. } | Self::Deployment(_))
    }

    /// Returns a user-friendly message (hides transport details).
    pub fn user_message(&self) -> String {
        match self {
            Self::WrongNetwork { .. } => "Please switch your wallet to the right network.".into(),
            Self::ProviderConnection(_) => "Could not reach your wallet.".into(),
            Self::ContractCall(msg) => format!("Transaction failed: {msg}"),
            Self::Deployment(msg) => format!("Deployment failed: {msg}"),
            Self::Config(msg) => format!("Configuration issue: {msg}"),
        }
    }
}
