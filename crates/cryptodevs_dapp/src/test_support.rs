use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use cryptodevs_chain::Eip1193Provider;
use cryptodevs_chain::testing::MockWallet;
use cryptodevs_core::MintError;

use crate::wallet::WalletConnector;

/// Connector that always hands out the same mock wallet.
pub struct StaticWallet {
    wallet: Arc<MockWallet>,
    opens: AtomicUsize,
}

impl StaticWallet {
    pub fn new(wallet: Arc<MockWallet>) -> Self {
        Self {
            wallet,
            opens: AtomicUsize::new(0),
        }
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

impl WalletConnector for StaticWallet {
    fn open(&self) -> Result<Arc<dyn Eip1193Provider>, MintError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        Ok(self.wallet.clone())
    }
}
