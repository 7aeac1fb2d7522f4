use std::sync::Arc;
use std::time::Duration;

use cryptodevs_chain::{Address, B256, CryptoDevsContract, U256};
use cryptodevs_core::{Alert, AlertSink, MintError};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::poller::CampaignPoller;
use crate::session::SessionContext;
use crate::wallet::WalletBridge;

pub const MINT_SUCCESS: &str = "You successfully minted a Crypto Dev!";

/// A user action that ends in a signed transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Intent {
    StartPresale,
    PresaleMint,
    PublicMint,
}

impl Intent {
    pub fn label(&self) -> &'static str {
        match self {
            Intent::StartPresale => "start presale",
            Intent::PresaleMint => "presale mint",
            Intent::PublicMint => "public mint",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    Confirmed { intent: Intent, tx_hash: B256 },
    Failed { intent: Intent, reason: String },
    /// Another action was still in flight; nothing was sent.
    Busy,
}

/// Holds the session's `loading` flag. Dropping it clears the flag, so the
/// flag cannot outlive the action on any return path. A guard from a
/// session that has since been reset leaves the new session's flag alone.
struct BusyGuard {
    context: SessionContext,
    epoch: u64,
}

impl BusyGuard {
    fn try_acquire(context: &SessionContext) -> Option<Self> {
        let epoch = context.epoch();
        let acquired = context.update_if(|s| {
            if s.loading {
                false
            } else {
                s.loading = true;
                true
            }
        });
        acquired.then(|| Self {
            context: context.clone(),
            epoch,
        })
    }

    /// The session this action belongs to is still the current one.
    fn is_current(&self) -> bool {
        self.context.epoch() == self.epoch
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.context.update_in(self.epoch, |s| s.loading = false);
    }
}

/// Turns intents into transactions and reports how they went.
pub struct ActionDispatcher {
    bridge: Arc<WalletBridge>,
    poller: Arc<CampaignPoller>,
    contract_address: Address,
    context: SessionContext,
    alerts: Arc<dyn AlertSink>,
    mint_price: U256,
    receipt_poll: Duration,
}

impl ActionDispatcher {
    pub fn new(
        bridge: Arc<WalletBridge>,
        poller: Arc<CampaignPoller>,
        contract_address: Address,
        context: SessionContext,
        alerts: Arc<dyn AlertSink>,
        mint_price: U256,
        receipt_poll: Duration,
    ) -> Self {
        Self {
            bridge,
            poller,
            contract_address,
            context,
            alerts,
            mint_price,
            receipt_poll,
        }
    }

    pub async fn start_presale(&self) -> ActionOutcome {
        self.dispatch(Intent::StartPresale).await
    }

    pub async fn presale_mint(&self) -> ActionOutcome {
        self.dispatch(Intent::PresaleMint).await
    }

    pub async fn public_mint(&self) -> ActionOutcome {
        self.dispatch(Intent::PublicMint).await
    }

    pub async fn dispatch(&self, intent: Intent) -> ActionOutcome {
        let Some(busy) = BusyGuard::try_acquire(&self.context) else {
            info!(action = intent.label(), "refused: a transaction is already in flight");
            return ActionOutcome::Busy;
        };
        let result = self.submit(intent).await;
        let current = busy.is_current();
        drop(busy);

        match result {
            Ok(tx_hash) if !current => {
                info!(action = intent.label(), tx = %tx_hash, "action confirmed after disconnect");
                ActionOutcome::Confirmed { intent, tx_hash }
            }
            Ok(tx_hash) => {
                info!(action = intent.label(), tx = %tx_hash, "action confirmed");
                match intent {
                    Intent::StartPresale => {
                        self.poller.refresh_phase().await;
                    }
                    Intent::PresaleMint | Intent::PublicMint => {
                        self.alerts.alert(Alert::success(MINT_SUCCESS));
                    }
                }
                ActionOutcome::Confirmed { intent, tx_hash }
            }
            Err(e) => {
                error!(action = intent.label(), error = %e, "action failed");
                ActionOutcome::Failed {
                    intent,
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn submit(&self, intent: Intent) -> Result<B256, MintError> {
        let handle = self.bridge.connect(true).await?;
        let from = handle
            .signer()
            .ok_or_else(|| MintError::ProviderConnection("no signer available".into()))?;
        let contract = CryptoDevsContract::new(self.contract_address, handle.provider());

        let pending = match intent {
            Intent::StartPresale => contract.start_presale(from).await?,
            Intent::PresaleMint => contract.presale_mint(from, self.mint_price).await?,
            Intent::PublicMint => contract.mint(from, self.mint_price).await?,
        };
        let tx_hash = pending.hash();
        pending.wait(self.receipt_poll).await?;
        Ok(tx_hash)
    }
}
