//! The mint page session: wires the bridge, poller and dispatcher around one
//! shared [`SessionContext`] and owns the poll timers.

use std::sync::Arc;
use std::time::Duration;

use cryptodevs_chain::{Address, U256};
use cryptodevs_core::{AlertSink, DappConfig, MintError, TaskSet};
use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::dispatcher::{ActionDispatcher, ActionOutcome};
use crate::phase::Clock;
use crate::poller::CampaignPoller;
use crate::session::{SessionContext, SessionState};
use crate::view::{self, CallToAction, PageAction};
use crate::wallet::{WalletBridge, WalletConnector};

/// Runtime settings of the page, resolved from [`DappConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSettings {
    pub chain_id: u64,
    pub contract_address: Address,
    pub mint_price: U256,
    pub phase_poll: Duration,
    pub minted_poll: Duration,
    pub receipt_poll: Duration,
    pub max_supply: u64,
}

impl PageSettings {
    pub fn from_config(config: &DappConfig) -> Result<Self, MintError> {
        let raw = config.require_contract_address()?;
        let contract_address: Address = raw
            .parse()
            .map_err(|e| MintError::Config(format!("invalid contract address {raw}: {e}")))?;
        Ok(Self {
            chain_id: config.chain_id,
            contract_address,
            mint_price: U256::from(config.mint_price_wei),
            phase_poll: Duration::from_secs(config.phase_poll_secs),
            minted_poll: Duration::from_secs(config.minted_poll_secs),
            receipt_poll: Duration::from_millis(config.receipt_poll_ms),
            max_supply: config.max_supply,
        })
    }
}

#[derive(Clone)]
pub struct MintPage {
    settings: PageSettings,
    context: SessionContext,
    bridge: Arc<WalletBridge>,
    poller: Arc<CampaignPoller>,
    dispatcher: Arc<ActionDispatcher>,
    timers: Arc<Mutex<TaskSet>>,
}

impl MintPage {
    pub fn new(
        settings: PageSettings,
        connector: Arc<dyn WalletConnector>,
        alerts: Arc<dyn AlertSink>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let context = SessionContext::new();
        let bridge = Arc::new(WalletBridge::new(
            connector,
            settings.chain_id,
            context.clone(),
            Arc::clone(&alerts),
        ));
        let poller = Arc::new(CampaignPoller::new(
            Arc::clone(&bridge),
            settings.contract_address,
            clock,
            context.clone(),
        ));
        let dispatcher = Arc::new(ActionDispatcher::new(
            Arc::clone(&bridge),
            Arc::clone(&poller),
            settings.contract_address,
            context.clone(),
            alerts,
            settings.mint_price,
            settings.receipt_poll,
        ));
        Self {
            settings,
            context,
            bridge,
            poller,
            dispatcher,
            timers: Arc::new(Mutex::new(TaskSet::new())),
        }
    }

    pub fn settings(&self) -> &PageSettings {
        &self.settings
    }

    pub fn state(&self) -> SessionState {
        self.context.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.context.subscribe()
    }

    pub fn render(&self) -> String {
        view::render(&self.state(), self.settings.max_supply)
    }

    pub fn call_to_action(&self) -> CallToAction {
        CallToAction::select(&self.state())
    }

    pub fn timers_running(&self) -> usize {
        self.timers.lock().running_count()
    }

    /// Connect the wallet and start polling. Polling starts once per
    /// connection; reconnecting while connected is a no-op on the timers.
    pub async fn connect_wallet(&self) -> Result<(), MintError> {
        self.bridge.connect(false).await?;

        let mut timers = self.timers.lock();
        if timers.is_empty() {
            *timers = self
                .poller
                .start(self.settings.phase_poll, self.settings.minted_poll);
            info!(contract = %self.settings.contract_address, "polling started");
        }
        Ok(())
    }

    /// Press the call-to-action currently on screen. Returns the outcome
    /// when the press sent a transaction.
    pub async fn press(&self) -> Option<ActionOutcome> {
        match self.call_to_action().action()? {
            PageAction::ConnectWallet => {
                if let Err(e) = self.connect_wallet().await {
                    warn!(error = %e, "wallet connection failed");
                }
                None
            }
            PageAction::Dispatch(intent) => Some(self.dispatcher.dispatch(intent).await),
        }
    }

    /// Poll both values now, outside the timers.
    pub async fn refresh(&self) {
        self.poller.refresh_phase().await;
        self.poller.refresh_minted().await;
    }

    /// Stop polling, drop the wallet and return to a fresh page.
    pub fn disconnect(&self) {
        self.stop_timers();
        self.bridge.disconnect();
    }

    /// Stop polling before the page goes away.
    pub fn end(&self) {
        self.stop_timers();
    }

    fn stop_timers(&self) {
        let mut timers = self.timers.lock();
        if !timers.is_empty() {
            timers.cancel_all();
            info!("polling stopped");
        }
    }
}
