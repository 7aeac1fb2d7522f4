//! Campaign-state poller.
//!
//! Re-reads the collection on two timers and mirrors what it sees into the
//! session: the presale flag and end time become a [`CampaignPhase`], and
//! `tokenIds()` becomes the minted count. A failed read is logged and the
//! previous value stays in place until the next tick.

use std::sync::Arc;
use std::time::Duration;

use cryptodevs_chain::{Address, CryptoDevsContract, Eip1193Provider, U256, eth};
use cryptodevs_core::{MintError, PeriodicTask, TaskSet};
use tracing::{debug, warn};

use crate::phase::{CampaignPhase, Clock};
use crate::session::SessionContext;
use crate::wallet::WalletBridge;

pub const PHASE_TASK: &str = "campaign-phase";
pub const MINTED_TASK: &str = "minted-count";

pub struct CampaignPoller {
    bridge: Arc<WalletBridge>,
    contract_address: Address,
    clock: Arc<dyn Clock>,
    context: SessionContext,
}

impl CampaignPoller {
    pub fn new(
        bridge: Arc<WalletBridge>,
        contract_address: Address,
        clock: Arc<dyn Clock>,
        context: SessionContext,
    ) -> Self {
        Self {
            bridge,
            contract_address,
            clock,
            context,
        }
    }

    async fn read_only(&self) -> Result<(CryptoDevsContract, Arc<dyn Eip1193Provider>), MintError> {
        let provider = self.bridge.connect(false).await?.provider();
        let contract = CryptoDevsContract::new(self.contract_address, Arc::clone(&provider));
        Ok((contract, provider))
    }

    /// Re-derive the campaign phase. Returns the phase now held by the
    /// session, which is the previous one if the read failed.
    pub async fn refresh_phase(&self) -> Option<CampaignPhase> {
        let epoch = self.context.epoch();
        match self.read_phase(epoch).await {
            Ok(phase) => {
                if !self.context.update_in(epoch, |s| s.phase = Some(phase)) {
                    debug!(?phase, "session ended before phase refresh completed");
                    return self.context.snapshot().phase;
                }
                debug!(?phase, "campaign phase refreshed");
                Some(phase)
            }
            Err(e) => {
                warn!(error = %e, "campaign phase refresh failed");
                self.context.snapshot().phase
            }
        }
    }

    async fn read_phase(&self, epoch: u64) -> Result<CampaignPhase, MintError> {
        let (contract, provider) = self.read_only().await?;
        let started = contract.presale_started().await?;
        if !started {
            if let Err(e) = self.refresh_owner(epoch, &contract, provider.as_ref()).await {
                warn!(error = %e, "owner check failed");
            }
            return Ok(CampaignPhase::derive(false, U256::ZERO, self.clock.now()));
        }

        let end = contract.presale_ended().await?;
        Ok(CampaignPhase::derive(true, end, self.clock.now()))
    }

    /// Compare the wallet's current account with `owner()`. Only meaningful
    /// before the presale starts; the start button is the one owner-only
    /// control. Uses `eth_accounts`, which never prompts the user.
    async fn refresh_owner(
        &self,
        epoch: u64,
        contract: &CryptoDevsContract,
        provider: &dyn Eip1193Provider,
    ) -> Result<(), MintError> {
        let owner = contract.owner().await?;
        let signer = eth::accounts(provider)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| MintError::ProviderConnection("wallet exposes no accounts".into()))?;

        // Parsed addresses compare by bytes, so checksum casing is irrelevant.
        let is_owner = signer == owner;
        self.context.update_in(epoch, |s| s.is_owner = is_owner);
        debug!(%owner, %signer, is_owner, "owner checked");
        Ok(())
    }

    /// Re-read the minted count. Returns the count now held by the session.
    pub async fn refresh_minted(&self) -> Option<U256> {
        let epoch = self.context.epoch();
        match self.read_minted().await {
            Ok(minted) => {
                if !self.context.update_in(epoch, |s| s.minted = Some(minted)) {
                    return self.context.snapshot().minted;
                }
                debug!(%minted, "minted count refreshed");
                Some(minted)
            }
            Err(e) => {
                warn!(error = %e, "minted count refresh failed");
                self.context.snapshot().minted
            }
        }
    }

    async fn read_minted(&self) -> Result<U256, MintError> {
        let (contract, _) = self.read_only().await?;
        Ok(contract.token_ids().await?)
    }

    /// Spawn the phase and minted-count timers. Both fire immediately, then
    /// every period, until the returned set is cancelled or dropped.
    pub fn start(self: &Arc<Self>, phase_every: Duration, minted_every: Duration) -> TaskSet {
        let mut tasks = TaskSet::new();

        let poller = Arc::clone(self);
        tasks.push(PeriodicTask::spawn(PHASE_TASK, phase_every, move || {
            let poller = Arc::clone(&poller);
            async move {
                poller.refresh_phase().await;
            }
        }));

        let poller = Arc::clone(self);
        tasks.push(PeriodicTask::spawn(MINTED_TASK, minted_every, move || {
            let poller = Arc::clone(&poller);
            async move {
                poller.refresh_minted().await;
            }
        }));

        tasks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phase::ManualClock;
    use crate::test_support::StaticWallet;
    use cryptodevs_chain::contract::CryptoDevs;
    use cryptodevs_chain::testing::MockWallet;
    use alloy_sol_types::SolCall;
    use cryptodevs_core::AlertLog;

    const NOW: u64 = 1_700_000_000;

    struct Fixture {
        wallet: Arc<MockWallet>,
        ctx: SessionContext,
        clock: Arc<ManualClock>,
        poller: Arc<CampaignPoller>,
    }

    fn fixture() -> Fixture {
        let wallet = Arc::new(MockWallet::new());
        let ctx = SessionContext::new();
        let clock = Arc::new(ManualClock::new(NOW));
        let bridge = Arc::new(WalletBridge::new(
            Arc::new(StaticWallet::new(wallet.clone())),
            5,
            ctx.clone(),
            Arc::new(AlertLog::new()),
        ));
        let poller = Arc::new(CampaignPoller::new(
            bridge,
            MockWallet::CONTRACT,
            clock.clone(),
            ctx.clone(),
        ));
        Fixture {
            wallet,
            ctx,
            clock,
            poller,
        }
    }

    #[tokio::test]
    async fn not_started_checks_owner() {
        let f = fixture();
        f.wallet.set_owner(MockWallet::ACCOUNT);

        assert_eq!(f.poller.refresh_phase().await, Some(CampaignPhase::NotStarted));
        assert!(f.ctx.snapshot().is_owner);
        assert_eq!(f.wallet.count_requests("eth_accounts"), 1);
    }

    #[tokio::test]
    async fn periodic_owner_check_never_prompts() {
        let f = fixture();
        f.wallet.set_owner(MockWallet::ACCOUNT);

        for _ in 0..3 {
            f.poller.refresh_phase().await;
        }
        assert!(f.ctx.snapshot().is_owner);
        assert_eq!(f.wallet.count_requests("eth_requestAccounts"), 0);
        assert_eq!(f.wallet.count_requests("eth_accounts"), 3);
    }

    #[tokio::test]
    async fn owner_match_ignores_address_casing() {
        const CHECKSUMMED: &str = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";
        let owner: Address = CHECKSUMMED.parse().unwrap();

        for reported in [
            CHECKSUMMED.to_string(),
            CHECKSUMMED.to_lowercase(),
            format!("0x{}", CHECKSUMMED[2..].to_uppercase()),
        ] {
            let f = fixture();
            f.wallet.set_owner(owner);
            f.wallet.set_raw_accounts(vec![reported.clone()]);

            assert_eq!(f.poller.refresh_phase().await, Some(CampaignPhase::NotStarted));
            assert!(f.ctx.snapshot().is_owner, "account reported as {reported}");
        }
    }

    #[tokio::test]
    async fn wallet_without_accounts_is_not_owner() {
        let f = fixture();
        f.wallet.set_owner(MockWallet::ACCOUNT);
        f.wallet.set_accounts(vec![]);

        assert_eq!(f.poller.refresh_phase().await, Some(CampaignPhase::NotStarted));
        assert!(!f.ctx.snapshot().is_owner);
    }

    #[tokio::test]
    async fn other_account_is_not_owner() {
        let f = fixture();
        f.wallet.set_owner(Address::repeat_byte(0x99));

        f.poller.refresh_phase().await;
        assert!(!f.ctx.snapshot().is_owner);
    }

    #[tokio::test]
    async fn owner_is_not_checked_once_started() {
        let f = fixture();
        f.wallet.set_owner(MockWallet::ACCOUNT);
        f.wallet.set_presale(true, U256::from(NOW + 3600));
        f.ctx.update(|s| s.is_owner = true);

        assert_eq!(f.poller.refresh_phase().await, Some(CampaignPhase::PresaleActive));
        assert_eq!(f.wallet.count_requests("eth_accounts"), 0);
        assert!(f.ctx.snapshot().is_owner);
    }

    #[tokio::test]
    async fn phase_follows_the_clock() {
        let f = fixture();
        f.wallet.set_presale(true, U256::from(NOW + 10));

        assert_eq!(f.poller.refresh_phase().await, Some(CampaignPhase::PresaleActive));
        f.clock.advance(10);
        assert_eq!(f.poller.refresh_phase().await, Some(CampaignPhase::PresaleEnded));
    }

    #[tokio::test]
    async fn failed_read_keeps_previous_phase() {
        let f = fixture();
        f.wallet.set_presale(true, U256::from(NOW + 3600));
        f.poller.refresh_phase().await;

        f.wallet.fail_selector(CryptoDevs::presaleStartedCall::SELECTOR);
        f.wallet.set_presale(true, U256::from(NOW - 1));
        assert_eq!(f.poller.refresh_phase().await, Some(CampaignPhase::PresaleActive));
        assert_eq!(f.ctx.snapshot().phase, Some(CampaignPhase::PresaleActive));
    }

    #[tokio::test]
    async fn first_failed_read_leaves_phase_unknown() {
        let f = fixture();
        f.wallet.set_offline(true);
        assert_eq!(f.poller.refresh_phase().await, None);
    }

    #[tokio::test]
    async fn owner_failure_does_not_block_phase() {
        let f = fixture();
        f.wallet.fail_selector(CryptoDevs::ownerCall::SELECTOR);
        assert_eq!(f.poller.refresh_phase().await, Some(CampaignPhase::NotStarted));
        assert!(!f.ctx.snapshot().is_owner);
    }

    #[tokio::test]
    async fn minted_count_refresh_and_failure() {
        let f = fixture();
        f.wallet.set_token_ids(4);
        assert_eq!(f.poller.refresh_minted().await, Some(U256::from(4u64)));

        f.wallet.set_token_ids(5);
        f.wallet.fail_selector(CryptoDevs::tokenIdsCall::SELECTOR);
        assert_eq!(f.poller.refresh_minted().await, Some(U256::from(4u64)));
        assert_eq!(f.ctx.snapshot().minted, Some(U256::from(4u64)));
    }

    #[tokio::test]
    async fn wrong_network_reads_nothing() {
        let f = fixture();
        f.wallet.set_chain_id(137);

        assert_eq!(f.poller.refresh_phase().await, None);
        assert_eq!(f.poller.refresh_minted().await, None);
        assert_eq!(f.wallet.count_requests("eth_call"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn timers_tick_until_cancelled() {
        let f = fixture();
        let mut tasks = f.poller.start(Duration::from_secs(5), Duration::from_secs(5));
        assert_eq!(tasks.running_count(), 2);

        tokio::time::sleep(Duration::from_millis(10)).await;
        let after_first = f.wallet.count_requests("eth_call");
        assert!(after_first > 0);
        assert_eq!(f.ctx.snapshot().phase, Some(CampaignPhase::NotStarted));
        assert_eq!(f.ctx.snapshot().minted, Some(U256::ZERO));

        f.wallet.set_token_ids(2);
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(f.ctx.snapshot().minted, Some(U256::from(2u64)));
        assert_eq!(tasks.get(PHASE_TASK).unwrap().run_count(), 2);

        tasks.cancel_all();
        let frozen = f.wallet.requests().len();
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(f.wallet.requests().len(), frozen);
    }
}
