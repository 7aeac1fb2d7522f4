use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use cryptodevs_chain::{Address, U256};
use tokio::sync::watch;

use crate::phase::CampaignPhase;

/// Per-visit state of the mint page. Nothing here is persisted; every field
/// is either a user event or a cache of the last successful on-chain read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub wallet_connected: bool,
    /// Connected signer is the collection owner. Only refreshed while the
    /// presale has not started.
    pub is_owner: bool,
    /// A transaction is in flight.
    pub loading: bool,
    /// `None` until the first phase read succeeds.
    pub phase: Option<CampaignPhase>,
    pub minted: Option<U256>,
    pub account: Option<Address>,
}

impl SessionState {
    /// An unknown phase counts as not started.
    pub fn presale_started(&self) -> bool {
        self.phase.is_some_and(|p| p.has_started())
    }
}

/// Shared handle to the session state. Every component mutates the state
/// through it and the renderer subscribes to changes.
///
/// Each [`reset`](Self::reset) starts a new epoch. Work begun in an earlier
/// epoch writes through [`update_in`](Self::update_in) so it cannot touch
/// the state of the session that replaced it.
#[derive(Clone)]
pub struct SessionContext {
    tx: Arc<watch::Sender<SessionState>>,
    epoch: Arc<AtomicU64>,
}

impl SessionContext {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(SessionState::default());
        Self {
            tx: Arc::new(tx),
            epoch: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    /// Apply `f` only if the session is still in `epoch`. Returns whether
    /// it was applied.
    pub fn update_in(&self, epoch: u64, f: impl FnOnce(&mut SessionState)) -> bool {
        self.tx.send_if_modified(|s| {
            if self.epoch.load(Ordering::SeqCst) != epoch {
                return false;
            }
            f(s);
            true
        })
    }

    pub fn update(&self, f: impl FnOnce(&mut SessionState)) {
        self.tx.send_modify(f);
    }

    /// Apply `f` and notify subscribers only when it returns `true`.
    pub fn update_if(&self, f: impl FnOnce(&mut SessionState) -> bool) -> bool {
        self.tx.send_if_modified(f)
    }

    pub fn snapshot(&self) -> SessionState {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.tx.subscribe()
    }

    /// Back to the state of a fresh page load, in a new epoch.
    pub fn reset(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.tx.send_replace(SessionState::default());
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}
