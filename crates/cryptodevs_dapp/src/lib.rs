//! The Crypto Devs mint page: wallet session, campaign-state polling,
//! minting actions and the call-to-action they drive.

pub mod dispatcher;
pub mod page;
pub mod phase;
pub mod poller;
pub mod session;
pub mod view;
pub mod wallet;

#[cfg(test)]
mod test_support;

pub use dispatcher::{ActionDispatcher, ActionOutcome, Intent};
pub use page::{MintPage, PageSettings};
pub use phase::{CampaignPhase, Clock, ManualClock, SystemClock};
pub use poller::CampaignPoller;
pub use session::{SessionContext, SessionState};
pub use view::{CallToAction, PageAction, render};
pub use wallet::{PreferredWallet, ProviderHandle, WalletBridge, WalletConnector, WalletModal, WalletSelector};
