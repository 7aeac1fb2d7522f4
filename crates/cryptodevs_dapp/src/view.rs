//! The page as text: header, minted counter and the single call-to-action.

use std::fmt::Write as _;

use crate::dispatcher::Intent;
use crate::phase::CampaignPhase;
use crate::session::SessionState;

pub const TITLE: &str = "Welcome to Crypto Devs!";
pub const DESCRIPTION: &str = "Its an NFT collection for developers in Crypto.";
pub const FOOTER: &str = "Made with \u{2764} by Crypto Devs";

/// What pressing the call-to-action does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageAction {
    ConnectWallet,
    Dispatch(Intent),
}

/// The one call-to-action the page shows. Exactly one applies to any
/// session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallToAction {
    ConnectWallet,
    Loading,
    StartPresale,
    PresaleNotStarted,
    PresaleMint,
    PublicMint,
}

impl CallToAction {
    /// First matching branch wins.
    pub fn select(state: &SessionState) -> Self {
        if !state.wallet_connected {
            Self::ConnectWallet
        } else if state.loading {
            Self::Loading
        } else if state.is_owner && !state.presale_started() {
            Self::StartPresale
        } else if !state.presale_started() {
            Self::PresaleNotStarted
        } else if state.phase == Some(CampaignPhase::PresaleActive) {
            Self::PresaleMint
        } else {
            Self::PublicMint
        }
    }

    /// Button text, if the branch shows a button.
    pub fn label(&self) -> Option<&'static str> {
        match self {
            Self::ConnectWallet => Some("Connect your wallet"),
            Self::Loading => Some("Loading......"),
            Self::StartPresale => Some("Start Presale!"),
            Self::PresaleNotStarted => None,
            Self::PresaleMint => Some("Presale Mint \u{1f680}"),
            Self::PublicMint => Some("Public Mint \u{1f680}"),
        }
    }

    pub fn message(&self) -> Option<&'static str> {
        match self {
            Self::PresaleNotStarted => Some("Presale has not started!"),
            Self::PresaleMint => Some(
                "Presale has started!! If your address is whitelisted, Mint a Crypto Dev \u{1f973}",
            ),
            _ => None,
        }
    }

    pub fn action(&self) -> Option<PageAction> {
        match self {
            Self::ConnectWallet => Some(PageAction::ConnectWallet),
            Self::StartPresale => Some(PageAction::Dispatch(Intent::StartPresale)),
            Self::PresaleMint => Some(PageAction::Dispatch(Intent::PresaleMint)),
            Self::PublicMint => Some(PageAction::Dispatch(Intent::PublicMint)),
            Self::Loading | Self::PresaleNotStarted => None,
        }
    }
}

/// Render the whole page. An unknown minted count shows as zero.
pub fn render(state: &SessionState, max_supply: u64) -> String {
    let cta = CallToAction::select(state);
    let minted = state.minted.unwrap_or_default();

    let mut out = String::new();
    let _ = writeln!(out, "{TITLE}");
    let _ = writeln!(out, "{DESCRIPTION}");
    let _ = writeln!(out, "{minted}/{max_supply} have been minted");
    let _ = writeln!(out);
    if let Some(message) = cta.message() {
        let _ = writeln!(out, "{message}");
    }
    if let Some(label) = cta.label() {
        let _ = writeln!(out, "[ {label} ]");
    }
    let _ = writeln!(out);
    let _ = write!(out, "{FOOTER}");
    out
}
