//! Wallet bridge: opens a wallet through the selection modal, caches the
//! provider for the rest of the session and refuses to work on any chain
//! but the configured one.

use std::sync::Arc;
use std::time::Duration;

use cryptodevs_chain::{Address, Chain, Eip1193Provider, HttpProvider, eth};
use cryptodevs_core::{Alert, AlertSink, MintError, WalletEndpoint, validate_url};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::session::SessionContext;

// ---------------------------------------------------------------------------
// Wallet modal
// ---------------------------------------------------------------------------

/// Picks one wallet out of the configured list.
pub trait WalletSelector: Send + Sync {
    fn select<'a>(&self, wallets: &'a [WalletEndpoint]) -> Option<&'a WalletEndpoint>;
}

/// Selects the wallet named like the preferred one (case-insensitive), or
/// the first wallet when there is no preference or no match.
#[derive(Debug, Clone, Default)]
pub struct PreferredWallet {
    preferred: Option<String>,
}

impl PreferredWallet {
    pub fn new(preferred: Option<String>) -> Self {
        Self { preferred }
    }
}

impl WalletSelector for PreferredWallet {
    fn select<'a>(&self, wallets: &'a [WalletEndpoint]) -> Option<&'a WalletEndpoint> {
        self.preferred
            .as_deref()
            .and_then(|name| wallets.iter().find(|w| w.name.eq_ignore_ascii_case(name)))
            .or_else(|| wallets.first())
    }
}

/// Source of wallet providers for the bridge.
pub trait WalletConnector: Send + Sync {
    fn open(&self) -> Result<Arc<dyn Eip1193Provider>, MintError>;
}

/// The wallet-selection modal over the configured HTTP wallet endpoints.
pub struct WalletModal {
    wallets: Vec<WalletEndpoint>,
    selector: Box<dyn WalletSelector>,
}

impl WalletModal {
    pub fn new(wallets: Vec<WalletEndpoint>, selector: impl WalletSelector + 'static) -> Self {
        Self {
            wallets,
            selector: Box::new(selector),
        }
    }

    pub fn wallets(&self) -> &[WalletEndpoint] {
        &self.wallets
    }
}

impl WalletConnector for WalletModal {
    fn open(&self) -> Result<Arc<dyn Eip1193Provider>, MintError> {
        if self.wallets.is_empty() {
            return Err(MintError::ProviderConnection("no wallets configured".into()));
        }
        let wallet = self
            .selector
            .select(&self.wallets)
            .ok_or_else(|| MintError::ProviderConnection("no wallet selected".into()))?;
        if !validate_url(&wallet.url) {
            return Err(MintError::ProviderConnection(format!(
                "wallet '{}' has an invalid URL: {}",
                wallet.name, wallet.url
            )));
        }

        let provider = HttpProvider::new(
            wallet.name.clone(),
            wallet.url.clone(),
            Duration::from_secs(wallet.timeout_secs),
        )?;
        info!(wallet = %wallet.name, url = %wallet.url, "wallet opened");
        Ok(Arc::new(provider))
    }
}

// ---------------------------------------------------------------------------
// Bridge
// ---------------------------------------------------------------------------

/// What a successful [`WalletBridge::connect`] hands back.
#[derive(Clone)]
pub enum ProviderHandle {
    /// Reads only.
    ReadOnly(Arc<dyn Eip1193Provider>),
    /// Can sign transactions from `address`.
    Signer {
        provider: Arc<dyn Eip1193Provider>,
        address: Address,
    },
}

impl ProviderHandle {
    pub fn provider(&self) -> Arc<dyn Eip1193Provider> {
        match self {
            Self::ReadOnly(provider) | Self::Signer { provider, .. } => Arc::clone(provider),
        }
    }

    pub fn signer(&self) -> Option<Address> {
        match self {
            Self::ReadOnly(_) => None,
            Self::Signer { address, .. } => Some(*address),
        }
    }
}

impl std::fmt::Debug for ProviderHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ReadOnly(p) => f.debug_tuple("ReadOnly").field(&p.name()).finish(),
            Self::Signer { provider, address } => f
                .debug_struct("Signer")
                .field("provider", &provider.name())
                .field("address", address)
                .finish(),
        }
    }
}

pub struct WalletBridge {
    connector: Arc<dyn WalletConnector>,
    chain_id: u64,
    provider: Mutex<Option<Arc<dyn Eip1193Provider>>>,
    context: SessionContext,
    alerts: Arc<dyn AlertSink>,
}

impl WalletBridge {
    pub fn new(
        connector: Arc<dyn WalletConnector>,
        chain_id: u64,
        context: SessionContext,
        alerts: Arc<dyn AlertSink>,
    ) -> Self {
        Self {
            connector,
            chain_id,
            provider: Mutex::new(None),
            context,
            alerts,
        }
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn is_open(&self) -> bool {
        self.provider.lock().is_some()
    }

    fn cached_or_open(&self) -> Result<Arc<dyn Eip1193Provider>, MintError> {
        let mut cached = self.provider.lock();
        if let Some(provider) = cached.as_ref() {
            return Ok(Arc::clone(provider));
        }
        let provider = self.connector.open()?;
        *cached = Some(Arc::clone(&provider));
        Ok(provider)
    }

    /// Get a provider, or a signer when `require_signer` is set.
    ///
    /// The wallet's chain is checked on every call. On the wrong chain the
    /// user is alerted and `MintError::WrongNetwork` is returned before
    /// anything else is asked of the wallet.
    ///
    /// A connection that outlives a [`disconnect`](Self::disconnect) fails
    /// instead of marking the new session connected.
    pub async fn connect(&self, require_signer: bool) -> Result<ProviderHandle, MintError> {
        let epoch = self.context.epoch();
        let provider = self.cached_or_open()?;

        let actual = eth::chain_id(provider.as_ref()).await?;
        if actual != self.chain_id {
            warn!(expected = self.chain_id, actual, wallet = provider.name(), "wallet on wrong network");
            self.alerts.alert(Alert::warning(format!(
                "Change the network to {}",
                Chain::label_for(self.chain_id)
            )));
            return Err(MintError::WrongNetwork {
                expected: self.chain_id,
                actual,
            });
        }

        let handle = if require_signer {
            let address = eth::request_accounts(provider.as_ref())
                .await?
                .into_iter()
                .next()
                .ok_or_else(|| {
                    MintError::ProviderConnection(format!(
                        "wallet '{}' exposes no accounts",
                        provider.name()
                    ))
                })?;
            ProviderHandle::Signer { provider, address }
        } else {
            ProviderHandle::ReadOnly(provider)
        };

        let account = handle.signer();
        let current = self.context.update_in(epoch, |s| {
            s.wallet_connected = true;
            if account.is_some() {
                s.account = account;
            }
        });
        if !current {
            debug!("wallet disconnected while connecting");
            return Err(MintError::ProviderConnection(
                "wallet was disconnected".into(),
            ));
        }
        debug!(signer = ?account, "wallet connected");
        Ok(handle)
    }

    /// Forget the provider and start over as a fresh page.
    pub fn disconnect(&self) {
        if self.provider.lock().take().is_some() {
            info!("wallet disconnected");
        }
        self.context.reset();
    }
}
