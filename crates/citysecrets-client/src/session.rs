//! Wallet session: the connected account, its signer, and the persisted
//! address that lets the session come back after a restart.
//!
//! The session is an explicit object owned by the client.  Every change
//! of account bumps a generation counter so that dependents (the contract
//! gateway) can tell a stale handle from a fresh one.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use citysecrets_chain::{ChainError, WalletProvider, WalletSigner};
use citysecrets_shared::Address;
use citysecrets_store::Database;

use crate::error::{ClientError, Result};
use crate::events::{ClientEvent, EventBus};

/// Owns a background listener task.  Dropping the handle stops the task.
#[derive(Debug)]
pub struct Subscription {
    handle: JoinHandle<()>,
}

impl Subscription {
    pub fn new(handle: JoinHandle<()>) -> Self {
        Self { handle }
    }

    pub fn is_active(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Stop listening.  Same as dropping the handle.
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Point-in-time view of the session.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub generation: u64,
    pub address: Option<Address>,
    pub signer: Option<WalletSigner>,
}

#[derive(Default)]
struct SessionState {
    address: Option<Address>,
    signer: Option<WalletSigner>,
    generation: u64,
}

pub struct WalletSession {
    provider: Option<Arc<dyn WalletProvider>>,
    store: Mutex<Database>,
    state: Mutex<SessionState>,
    events: EventBus,
    watcher: Mutex<Option<Subscription>>,
}

impl WalletSession {
    /// `provider` is `None` when no wallet is installed.
    pub fn new(
        provider: Option<Arc<dyn WalletProvider>>,
        store: Database,
        events: EventBus,
    ) -> Arc<Self> {
        Arc::new(Self {
            provider,
            store: Mutex::new(store),
            state: Mutex::new(SessionState::default()),
            events,
            watcher: Mutex::new(None),
        })
    }

    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    pub fn address(&self) -> Option<Address> {
        self.state().address
    }

    pub fn signer(&self) -> Option<WalletSigner> {
        self.state().signer.clone()
    }

    pub fn generation(&self) -> u64 {
        self.state().generation
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.state();
        SessionSnapshot {
            generation: state.generation,
            address: state.address,
            signer: state.signer.clone(),
        }
    }

    /// Address saved by the last connect, if any.
    pub fn persisted_address(&self) -> Result<Option<Address>> {
        Ok(self.store().load_session_address()?)
    }

    /// Whether an account-change listener is running.
    pub fn is_watching(&self) -> bool {
        self.watcher()
            .as_ref()
            .is_some_and(Subscription::is_active)
    }

    /// Request account access and adopt the wallet's selected account.
    ///
    /// Without a provider this fails with `ProviderUnavailable` and the
    /// session stays empty.
    pub async fn connect(self: &Arc<Self>) -> Result<Address> {
        let provider = self
            .provider
            .clone()
            .ok_or(ChainError::ProviderUnavailable)?;

        let accounts = provider.request_accounts().await?;
        let address = *accounts.first().ok_or(ClientError::WalletDisconnected)?;
        let signer = provider.signer_for(address)?;

        self.store().save_session_address(address)?;
        self.ensure_watcher(provider.as_ref());
        self.replace(Some(address), Some(signer));

        info!(account = %address, "Wallet connected");
        Ok(address)
    }

    /// Reconnect if an address was persisted by an earlier session.
    ///
    /// Failures are logged and leave the session empty; the persisted
    /// entry is kept so the next start tries again.
    pub async fn restore(self: &Arc<Self>) -> Option<Address> {
        let persisted = match self.store().load_session_address() {
            Ok(Some(address)) => address,
            Ok(None) => return None,
            Err(e) => {
                warn!(error = %e, "Could not read persisted session");
                return None;
            }
        };

        if self.provider.is_none() {
            debug!(account = %persisted, "No wallet provider, skipping session restore");
            return None;
        }

        match self.connect().await {
            Ok(address) => Some(address),
            Err(e) => {
                warn!(account = %persisted, error = %e, "Failed to restore wallet session");
                None
            }
        }
    }

    /// Forget the account, remove the persisted entry and stop listening.
    pub fn disconnect(&self) {
        drop(self.watcher().take());
        self.forget();
        info!("Wallet session closed");
    }

    /// React to the wallet's account list changing.
    pub fn handle_accounts_changed(&self, accounts: Vec<Address>) {
        let Some(&next) = accounts.first() else {
            info!("Wallet reported no accounts, clearing session");
            self.forget();
            return;
        };

        if self.address() == Some(next) {
            return;
        }

        let Some(provider) = self.provider.as_ref() else {
            return;
        };
        let signer = match provider.signer_for(next) {
            Ok(signer) => signer,
            Err(e) => {
                warn!(account = %next, error = %e, "No signer for new account");
                return;
            }
        };

        if let Err(e) = self.store().save_session_address(next) {
            warn!(error = %e, "Failed to persist session address");
        }
        self.replace(Some(next), Some(signer));
        info!(account = %next, "Wallet account changed");
    }

    fn forget(&self) {
        if let Err(e) = self.store().clear_session_address() {
            warn!(error = %e, "Failed to clear persisted session");
        }
        self.replace(None, None);
    }

    fn replace(&self, address: Option<Address>, signer: Option<WalletSigner>) {
        {
            let mut state = self.state();
            state.address = address;
            state.signer = signer;
            state.generation += 1;
        }
        self.events.emit(ClientEvent::SessionChanged { address });
    }

    fn ensure_watcher(self: &Arc<Self>, provider: &dyn WalletProvider) {
        let mut watcher = self.watcher();
        if watcher.as_ref().is_some_and(Subscription::is_active) {
            return;
        }

        let mut rx = provider.subscribe_accounts();
        let session: Weak<Self> = Arc::downgrade(self);

        let handle = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(accounts) => {
                        let Some(session) = session.upgrade() else {
                            break;
                        };
                        session.handle_accounts_changed(accounts);
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Missed wallet account-change events");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            debug!("Account-change listener stopped");
        });

        *watcher = Some(Subscription::new(handle));
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn store(&self) -> MutexGuard<'_, Database> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn watcher(&self) -> MutexGuard<'_, Option<Subscription>> {
        self.watcher.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use citysecrets_chain::KeyWallet;

    use super::*;

    const KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn session_with(wallet: Option<Arc<KeyWallet>>) -> Arc<WalletSession> {
        let provider = wallet.map(|w| w as Arc<dyn WalletProvider>);
        WalletSession::new(provider, Database::open_in_memory().unwrap(), EventBus::new())
    }

    #[tokio::test]
    async fn connect_without_provider_leaves_session_empty() {
        let session = session_with(None);

        let err = session.connect().await.unwrap_err();

        assert!(matches!(err, ClientError::Chain(ChainError::ProviderUnavailable)));
        assert_eq!(session.address(), None);
        assert_eq!(session.generation(), 0);
    }

    #[tokio::test]
    async fn connect_persists_address() {
        let wallet = Arc::new(KeyWallet::from_hex_keys(&[KEY]).unwrap());
        let session = session_with(Some(wallet.clone()));

        let address = session.connect().await.unwrap();

        assert_eq!(address, wallet.addresses()[0]);
        assert_eq!(session.store().load_session_address().unwrap(), Some(address));
        assert!(session.signer().is_some());
        assert!(session.is_watching());
    }

    #[tokio::test]
    async fn empty_account_list_clears_everything() {
        let wallet = Arc::new(KeyWallet::from_hex_keys(&[KEY]).unwrap());
        let session = session_with(Some(wallet));
        session.connect().await.unwrap();
        let before = session.generation();

        session.handle_accounts_changed(Vec::new());

        assert_eq!(session.address(), None);
        assert!(session.signer().is_none());
        assert_eq!(session.store().load_session_address().unwrap(), None);
        assert!(session.generation() > before);
    }

    #[tokio::test]
    async fn restore_reconnects_persisted_account() {
        let wallet = Arc::new(KeyWallet::from_hex_keys(&[KEY]).unwrap());
        let session = session_with(Some(wallet.clone()));
        session.store().save_session_address(wallet.addresses()[0]).unwrap();

        assert_eq!(session.restore().await, Some(wallet.addresses()[0]));
    }

    #[tokio::test]
    async fn restore_without_persisted_address_does_nothing() {
        let wallet = Arc::new(KeyWallet::random(1));
        let session = session_with(Some(wallet));

        assert_eq!(session.restore().await, None);
        assert_eq!(session.address(), None);
    }

    #[tokio::test]
    async fn dropping_subscription_stops_listener() {
        let wallet = Arc::new(KeyWallet::random(2));
        let session = session_with(Some(wallet.clone()));
        session.connect().await.unwrap();

        session.disconnect();
        assert!(!session.is_watching());

        wallet.select_account(wallet.addresses()[1]).unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(session.address(), None);
    }
}
