//! Wallet provider boundary.
//!
//! [`WalletProvider`] is what an injected browser wallet offers a dApp:
//! account access, a signer for the selected account, and account-change
//! notifications.  [`KeyWallet`] implements it over local private keys.

use std::str::FromStr;
use std::sync::Mutex;

use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::Signer as _;
use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::error::ChainError;

/// Signing handle for one account.
pub type WalletSigner = PrivateKeySigner;

const ACCOUNT_EVENTS_CAPACITY: usize = 16;

#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Ask for account access.  The selected account comes first.
    async fn request_accounts(&self) -> Result<Vec<Address>, ChainError>;

    /// Signer for an account the provider manages.
    fn signer_for(&self, address: Address) -> Result<WalletSigner, ChainError>;

    /// Account-change notifications.  An empty list means the wallet
    /// disconnected.
    fn subscribe_accounts(&self) -> broadcast::Receiver<Vec<Address>>;
}

struct KeyWalletState {
    selected: Option<Address>,
}

/// Wallet backed by in-process secp256k1 keys.
pub struct KeyWallet {
    signers: Vec<PrivateKeySigner>,
    state: Mutex<KeyWalletState>,
    events: broadcast::Sender<Vec<Address>>,
}

impl KeyWallet {
    pub fn new(signers: Vec<PrivateKeySigner>) -> Self {
        let (events, _) = broadcast::channel(ACCOUNT_EVENTS_CAPACITY);
        Self {
            signers,
            state: Mutex::new(KeyWalletState { selected: None }),
            events,
        }
    }

    /// Load hex-encoded private keys (with or without `0x`).
    pub fn from_hex_keys<S: AsRef<str>>(keys: &[S]) -> Result<Self, ChainError> {
        let signers = keys
            .iter()
            .map(|k| {
                PrivateKeySigner::from_str(k.as_ref().trim())
                    .map_err(|e| ChainError::InvalidKey(e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(signers))
    }

    /// Wallet with `count` freshly generated accounts.
    pub fn random(count: usize) -> Self {
        Self::new((0..count).map(|_| PrivateKeySigner::random()).collect())
    }

    pub fn addresses(&self) -> Vec<Address> {
        self.signers.iter().map(|s| s.address()).collect()
    }

    /// Switch the selected account and notify subscribers.
    pub fn select_account(&self, address: Address) -> Result<(), ChainError> {
        if !self.addresses().contains(&address) {
            return Err(ChainError::UnknownAccount(address.to_string()));
        }
        {
            let mut state = self.state.lock().map_err(|e| ChainError::Rpc(e.to_string()))?;
            state.selected = Some(address);
        }
        info!(account = %address, "Wallet account switched");
        self.notify(vec![address]);
        Ok(())
    }

    /// Revoke account access and notify subscribers with an empty list.
    pub fn disconnect(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.selected = None;
        }
        info!("Wallet disconnected");
        self.notify(Vec::new());
    }

    fn notify(&self, accounts: Vec<Address>) {
        // No receivers is fine: nobody is listening yet.
        if self.events.send(accounts).is_err() {
            debug!("No account-change subscribers");
        }
    }
}

#[async_trait]
impl WalletProvider for KeyWallet {
    async fn request_accounts(&self) -> Result<Vec<Address>, ChainError> {
        let addresses = self.addresses();
        if addresses.is_empty() {
            return Err(ChainError::ProviderUnavailable);
        }

        let mut state = self.state.lock().map_err(|e| ChainError::Rpc(e.to_string()))?;
        let selected = *state.selected.get_or_insert(addresses[0]);

        let mut accounts = vec![selected];
        accounts.extend(addresses.into_iter().filter(|a| *a != selected));
        Ok(accounts)
    }

    fn signer_for(&self, address: Address) -> Result<WalletSigner, ChainError> {
        self.signers
            .iter()
            .find(|s| s.address() == address)
            .cloned()
            .ok_or_else(|| ChainError::UnknownAccount(address.to_string()))
    }

    fn subscribe_accounts(&self) -> broadcast::Receiver<Vec<Address>> {
        self.events.subscribe()
    }
}
