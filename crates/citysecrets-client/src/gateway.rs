//! Lazily built contract handle, tied to the session that signs for it.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{error, info};

use citysecrets_chain::{ChainError, ContractConnector, SpotsContract};
use citysecrets_shared::Address;

use crate::error::{ClientError, Result};
use crate::session::WalletSession;

struct CachedContract {
    generation: u64,
    contract: Arc<dyn SpotsContract>,
}

/// Builds the contract handle on first use and rebuilds it whenever the
/// session changes account.
pub struct ContractGateway {
    connector: Arc<dyn ContractConnector>,
    contract_address: Option<Address>,
    cached: Mutex<Option<CachedContract>>,
    last_error: Mutex<Option<String>>,
}

impl ContractGateway {
    pub fn new(connector: Arc<dyn ContractConnector>, contract_address: Option<Address>) -> Self {
        Self {
            connector,
            contract_address,
            cached: Mutex::new(None),
            last_error: Mutex::new(None),
        }
    }

    pub fn contract_address(&self) -> Option<Address> {
        self.contract_address
    }

    /// Reason the last initialisation attempt failed, if it did.
    pub fn contract_error(&self) -> Option<String> {
        lock(&self.last_error).clone()
    }

    /// Contract handle for the session's current signer.
    ///
    /// The probing `user(self)` read only runs when a new handle is built.
    pub async fn contract(&self, session: &WalletSession) -> Result<Arc<dyn SpotsContract>> {
        let snapshot = session.snapshot();
        let Some(signer) = snapshot.signer else {
            self.drop_cached();
            return Err(self.fail(ClientError::WalletDisconnected));
        };

        if let Some(cached) = lock(&self.cached).as_ref() {
            if cached.generation == snapshot.generation {
                return Ok(cached.contract.clone());
            }
        }

        let Some(address) = self.contract_address else {
            return Err(self.fail(
                ChainError::Misconfigured("Contract address not configured".into()).into(),
            ));
        };

        let contract = self
            .connector
            .connect(&signer, address)
            .map_err(|e| self.fail(e.into()))?;

        if let Err(e) = contract.user(contract.signer_address()).await {
            return Err(self.fail(ChainError::Connection(e.to_string()).into()));
        }

        *lock(&self.cached) = Some(CachedContract {
            generation: snapshot.generation,
            contract: contract.clone(),
        });
        *lock(&self.last_error) = None;

        info!(contract = %address, signer = %contract.signer_address(), "Contract initialized successfully");
        Ok(contract)
    }

    /// Drop the cached handle.  Called when the session changes.
    pub fn reset(&self) {
        self.drop_cached();
        *lock(&self.last_error) = None;
    }

    fn drop_cached(&self) {
        lock(&self.cached).take();
    }

    fn fail(&self, err: ClientError) -> ClientError {
        error!(error = %err, "Contract initialization failed");
        *lock(&self.last_error) = Some(err.to_string());
        err
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
