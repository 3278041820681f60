use std::fmt;
use std::future::Future;
use std::sync::Arc;

use alloy::primitives::{Address, TxHash, U256};
use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::FutureExt;

use citysecrets_shared::{ChainSpot, SpotCategory, SpotCreated, SpotId, UserRecord};

use crate::error::ChainError;
use crate::wallet::WalletSigner;

/// A submitted transaction that has not been confirmed yet.
///
/// Mutating calls are two-phase: the call returns once the node accepted
/// the transaction, and [`PendingTx::confirm`] resolves once it is mined.
/// Callers treat the operation as pending until `confirm` returns.
pub struct PendingTx<T> {
    hash: TxHash,
    confirmation: BoxFuture<'static, Result<T, ChainError>>,
}

impl<T> PendingTx<T> {
    pub fn new<F>(hash: TxHash, confirmation: F) -> Self
    where
        F: Future<Output = Result<T, ChainError>> + Send + 'static,
    {
        Self {
            hash,
            confirmation: confirmation.boxed(),
        }
    }

    /// A transaction whose outcome is already known (e.g. an instant-mine ledger).
    pub fn ready(hash: TxHash, outcome: T) -> Self
    where
        T: Send + 'static,
    {
        Self::new(hash, async move { Ok(outcome) })
    }

    pub fn hash(&self) -> TxHash {
        self.hash
    }

    /// Wait for the transaction to be mined.
    pub async fn confirm(self) -> Result<T, ChainError> {
        self.confirmation.await
    }
}

impl<T> fmt::Debug for PendingTx<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingTx").field("hash", &self.hash).finish()
    }
}

/// Typed calls on the SecretSpots contract, bound to one signer.
#[async_trait]
pub trait SpotsContract: Send + Sync {
    /// Address of the deployed contract.
    fn address(&self) -> Address;

    /// Address transactions are sent from.
    fn signer_address(&self) -> Address;

    async fn user(&self, who: Address) -> Result<UserRecord, ChainError>;

    async fn spot(&self, id: SpotId) -> Result<ChainSpot, ChainError>;

    async fn has_voted(&self, voter: Address, id: SpotId) -> Result<bool, ChainError>;

    async fn register_user(&self, username: &str) -> Result<PendingTx<()>, ChainError>;

    /// Resolves to the id and denormalised username from the `SpotCreated` event.
    async fn create_spot(&self, category: SpotCategory) -> Result<PendingTx<SpotCreated>, ChainError>;

    /// Paid vote: `value` wei travels with the transaction.
    async fn vote_spot(
        &self,
        id: SpotId,
        is_upvote: bool,
        value: U256,
    ) -> Result<PendingTx<()>, ChainError>;

    async fn delete_spot(&self, id: SpotId) -> Result<PendingTx<()>, ChainError>;
}

/// Builds a contract handle for a signer.
pub trait ContractConnector: Send + Sync {
    fn connect(
        &self,
        signer: &WalletSigner,
        contract: Address,
    ) -> Result<Arc<dyn SpotsContract>, ChainError>;
}
