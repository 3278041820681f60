//! In-process SecretSpots ledger.
//!
//! Transactions are mined the moment they are submitted: rule violations
//! are returned from the submit call, and the [`PendingTx`] handed back
//! confirms immediately.  Every [`MemoryContract`] handle created from the
//! same [`MemoryChain`] shares one ledger.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use alloy::primitives::{keccak256, Address, TxHash, U256};
use alloy::signers::Signer as _;
use async_trait::async_trait;
use tracing::debug;

use citysecrets_shared::constants::{
    DEFAULT_VOTE_VALUE_WEI, INITIAL_USER_LEVEL, SCORE_PER_LEVEL,
};
use citysecrets_shared::{ChainSpot, SpotCategory, SpotCreated, SpotId, UserRecord};

use crate::contract::{ContractConnector, PendingTx, SpotsContract};
use crate::error::ChainError;
use crate::wallet::WalletSigner;

/// Address the in-process contract is "deployed" at unless told otherwise.
pub const MEMORY_CONTRACT_ADDRESS: Address = Address::new([0x5E; 20]);

#[derive(Default)]
struct Ledger {
    users: HashMap<Address, UserRecord>,
    spots: BTreeMap<u64, ChainSpot>,
    votes: HashSet<(Address, u64)>,
    next_spot_id: u64,
    tx_count: u64,
}

impl Ledger {
    fn next_tx_hash(&mut self, from: Address) -> TxHash {
        self.tx_count += 1;
        let mut preimage = from.to_vec();
        preimage.extend_from_slice(&self.tx_count.to_be_bytes());
        keccak256(preimage)
    }

    fn require_registered(&self, who: Address) -> Result<&UserRecord, ChainError> {
        self.users
            .get(&who)
            .filter(|u| u.is_registered)
            .ok_or(ChainError::NotRegistered)
    }

    fn live_spot(&self, id: SpotId) -> Result<&ChainSpot, ChainError> {
        self.spots.get(&id.0).ok_or(ChainError::SpotNotFound(id))
    }
}

/// Shared ledger plus the address it answers on.
#[derive(Clone)]
pub struct MemoryChain {
    address: Address,
    vote_value: U256,
    ledger: Arc<Mutex<Ledger>>,
}

impl MemoryChain {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            vote_value: U256::from(DEFAULT_VOTE_VALUE_WEI),
            ledger: Arc::new(Mutex::new(Ledger {
                next_spot_id: 1,
                ..Default::default()
            })),
        }
    }

    /// Minimum payment a vote must carry.
    pub fn with_vote_value(mut self, vote_value: U256) -> Self {
        self.vote_value = vote_value;
        self
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Contract handle that sends from `signer`.
    pub fn connect_as(&self, signer: Address) -> MemoryContract {
        self.handle(signer, self.address)
    }

    fn handle(&self, signer: Address, contract: Address) -> MemoryContract {
        MemoryContract {
            chain: self.clone(),
            contract,
            signer,
        }
    }
}

impl Default for MemoryChain {
    fn default() -> Self {
        Self::new(MEMORY_CONTRACT_ADDRESS)
    }
}

impl ContractConnector for MemoryChain {
    fn connect(
        &self,
        signer: &WalletSigner,
        contract: Address,
    ) -> Result<Arc<dyn SpotsContract>, ChainError> {
        Ok(Arc::new(self.handle(signer.address(), contract)))
    }
}

/// One signer's view of a [`MemoryChain`].
pub struct MemoryContract {
    chain: MemoryChain,
    contract: Address,
    signer: Address,
}

impl MemoryContract {
    fn ledger(&self) -> Result<MutexGuard<'_, Ledger>, ChainError> {
        if self.contract != self.chain.address {
            return Err(ChainError::Rpc(format!("no contract code at {}", self.contract)));
        }
        self.chain
            .ledger
            .lock()
            .map_err(|e| ChainError::Rpc(e.to_string()))
    }
}

#[async_trait]
impl SpotsContract for MemoryContract {
    fn address(&self) -> Address {
        self.contract
    }

    fn signer_address(&self) -> Address {
        self.signer
    }

    async fn user(&self, who: Address) -> Result<UserRecord, ChainError> {
        Ok(self.ledger()?.users.get(&who).cloned().unwrap_or_default())
    }

    async fn spot(&self, id: SpotId) -> Result<ChainSpot, ChainError> {
        let ledger = self.ledger()?;
        Ok(ledger.spots.get(&id.0).cloned().unwrap_or(ChainSpot {
            id,
            creator: Address::ZERO,
            upvotes: 0,
            downvotes: 0,
            category: 0,
        }))
    }

    async fn has_voted(&self, voter: Address, id: SpotId) -> Result<bool, ChainError> {
        Ok(self.ledger()?.votes.contains(&(voter, id.0)))
    }

    async fn register_user(&self, username: &str) -> Result<PendingTx<()>, ChainError> {
        let mut ledger = self.ledger()?;
        if ledger.users.get(&self.signer).is_some_and(|u| u.is_registered) {
            return Err(ChainError::AlreadyRegistered);
        }

        ledger.users.insert(
            self.signer,
            UserRecord {
                username: username.to_string(),
                is_registered: true,
                level: INITIAL_USER_LEVEL,
                credibility_score: 0,
            },
        );
        debug!(user = %self.signer, username, "memory ledger: registered");

        let hash = ledger.next_tx_hash(self.signer);
        Ok(PendingTx::ready(hash, ()))
    }

    async fn create_spot(&self, category: SpotCategory) -> Result<PendingTx<SpotCreated>, ChainError> {
        let mut ledger = self.ledger()?;
        let username = ledger.require_registered(self.signer)?.username.clone();

        let id = ledger.next_spot_id;
        ledger.next_spot_id += 1;
        ledger.spots.insert(
            id,
            ChainSpot {
                id: SpotId(id),
                creator: self.signer,
                upvotes: 0,
                downvotes: 0,
                category: category.code(),
            },
        );
        debug!(spot_id = id, creator = %self.signer, "memory ledger: spot created");

        let hash = ledger.next_tx_hash(self.signer);
        Ok(PendingTx::ready(
            hash,
            SpotCreated {
                spot_id: SpotId(id),
                creator: self.signer,
                username,
            },
        ))
    }

    async fn vote_spot(
        &self,
        id: SpotId,
        is_upvote: bool,
        value: U256,
    ) -> Result<PendingTx<()>, ChainError> {
        let mut ledger = self.ledger()?;
        ledger.require_registered(self.signer)?;

        let creator = ledger.live_spot(id)?.creator;
        if creator == self.signer {
            return Err(ChainError::CannotVoteOwnSpot);
        }
        if ledger.votes.contains(&(self.signer, id.0)) {
            return Err(ChainError::AlreadyVoted);
        }
        if value < self.chain.vote_value {
            return Err(ChainError::InsufficientPayment);
        }

        ledger.votes.insert((self.signer, id.0));
        if let Some(spot) = ledger.spots.get_mut(&id.0) {
            if is_upvote {
                spot.upvotes += 1;
            } else {
                spot.downvotes += 1;
            }
        }
        if let Some(author) = ledger.users.get_mut(&creator) {
            author.credibility_score = if is_upvote {
                author.credibility_score + 1
            } else {
                author.credibility_score.saturating_sub(1)
            };
            author.level = INITIAL_USER_LEVEL + author.credibility_score / SCORE_PER_LEVEL;
        }
        debug!(spot_id = %id, voter = %self.signer, is_upvote, "memory ledger: vote");

        let hash = ledger.next_tx_hash(self.signer);
        Ok(PendingTx::ready(hash, ()))
    }

    async fn delete_spot(&self, id: SpotId) -> Result<PendingTx<()>, ChainError> {
        let mut ledger = self.ledger()?;
        if ledger.live_spot(id)?.creator != self.signer {
            return Err(ChainError::NotSpotCreator);
        }
        ledger.spots.remove(&id.0);
        debug!(spot_id = %id, "memory ledger: spot deleted");

        let hash = ledger.next_tx_hash(self.signer);
        Ok(PendingTx::ready(hash, ()))
    }
}
