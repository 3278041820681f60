//! SecretSpots bindings over an EVM JSON-RPC node.

use std::sync::Arc;

use alloy::network::{Ethereum, EthereumWallet};
use alloy::primitives::{Address, U256};
use alloy::providers::{DynProvider, PendingTransactionBuilder, Provider, ProviderBuilder};
use alloy::rpc::types::{Log, TransactionReceipt};
use alloy::signers::Signer as _;
use alloy::sol;
use alloy::transports::http::reqwest::Url;
use async_trait::async_trait;
use tracing::{debug, info};

use citysecrets_shared::constants::{SPOT_CREATED_EVENT, VOTE_GAS_LIMIT};
use citysecrets_shared::{ChainSpot, SpotCategory, SpotCreated, SpotId, UserRecord};

use crate::contract::{ContractConnector, PendingTx, SpotsContract};
use crate::error::ChainError;
use crate::wallet::WalletSigner;

sol! {
    #[sol(rpc)]
    contract SecretSpots {
        event SpotCreated(uint256 indexed spotId, address indexed creator, string username);

        function users(address account)
            external
            view
            returns (string memory username, bool isRegistered, uint256 level, uint256 credibilityScore);

        function spots(uint256 spotId)
            external
            view
            returns (uint256 id, address creator, uint256 upvotes, uint256 downvotes, uint8 category);

        function hasVoted(address voter, uint256 spotId) external view returns (bool);

        function registerUser(string memory username) external;

        function createSpot(uint8 category) external returns (uint256);

        function voteSpot(uint256 spotId, bool isUpvote) external payable;

        function deleteSpot(uint256 spotId) external;
    }
}

type Instance = SecretSpots::SecretSpotsInstance<DynProvider>;

fn to_u64(value: U256, field: &'static str) -> Result<u64, ChainError> {
    u64::try_from(value).map_err(|_| ChainError::OutOfRange {
        field,
        value: value.to_string(),
    })
}

fn call_error(e: alloy::contract::Error) -> ChainError {
    let message = e.to_string();
    let classified = ChainError::from_revert(&message);
    match classified {
        ChainError::Transaction(_) => ChainError::Rpc(message),
        rule => rule,
    }
}

/// Find and decode the `SpotCreated` event emitted by `contract`.
pub fn decode_spot_created(logs: &[Log], contract: Address) -> Result<SpotCreated, ChainError> {
    logs.iter()
        .filter(|log| log.inner.address == contract)
        .find_map(|log| log.log_decode::<SecretSpots::SpotCreated>().ok())
        .ok_or(ChainError::MissingEvent(SPOT_CREATED_EVENT))
        .and_then(|log| {
            let event = log.inner.data;
            Ok(SpotCreated {
                spot_id: SpotId(to_u64(event.spotId, "spotId")?),
                creator: event.creator,
                username: event.username,
            })
        })
}

/// Turn a submitted transaction into a [`PendingTx`] that resolves on receipt.
fn track<T, F>(pending: PendingTransactionBuilder<Ethereum>, decode: F) -> PendingTx<T>
where
    T: Send + 'static,
    F: FnOnce(&TransactionReceipt) -> Result<T, ChainError> + Send + 'static,
{
    let hash = *pending.tx_hash();
    PendingTx::new(hash, async move {
        let receipt = pending
            .get_receipt()
            .await
            .map_err(|e| ChainError::Transaction(e.to_string()))?;

        if !receipt.status() {
            return Err(ChainError::Transaction(format!("transaction {hash} reverted")));
        }
        debug!(tx = %hash, block = ?receipt.block_number, "Transaction confirmed");
        decode(&receipt)
    })
}

/// Contract handle bound to one signer.
pub struct EvmContract {
    instance: Instance,
    signer: Address,
}

impl EvmContract {
    pub fn new(rpc_url: Url, signer: WalletSigner, contract: Address) -> Self {
        let from = signer.address();
        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer))
            .connect_http(rpc_url)
            .erased();

        Self {
            instance: SecretSpots::new(contract, provider),
            signer: from,
        }
    }
}

#[async_trait]
impl SpotsContract for EvmContract {
    fn address(&self) -> Address {
        *self.instance.address()
    }

    fn signer_address(&self) -> Address {
        self.signer
    }

    async fn user(&self, who: Address) -> Result<UserRecord, ChainError> {
        let user = self.instance.users(who).call().await.map_err(call_error)?;
        Ok(UserRecord {
            username: user.username,
            is_registered: user.isRegistered,
            level: to_u64(user.level, "level")?,
            credibility_score: to_u64(user.credibilityScore, "credibilityScore")?,
        })
    }

    async fn spot(&self, id: SpotId) -> Result<ChainSpot, ChainError> {
        let spot = self
            .instance
            .spots(U256::from(id.0))
            .call()
            .await
            .map_err(call_error)?;
        Ok(ChainSpot {
            id,
            creator: spot.creator,
            upvotes: to_u64(spot.upvotes, "upvotes")?,
            downvotes: to_u64(spot.downvotes, "downvotes")?,
            category: spot.category,
        })
    }

    async fn has_voted(&self, voter: Address, id: SpotId) -> Result<bool, ChainError> {
        self.instance
            .hasVoted(voter, U256::from(id.0))
            .call()
            .await
            .map_err(call_error)
    }

    async fn register_user(&self, username: &str) -> Result<PendingTx<()>, ChainError> {
        let pending = self
            .instance
            .registerUser(username.to_string())
            .send()
            .await
            .map_err(call_error)?;
        info!(tx = %pending.tx_hash(), username, "registerUser submitted");
        Ok(track(pending, |_| Ok(())))
    }

    async fn create_spot(&self, category: SpotCategory) -> Result<PendingTx<SpotCreated>, ChainError> {
        let pending = self
            .instance
            .createSpot(category.code())
            .send()
            .await
            .map_err(call_error)?;
        info!(tx = %pending.tx_hash(), %category, "createSpot submitted");

        let contract = self.address();
        Ok(track(pending, move |receipt| {
            decode_spot_created(receipt.inner.logs(), contract)
        }))
    }

    async fn vote_spot(
        &self,
        id: SpotId,
        is_upvote: bool,
        value: U256,
    ) -> Result<PendingTx<()>, ChainError> {
        let pending = self
            .instance
            .voteSpot(U256::from(id.0), is_upvote)
            .value(value)
            .gas(VOTE_GAS_LIMIT)
            .send()
            .await
            .map_err(call_error)?;
        info!(tx = %pending.tx_hash(), spot_id = %id, is_upvote, %value, "voteSpot submitted");
        Ok(track(pending, |_| Ok(())))
    }

    async fn delete_spot(&self, id: SpotId) -> Result<PendingTx<()>, ChainError> {
        let pending = self
            .instance
            .deleteSpot(U256::from(id.0))
            .send()
            .await
            .map_err(call_error)?;
        info!(tx = %pending.tx_hash(), spot_id = %id, "deleteSpot submitted");
        Ok(track(pending, |_| Ok(())))
    }
}

/// Connects signers to the contract through one JSON-RPC endpoint.
#[derive(Debug, Clone)]
pub struct EvmConnector {
    rpc_url: Url,
}

impl EvmConnector {
    pub fn new(rpc_url: &str) -> Result<Self, ChainError> {
        let rpc_url = Url::parse(rpc_url)
            .map_err(|e| ChainError::Misconfigured(format!("invalid RPC URL {rpc_url}: {e}")))?;
        Ok(Self { rpc_url })
    }

    pub fn rpc_url(&self) -> &Url {
        &self.rpc_url
    }
}

impl ContractConnector for EvmConnector {
    fn connect(
        &self,
        signer: &WalletSigner,
        contract: Address,
    ) -> Result<Arc<dyn SpotsContract>, ChainError> {
        Ok(Arc::new(EvmContract::new(
            self.rpc_url.clone(),
            signer.clone(),
            contract,
        )))
    }
}

#[cfg(test)]
mod tests {
    use alloy::sol_types::SolEvent;

    use super::*;

    fn spot_created_log(emitter: Address, id: u64) -> Log {
        spot_created_log_raw(emitter, U256::from(id))
    }

    fn spot_created_log_raw(emitter: Address, id: U256) -> Log {
        let event = SecretSpots::SpotCreated {
            spotId: id,
            creator: Address::repeat_byte(0xA1),
            username: "alice".to_string(),
        };
        Log {
            inner: alloy::primitives::Log {
                address: emitter,
                data: event.encode_log_data(),
            },
            ..Default::default()
        }
    }

    #[test]
    fn decodes_spot_created_from_contract_logs() {
        let contract = Address::repeat_byte(0x5E);
        let logs = vec![
            spot_created_log(Address::repeat_byte(0x01), 99),
            spot_created_log(contract, 7),
        ];

        let created = decode_spot_created(&logs, contract).unwrap();
        assert_eq!(created.spot_id, SpotId(7));
        assert_eq!(created.creator, Address::repeat_byte(0xA1));
        assert_eq!(created.username, "alice");
    }

    #[test]
    fn missing_event_is_reported() {
        let contract = Address::repeat_byte(0x5E);
        assert_eq!(
            decode_spot_created(&[], contract),
            Err(ChainError::MissingEvent("SpotCreated"))
        );
    }

    #[test]
    fn oversized_counter_is_an_error() {
        assert_eq!(to_u64(U256::from(u64::MAX), "upvotes"), Ok(u64::MAX));
        assert_eq!(
            to_u64(U256::from(u64::MAX) + U256::from(1u8), "upvotes"),
            Err(ChainError::OutOfRange {
                field: "upvotes",
                value: "18446744073709551616".into(),
            })
        );
    }

    #[test]
    fn oversized_spot_id_is_not_clamped() {
        let contract = Address::repeat_byte(0x5E);
        let logs = vec![spot_created_log_raw(contract, U256::MAX)];

        assert!(matches!(
            decode_spot_created(&logs, contract),
            Err(ChainError::OutOfRange { field: "spotId", .. })
        ));
    }

    #[test]
    fn connector_rejects_bad_url() {
        assert!(matches!(
            EvmConnector::new("not a url"),
            Err(ChainError::Misconfigured(_))
        ));
        let connector = EvmConnector::new("http://127.0.0.1:8545").unwrap();
        assert_eq!(connector.rpc_url().port(), Some(8545));
    }

    #[tokio::test]
    async fn handle_reports_addresses_without_network() {
        let connector = EvmConnector::new("http://127.0.0.1:8545").unwrap();
        let signer = WalletSigner::random();
        let contract = Address::repeat_byte(0x5E);

        let handle = connector.connect(&signer, contract).unwrap();
        assert_eq!(handle.address(), contract);
        assert_eq!(handle.signer_address(), signer.address());
    }
}
