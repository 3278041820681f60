//! Wallet and contract boundary for the SecretSpots contract.
//!
//! [`SpotsContract`] is the seam the client talks to.  Two implementations
//! ship here: [`EvmContract`], bound to a deployed contract over JSON-RPC,
//! and [`MemoryContract`], an in-process ledger that applies the same
//! rules and backs local development and tests.

pub mod contract;
pub mod error;
pub mod evm;
pub mod memory;
pub mod wallet;

pub use contract::{ContractConnector, PendingTx, SpotsContract};
pub use error::ChainError;
pub use evm::{EvmConnector, EvmContract};
pub use memory::{MemoryChain, MemoryContract, MEMORY_CONTRACT_ADDRESS};
pub use wallet::{KeyWallet, WalletProvider, WalletSigner};

pub use alloy::primitives::{TxHash, U256};
