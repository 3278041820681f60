use citysecrets_shared::constants::{
    REVERT_ALREADY_REGISTERED, REVERT_ALREADY_VOTED, REVERT_INSUFFICIENT_PAYMENT,
    REVERT_NOT_CREATOR, REVERT_NOT_REGISTERED, REVERT_OWN_SPOT,
};
use citysecrets_shared::SpotId;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    #[error("No wallet provider available")]
    ProviderUnavailable,

    #[error("Invalid signing key: {0}")]
    InvalidKey(String),

    #[error("Unknown account: {0}")]
    UnknownAccount(String),

    #[error("Contract misconfigured: {0}")]
    Misconfigured(String),

    #[error("Error connecting to contract: {0}")]
    Connection(String),

    #[error("User not registered")]
    NotRegistered,

    #[error("User already registered")]
    AlreadyRegistered,

    #[error("Already voted on this spot")]
    AlreadyVoted,

    #[error("Cannot vote own spot")]
    CannotVoteOwnSpot,

    #[error("Spot {0} does not exist")]
    SpotNotFound(SpotId),

    #[error("Only the spot creator can do this")]
    NotSpotCreator,

    #[error("Insufficient vote payment")]
    InsufficientPayment,

    #[error("Event {0} not found in receipt")]
    MissingEvent(&'static str),

    #[error("Transaction failed: {0}")]
    Transaction(String),

    #[error("RPC error: {0}")]
    Rpc(String),

    /// A contract integer does not fit the client's 64-bit field.
    #[error("Contract value {field} out of range: {value}")]
    OutOfRange { field: &'static str, value: String },
}

impl ChainError {
    /// Classify a node error message by the contract revert reason it carries.
    pub fn from_revert(message: &str) -> Self {
        if message.contains(REVERT_OWN_SPOT) {
            Self::CannotVoteOwnSpot
        } else if message.contains(REVERT_ALREADY_VOTED) {
            Self::AlreadyVoted
        } else if message.contains(REVERT_ALREADY_REGISTERED) {
            Self::AlreadyRegistered
        } else if message.contains(REVERT_NOT_REGISTERED) {
            Self::NotRegistered
        } else if message.contains(REVERT_NOT_CREATOR) {
            Self::NotSpotCreator
        } else if message.contains(REVERT_INSUFFICIENT_PAYMENT) {
            Self::InsufficientPayment
        } else {
            Self::Transaction(message.to_string())
        }
    }

    /// Business-rule rejections raised by the contract itself.
    pub fn is_rule_violation(&self) -> bool {
        matches!(
            self,
            Self::NotRegistered
                | Self::AlreadyRegistered
                | Self::AlreadyVoted
                | Self::CannotVoteOwnSpot
                | Self::SpotNotFound(_)
                | Self::NotSpotCreator
                | Self::InsufficientPayment
        )
    }
}
