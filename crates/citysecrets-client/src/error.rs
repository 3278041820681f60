use citysecrets_backend::BackendError;
use citysecrets_chain::ChainError;
use citysecrets_shared::{MergeError, ValidationError};
use citysecrets_store::StoreError;
use thiserror::Error;

/// Errors returned by client commands.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Merge(#[from] MergeError),

    #[error("Wallet not connected")]
    WalletDisconnected,

    /// The action needs a registered user; carries the action's gerund.
    #[error("Please register before {0}")]
    RegistrationRequired(&'static str),
}

pub type Result<T> = std::result::Result<T, ClientError>;

impl ClientError {
    /// Text for the transient notification shown to the user.
    ///
    /// Business-rule rejections and input errors get their own wording;
    /// anything else falls back to the action's generic message.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Validation(e) => e.to_string(),
            Self::WalletDisconnected | Self::RegistrationRequired(_) => self.to_string(),
            Self::Chain(e) => match e {
                ChainError::ProviderUnavailable => "Please install a wallet provider".to_string(),
                ChainError::NotRegistered => "Please register first".to_string(),
                ChainError::AlreadyRegistered => "User already registered".to_string(),
                ChainError::AlreadyVoted => "You have already voted on this spot".to_string(),
                ChainError::CannotVoteOwnSpot => "You cannot vote on your own spot".to_string(),
                ChainError::NotSpotCreator => "Only the creator can delete this spot".to_string(),
                ChainError::Misconfigured(_) => "Contract address not configured".to_string(),
                ChainError::Connection(_) => "Error connecting to contract".to_string(),
                _ => fallback.to_string(),
            },
            Self::Backend(BackendError::MissingUploadUrls) => {
                BackendError::MissingUploadUrls.to_string()
            }
            _ => fallback.to_string(),
        }
    }
}
