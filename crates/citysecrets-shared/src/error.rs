use thiserror::Error;

use crate::types::SpotId;

/// Client-side form and input checks.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("Invalid coordinates")]
    InvalidCoordinates,

    #[error("At least one photo is required")]
    NoPhotos,

    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    #[error("Username is required")]
    EmptyUsername,

    #[error("Comment cannot be empty")]
    EmptyComment,
}

/// Raised when the on-chain and off-chain halves of a spot cannot be joined.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MergeError {
    #[error("Spot {0} has no on-chain record")]
    MissingOnChain(SpotId),

    #[error("Creator of spot {0} has no on-chain record")]
    MissingCreator(SpotId),
}
