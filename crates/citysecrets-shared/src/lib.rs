// Domain types shared by the chain, backend, store and client crates.

pub mod constants;
pub mod error;
pub mod models;
pub mod types;
pub mod validation;

pub use alloy::primitives::Address;
pub use error::{MergeError, ValidationError};
pub use models::{Comment, CreatorCredibility, Location, PhotoUpload, SpotDocument, SpotView};
pub use types::{ChainSpot, SpotCategory, SpotCreated, SpotId, UserRecord};
