//! User intents, grouped by domain.
//!
//! Every command follows the same shape: mark the client as loading,
//! run the fallible body, then log and publish the outcome.  The loading
//! mark is released on every exit path.

pub mod comments;
pub mod registration;
pub mod spots;
pub mod voting;
