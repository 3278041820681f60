//! REST client for the City Secrets content service.
//!
//! Stateless: every call maps to one HTTP request and any failure is
//! returned to the caller as is.  Retry policy, if any, belongs upstream.

pub mod client;
pub mod error;

pub use client::{BackendClient, NewComment, UserRegistration};
pub use error::BackendError;
