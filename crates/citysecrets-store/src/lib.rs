//! # citysecrets-store
//!
//! Local persistence for the City Secrets client, backed by SQLite.
//!
//! Plays the role browser storage plays for a web dApp: a small key/value
//! table that survives restarts, plus typed helpers for the persisted
//! wallet session.

pub mod database;
pub mod local_storage;
pub mod migrations;
pub mod session;

mod error;

pub use database::Database;
pub use error::StoreError;
