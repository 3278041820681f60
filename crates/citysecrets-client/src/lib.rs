//! # citysecrets-client
//!
//! Client core for City Secrets: a wallet session, the SecretSpots
//! contract, and the content backend, reconciled into view-ready state.
//!
//! Views hold an [`Arc<SpotsClient>`], call its commands, and listen on
//! [`SpotsClient::subscribe`] for notifications and state changes.

pub mod client;
pub mod commands;
pub mod config;
pub mod error;
pub mod events;
pub mod gateway;
pub mod reconcile;
pub mod session;
pub mod state;
pub mod wizard;

use tracing_subscriber::{fmt, EnvFilter};

pub use client::{SpotsClient, SpotsClientBuilder};
pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use events::{ClientEvent, EventBus, Notification, NotificationLevel, SpotCollection};
pub use gateway::ContractGateway;
pub use reconcile::{FanoutPolicy, Reconciler};
pub use session::{SessionSnapshot, Subscription, WalletSession};
pub use state::{ClientState, Profile, SpotDetail};
pub use wizard::{CreateSpotWizard, WizardStep};

/// Install the fmt subscriber.  `RUST_LOG` overrides the default filter.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(
            "citysecrets_client=debug,citysecrets_chain=debug,citysecrets_backend=info,citysecrets_store=info,warn",
        )
    });

    let installed = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init()
        .is_ok();

    if installed {
        tracing::info!("Starting City Secrets client");
    }
}
