//! The client object: session, contract gateway, backend and view state
//! wired together.  Commands live in [`crate::commands`].

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, error, info, warn};

use citysecrets_backend::BackendClient;
use citysecrets_chain::{ContractConnector, EvmConnector, SpotsContract, WalletProvider};
use citysecrets_shared::Address;
use citysecrets_store::Database;

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::events::{ClientEvent, EventBus, NotificationLevel};
use crate::gateway::ContractGateway;
use crate::reconcile::Reconciler;
use crate::session::{Subscription, WalletSession};
use crate::state::ClientState;

pub struct SpotsClient {
    pub(crate) config: ClientConfig,
    pub(crate) session: Arc<WalletSession>,
    pub(crate) gateway: ContractGateway,
    pub(crate) backend: BackendClient,
    pub(crate) reconciler: Reconciler,
    pub(crate) events: EventBus,
    state: Mutex<ClientState>,
    session_watch: Mutex<Option<Subscription>>,
}

/// Assembles a [`SpotsClient`].  Anything not supplied is built from the
/// configuration.
pub struct SpotsClientBuilder {
    config: ClientConfig,
    wallet: Option<Arc<dyn WalletProvider>>,
    connector: Option<Arc<dyn ContractConnector>>,
    database: Option<Database>,
}

impl SpotsClientBuilder {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            wallet: None,
            connector: None,
            database: None,
        }
    }

    /// Wallet provider.  Without one every connect attempt fails with
    /// "provider unavailable".
    pub fn wallet(mut self, wallet: Arc<dyn WalletProvider>) -> Self {
        self.wallet = Some(wallet);
        self
    }

    /// Contract connector.  Defaults to JSON-RPC at `config.rpc_url`.
    pub fn connector(mut self, connector: Arc<dyn ContractConnector>) -> Self {
        self.connector = Some(connector);
        self
    }

    /// Session database.  Defaults to `config.data_dir` or the platform
    /// data directory.
    pub fn database(mut self, database: Database) -> Self {
        self.database = Some(database);
        self
    }

    /// Build the client.  Must be called from within a Tokio runtime.
    pub fn build(self) -> Result<Arc<SpotsClient>> {
        let config = self.config;

        let backend = BackendClient::new(&config.api_base_url)?;
        let connector: Arc<dyn ContractConnector> = match self.connector {
            Some(connector) => connector,
            None => Arc::new(EvmConnector::new(&config.rpc_url)?),
        };
        let database = match self.database {
            Some(database) => database,
            None => match &config.data_dir {
                Some(dir) => Database::open_in_dir(dir)?,
                None => Database::new()?,
            },
        };

        let events = EventBus::new();
        let session = WalletSession::new(self.wallet, database, events.clone());

        let client = Arc::new(SpotsClient {
            gateway: ContractGateway::new(connector, config.contract_address),
            reconciler: Reconciler::new(config.fanout, config.fanout_policy),
            backend,
            session,
            events,
            state: Mutex::new(ClientState::new()),
            session_watch: Mutex::new(None),
            config,
        });

        let watch = watch_session(&client);
        *lock(&client.session_watch) = Some(watch);

        info!(
            api = %client.backend.base_url(),
            contract = ?client.config.contract_address,
            "City Secrets client ready"
        );
        Ok(client)
    }
}

/// Keeps user state in step with the wallet session.
fn watch_session(client: &Arc<SpotsClient>) -> Subscription {
    let mut rx = client.events.subscribe();
    let client: Weak<SpotsClient> = Arc::downgrade(client);

    Subscription::new(tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(ClientEvent::SessionChanged { address }) => {
                    let Some(client) = client.upgrade() else {
                        break;
                    };
                    client.on_session_changed(address).await;
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Session watcher lagged behind client events");
                }
                Err(RecvError::Closed) => break,
            }
        }
    }))
}

/// Decrements the pending-command count when dropped.
pub(crate) struct LoadingGuard<'a> {
    state: &'a Mutex<ClientState>,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        let mut state = lock(self.state);
        state.pending = state.pending.saturating_sub(1);
    }
}

impl SpotsClient {
    pub fn builder(config: ClientConfig) -> SpotsClientBuilder {
        SpotsClientBuilder::new(config)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session(&self) -> &Arc<WalletSession> {
        &self.session
    }

    /// Connected account, if any.
    pub fn address(&self) -> Option<Address> {
        self.session.address()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }

    /// Snapshot of the view state.
    pub fn state(&self) -> ClientState {
        self.lock_state().clone()
    }

    pub fn is_loading(&self) -> bool {
        self.lock_state().is_loading()
    }

    /// Why the contract could not be initialised, for display.
    pub fn contract_error(&self) -> Option<String> {
        self.gateway.contract_error()
    }

    /// Restore a persisted session and load the initial lists.
    pub async fn start(&self) -> Option<Address> {
        let address = self.session.restore().await?;
        // Failures below are reported by the commands themselves.
        let _ = self.refresh_user().await;
        let _ = self.fetch_spots().await;
        let _ = self.fetch_user_spots().await;
        Some(address)
    }

    pub async fn connect_wallet(&self) -> Result<Address> {
        let _loading = self.begin();
        let result = self.session.connect().await;
        self.report(
            "connect_wallet",
            result,
            Some("Wallet connected"),
            "Failed to connect wallet",
        )
    }

    pub fn disconnect_wallet(&self) {
        self.session.disconnect();
        self.events.notify(NotificationLevel::Info, "Wallet disconnected");
    }

    pub(crate) fn lock_state(&self) -> MutexGuard<'_, ClientState> {
        lock(&self.state)
    }

    /// Mark a command as running until the guard drops.
    pub(crate) fn begin(&self) -> LoadingGuard<'_> {
        self.lock_state().pending += 1;
        LoadingGuard { state: &self.state }
    }

    /// The connected account and a contract handle signing for it.
    pub(crate) async fn connected(&self) -> Result<(Address, Arc<dyn SpotsContract>)> {
        let address = self.session.address().ok_or(ClientError::WalletDisconnected)?;
        let contract = self.gateway.contract(&self.session).await?;
        Ok((address, contract))
    }

    /// Log a command's failure and publish the matching notification.
    pub(crate) fn report<T>(
        &self,
        action: &'static str,
        result: Result<T>,
        success: Option<&str>,
        fallback: &str,
    ) -> Result<T> {
        match &result {
            Ok(_) => {
                if let Some(message) = success {
                    self.events.notify(NotificationLevel::Success, message);
                }
            }
            Err(e) => {
                error!(action, error = %e, "Command failed");
                self.events
                    .notify(NotificationLevel::Error, e.user_message(fallback));
            }
        }
        result
    }

    async fn on_session_changed(&self, address: Option<Address>) {
        self.gateway.reset();
        match address {
            None => {
                self.lock_state().clear_account();
                self.events.emit(ClientEvent::UserUpdated {
                    is_registered: false,
                });
            }
            Some(address) => {
                debug!(account = %address, "Session changed, refreshing account data");
                let _ = self.refresh_user().await;
                let _ = self.fetch_user_spots().await;
            }
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
