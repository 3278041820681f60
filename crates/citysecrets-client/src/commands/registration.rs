use tracing::info;

use citysecrets_backend::UserRegistration;
use citysecrets_chain::SpotsContract;
use citysecrets_shared::validation::validate_username;
use citysecrets_shared::{Address, UserRecord};

use crate::client::SpotsClient;
use crate::error::{ClientError, Result};
use crate::events::ClientEvent;
use crate::state::Profile;

impl SpotsClient {
    /// Register the connected account on-chain, then with the backend.
    pub async fn register_user(&self, username: &str) -> Result<UserRecord> {
        let _loading = self.begin();
        let result = self.try_register_user(username).await;
        self.report(
            "register_user",
            result,
            Some("User registered successfully"),
            "Failed to register user",
        )
    }

    async fn try_register_user(&self, username: &str) -> Result<UserRecord> {
        let username = validate_username(username)?;
        let (address, contract) = self.connected().await?;

        let pending = contract.register_user(&username).await?;
        info!(account = %address, tx = %pending.hash(), "Registration submitted");
        pending.confirm().await?;

        self.backend
            .register_user(&UserRegistration {
                wallet_address: address,
                username,
            })
            .await?;

        self.load_user().await
    }

    /// Re-read the connected account's on-chain record into state.
    ///
    /// Without a session the record resets to unregistered.
    pub async fn refresh_user(&self) -> Result<UserRecord> {
        let _loading = self.begin();
        let result = self.load_user().await;
        if let Err(e) = &result {
            tracing::error!(error = %e, "Failed to fetch user data");
        }
        result
    }

    /// Profile page data for the connected account.
    pub async fn profile(&self) -> Result<Profile> {
        let _loading = self.begin();
        let result = self.try_profile().await;
        self.report("profile", result, None, "Failed to load profile")
    }

    async fn try_profile(&self) -> Result<Profile> {
        let address = self.address().ok_or(ClientError::WalletDisconnected)?;
        let user = self.load_user().await?;
        let spots = self.load_user_spots().await?;

        Ok(Profile {
            address,
            username: user.username,
            is_registered: user.is_registered,
            level: user.level,
            credibility_score: user.credibility_score,
            spots,
        })
    }

    /// A wallet is connected but its account has not registered yet.
    pub fn needs_registration(&self) -> bool {
        self.address().is_some() && !self.lock_state().user.is_registered
    }

    pub(crate) async fn load_user(&self) -> Result<UserRecord> {
        let user = match self.address() {
            None => UserRecord::default(),
            Some(address) => {
                let (_, contract) = self.connected().await?;
                contract.user(address).await?
            }
        };

        self.lock_state().user = user.clone();
        self.events.emit(ClientEvent::UserUpdated {
            is_registered: user.is_registered,
        });
        Ok(user)
    }

    /// Fail with a registration prompt unless the connected account is
    /// registered.  Reads the contract, not cached state.
    pub(crate) async fn require_registered(
        &self,
        contract: &dyn SpotsContract,
        address: Address,
        action: &'static str,
    ) -> Result<UserRecord> {
        let user = contract.user(address).await?;
        if !user.is_registered {
            return Err(ClientError::RegistrationRequired(action));
        }
        Ok(user)
    }
}
