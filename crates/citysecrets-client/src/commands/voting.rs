use tracing::info;

use citysecrets_chain::ChainError;
use citysecrets_shared::SpotId;

use crate::client::SpotsClient;
use crate::error::Result;

impl SpotsClient {
    /// Up- or downvote a spot.  The vote carries the configured payment.
    ///
    /// Registration, a previous vote and ownership are checked against
    /// the contract before anything is sent.
    pub async fn vote_spot(&self, id: SpotId, is_upvote: bool) -> Result<()> {
        let _loading = self.begin();
        let result = self.try_vote_spot(id, is_upvote).await;
        self.report(
            "vote_spot",
            result,
            Some("Vote submitted successfully"),
            "Failed to vote",
        )
    }

    async fn try_vote_spot(&self, id: SpotId, is_upvote: bool) -> Result<()> {
        let (address, contract) = self.connected().await?;
        self.require_registered(contract.as_ref(), address, "voting")
            .await?;

        if contract.has_voted(address, id).await? {
            return Err(ChainError::AlreadyVoted.into());
        }
        let spot = contract.spot(id).await?;
        if !spot.exists() {
            return Err(ChainError::SpotNotFound(id).into());
        }
        if spot.creator == address {
            return Err(ChainError::CannotVoteOwnSpot.into());
        }

        let pending = contract
            .vote_spot(id, is_upvote, self.config.vote_value)
            .await?;
        info!(spot_id = %id, is_upvote, tx = %pending.hash(), "Vote submitted");
        pending.confirm().await?;

        self.refresh_after_change().await;
        self.refresh_detail_if_open(id).await;
        Ok(())
    }
}
