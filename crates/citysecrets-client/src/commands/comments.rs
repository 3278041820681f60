use tracing::info;

use citysecrets_backend::NewComment;
use citysecrets_shared::validation::validate_comment;
use citysecrets_shared::{Comment, SpotId};

use crate::client::SpotsClient;
use crate::error::Result;

impl SpotsClient {
    /// Post a comment as the connected account and return the spot's
    /// updated comment list.
    pub async fn add_comment(&self, id: SpotId, content: &str) -> Result<Vec<Comment>> {
        let _loading = self.begin();
        let result = self.try_add_comment(id, content).await;
        self.report(
            "add_comment",
            result,
            Some("Comment added successfully"),
            "Failed to add comment",
        )
    }

    async fn try_add_comment(&self, id: SpotId, content: &str) -> Result<Vec<Comment>> {
        let content = validate_comment(content)?;
        let (address, contract) = self.connected().await?;
        let user = self
            .require_registered(contract.as_ref(), address, "commenting")
            .await?;

        self.backend
            .add_comment(
                id,
                &NewComment {
                    commenter: address,
                    content,
                    username: user.username,
                },
            )
            .await?;
        info!(spot_id = %id, "Comment added");

        let comments = self.backend.list_comments(id).await?;
        {
            let mut state = self.lock_state();
            if let Some(detail) = state.spot_detail.as_mut() {
                if detail.spot.spot_id() == id {
                    detail.comments = comments.clone();
                }
            }
        }
        Ok(comments)
    }
}
