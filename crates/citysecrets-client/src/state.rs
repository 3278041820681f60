//! View state held by the client.
//!
//! [`ClientState`] lives behind a mutex inside [`crate::SpotsClient`];
//! commands replace whole collections after each refresh and views read
//! cloned snapshots.

use serde::Serialize;

use citysecrets_shared::{Address, Comment, SpotView, UserRecord};

/// A single spot opened in the detail view, with its comments.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpotDetail {
    pub spot: SpotView,
    pub comments: Vec<Comment>,
}

/// Central client state.
#[derive(Debug, Clone, Default)]
pub struct ClientState {
    /// Every spot, or the result of the last city search.
    pub spots: Vec<SpotView>,

    /// Spots created by the connected account.
    pub user_spots: Vec<SpotView>,

    /// The spot currently opened in the detail view.
    pub spot_detail: Option<SpotDetail>,

    /// On-chain record of the connected account.  Default (unregistered)
    /// while no wallet is connected.
    pub user: UserRecord,

    /// City the `spots` list is filtered by, if any.
    pub search_city: Option<String>,

    /// Commands currently running.  Loading while non-zero.
    pub pending: usize,
}

impl ClientState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loading(&self) -> bool {
        self.pending > 0
    }

    /// `spots` ranked by upvotes, highest first.  Ties keep backend order.
    pub fn spots_by_upvotes(&self) -> Vec<SpotView> {
        let mut ranked = self.spots.clone();
        ranked.sort_by_key(|spot| std::cmp::Reverse(spot.upvotes.parse::<u64>().unwrap_or(0)));
        ranked
    }

    /// Forget everything tied to the previous account.
    pub fn clear_account(&mut self) {
        self.user = UserRecord::default();
        self.user_spots.clear();
    }
}

/// Profile page snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub address: Address,
    pub username: String,
    pub is_registered: bool,
    pub level: u64,
    pub credibility_score: u64,
    pub spots: Vec<SpotView>,
}
