//! Joins backend documents with their on-chain records.
//!
//! A list of N documents costs 2N contract reads: the spot, then its
//! creator.  Reads run with bounded concurrency and results keep the
//! backend's order.

use std::fmt;
use std::str::FromStr;

use futures::stream::{self, StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};
use tracing::warn;

use citysecrets_chain::SpotsContract;
use citysecrets_shared::{MergeError, SpotDocument, SpotView};

use crate::error::Result;

/// What to do when one document of a list cannot be reconciled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FanoutPolicy {
    /// Fail the whole list on the first error.
    #[default]
    AbortAll,
    /// Drop the failing documents and keep the rest.
    BestEffort,
}

impl FromStr for FanoutPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "abort" | "abort-all" => Ok(Self::AbortAll),
            "best-effort" | "besteffort" => Ok(Self::BestEffort),
            other => Err(format!("unknown fan-out policy: {other}")),
        }
    }
}

impl fmt::Display for FanoutPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AbortAll => f.write_str("abort"),
            Self::BestEffort => f.write_str("best-effort"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Reconciler {
    fanout: usize,
    policy: FanoutPolicy,
}

impl Reconciler {
    pub fn new(fanout: usize, policy: FanoutPolicy) -> Self {
        Self {
            fanout: fanout.max(1),
            policy,
        }
    }

    pub fn policy(&self) -> FanoutPolicy {
        self.policy
    }

    /// Merge one document with its spot and creator records.
    pub async fn merge_one(
        &self,
        contract: &dyn SpotsContract,
        document: SpotDocument,
    ) -> Result<SpotView> {
        let spot = contract.spot(document.spot_id).await?;
        if !spot.exists() {
            return Err(MergeError::MissingOnChain(document.spot_id).into());
        }
        let creator = contract.user(spot.creator).await?;
        Ok(SpotView::merge(document, &spot, &creator)?)
    }

    /// Merge a whole list, preserving its order.
    pub async fn merge_all(
        &self,
        contract: &dyn SpotsContract,
        documents: Vec<SpotDocument>,
    ) -> Result<Vec<SpotView>> {
        let merged = stream::iter(documents)
            .map(|document| {
                let spot_id = document.spot_id;
                async move { (spot_id, self.merge_one(contract, document).await) }
            })
            .buffered(self.fanout);

        match self.policy {
            FanoutPolicy::AbortAll => {
                merged
                    .map(|(_, result)| result)
                    .try_collect::<Vec<_>>()
                    .await
            }
            FanoutPolicy::BestEffort => {
                let views = merged
                    .filter_map(|(spot_id, result)| async move {
                        match result {
                            Ok(view) => Some(view),
                            Err(e) => {
                                warn!(spot_id = %spot_id, error = %e, "Dropping spot that failed to reconcile");
                                None
                            }
                        }
                    })
                    .collect::<Vec<_>>()
                    .await;
                Ok(views)
            }
        }
    }
}
