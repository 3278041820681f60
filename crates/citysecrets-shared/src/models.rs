//! Off-chain documents served by the content backend, and the merged
//! view model combining them with on-chain state.
//!
//! Field names follow the backend's camelCase JSON so the structs can be
//! sent and received without an intermediate DTO.

use alloy::primitives::Address;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::MergeError;
use crate::types::{ChainSpot, SpotCategory, SpotId, UserRecord};

// ---------------------------------------------------------------------------
// Spot document
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub city: String,
    pub state: String,
    pub full_address: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// The off-chain half of a spot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpotDocument {
    /// Backend document id. Absent on documents we are about to create.
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
    pub spot_id: SpotId,
    pub creator: Address,
    pub name: String,
    /// Creator's username, denormalised from the `SpotCreated` event.
    #[serde(default)]
    pub username: String,
    pub description: String,
    pub category: SpotCategory,
    pub location: Location,
    #[serde(default)]
    pub photos: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Comment
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spot_id: Option<SpotId>,
    pub commenter: Address,
    #[serde(default)]
    pub username: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Photo upload
// ---------------------------------------------------------------------------

/// A photo picked by the user, not yet hosted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoUpload {
    pub file_name: String,
    pub content_type: String,
    pub data: Bytes,
}

impl PhotoUpload {
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            data: data.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Merged view
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatorCredibility {
    pub score: String,
    pub level: String,
}

/// A display-ready spot: the backend document plus the contract's counters.
///
/// Vote counts and credibility are carried as decimal strings, exactly as
/// read from the contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpotView {
    #[serde(flatten)]
    pub document: SpotDocument,
    pub upvotes: String,
    pub downvotes: String,
    pub category_code: u8,
    pub creator_credibility: CreatorCredibility,
}

impl SpotView {
    /// Join a document with its on-chain spot and the creator's user record.
    ///
    /// The contract is authoritative for the creator address.
    pub fn merge(
        mut document: SpotDocument,
        chain: &ChainSpot,
        creator: &UserRecord,
    ) -> Result<Self, MergeError> {
        if !chain.exists() || chain.id != document.spot_id {
            return Err(MergeError::MissingOnChain(document.spot_id));
        }
        if !creator.is_registered {
            return Err(MergeError::MissingCreator(document.spot_id));
        }

        document.creator = chain.creator;

        Ok(Self {
            document,
            upvotes: chain.upvotes.to_string(),
            downvotes: chain.downvotes.to_string(),
            category_code: chain.category,
            creator_credibility: CreatorCredibility {
                score: creator.credibility_score.to_string(),
                level: creator.level.to_string(),
            },
        })
    }

    pub fn spot_id(&self) -> SpotId {
        self.document.spot_id
    }

    pub fn creator(&self) -> Address {
        self.document.creator
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(id: u64) -> SpotDocument {
        SpotDocument {
            document_id: Some("65f0c0ffee".into()),
            spot_id: SpotId(id),
            creator: Address::ZERO,
            name: "Hidden Cafe".into(),
            username: "alice".into(),
            description: "Back alley espresso".into(),
            category: SpotCategory::FoodBeverages,
            location: Location {
                city: "Austin".into(),
                state: "TX".into(),
                full_address: "1 Main St".into(),
                latitude: 30.27,
                longitude: -97.74,
            },
            photos: vec!["https://cdn.example/p1.jpg".into()],
            created_at: None,
        }
    }

    fn chain_spot(id: u64, creator: Address) -> ChainSpot {
        ChainSpot {
            id: SpotId(id),
            creator,
            upvotes: 12,
            downvotes: 3,
            category: 0,
        }
    }

    fn creator() -> UserRecord {
        UserRecord {
            username: "alice".into(),
            is_registered: true,
            level: 2,
            credibility_score: 14,
        }
    }

    #[test]
    fn merge_stringifies_counters() {
        let owner = Address::repeat_byte(0x11);
        let view = SpotView::merge(document(1), &chain_spot(1, owner), &creator()).unwrap();

        assert_eq!(view.upvotes, "12");
        assert_eq!(view.downvotes, "3");
        assert_eq!(view.creator_credibility.level, "2");
        assert_eq!(view.creator_credibility.score, "14");
        assert_eq!(view.creator(), owner);
    }

    #[test]
    fn merge_rejects_missing_chain_half() {
        let err = SpotView::merge(document(4), &chain_spot(4, Address::ZERO), &creator()).unwrap_err();
        assert_eq!(err, MergeError::MissingOnChain(SpotId(4)));
    }

    #[test]
    fn merge_rejects_mismatched_ids() {
        let owner = Address::repeat_byte(0x11);
        let err = SpotView::merge(document(4), &chain_spot(5, owner), &creator()).unwrap_err();
        assert_eq!(err, MergeError::MissingOnChain(SpotId(4)));
    }

    #[test]
    fn merge_rejects_unregistered_creator() {
        let owner = Address::repeat_byte(0x11);
        let err = SpotView::merge(document(2), &chain_spot(2, owner), &UserRecord::default())
            .unwrap_err();
        assert_eq!(err, MergeError::MissingCreator(SpotId(2)));
    }

    #[test]
    fn document_reads_backend_json() {
        let json = r#"{
            "_id": "65f0c0ffee",
            "spotId": 7,
            "creator": "0x1111111111111111111111111111111111111111",
            "name": "Hidden Cafe",
            "username": "alice",
            "description": "Back alley espresso",
            "category": "FOOD_BEVERAGES",
            "location": {
                "city": "Austin",
                "state": "TX",
                "fullAddress": "1 Main St",
                "latitude": 30.27,
                "longitude": -97.74
            },
            "photos": ["https://cdn.example/p1.jpg"],
            "createdAt": "2024-11-02T10:00:00Z"
        }"#;

        let doc: SpotDocument = serde_json::from_str(json).unwrap();
        assert_eq!(doc.spot_id, SpotId(7));
        assert_eq!(doc.creator, Address::repeat_byte(0x11));
        assert_eq!(doc.location.full_address, "1 Main St");
        assert!(doc.created_at.is_some());
    }

    #[test]
    fn view_flattens_document_fields() {
        let owner = Address::repeat_byte(0x11);
        let view = SpotView::merge(document(1), &chain_spot(1, owner), &creator()).unwrap();
        let value = serde_json::to_value(&view).unwrap();

        assert_eq!(value["spotId"], 1);
        assert_eq!(value["upvotes"], "12");
        assert_eq!(value["creatorCredibility"]["level"], "2");
        assert_eq!(value["location"]["city"], "Austin");
    }
}
