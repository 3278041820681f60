use std::fmt;
use std::str::FromStr;

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// On-chain spot identifier, assigned by the contract at creation time.
/// It is also the join key for the off-chain document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpotId(pub u64);

impl From<u64> for SpotId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for SpotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum SpotCategory {
    FoodBeverages = 0,
    Nature = 1,
    Cultural = 2,
    Photo = 3,
    Historical = 4,
    LocalExperience = 5,
    Nightlife = 6,
    IKnowAPlace = 7,
}

impl SpotCategory {
    pub const ALL: [SpotCategory; 8] = [
        Self::FoodBeverages,
        Self::Nature,
        Self::Cultural,
        Self::Photo,
        Self::Historical,
        Self::LocalExperience,
        Self::Nightlife,
        Self::IKnowAPlace,
    ];

    /// Numeric code understood by `createSpot`.
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.get(code as usize).copied()
    }

    /// Name used in backend documents.
    pub fn name(self) -> &'static str {
        match self {
            Self::FoodBeverages => "FOOD_BEVERAGES",
            Self::Nature => "NATURE",
            Self::Cultural => "CULTURAL",
            Self::Photo => "PHOTO",
            Self::Historical => "HISTORICAL",
            Self::LocalExperience => "LOCAL_EXPERIENCE",
            Self::Nightlife => "NIGHTLIFE",
            Self::IKnowAPlace => "I_KNOW_A_PLACE",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::FoodBeverages => "Food & Beverages",
            Self::Nature => "Nature",
            Self::Cultural => "Cultural",
            Self::Photo => "Photo Spot",
            Self::Historical => "Historical",
            Self::LocalExperience => "Local Experience",
            Self::Nightlife => "Nightlife",
            Self::IKnowAPlace => "I Know a Place",
        }
    }
}

impl FromStr for SpotCategory {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.name() == s)
            .ok_or_else(|| ValidationError::UnknownCategory(s.to_string()))
    }
}

impl fmt::Display for SpotCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The contract's `users(address)` record.
///
/// Addresses that never registered read back as the default value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub username: String,
    pub is_registered: bool,
    pub level: u64,
    pub credibility_score: u64,
}

/// The contract's `spots(id)` record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainSpot {
    pub id: SpotId,
    pub creator: Address,
    pub upvotes: u64,
    pub downvotes: u64,
    pub category: u8,
}

impl ChainSpot {
    /// A spot that was never created (or was deleted) has no creator.
    pub fn exists(&self) -> bool {
        self.creator != Address::ZERO
    }
}

/// Decoded `SpotCreated` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpotCreated {
    pub spot_id: SpotId,
    pub creator: Address,
    pub username: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_codes_follow_declaration_order() {
        for (i, category) in SpotCategory::ALL.iter().enumerate() {
            assert_eq!(category.code() as usize, i);
            assert_eq!(SpotCategory::from_code(i as u8), Some(*category));
        }
        assert_eq!(SpotCategory::from_code(8), None);
    }

    #[test]
    fn category_parses_backend_names() {
        assert_eq!(
            "FOOD_BEVERAGES".parse::<SpotCategory>().unwrap(),
            SpotCategory::FoodBeverages
        );
        assert_eq!(
            "I_KNOW_A_PLACE".parse::<SpotCategory>().unwrap(),
            SpotCategory::IKnowAPlace
        );
        assert_eq!(
            "BEACH".parse::<SpotCategory>(),
            Err(ValidationError::UnknownCategory("BEACH".into()))
        );
    }

    #[test]
    fn category_serde_matches_name() {
        let json = serde_json::to_string(&SpotCategory::LocalExperience).unwrap();
        assert_eq!(json, "\"LOCAL_EXPERIENCE\"");
    }

    #[test]
    fn zero_creator_means_missing_spot() {
        let spot = ChainSpot {
            id: SpotId(3),
            creator: Address::ZERO,
            upvotes: 0,
            downvotes: 0,
            category: 0,
        };
        assert!(!spot.exists());
    }
}
