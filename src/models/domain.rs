use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::core::{Coordinate, Locatable};

/// Raised when a stored or requested enum value is not recognised
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown {kind}: {value}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

/// Item category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Electronics,
    Furniture,
    Clothing,
    Books,
    Hobby,
    Other,
}

impl Category {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Category::Electronics => "electronics",
            Category::Furniture => "furniture",
            Category::Clothing => "clothing",
            Category::Books => "books",
            Category::Hobby => "hobby",
            Category::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "electronics" => Ok(Category::Electronics),
            "furniture" => Ok(Category::Furniture),
            "clothing" => Ok(Category::Clothing),
            "books" => Ok(Category::Books),
            "hobby" => Ok(Category::Hobby),
            "other" => Ok(Category::Other),
            _ => Err(ParseEnumError {
                kind: "category",
                value: s.to_string(),
            }),
        }
    }
}

/// Listing lifecycle status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    #[default]
    Available,
    Reserved,
    Completed,
}

impl ItemStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Available => "available",
            ItemStatus::Reserved => "reserved",
            ItemStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(ItemStatus::Available),
            "reserved" => Ok(ItemStatus::Reserved),
            "completed" => Ok(ItemStatus::Completed),
            _ => Err(ParseEnumError {
                kind: "status",
                value: s.to_string(),
            }),
        }
    }
}

/// A listing about to be stored
///
/// Carries both the owner's true location and the display location derived
/// from it. This type is never serialized; only [`ItemView`] leaves the
/// service.
#[derive(Debug, Clone)]
pub struct NewListing {
    pub owner_id: i64,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub location: Coordinate,
    pub display_location: Coordinate,
    pub address_display: String,
    pub images: Vec<String>,
}

/// Who posted an item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Seller {
    pub user_id: i64,
    pub user_name: String,
    pub user_rating: f64,
    pub user_review_count: i32,
}

/// Public shape of a listing
///
/// Holds the display location only. Stored rows may lack a display location
/// or hold garbage, so both halves are optional here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemView {
    pub id: i64,
    #[serde(flatten)]
    pub seller: Seller,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub display_lat: Option<f64>,
    pub display_lng: Option<f64>,
    pub address_display: Option<String>,
    pub status: ItemStatus,
    pub images: Vec<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Locatable for ItemView {
    fn display_location(&self) -> Option<Coordinate> {
        Coordinate::from_parts(self.display_lat, self.display_lng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_round_trip_names() {
        for category in [
            Category::Electronics,
            Category::Furniture,
            Category::Clothing,
            Category::Books,
            Category::Hobby,
            Category::Other,
        ] {
            assert_eq!(category.as_str().parse::<Category>().unwrap(), category);
        }
        assert!("cars".parse::<Category>().is_err());
    }

    #[test]
    fn test_status_defaults_to_available() {
        assert_eq!(ItemStatus::default(), ItemStatus::Available);
        assert_eq!("reserved".parse::<ItemStatus>().unwrap(), ItemStatus::Reserved);
        let err = "sold".parse::<ItemStatus>().unwrap_err();
        assert_eq!(err.to_string(), "Unknown status: sold");
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&ItemStatus::Completed).unwrap();
        assert_eq!(json, "\"completed\"");
    }
}
