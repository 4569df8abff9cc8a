use serde::{Deserialize, Serialize};

use crate::core::{format_distance, DistanceAnnotated};
use crate::models::domain::ItemView;

/// An item as returned to a viewer, with its distance when one is known
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemResponse {
    #[serde(flatten)]
    pub item: ItemView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    #[serde(rename = "distanceLabel", skip_serializing_if = "Option::is_none")]
    pub distance_label: Option<String>,
}

impl From<DistanceAnnotated<ItemView>> for ItemResponse {
    fn from(value: DistanceAnnotated<ItemView>) -> Self {
        Self {
            item: value.listing,
            distance: value.distance,
            distance_label: value.distance.map(format_distance),
        }
    }
}

impl From<ItemView> for ItemResponse {
    fn from(item: ItemView) -> Self {
        Self {
            item,
            distance: None,
            distance_label: None,
        }
    }
}

/// Response for the listing endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListItemsResponse {
    pub items: Vec<ItemResponse>,
}

/// Response for a status change
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatusResponse {
    pub success: bool,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
