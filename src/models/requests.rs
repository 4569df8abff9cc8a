use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::Coordinate;
use crate::models::domain::{Category, ItemStatus, ParseEnumError};

/// Request to post a new item
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateItemRequest {
    #[validate(length(min = 1, max = 100, message = "title must be 1 to 100 characters"))]
    pub title: String,
    #[validate(length(min = 1, max = 1000, message = "description must be 1 to 1000 characters"))]
    pub description: String,
    pub category: Category,
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub address_display: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
}

impl CreateItemRequest {
    pub fn location(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lng)
    }
}

/// Query string of the listing endpoint
///
/// Numbers arrive as raw strings so that an unparsable value degrades to
/// "not given" instead of rejecting the whole request. A repeated key keeps
/// its first value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(from = "Vec<(String, String)>")]
pub struct ListItemsQuery {
    pub category: Option<String>,
    pub lat: Option<String>,
    pub lng: Option<String>,
    pub max_distance: Option<String>,
}

impl From<Vec<(String, String)>> for ListItemsQuery {
    fn from(pairs: Vec<(String, String)>) -> Self {
        let mut query = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "category" => &mut query.category,
                "lat" => &mut query.lat,
                "lng" => &mut query.lng,
                "maxDistance" => &mut query.max_distance,
                _ => continue,
            };
            slot.get_or_insert(value);
        }
        query
    }
}

impl ListItemsQuery {
    /// The category to filter on; `all` or absent means no filter
    pub fn category_filter(&self) -> Result<Option<Category>, ParseEnumError> {
        match self.category.as_deref().map(str::trim) {
            None | Some("") | Some("all") => Ok(None),
            Some(value) => value.parse().map(Some),
        }
    }

    pub fn viewer(&self) -> Option<Coordinate> {
        Coordinate::from_parts(parse_number(&self.lat), parse_number(&self.lng))
    }

    pub fn max_distance_m(&self) -> Option<f64> {
        parse_number(&self.max_distance)
    }
}

/// Optional viewer position for a single item
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(from = "Vec<(String, String)>")]
pub struct ViewerQuery {
    pub lat: Option<String>,
    pub lng: Option<String>,
}

impl From<Vec<(String, String)>> for ViewerQuery {
    fn from(pairs: Vec<(String, String)>) -> Self {
        let mut query = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "lat" => &mut query.lat,
                "lng" => &mut query.lng,
                _ => continue,
            };
            slot.get_or_insert(value);
        }
        query
    }
}

impl ViewerQuery {
    pub fn viewer(&self) -> Option<Coordinate> {
        Coordinate::from_parts(parse_number(&self.lat), parse_number(&self.lng))
    }
}

/// Request to change an item's status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: ItemStatus,
}

fn parse_number(raw: &Option<String>) -> Option<f64> {
    raw.as_deref()
        .and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|n| n.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_request(title: &str, description: &str) -> CreateItemRequest {
        CreateItemRequest {
            title: title.to_string(),
            description: description.to_string(),
            category: Category::Books,
            lat: 35.6812,
            lng: 139.7671,
            address_display: None,
            images: vec![],
        }
    }

    #[test]
    fn test_valid_create_request() {
        assert!(create_request("Desk lamp", "Works fine").validate().is_ok());
    }

    #[test]
    fn test_title_length_limits() {
        assert!(create_request("", "desc").validate().is_err());
        assert!(create_request(&"a".repeat(100), "desc").validate().is_ok());
        assert!(create_request(&"a".repeat(101), "desc").validate().is_err());
    }

    #[test]
    fn test_description_length_limits() {
        assert!(create_request("t", "").validate().is_err());
        assert!(create_request("t", &"あ".repeat(1000)).validate().is_ok());
        assert!(create_request("t", &"a".repeat(1001)).validate().is_err());
    }

    #[test]
    fn test_unknown_category_rejected_by_json() {
        let json = r#"{"title":"t","description":"d","category":"cars","lat":1.0,"lng":2.0}"#;
        assert!(serde_json::from_str::<CreateItemRequest>(json).is_err());
    }

    #[test]
    fn test_list_query_parsing() {
        let query = ListItemsQuery {
            category: Some("all".to_string()),
            lat: Some("35.68".to_string()),
            lng: Some(" 139.76 ".to_string()),
            max_distance: Some("abc".to_string()),
        };

        assert_eq!(query.category_filter().unwrap(), None);
        assert_eq!(query.viewer(), Some(Coordinate::new(35.68, 139.76)));
        assert_eq!(query.max_distance_m(), None);
    }

    #[test]
    fn test_list_query_bad_viewer_is_absent() {
        let query = ListItemsQuery {
            lat: Some("NaN".to_string()),
            lng: Some("139.0".to_string()),
            ..Default::default()
        };
        assert_eq!(query.viewer(), None);
    }

    #[test]
    fn test_repeated_query_keys_keep_first_value() {
        let query = actix_web::web::Query::<ListItemsQuery>::from_query("lat=35&lat=36&lng=139&maxDistance=800")
            .unwrap()
            .into_inner();
        assert_eq!(query.viewer(), Some(Coordinate::new(35.0, 139.0)));
        assert_eq!(query.max_distance_m(), Some(800.0));

        let query = actix_web::web::Query::<ViewerQuery>::from_query("lng=139&lat=35&lng=140&extra=1")
            .unwrap()
            .into_inner();
        assert_eq!(query.viewer(), Some(Coordinate::new(35.0, 139.0)));
    }

    #[test]
    fn test_unparsable_query_value_is_absent() {
        let query = actix_web::web::Query::<ListItemsQuery>::from_query("lat=abc&lng=139&category=books")
            .unwrap()
            .into_inner();
        assert_eq!(query.viewer(), None);
        assert_eq!(query.category_filter().unwrap(), Some(Category::Books));
    }

    #[test]
    fn test_list_query_category() {
        let query = ListItemsQuery {
            category: Some("furniture".to_string()),
            ..Default::default()
        };
        assert_eq!(query.category_filter().unwrap(), Some(Category::Furniture));

        let query = ListItemsQuery {
            category: Some("cars".to_string()),
            ..Default::default()
        };
        assert!(query.category_filter().is_err());
    }
}
