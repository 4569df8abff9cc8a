// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{Category, ItemStatus, ItemView, NewListing, ParseEnumError, Seller};
pub use requests::{CreateItemRequest, ListItemsQuery, UpdateStatusRequest, ViewerQuery};
pub use responses::{ErrorResponse, HealthResponse, ItemResponse, ListItemsResponse, UpdateStatusResponse};
