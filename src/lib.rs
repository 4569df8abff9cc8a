//! Nearby Market - local classifieds with privacy-preserving locations
//!
//! Listings are shown at a randomly displaced display location instead of
//! the owner's address, and browsed through a distance filter that ranks
//! them nearest first for the viewer.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{
    filter_and_rank, haversine_distance, obfuscate_location, Coordinate, DistanceAnnotated, GeoError,
    ProximityFilter,
};
pub use models::{CreateItemRequest, ItemView, ListItemsQuery, NewListing};
