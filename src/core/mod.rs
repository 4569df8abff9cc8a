// Core algorithm exports
pub mod coordinate;
pub mod distance;
pub mod listing;
pub mod obfuscation;
pub mod proximity;

pub use coordinate::{Coordinate, GeoError};
pub use distance::{format_distance, haversine_distance, EARTH_RADIUS_M};
pub use listing::{prepare_listing, rank_listings};
pub use obfuscation::{obfuscate_location, obfuscate_location_with, FixedSource, RandomSource, DISPLAY_RADIUS_M};
pub use proximity::{
    filter_and_rank, resolve_max_distance, DistanceAnnotated, Locatable, ProximityFilter,
    DEFAULT_MAX_DISTANCE_M,
};
