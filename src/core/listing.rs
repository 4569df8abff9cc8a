use crate::models::{CreateItemRequest, ItemView, NewListing};

use super::coordinate::GeoError;
use super::obfuscation::{obfuscate_location_with, RandomSource};
use super::proximity::{DistanceAnnotated, ProximityFilter};

/// Turn a validated create request into a listing ready for storage
///
/// This is the only place a display location is derived. Later reads and
/// status updates reuse the stored value.
pub fn prepare_listing<S: RandomSource>(
    owner_id: i64,
    request: CreateItemRequest,
    source: &mut S,
) -> Result<NewListing, GeoError> {
    let location = request.location();
    let display_location = obfuscate_location_with(location, source)?;

    Ok(NewListing {
        owner_id,
        title: request.title,
        description: request.description,
        category: request.category,
        location,
        display_location,
        address_display: request.address_display.unwrap_or_default(),
        images: request.images,
    })
}

/// Rank fetched listings for a viewer
///
/// Candidates come in newest first; with a usable viewer they leave nearest
/// first, trimmed to the filter's radius.
pub fn rank_listings(
    filter: &ProximityFilter,
    candidates: Vec<ItemView>,
) -> Vec<DistanceAnnotated<ItemView>> {
    filter.apply(candidates)
}
