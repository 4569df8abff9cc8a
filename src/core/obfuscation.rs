//! Location obfuscation for public listing display.
//!
//! A listing's true coordinate is displaced by a random bearing and a random
//! distance of at most [`DISPLAY_RADIUS_M`] before it is shown to anyone. The
//! displaced point is computed once, when the listing is created, and stored
//! next to the true one. Recomputing it on read would let a viewer average
//! repeated answers back to the true location.

use rand::RngCore;

use super::coordinate::{Coordinate, GeoError};
use super::distance::EARTH_RADIUS_M;

/// Maximum distance in meters between a true coordinate and its display coordinate
pub const DISPLAY_RADIUS_M: f64 = 200.0;

/// Source of uniform samples in `[0, 1)`
///
/// Any `rand` generator works; tests can substitute [`FixedSource`] to pin
/// the bearing and distance.
pub trait RandomSource {
    fn next_unit(&mut self) -> f64;
}

impl<R: RngCore> RandomSource for R {
    #[inline]
    fn next_unit(&mut self) -> f64 {
        rand::Rng::gen::<f64>(self)
    }
}

/// Replays a fixed list of samples, cycling when exhausted
#[derive(Debug, Clone)]
pub struct FixedSource {
    samples: Vec<f64>,
    next: usize,
}

impl FixedSource {
    pub fn new(samples: Vec<f64>) -> Self {
        Self { samples, next: 0 }
    }
}

impl RandomSource for FixedSource {
    fn next_unit(&mut self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let value = self.samples[self.next % self.samples.len()];
        self.next = self.next.wrapping_add(1);
        value.clamp(0.0, 1.0)
    }
}

/// Derive a display coordinate for `actual` using the thread-local RNG
pub fn obfuscate_location(actual: Coordinate) -> Result<Coordinate, GeoError> {
    obfuscate_location_with(actual, &mut rand::thread_rng())
}

/// Derive a display coordinate for `actual` from the given random source
///
/// The first sample picks the bearing (clockwise from north), the second the
/// distance as a fraction of [`DISPLAY_RADIUS_M`]. The offset is projected
/// along a great circle, so the displacement bound holds at any latitude.
pub fn obfuscate_location_with<S: RandomSource>(
    actual: Coordinate,
    source: &mut S,
) -> Result<Coordinate, GeoError> {
    actual.validate()?;

    let bearing_deg = source.next_unit() * 360.0;
    let distance_m = source.next_unit() * DISPLAY_RADIUS_M;

    let display = destination(actual, bearing_deg, distance_m);

    tracing::trace!(bearing_deg, distance_m, "Obfuscated listing location");

    Ok(display)
}

/// Point reached from `origin` after `distance_m` along a great circle at `bearing_deg`
fn destination(origin: Coordinate, bearing_deg: f64, distance_m: f64) -> Coordinate {
    let lat1 = origin.latitude.to_radians();
    let lon1 = origin.longitude.to_radians();
    let bearing = bearing_deg.to_radians();
    let angular = distance_m / EARTH_RADIUS_M;

    // clamped: rounding near the poles can leave asin's domain
    let sin_lat2 = (lat1.sin() * angular.cos() + lat1.cos() * angular.sin() * bearing.cos()).clamp(-1.0, 1.0);
    let lat2 = sin_lat2.asin();
    let lon2 = lon1
        + (bearing.sin() * angular.sin() * lat1.cos()).atan2(angular.cos() - lat1.sin() * sin_lat2);

    Coordinate::new(lat2.to_degrees().clamp(-90.0, 90.0), wrap_longitude(lon2.to_degrees()))
}

/// Bring a longitude back into [-180, 180] after crossing the antimeridian
#[inline]
fn wrap_longitude(lon: f64) -> f64 {
    if lon > 180.0 {
        lon - 360.0
    } else if lon < -180.0 {
        lon + 360.0
    } else {
        lon
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::distance::haversine_distance;

    const TOLERANCE: f64 = 1.05;

    #[test]
    fn test_display_location_within_radius() {
        let tokyo = Coordinate::new(35.6812, 139.7671);

        for _ in 0..1_000 {
            let display = obfuscate_location(tokyo).unwrap();
            let offset = haversine_distance(tokyo, display);
            assert!(
                offset <= DISPLAY_RADIUS_M * TOLERANCE,
                "Offset {} exceeds radius",
                offset
            );
        }
    }

    #[test]
    fn test_fixed_source_hits_full_radius() {
        let origin = Coordinate::new(40.7128, -74.0060);

        // north, east, south, west at the full radius
        for bearing in [0.0, 0.25, 0.5, 0.75] {
            let mut source = FixedSource::new(vec![bearing, 0.999_999]);
            let display = obfuscate_location_with(origin, &mut source).unwrap();
            let offset = haversine_distance(origin, display);
            assert!((offset - DISPLAY_RADIUS_M).abs() < DISPLAY_RADIUS_M * 0.01, "offset {}", offset);
        }
    }

    #[test]
    fn test_zero_distance_sample_keeps_location() {
        let origin = Coordinate::new(34.6937, 135.5023);
        let mut source = FixedSource::new(vec![0.3, 0.0]);

        let display = obfuscate_location_with(origin, &mut source).unwrap();
        assert!(haversine_distance(origin, display) < 1e-6);
    }

    #[test]
    fn test_north_bearing_moves_latitude_only() {
        let origin = Coordinate::new(0.0, 0.0);
        let mut source = FixedSource::new(vec![0.0, 0.5]);

        let display = obfuscate_location_with(origin, &mut source).unwrap();
        assert!(display.latitude > 0.0);
        assert!(display.longitude.abs() < 1e-9);
    }

    #[test]
    fn test_antimeridian_wraps() {
        let origin = Coordinate::new(0.0, 179.9999);
        // due east
        let mut source = FixedSource::new(vec![0.25, 0.999]);

        let display = obfuscate_location_with(origin, &mut source).unwrap();
        assert!(display.is_valid(), "display {:?} out of range", display);
        assert!(haversine_distance(origin, display) <= DISPLAY_RADIUS_M * TOLERANCE);
    }

    #[test]
    fn test_invalid_coordinate_rejected() {
        let result = obfuscate_location(Coordinate::new(f64::NAN, 139.0));
        assert!(matches!(result, Err(GeoError::InvalidCoordinate { .. })));

        let result = obfuscate_location(Coordinate::new(95.0, 0.0));
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_fixed_source_yields_zero() {
        let mut source = FixedSource::new(vec![]);
        assert_eq!(source.next_unit(), 0.0);
    }
}
