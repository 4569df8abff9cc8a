use serde::Serialize;

use super::coordinate::Coordinate;
use super::distance::haversine_distance;

/// Search radius used when the caller gives none, or an unusable one
pub const DEFAULT_MAX_DISTANCE_M: f64 = 5000.0;

/// Anything with a public display location
pub trait Locatable {
    /// The display coordinate, or `None` if the record has none
    fn display_location(&self) -> Option<Coordinate>;
}

/// A candidate paired with its distance from the viewer
///
/// `distance` is `None` when there was no usable viewer or the candidate's
/// own location is missing or malformed.
#[derive(Debug, Clone, Serialize)]
pub struct DistanceAnnotated<T> {
    #[serde(flatten)]
    pub listing: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
}

impl<T> DistanceAnnotated<T> {
    fn unplaced(listing: T) -> Self {
        Self { listing, distance: None }
    }
}

/// Pick the effective search radius for a requested one
///
/// Only finite, non-negative values are honoured.
#[inline]
pub fn resolve_max_distance(requested: Option<f64>) -> f64 {
    requested
        .filter(|m| m.is_finite() && *m >= 0.0)
        .unwrap_or(DEFAULT_MAX_DISTANCE_M)
}

/// Distance filter and ranking for one viewer
///
/// A viewer with non-finite components counts as absent. Without a viewer
/// nothing is filtered or reordered.
#[derive(Debug, Clone, Copy)]
pub struct ProximityFilter {
    viewer: Option<Coordinate>,
    max_distance_m: f64,
}

impl ProximityFilter {
    pub fn new(viewer: Option<Coordinate>, max_distance_m: Option<f64>) -> Self {
        Self {
            viewer: viewer.filter(Coordinate::is_finite),
            max_distance_m: resolve_max_distance(max_distance_m),
        }
    }

    pub fn viewer(&self) -> Option<Coordinate> {
        self.viewer
    }

    pub fn max_distance_m(&self) -> f64 {
        self.max_distance_m
    }

    /// Distance from the viewer to `target`, if both are usable
    ///
    /// Can still be NaN when far out-of-range coordinates overflow.
    #[inline]
    pub fn distance_to(&self, target: Option<Coordinate>) -> Option<f64> {
        let viewer = self.viewer?;
        let target = target.filter(Coordinate::is_finite)?;
        Some(haversine_distance(viewer, target))
    }

    /// Annotate a single listing without filtering it out
    pub fn annotate<T: Locatable>(&self, listing: T) -> DistanceAnnotated<T> {
        let distance = self.distance_to(listing.display_location());
        DistanceAnnotated { listing, distance }
    }

    /// Filter candidates to the search radius and sort them nearest first
    ///
    /// The radius is inclusive and the sort is stable, so equally distant
    /// candidates keep their input order. Candidates without a usable
    /// location are kept after all placed ones, in input order.
    pub fn apply<T: Locatable>(&self, candidates: Vec<T>) -> Vec<DistanceAnnotated<T>> {
        if self.viewer.is_none() {
            return candidates.into_iter().map(DistanceAnnotated::unplaced).collect();
        }

        let total = candidates.len();
        let mut placed = Vec::with_capacity(total);
        let mut unplaced = Vec::new();

        for candidate in candidates {
            match self.distance_to(candidate.display_location()) {
                Some(distance) if distance <= self.max_distance_m => placed.push(DistanceAnnotated {
                    listing: candidate,
                    distance: Some(distance),
                }),
                Some(distance) if distance.is_nan() => unplaced.push(DistanceAnnotated::unplaced(candidate)),
                Some(_) => {}
                None => unplaced.push(DistanceAnnotated::unplaced(candidate)),
            }
        }

        if !unplaced.is_empty() {
            tracing::warn!("{} listings have no usable display location", unplaced.len());
        }

        placed.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        tracing::debug!(
            "Kept {} of {} listings within {}m",
            placed.len(),
            total,
            self.max_distance_m
        );

        placed.extend(unplaced);
        placed
    }
}

/// Filter `candidates` to `max_distance_m` around `viewer` and rank them by distance
///
/// Shorthand for [`ProximityFilter::apply`].
pub fn filter_and_rank<T: Locatable>(
    viewer: Option<Coordinate>,
    max_distance_m: Option<f64>,
    candidates: Vec<T>,
) -> Vec<DistanceAnnotated<T>> {
    ProximityFilter::new(viewer, max_distance_m).apply(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::distance::EARTH_RADIUS_M;

    #[derive(Debug, Clone, PartialEq)]
    struct Spot {
        id: &'static str,
        location: Option<Coordinate>,
    }

    impl Locatable for Spot {
        fn display_location(&self) -> Option<Coordinate> {
            self.location
        }
    }

    const VIEWER: Coordinate = Coordinate::new(0.0, 0.0);

    /// A point due north of the viewer, no further than `meters` away
    fn north_of_viewer(meters: f64) -> Coordinate {
        let mut lat = (meters / EARTH_RADIUS_M).to_degrees();
        while haversine_distance(VIEWER, Coordinate::new(lat, 0.0)) > meters {
            lat -= 1e-12;
        }
        Coordinate::new(lat, 0.0)
    }

    fn spot(id: &'static str, meters: f64) -> Spot {
        Spot {
            id,
            location: Some(north_of_viewer(meters)),
        }
    }

    fn ids<T>(ranked: &[DistanceAnnotated<T>], id: impl Fn(&T) -> &'static str) -> Vec<&'static str> {
        ranked.iter().map(|r| id(&r.listing)).collect()
    }

    #[test]
    fn test_inclusive_boundary() {
        let candidates = vec![
            spot("5001", 5001.0),
            spot("5000", 5000.0),
            spot("0", 0.0),
            spot("4999", 4999.0),
        ];

        let ranked = filter_and_rank(Some(VIEWER), None, candidates);
        assert_eq!(ids(&ranked, |s: &Spot| s.id), vec!["0", "4999", "5000"]);
    }

    #[test]
    fn test_stable_for_equal_distances() {
        let candidates = vec![spot("b", 100.0), spot("first", 50.0), spot("second", 50.0)];

        let ranked = filter_and_rank(Some(VIEWER), None, candidates);
        assert_eq!(ids(&ranked, |s: &Spot| s.id), vec!["first", "second", "b"]);
    }

    #[test]
    fn test_nan_viewer_passes_through() {
        let candidates = vec![spot("far", 9000.0), spot("near", 10.0)];

        let ranked = filter_and_rank(Some(Coordinate::new(f64::NAN, 139.0)), None, candidates);
        assert_eq!(ids(&ranked, |s: &Spot| s.id), vec!["far", "near"]);
        assert!(ranked.iter().all(|r| r.distance.is_none()));
    }

    #[test]
    fn test_missing_location_placed_last() {
        let candidates = vec![
            Spot { id: "none", location: None },
            spot("mid", 300.0),
            Spot {
                id: "nan",
                location: Some(Coordinate::new(f64::NAN, 0.0)),
            },
            spot("near", 10.0),
        ];

        let ranked = filter_and_rank(Some(VIEWER), None, candidates);
        assert_eq!(ids(&ranked, |s: &Spot| s.id), vec!["near", "mid", "none", "nan"]);
        assert!(ranked[2].distance.is_none());
        assert!(ranked[3].distance.is_none());
    }

    #[test]
    fn test_unmeasurable_distance_placed_last() {
        let candidates = vec![
            Spot {
                id: "huge",
                location: Some(Coordinate::new(f64::MAX, 0.0)),
            },
            Spot {
                id: "same",
                location: Some(Coordinate::new(-f64::MAX, 0.0)),
            },
        ];

        // the latitude difference overflows, so the distance is NaN
        let ranked = filter_and_rank(Some(Coordinate::new(-f64::MAX, 0.0)), None, candidates);
        assert_eq!(ids(&ranked, |s: &Spot| s.id), vec!["same", "huge"]);
        assert_eq!(ranked[0].distance, Some(0.0));
        assert!(ranked[1].distance.is_none());
    }

    #[test]
    fn test_custom_radius() {
        let candidates = vec![spot("a", 900.0), spot("b", 1100.0)];

        let ranked = filter_and_rank(Some(VIEWER), Some(1000.0), candidates);
        assert_eq!(ids(&ranked, |s: &Spot| s.id), vec!["a"]);
    }

    #[test]
    fn test_resolve_max_distance() {
        assert_eq!(resolve_max_distance(None), DEFAULT_MAX_DISTANCE_M);
        assert_eq!(resolve_max_distance(Some(1200.0)), 1200.0);
        assert_eq!(resolve_max_distance(Some(0.0)), 0.0);
        assert_eq!(resolve_max_distance(Some(-1.0)), DEFAULT_MAX_DISTANCE_M);
        assert_eq!(resolve_max_distance(Some(f64::NAN)), DEFAULT_MAX_DISTANCE_M);
        assert_eq!(resolve_max_distance(Some(f64::INFINITY)), DEFAULT_MAX_DISTANCE_M);
    }

    #[test]
    fn test_annotate_keeps_far_listing() {
        let filter = ProximityFilter::new(Some(VIEWER), Some(10.0));
        let annotated = filter.annotate(spot("far", 2000.0));

        let distance = annotated.distance.unwrap();
        assert!((distance - 2000.0).abs() < 1e-3);
    }
}
