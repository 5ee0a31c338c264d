//! In-memory R-tree index over the fixed point registry.
//!
//! Built once per batch and queried per observation: an axis-aligned
//! envelope around the storm position, inflated to cover the impact
//! radius in degrees, yields candidate points; the exact distance test
//! runs only on those candidates.

use rstar::{AABB, RTree, RTreeObject};
use storm_exposure_registry_models::FixedPoint;

use crate::distance::METERS_PER_DEGREE;

/// Extra envelope inflation so the degree-space bounding box always
/// covers the metric radius despite projection differences.
const ENVELOPE_MARGIN: f64 = 1.05;

/// A registry point stored in the R-tree with its index into the
/// registry slice.
struct PointEntry {
    index: usize,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for PointEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Pre-built spatial index over the point registry.
pub struct PointIndex {
    tree: RTree<PointEntry>,
}

impl PointIndex {
    /// Builds the index from the registry. Entry indexes refer back into
    /// the given slice.
    #[must_use]
    pub fn build(points: &[FixedPoint]) -> Self {
        let entries = points
            .iter()
            .enumerate()
            .map(|(index, point)| PointEntry {
                index,
                envelope: AABB::from_point([point.lon, point.lat]),
            })
            .collect();
        let tree = RTree::bulk_load(entries);
        log::debug!("Built point index over {} registry points", points.len());
        Self { tree }
    }

    /// Returns registry indexes of all points whose position can lie
    /// within `radius_m` of `(lat, lon)`. Over-approximates; callers
    /// must run the exact distance test.
    #[must_use]
    pub fn candidates_within(&self, lat: f64, lon: f64, radius_m: f64) -> Vec<usize> {
        let lat_margin = radius_m / METERS_PER_DEGREE * ENVELOPE_MARGIN;
        // Longitude degrees shrink with latitude; clamp the cosine so
        // near-polar observations stay finite.
        let cos_lat = lat.to_radians().cos().max(0.01);
        let lon_margin = radius_m / (METERS_PER_DEGREE * cos_lat) * ENVELOPE_MARGIN;

        let lo = lon - lon_margin;
        let hi = lon + lon_margin;

        // A query window crossing the antimeridian splits into two
        // envelopes, one per side, so points stored near the opposite
        // longitude sign still surface as candidates.
        let mut envelopes = Vec::with_capacity(2);
        if lo < -180.0 {
            envelopes.push(AABB::from_corners([-180.0, lat - lat_margin], [hi, lat + lat_margin]));
            envelopes.push(AABB::from_corners(
                [lo + 360.0, lat - lat_margin],
                [180.0, lat + lat_margin],
            ));
        } else if hi > 180.0 {
            envelopes.push(AABB::from_corners([lo, lat - lat_margin], [180.0, lat + lat_margin]));
            envelopes.push(AABB::from_corners(
                [-180.0, lat - lat_margin],
                [hi - 360.0, lat + lat_margin],
            ));
        } else {
            envelopes.push(AABB::from_corners([lo, lat - lat_margin], [hi, lat + lat_margin]));
        }

        let mut found: Vec<usize> = envelopes
            .iter()
            .flat_map(|envelope| self.tree.locate_in_envelope_intersecting(envelope))
            .map(|entry| entry.index)
            .collect();
        found.sort_unstable();
        found.dedup();
        found
    }
}
