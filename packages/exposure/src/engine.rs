//! Batch driver: one pass over the observation stream against the whole
//! point registry.

use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{Datelike, NaiveDate};
use storm_exposure_cyclone_models::{StormCategory, StormObservation};
use storm_exposure_exposure_models::{EngineConfig, LifetimeExposureRecord};
use storm_exposure_registry_models::FixedPoint;

use crate::accumulator::PointState;
use crate::distance::DistanceModel;
use crate::index::PointIndex;
use crate::progress::ProgressCallback;
use crate::radius::RadiusModel;

/// Diagnostic counters for one batch run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSummary {
    /// Points in the registry.
    pub points: usize,
    /// Observations consumed.
    pub observations: u64,
    /// Distinct storm identifiers seen (passage boundaries).
    pub storms: u64,
    /// Observations that produced no classification (not an error).
    pub unclassified: u64,
    /// Observations where the radius model was degenerate (not an error).
    pub degenerate_radius: u64,
    /// Point-hits recorded (first hits of a passage only).
    pub hits: u64,
    /// Wall time of the pass.
    pub elapsed: Duration,
}

/// Finished batch: one report record per registry point, in registry
/// order, plus the run counters.
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    /// Per-point lifetime exposure records.
    pub records: Vec<LifetimeExposureRecord>,
    /// Run counters.
    pub summary: BatchSummary,
}

/// The exposure engine: configuration plus the two pluggable strategies.
pub struct ExposureEngine {
    config: EngineConfig,
    radius: Box<dyn RadiusModel>,
    distance: Box<dyn DistanceModel>,
}

impl ExposureEngine {
    /// Creates an engine with the strategies named by `config`.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        let radius = crate::radius::for_policy(config.radius_policy);
        let distance = crate::distance::for_policy(config.distance_policy);
        Self {
            config,
            radius,
            distance,
        }
    }

    /// Runs one batch pass.
    ///
    /// The observation slice must be grouped by storm identifier with
    /// non-decreasing timestamps within each group (the archive's
    /// delivery order); passage deduplication relies on each storm's
    /// observations being contiguous. Groups themselves may appear in
    /// any order.
    ///
    /// Re-running over the same inputs produces identical records: the
    /// pass is a pure fold with no ordering-dependent nondeterminism.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn run(
        &self,
        points: &[FixedPoint],
        observations: &[StormObservation],
        progress: Option<&Arc<dyn ProgressCallback>>,
    ) -> BatchOutcome {
        let start = Instant::now();
        let index = PointIndex::build(points);
        let mut states: Vec<PointState> = vec![PointState::default(); points.len()];

        let mut summary = BatchSummary {
            points: points.len(),
            observations: observations.len() as u64,
            storms: 0,
            unclassified: 0,
            degenerate_radius: 0,
            hits: 0,
            elapsed: Duration::ZERO,
        };

        if let Some(progress) = progress {
            progress.set_total(observations.len() as u64);
        }

        // Distinct observation dates per calendar year, used below to
        // credit eligible-but-hit-free years to each point.
        let mut year_dates: BTreeMap<i32, BTreeSet<NaiveDate>> = BTreeMap::new();

        let mut current_storm: Option<&str> = None;
        for obs in observations {
            if current_storm != Some(obs.storm_id.as_str()) {
                current_storm = Some(obs.storm_id.as_str());
                summary.storms += 1;
            }
            year_dates
                .entry(obs.time.year())
                .or_default()
                .insert(obs.time.date_naive());

            self.process_observation(obs, points, &index, &mut states, &mut summary);

            if let Some(progress) = progress {
                progress.inc(1);
            }
        }

        // A calendar year counts as observed for a point whenever any
        // observation date falls inside its service interval, hit or
        // not; empty accumulators keep the per-year spreads and the
        // elapsed-year mean denominator honest for quiet years.
        for (point, state) in points.iter().zip(&mut states) {
            let Some(install) = point.install_date else {
                continue;
            };
            let upper = point
                .removal_date
                .map_or(Bound::Unbounded, Bound::Included);
            for (year, dates) in &year_dates {
                if dates
                    .range((Bound::Included(install), upper))
                    .next()
                    .is_some()
                {
                    state.ensure_year(*year);
                }
            }
        }

        let records: Vec<LifetimeExposureRecord> = states
            .into_iter()
            .zip(points)
            .map(|(state, point)| state.into_record(point))
            .collect();

        summary.elapsed = start.elapsed();
        if let Some(progress) = progress {
            progress.finish(format!(
                "Processed {} observations against {} points",
                summary.observations, summary.points
            ));
        }
        log::info!(
            "Exposure pass: {} storms, {} hits, {} unclassified, {} degenerate radii in {:?}",
            summary.storms,
            summary.hits,
            summary.unclassified,
            summary.degenerate_radius,
            summary.elapsed
        );

        BatchOutcome { records, summary }
    }

    fn process_observation(
        &self,
        obs: &StormObservation,
        points: &[FixedPoint],
        index: &PointIndex,
        states: &mut [PointState],
        summary: &mut BatchSummary,
    ) {
        let Some(category) = StormCategory::classify(
            obs.category_code,
            obs.wind_kt,
            &self.config.category_thresholds_knots,
        ) else {
            summary.unclassified += 1;
            return;
        };

        let Some(radius_m) = self.radius.impact_radius_m(obs, category) else {
            summary.degenerate_radius += 1;
            return;
        };
        if radius_m <= 0.0 {
            summary.degenerate_radius += 1;
            return;
        }

        let date = obs.time.date_naive();
        for point_idx in index.candidates_within(obs.lat, obs.lon, radius_m) {
            let point = &points[point_idx];
            if !point.is_eligible(date) {
                continue;
            }
            let distance_m = self
                .distance
                .distance_m(point.lat, point.lon, obs.lat, obs.lon);
            // Closed boundary: exactly `radius` meters away is a hit.
            if distance_m > radius_m {
                continue;
            }
            if states[point_idx].record_hit(obs, category, self.config.observation_quantum_days)
            {
                summary.hits += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use storm_exposure_cyclone_models::Basin;
    use storm_exposure_exposure_models::{DistancePolicy, MetVariable, RadiusPolicy};

    fn point(id: &str, lat: f64, lon: f64, install: Option<&str>) -> FixedPoint {
        FixedPoint {
            id: id.to_string(),
            lat,
            lon,
            install_date: install.map(|s| s.parse().unwrap()),
            removal_date: None,
        }
    }

    fn obs(storm_id: &str, time: &str, lat: f64, lon: f64, wind_kt: f64) -> StormObservation {
        StormObservation {
            storm_id: storm_id.to_string(),
            time: time.parse::<DateTime<Utc>>().unwrap(),
            lat,
            lon,
            category_code: None,
            wind_kt: Some(wind_kt),
            gust_kt: None,
            pressure_hpa: None,
            wave_height_m: None,
            basin: Basin::NorthAtlantic,
        }
    }

    fn engine() -> ExposureEngine {
        ExposureEngine::new(EngineConfig::default())
    }

    #[test]
    fn end_to_end_single_storm_scenario() {
        // Point P in the Gulf, in service since 2000. First observation
        // sits exactly on P (120 kt, C4, fixed radius 450 km => hit);
        // the second is ~600 km east (no hit).
        let points = vec![point("P", 28.0, -90.0, Some("2000-01-01"))];
        let observations = vec![
            obs("STORM-1", "2005-08-01T00:00:00Z", 28.0, -90.0, 120.0),
            obs("STORM-1", "2005-08-02T00:00:00Z", 28.0, -83.9, 120.0),
        ];

        let outcome = engine().run(&points, &observations, None);
        assert_eq!(outcome.summary.storms, 1);
        assert_eq!(outcome.summary.hits, 1);

        let record = &outcome.records[0];
        let c4 = record
            .categories
            .iter()
            .find(|r| r.category == StormCategory::Cat4)
            .unwrap();
        assert_eq!(c4.count, Some(1));
        assert!((c4.duration_days.unwrap() - 0.24).abs() < 1e-12);

        let wind = record
            .variables
            .iter()
            .find(|v| v.variable == MetVariable::Wind)
            .unwrap();
        assert_eq!(wind.sample_count, Some(1));
        assert_eq!(wind.max, Some(120.0));
    }

    #[test]
    fn hit_boundary_is_closed() {
        // A tropical-storm observation (fixed radius 100 km) against two
        // points due north: one on the boundary (within float tolerance,
        // nudged a hair inward so rounding can't flip the verdict) and
        // one just past it. The hit comparison itself is `<=`, so the
        // boundary is closed.
        let boundary_deg = 100_000.0 / crate::distance::METERS_PER_DEGREE;
        let points = vec![
            point("on", 28.0 + boundary_deg * (1.0 - 1e-9), -90.0, Some("2000-01-01")),
            point("past", 28.0 + boundary_deg * 1.001, -90.0, Some("2000-01-01")),
        ];
        let observations = vec![obs("S", "2005-08-01T00:00:00Z", 28.0, -90.0, 40.0)];

        let outcome = engine().run(&points, &observations, None);
        let counts: Vec<Option<u64>> = outcome
            .records
            .iter()
            .map(|r| {
                r.categories
                    .iter()
                    .find(|c| c.category == StormCategory::Tropical)
                    .unwrap()
                    .count
            })
            .collect();
        assert_eq!(counts, vec![Some(1), Some(0)]);
    }

    #[test]
    fn observations_before_install_date_never_contribute() {
        let points = vec![point("P", 28.0, -90.0, Some("2006-01-01"))];
        let observations = vec![obs("S", "2005-08-01T00:00:00Z", 28.0, -90.0, 120.0)];

        let outcome = engine().run(&points, &observations, None);
        let record = &outcome.records[0];
        assert!(record.eligible);
        assert_eq!(record.years_observed, Some(0));
        for row in &record.categories {
            assert_eq!(row.count, Some(0));
        }
    }

    #[test]
    fn hit_free_eligible_years_widen_yearly_spreads() {
        // One C1 hit in 2004, then a 2005 storm far enough away that the
        // point is never hit again. 2005 still counts as observed, so the
        // yearly C1 count spread spans 0..1 with mean 0.5.
        let points = vec![point("P", 28.0, -90.0, Some("2000-01-01"))];
        let observations = vec![
            obs("STORM-A", "2004-08-01T00:00:00Z", 28.0, -90.0, 70.0),
            obs("STORM-B", "2005-08-01T00:00:00Z", 28.0, -60.0, 70.0),
        ];

        let outcome = engine().run(&points, &observations, None);
        assert_eq!(outcome.summary.hits, 1);

        let record = &outcome.records[0];
        assert_eq!(record.years_observed, Some(2));

        let c1 = record
            .categories
            .iter()
            .find(|r| r.category == StormCategory::Cat1)
            .unwrap();
        assert_eq!(c1.count, Some(1));
        assert_eq!(c1.yearly_count.min, Some(0.0));
        assert_eq!(c1.yearly_count.max, Some(1.0));
        assert!((c1.yearly_count.mean.unwrap() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn storm_across_antimeridian_still_hits() {
        // Storm at 179.95° E, point at 179.95° W: ~11 km apart, well
        // inside the 100 km tropical radius despite the sign flip.
        let points = vec![point("P", 10.0, -179.95, Some("2000-01-01"))];
        let observations = vec![obs("S", "2005-08-01T00:00:00Z", 10.0, 179.95, 40.0)];

        let outcome = engine().run(&points, &observations, None);
        assert_eq!(outcome.summary.hits, 1);
    }

    #[test]
    fn negative_explicit_category_is_unclassified() {
        let points = vec![point("P", 28.0, -90.0, Some("2000-01-01"))];
        let mut o = obs("S", "2005-08-01T00:00:00Z", 28.0, -90.0, 120.0);
        o.category_code = Some(-1);

        let outcome = engine().run(&points, &[o], None);
        assert_eq!(outcome.summary.unclassified, 1);
        assert_eq!(outcome.summary.hits, 0);
    }

    #[test]
    fn statistical_policy_requires_wind() {
        let config = EngineConfig {
            radius_policy: RadiusPolicy::Statistical,
            ..EngineConfig::default()
        };
        let points = vec![point("P", 28.0, -90.0, Some("2000-01-01"))];
        let mut o = obs("S", "2005-08-01T00:00:00Z", 28.0, -90.0, 0.0);
        // Explicit category keeps the observation classified, but zero
        // wind degenerates the statistical radius.
        o.category_code = Some(3);
        o.wind_kt = Some(0.0);

        let outcome = ExposureEngine::new(config).run(&points, &[o], None);
        assert_eq!(outcome.summary.degenerate_radius, 1);
        assert_eq!(outcome.summary.hits, 0);
    }

    #[test]
    fn geodesic_policy_matches_planar_verdict_nearby() {
        let config = EngineConfig {
            distance_policy: DistancePolicy::Geodesic,
            ..EngineConfig::default()
        };
        let points = vec![point("P", 28.0, -90.0, Some("2000-01-01"))];
        let observations = vec![obs("S", "2005-08-01T00:00:00Z", 28.5, -90.5, 120.0)];

        let planar = engine().run(&points, &observations, None);
        let geodesic = ExposureEngine::new(config).run(&points, &observations, None);
        assert_eq!(planar.summary.hits, 1);
        assert_eq!(geodesic.summary.hits, 1);
    }

    #[test]
    fn rerun_is_deterministic() {
        let points = vec![
            point("A", 28.0, -90.0, Some("2000-01-01")),
            point("B", 27.0, -89.0, Some("1990-06-15")),
            point("C", 45.0, -60.0, None),
        ];
        let observations = vec![
            obs("S1", "2004-09-10T00:00:00Z", 27.5, -89.5, 95.0),
            obs("S1", "2004-09-10T06:00:00Z", 27.8, -89.8, 100.0),
            obs("S2", "2005-08-28T00:00:00Z", 27.0, -89.2, 145.0),
        ];

        let first = engine().run(&points, &observations, None);
        let second = engine().run(&points, &observations, None);
        assert_eq!(first.records, second.records);
    }
}
