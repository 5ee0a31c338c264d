#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Exposure statistics types, the per-point report record, and the
//! engine configuration.
//!
//! Statistics are two-level: a [`YearAccumulator`] collects one calendar
//! year of hits and meteorological samples for one point, and the
//! finished [`LifetimeExposureRecord`] carries both lifetime totals and
//! min/max/sum/mean taken *across* the per-year aggregates.
//!
//! Every emitted statistic is an `Option`: `None` means "never observed",
//! which the report layer serializes as null/empty so it can never be
//! confused with an observed zero.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use storm_exposure_cyclone_models::{CategoryThresholds, StormCategory};
use strum_macros::{AsRefStr, Display, EnumString};

/// Number of Saffir-Simpson categories tracked (tropical through C5).
pub const CATEGORY_COUNT: usize = 6;
/// Number of meteorological variables tracked per observation.
pub const VARIABLE_COUNT: usize = 4;

/// Default exposure duration credited per hitting observation, in days.
/// Reflects the ~5.5-hour nominal sampling cadence of the track archive.
pub const DEFAULT_OBSERVATION_QUANTUM_DAYS: f64 = 0.24;

/// Meteorological variable tracked per observation.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum MetVariable {
    /// Maximum sustained wind speed (knots).
    Wind,
    /// Maximum recorded wind gust (knots).
    Gust,
    /// Minimum central pressure (hPa).
    Pressure,
    /// Significant wave height (meters).
    WaveHeight,
}

impl MetVariable {
    /// Returns all variables in report order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Wind, Self::Gust, Self::Pressure, Self::WaveHeight]
    }

    /// Array index for this variable in per-variable state tables.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Running count/sum/min/max over a stream of valid samples.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunningStats {
    /// Number of valid samples recorded.
    pub count: u64,
    /// Sum of all samples.
    pub sum: f64,
    /// Smallest sample, `None` until the first sample arrives.
    pub min: Option<f64>,
    /// Largest sample, `None` until the first sample arrives.
    pub max: Option<f64>,
}

impl RunningStats {
    /// Folds one sample into the running statistics.
    pub fn record(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
        self.min = Some(self.min.map_or(value, |m| m.min(value)));
        self.max = Some(self.max.map_or(value, |m| m.max(value)));
    }

    /// Folds another set of running statistics into this one.
    pub fn merge(&mut self, other: &Self) {
        if other.is_empty() {
            return;
        }
        self.count += other.count;
        self.sum += other.sum;
        self.min = match (self.min, other.min) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        self.max = match (self.max, other.max) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
    }

    /// Mean of the recorded samples, `None` with zero samples.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }

    /// Whether any sample has been recorded.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Finished min/max/sum/mean of one per-year statistic taken across all
/// observed years. All-`None` when no year contributed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatSummary {
    /// Minimum of the per-year values.
    pub min: Option<f64>,
    /// Maximum of the per-year values.
    pub max: Option<f64>,
    /// Sum of the per-year values.
    pub sum: Option<f64>,
    /// Mean of the per-year values.
    pub mean: Option<f64>,
}

impl From<&RunningStats> for StatSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            min: stats.min,
            max: stats.max,
            sum: (!stats.is_empty()).then_some(stats.sum),
            mean: stats.mean(),
        }
    }
}

/// One calendar year of exposure for one point.
///
/// One accumulator exists for every calendar year in which the point was
/// in service while the archive had observations (hit or not); all are
/// folded into the lifetime record when the batch finishes.
#[derive(Debug, Clone, PartialEq)]
pub struct YearAccumulator {
    /// Calendar year this accumulator covers.
    pub year: i32,
    /// Storm hits per category.
    pub category_counts: [u32; CATEGORY_COUNT],
    /// Accumulated exposure duration per category, in days.
    pub category_duration_days: [f64; CATEGORY_COUNT],
    /// Running stats per meteorological variable for this year.
    pub variables: [RunningStats; VARIABLE_COUNT],
    /// Missing-sample count per variable among hitting observations.
    pub variable_nulls: [u64; VARIABLE_COUNT],
}

impl YearAccumulator {
    /// Creates an empty accumulator for one calendar year.
    #[must_use]
    pub fn new(year: i32) -> Self {
        Self {
            year,
            category_counts: [0; CATEGORY_COUNT],
            category_duration_days: [0.0; CATEGORY_COUNT],
            variables: [RunningStats::default(); VARIABLE_COUNT],
            variable_nulls: [0; VARIABLE_COUNT],
        }
    }

    /// Records the first hit of a storm passage in `category`.
    pub fn record_passage(&mut self, category: StormCategory) {
        self.category_counts[category as usize] += 1;
    }

    /// Adds one observation quantum of exposure duration to `category`.
    pub fn add_duration(&mut self, category: StormCategory, days: f64) {
        self.category_duration_days[category as usize] += days;
    }

    /// Folds one meteorological sample (or its absence) into this year.
    pub fn record_sample(&mut self, variable: MetVariable, value: Option<f64>) {
        match value {
            Some(v) => self.variables[variable.index()].record(v),
            None => self.variable_nulls[variable.index()] += 1,
        }
    }
}

/// Lifetime exposure for one category: total count and duration plus
/// min/max/sum/mean across the per-year count and duration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryReport {
    /// Category this row describes.
    pub category: StormCategory,
    /// Lifetime hit count, `None` for ineligible points.
    pub count: Option<u64>,
    /// Lifetime exposure duration in days, `None` for ineligible points.
    pub duration_days: Option<f64>,
    /// Spread of the per-year hit counts.
    pub yearly_count: StatSummary,
    /// Spread of the per-year durations.
    pub yearly_duration: StatSummary,
}

impl CategoryReport {
    /// An all-null report row for an ineligible point.
    #[must_use]
    pub fn unobserved(category: StormCategory) -> Self {
        Self {
            category,
            count: None,
            duration_days: None,
            yearly_count: StatSummary::default(),
            yearly_duration: StatSummary::default(),
        }
    }
}

/// Lifetime exposure for one meteorological variable: direct sample
/// statistics plus min/max/sum/mean across each per-year aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableReport {
    /// Variable this row describes.
    pub variable: MetVariable,
    /// Count of valid samples over the point's lifetime.
    pub sample_count: Option<u64>,
    /// Count of hitting observations where the variable was absent.
    pub null_count: Option<u64>,
    /// Sum of all valid samples.
    pub sum: Option<f64>,
    /// Smallest valid sample.
    pub min: Option<f64>,
    /// Largest valid sample.
    pub max: Option<f64>,
    /// Mean of all valid samples.
    pub mean: Option<f64>,
    /// Spread across years of the per-year minimum.
    pub yearly_min: StatSummary,
    /// Spread across years of the per-year maximum.
    pub yearly_max: StatSummary,
    /// Spread across years of the per-year sum.
    pub yearly_sum: StatSummary,
    /// Spread across years of the per-year mean.
    pub yearly_mean: StatSummary,
}

impl VariableReport {
    /// An all-null report row for an ineligible point.
    #[must_use]
    pub fn unobserved(variable: MetVariable) -> Self {
        Self {
            variable,
            sample_count: None,
            null_count: None,
            sum: None,
            min: None,
            max: None,
            mean: None,
            yearly_min: StatSummary::default(),
            yearly_max: StatSummary::default(),
            yearly_sum: StatSummary::default(),
            yearly_mean: StatSummary::default(),
        }
    }
}

/// The finished per-point exposure report record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifetimeExposureRecord {
    /// Registry identifier of the point.
    pub point_id: String,
    /// Latitude in WGS84 degrees.
    pub lat: f64,
    /// Longitude in WGS84 degrees.
    pub lon: f64,
    /// Install date carried through from the registry.
    pub install_date: Option<NaiveDate>,
    /// Removal date carried through from the registry.
    pub removal_date: Option<NaiveDate>,
    /// Whether the point was eligible at all (has an install date).
    /// Ineligible points report every statistic as null.
    pub eligible: bool,
    /// Number of distinct calendar years with recorded exposure.
    pub years_observed: Option<u32>,
    /// Per-category exposure rows, ascending category order.
    pub categories: Vec<CategoryReport>,
    /// Per-variable exposure rows, report order.
    pub variables: Vec<VariableReport>,
}

/// Impact radius policy selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RadiusPolicy {
    /// Fixed per-category radius table.
    #[default]
    Fixed,
    /// Log-normal radius-of-maximum-winds estimator keyed by region,
    /// wind speed, and latitude.
    Statistical,
}

/// Distance metric selection for the spatial hit test.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DistancePolicy {
    /// Local equirectangular approximation on a spherical Earth.
    /// Adequate at cyclone-impact scales and the default.
    #[default]
    Planar,
    /// True geodesic distance on the WGS84 ellipsoid.
    Geodesic,
}

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Which impact radius model to use.
    pub radius_policy: RadiusPolicy,
    /// Which distance metric to use for the hit test.
    pub distance_policy: DistancePolicy,
    /// Exposure duration credited per hitting observation, in days.
    pub observation_quantum_days: f64,
    /// Wind-speed breakpoints for classification without an explicit
    /// category code.
    pub category_thresholds_knots: CategoryThresholds,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            radius_policy: RadiusPolicy::default(),
            distance_policy: DistancePolicy::default(),
            observation_quantum_days: DEFAULT_OBSERVATION_QUANTUM_DAYS,
            category_thresholds_knots: CategoryThresholds::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn running_stats_track_min_max_sum_mean() {
        let mut stats = RunningStats::default();
        assert!(stats.is_empty());
        assert_eq!(stats.mean(), None);

        for v in [3.0, -1.0, 7.0] {
            stats.record(v);
        }
        assert_eq!(stats.count, 3);
        assert_eq!(stats.min, Some(-1.0));
        assert_eq!(stats.max, Some(7.0));
        assert!((stats.mean().unwrap() - 3.0).abs() < 1e-12);
    }

    #[test]
    fn stat_summary_from_empty_stats_is_all_none() {
        let summary = StatSummary::from(&RunningStats::default());
        assert_eq!(summary, StatSummary::default());
    }

    #[test]
    fn year_accumulator_records_hits_and_samples() {
        let mut year = YearAccumulator::new(2005);
        year.record_passage(StormCategory::Cat3);
        year.add_duration(StormCategory::Cat3, 0.24);
        year.add_duration(StormCategory::Cat3, 0.24);
        year.record_sample(MetVariable::Wind, Some(120.0));
        year.record_sample(MetVariable::Gust, None);

        assert_eq!(year.category_counts[StormCategory::Cat3 as usize], 1);
        assert!(
            (year.category_duration_days[StormCategory::Cat3 as usize] - 0.48).abs() < 1e-12
        );
        assert_eq!(year.variables[MetVariable::Wind.index()].count, 1);
        assert_eq!(year.variable_nulls[MetVariable::Gust.index()], 1);
    }

    #[test]
    fn engine_config_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.radius_policy, RadiusPolicy::Fixed);
        assert_eq!(config.distance_policy, DistancePolicy::Planar);
        assert!((config.observation_quantum_days - 0.24).abs() < f64::EPSILON);
    }
}
