//! Per-point exposure accumulation.
//!
//! [`PointState`] walks the observation stream for one point. A storm
//! passage is deduplicated through an explicit [`PassageState`]: the
//! first eligible, classified, spatially-hitting observation of a
//! passage records a hit in its category; later observations of the same
//! passage only add exposure duration and meteorological samples.
//!
//! Year accumulators are keyed by calendar year and folded into the
//! lifetime record when the batch finishes, so year detection stays
//! correct for grouped-then-concatenated streams whose storm groups are
//! not globally time-sorted.

use std::collections::BTreeMap;

use chrono::Datelike;
use storm_exposure_cyclone_models::{StormCategory, StormObservation};
use storm_exposure_exposure_models::{
    CATEGORY_COUNT, CategoryReport, LifetimeExposureRecord, MetVariable, RunningStats,
    StatSummary, VARIABLE_COUNT, VariableReport, YearAccumulator,
};
use storm_exposure_registry_models::FixedPoint;

/// Hit state for the storm passage currently being walked.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PassageState {
    /// No hit recorded for the current passage.
    #[default]
    NotHit,
    /// The passage has already hit this point; further observations add
    /// duration to the recorded category but never another count.
    HitRecorded {
        /// Storm identifier of the passage.
        storm_id: String,
        /// Category recorded at the passage's first hit.
        category: StormCategory,
    },
}

/// Transient accumulation state for one point during a batch run.
#[derive(Debug, Clone, Default)]
pub struct PointState {
    passage: PassageState,
    years: BTreeMap<i32, YearAccumulator>,
}

impl PointState {
    /// Records one eligible, classified, spatially-hitting observation.
    ///
    /// Returns `true` when this was the first hit of the storm passage
    /// (i.e. a new hit count was recorded).
    pub fn record_hit(
        &mut self,
        obs: &StormObservation,
        category: StormCategory,
        quantum_days: f64,
    ) -> bool {
        let recorded = match &self.passage {
            PassageState::HitRecorded { storm_id, category } if *storm_id == obs.storm_id => {
                Some(*category)
            }
            _ => None,
        };
        let first_of_passage = recorded.is_none();
        let category = recorded.unwrap_or(category);
        if first_of_passage {
            self.passage = PassageState::HitRecorded {
                storm_id: obs.storm_id.clone(),
                category,
            };
        }

        let year = self
            .years
            .entry(obs.time.year())
            .or_insert_with_key(|y| YearAccumulator::new(*y));

        if first_of_passage {
            year.record_passage(category);
        }
        year.add_duration(category, quantum_days);
        year.record_sample(MetVariable::Wind, obs.wind_kt);
        year.record_sample(MetVariable::Gust, obs.gust_kt);
        year.record_sample(MetVariable::Pressure, obs.pressure_hpa);
        year.record_sample(MetVariable::WaveHeight, obs.wave_height_m);

        first_of_passage
    }

    /// Ensures a (possibly empty) accumulator exists for `year`.
    ///
    /// Called by the driver for every calendar year in which the point
    /// was in service while the archive had observations, so hit-free
    /// years still count toward `years_observed` and contribute zeros
    /// to the per-year count and duration spreads.
    pub fn ensure_year(&mut self, year: i32) {
        self.years
            .entry(year)
            .or_insert_with_key(|y| YearAccumulator::new(*y));
    }

    /// Folds all outstanding year accumulators, in ascending year order,
    /// into the finished lifetime record for `point`.
    ///
    /// A point without a service record yields an all-null report: with
    /// no install date, "how long was it exposed" is unanswerable.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub fn into_record(self, point: &FixedPoint) -> LifetimeExposureRecord {
        if !point.has_service_record() {
            return Self::unobserved_record(point);
        }

        let mut category_counts = [0_u64; CATEGORY_COUNT];
        let mut category_durations = [0.0_f64; CATEGORY_COUNT];
        let mut yearly_counts = [RunningStats::default(); CATEGORY_COUNT];
        let mut yearly_durations = [RunningStats::default(); CATEGORY_COUNT];

        let mut samples = [RunningStats::default(); VARIABLE_COUNT];
        let mut nulls = [0_u64; VARIABLE_COUNT];
        let mut yearly_mins = [RunningStats::default(); VARIABLE_COUNT];
        let mut yearly_maxes = [RunningStats::default(); VARIABLE_COUNT];
        let mut yearly_sums = [RunningStats::default(); VARIABLE_COUNT];
        let mut yearly_means = [RunningStats::default(); VARIABLE_COUNT];

        let years_observed = self.years.len() as u32;

        for year in self.years.values() {
            for i in 0..CATEGORY_COUNT {
                category_counts[i] += u64::from(year.category_counts[i]);
                category_durations[i] += year.category_duration_days[i];
                yearly_counts[i].record(f64::from(year.category_counts[i]));
                yearly_durations[i].record(year.category_duration_days[i]);
            }
            for i in 0..VARIABLE_COUNT {
                samples[i].merge(&year.variables[i]);
                nulls[i] += year.variable_nulls[i];
                let stats = &year.variables[i];
                // Per-year aggregates only exist for years where the
                // variable was actually sampled.
                if let (Some(min), Some(max), Some(mean)) = (stats.min, stats.max, stats.mean())
                {
                    yearly_mins[i].record(min);
                    yearly_maxes[i].record(max);
                    yearly_sums[i].record(stats.sum);
                    yearly_means[i].record(mean);
                }
            }
        }

        let categories = StormCategory::all()
            .iter()
            .map(|cat| {
                let i = *cat as usize;
                CategoryReport {
                    category: *cat,
                    count: Some(category_counts[i]),
                    duration_days: Some(category_durations[i]),
                    yearly_count: StatSummary::from(&yearly_counts[i]),
                    yearly_duration: StatSummary::from(&yearly_durations[i]),
                }
            })
            .collect();

        let variables = MetVariable::all()
            .iter()
            .map(|var| {
                let i = var.index();
                VariableReport {
                    variable: *var,
                    sample_count: Some(samples[i].count),
                    null_count: Some(nulls[i]),
                    sum: (!samples[i].is_empty()).then_some(samples[i].sum),
                    min: samples[i].min,
                    max: samples[i].max,
                    mean: samples[i].mean(),
                    yearly_min: StatSummary::from(&yearly_mins[i]),
                    yearly_max: StatSummary::from(&yearly_maxes[i]),
                    yearly_sum: StatSummary::from(&yearly_sums[i]),
                    yearly_mean: StatSummary::from(&yearly_means[i]),
                }
            })
            .collect();

        LifetimeExposureRecord {
            point_id: point.id.clone(),
            lat: point.lat,
            lon: point.lon,
            install_date: point.install_date,
            removal_date: point.removal_date,
            eligible: true,
            years_observed: Some(years_observed),
            categories,
            variables,
        }
    }

    fn unobserved_record(point: &FixedPoint) -> LifetimeExposureRecord {
        LifetimeExposureRecord {
            point_id: point.id.clone(),
            lat: point.lat,
            lon: point.lon,
            install_date: point.install_date,
            removal_date: point.removal_date,
            eligible: false,
            years_observed: None,
            categories: StormCategory::all()
                .iter()
                .map(|cat| CategoryReport::unobserved(*cat))
                .collect(),
            variables: MetVariable::all()
                .iter()
                .map(|var| VariableReport::unobserved(*var))
                .collect(),
        }
    }
}
