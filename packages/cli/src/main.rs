#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Batch entry point for the hurricane-exposure statistics engine.
//!
//! Loads the point registry and track archive from CSV, runs one engine
//! pass, and writes the per-point lifetime exposure report.
//!
//! Uses `indicatif-log-bridge` (via [`storm_exposure_cli_utils::init_logger`])
//! to route `log` output through `indicatif::MultiProgress` so that log
//! lines and progress bars never fight for the terminal.

use std::path::PathBuf;

use clap::Parser;
use storm_exposure_cli_utils::IndicatifProgress;
use storm_exposure_cyclone_models::CategoryThresholds;
use storm_exposure_exposure::ExposureEngine;
use storm_exposure_exposure_models::{DistancePolicy, EngineConfig, RadiusPolicy};
use storm_exposure_report::ReportFormat;

/// Compute per-point hurricane exposure statistics from a point registry
/// and a cyclone track archive.
#[derive(Debug, Parser)]
#[command(name = "storm-exposure", version)]
struct Args {
    /// Point registry CSV (id,lat,lon,install_date,removal_date).
    #[arg(long)]
    points: PathBuf,

    /// Track archive CSV, grouped by storm and time-ordered within each
    /// storm.
    #[arg(long)]
    tracks: PathBuf,

    /// Output report path.
    #[arg(long)]
    out: PathBuf,

    /// Output format: csv or json.
    #[arg(long, default_value = "csv")]
    format: ReportFormat,

    /// Impact radius policy: fixed or statistical.
    #[arg(long, default_value = "fixed")]
    radius_policy: RadiusPolicy,

    /// Distance policy: planar or geodesic.
    #[arg(long, default_value = "planar")]
    distance_policy: DistancePolicy,

    /// Exposure duration credited per hitting observation, in days.
    #[arg(long, default_value_t = 0.24)]
    quantum_days: f64,

    /// Override the six category wind thresholds (knots), ascending,
    /// comma separated.
    #[arg(long, value_delimiter = ',')]
    category_thresholds: Option<Vec<f64>>,
}

/// Validates a `--category-thresholds` override: exactly six breakpoints
/// in strictly ascending order.
fn parse_thresholds(values: Vec<f64>) -> Result<CategoryThresholds, String> {
    let breakpoints: [f64; 6] = values
        .try_into()
        .map_err(|v: Vec<f64>| format!("expected 6 thresholds, got {}", v.len()))?;
    if !breakpoints.windows(2).all(|pair| pair[0] < pair[1]) {
        return Err(format!(
            "thresholds must be strictly ascending, got {breakpoints:?}"
        ));
    }
    Ok(CategoryThresholds(breakpoints))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = storm_exposure_cli_utils::init_logger();
    let args = Args::parse();

    let thresholds = match args.category_thresholds {
        Some(values) => parse_thresholds(values)?,
        None => CategoryThresholds::default(),
    };

    let config = EngineConfig {
        radius_policy: args.radius_policy,
        distance_policy: args.distance_policy,
        observation_quantum_days: args.quantum_days,
        category_thresholds_knots: thresholds,
    };

    let registry = storm_exposure_archive::load_registry(&args.points)?;

    let load_bar = IndicatifProgress::records_bar(&multi, "Loading track archive");
    let archive = storm_exposure_archive::load_track_archive(&args.tracks, Some(&load_bar))?;
    load_bar.finish(format!(
        "Loaded {} observations ({} skipped)",
        archive.observations.len(),
        archive.skipped
    ));

    let engine_bar = IndicatifProgress::records_bar(&multi, "Computing exposure");
    let outcome = ExposureEngine::new(config).run(
        &registry.points,
        &archive.observations,
        Some(&engine_bar),
    );

    storm_exposure_report::write_report(&args.out, args.format, &outcome.records)?;

    log::info!(
        "Done: {} points, {} storms, {} hits, {} skipped archive rows, {:?}",
        outcome.summary.points,
        outcome.summary.storms,
        outcome.summary.hits,
        archive.skipped + registry.skipped,
        outcome.summary.elapsed
    );

    Ok(())
}
