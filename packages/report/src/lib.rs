#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Report emitter: serializes finished [`LifetimeExposureRecord`]s.
//!
//! Two formats: a flat CSV with one row per point (null statistics become
//! empty cells, so "never observed" is distinguishable from an observed
//! zero) and pretty-printed JSON of the full record structure.

use std::io::Write;
use std::path::Path;

use storm_exposure_exposure_models::{LifetimeExposureRecord, StatSummary};
use strum_macros::{Display, EnumString};
use thiserror::Error;

/// Errors that can occur while emitting a report.
#[derive(Debug, Error)]
pub enum ReportError {
    /// The output file could not be created or written.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV serialization failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Output format selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum ReportFormat {
    /// One flat row per point.
    #[default]
    Csv,
    /// Full nested record structure.
    Json,
}

/// Writes the report to `path` in the given format.
///
/// # Errors
///
/// Returns an error if the file cannot be created or serialization
/// fails.
pub fn write_report(
    path: &Path,
    format: ReportFormat,
    records: &[LifetimeExposureRecord],
) -> Result<(), ReportError> {
    let file = std::fs::File::create(path)?;
    match format {
        ReportFormat::Csv => write_csv(file, records)?,
        ReportFormat::Json => write_json(file, records)?,
    }
    log::info!(
        "Wrote {} exposure records to {} ({format})",
        records.len(),
        path.display()
    );
    Ok(())
}

/// Writes the report as pretty-printed JSON.
///
/// # Errors
///
/// Returns an error if serialization or the underlying writer fails.
pub fn write_json<W: Write>(writer: W, records: &[LifetimeExposureRecord]) -> Result<(), ReportError> {
    serde_json::to_writer_pretty(writer, records)?;
    Ok(())
}

/// Writes the report as a flat CSV, one row per point.
///
/// # Errors
///
/// Returns an error if serialization or the underlying writer fails.
pub fn write_csv<W: Write>(writer: W, records: &[LifetimeExposureRecord]) -> Result<(), ReportError> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    if let Some(first) = records.first() {
        csv_writer.write_record(header(first))?;
        for record in records {
            csv_writer.write_record(row(record))?;
        }
    }
    csv_writer.flush()?;
    Ok(())
}

/// Column names, derived from the first record's category/variable rows
/// (all records share the same shape).
fn header(record: &LifetimeExposureRecord) -> Vec<String> {
    let mut columns = vec![
        "point_id".to_string(),
        "lat".to_string(),
        "lon".to_string(),
        "install_date".to_string(),
        "removal_date".to_string(),
        "eligible".to_string(),
        "years_observed".to_string(),
    ];
    for cat in &record.categories {
        let prefix = cat.category.as_ref().to_lowercase();
        columns.push(format!("{prefix}_count"));
        columns.push(format!("{prefix}_duration_days"));
        push_summary_header(&mut columns, &format!("{prefix}_yearly_count"));
        push_summary_header(&mut columns, &format!("{prefix}_yearly_duration"));
    }
    for var in &record.variables {
        let prefix = var.variable.as_ref().to_lowercase();
        columns.push(format!("{prefix}_sample_count"));
        columns.push(format!("{prefix}_null_count"));
        columns.push(format!("{prefix}_sum"));
        columns.push(format!("{prefix}_min"));
        columns.push(format!("{prefix}_max"));
        columns.push(format!("{prefix}_mean"));
        push_summary_header(&mut columns, &format!("{prefix}_yearly_min"));
        push_summary_header(&mut columns, &format!("{prefix}_yearly_max"));
        push_summary_header(&mut columns, &format!("{prefix}_yearly_sum"));
        push_summary_header(&mut columns, &format!("{prefix}_yearly_mean"));
    }
    columns
}

fn push_summary_header(columns: &mut Vec<String>, prefix: &str) {
    for suffix in ["min", "max", "sum", "mean"] {
        columns.push(format!("{prefix}_{suffix}"));
    }
}

fn row(record: &LifetimeExposureRecord) -> Vec<String> {
    let mut cells = vec![
        record.point_id.clone(),
        record.lat.to_string(),
        record.lon.to_string(),
        record
            .install_date
            .map(|d| d.to_string())
            .unwrap_or_default(),
        record
            .removal_date
            .map(|d| d.to_string())
            .unwrap_or_default(),
        record.eligible.to_string(),
        opt_cell(record.years_observed.map(f64::from)),
    ];
    for cat in &record.categories {
        cells.push(opt_int_cell(cat.count));
        cells.push(opt_cell(cat.duration_days));
        push_summary_row(&mut cells, &cat.yearly_count);
        push_summary_row(&mut cells, &cat.yearly_duration);
    }
    for var in &record.variables {
        cells.push(opt_int_cell(var.sample_count));
        cells.push(opt_int_cell(var.null_count));
        cells.push(opt_cell(var.sum));
        cells.push(opt_cell(var.min));
        cells.push(opt_cell(var.max));
        cells.push(opt_cell(var.mean));
        push_summary_row(&mut cells, &var.yearly_min);
        push_summary_row(&mut cells, &var.yearly_max);
        push_summary_row(&mut cells, &var.yearly_sum);
        push_summary_row(&mut cells, &var.yearly_mean);
    }
    cells
}

fn push_summary_row(cells: &mut Vec<String>, summary: &StatSummary) {
    cells.push(opt_cell(summary.min));
    cells.push(opt_cell(summary.max));
    cells.push(opt_cell(summary.sum));
    cells.push(opt_cell(summary.mean));
}

/// Formats an optional float cell; `None` becomes the empty string.
fn opt_cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Formats an optional integer cell; `None` becomes the empty string.
fn opt_int_cell(value: Option<u64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}
