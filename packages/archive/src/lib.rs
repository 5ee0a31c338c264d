#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CSV loaders for the engine's two inputs: the fixed point registry and
//! the cyclone track archive.
//!
//! Both loaders are tolerant at the row level: a malformed row is logged,
//! counted, and skipped; it never aborts the load. The returned skip
//! counts are surfaced in the batch summary for diagnostics.
//!
//! Expected registry columns: `id,lat,lon,install_date,removal_date`
//! (ISO dates, empty meaning unknown/still in service). Expected track
//! columns follow the IBTrACS convention: `storm_id,iso_time,lat,lon,
//! category,wind,gust,pressure,wave_height,basin,subbasin`.

use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::Deserialize;
use storm_exposure_cyclone_models::{RawObservation, StormObservation};
use storm_exposure_exposure::progress::ProgressCallback;
use storm_exposure_registry_models::FixedPoint;
use thiserror::Error;

/// Errors that can occur while loading an archive file.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// The file could not be opened or read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The CSV structure itself (not a single row) is broken.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// A loaded point registry with its skipped-row diagnostic count.
#[derive(Debug, Clone)]
pub struct LoadedRegistry {
    /// Successfully parsed points, in file order.
    pub points: Vec<FixedPoint>,
    /// Rows skipped because of missing or malformed required fields.
    pub skipped: u64,
}

/// A loaded track archive with its skipped-row diagnostic count.
#[derive(Debug, Clone)]
pub struct LoadedArchive {
    /// Successfully parsed observations, in file order (grouped by storm,
    /// time-ordered within each storm).
    pub observations: Vec<StormObservation>,
    /// Rows skipped because of missing or malformed required fields.
    pub skipped: u64,
}

/// A raw registry row before validation.
#[derive(Debug, Clone, Default, Deserialize)]
struct RawPointRow {
    id: Option<String>,
    lat: Option<String>,
    lon: Option<String>,
    install_date: Option<String>,
    removal_date: Option<String>,
}

impl RawPointRow {
    /// Validates this row into a [`FixedPoint`]. Empty dates become
    /// `None`; a non-empty but unparseable date rejects the row rather
    /// than silently changing the point's eligibility.
    fn validate(&self) -> Option<FixedPoint> {
        let id = self
            .id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())?
            .to_string();
        let lat = self.lat.as_deref()?.trim().parse::<f64>().ok()?;
        let lon = self.lon.as_deref()?.trim().parse::<f64>().ok()?;
        if !(-90.0..=90.0).contains(&lat) {
            return None;
        }
        let install_date = parse_optional_date(self.install_date.as_deref())?;
        let removal_date = parse_optional_date(self.removal_date.as_deref())?;
        Some(FixedPoint {
            id,
            lat,
            lon,
            install_date,
            removal_date,
        })
    }
}

/// Parses an optional ISO date cell. Empty is a valid `None`; unparseable
/// non-empty text rejects the row (outer `None`).
fn parse_optional_date(value: Option<&str>) -> Option<Option<NaiveDate>> {
    match value.map(str::trim) {
        None | Some("") => Some(None),
        Some(s) => s.parse::<NaiveDate>().ok().map(Some),
    }
}

/// Loads the point registry from a CSV file.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or the CSV structure is
/// unreadable. Individual malformed rows are skipped and counted, not
/// errors.
pub fn load_registry(path: &Path) -> Result<LoadedRegistry, ArchiveError> {
    let file = std::fs::File::open(path)?;
    let registry = read_registry(file)?;
    log::info!(
        "Loaded {} registry points from {} ({} rows skipped)",
        registry.points.len(),
        path.display(),
        registry.skipped
    );
    Ok(registry)
}

/// Loads the point registry from any CSV reader.
///
/// # Errors
///
/// Returns an error if the CSV structure is unreadable.
pub fn read_registry<R: Read>(reader: R) -> Result<LoadedRegistry, ArchiveError> {
    let mut csv_reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

    let mut points = Vec::new();
    let mut skipped = 0_u64;
    for result in csv_reader.deserialize::<RawPointRow>() {
        let Ok(row) = result else {
            skipped += 1;
            continue;
        };
        match row.validate() {
            Some(point) => points.push(point),
            None => {
                log::warn!("Skipping malformed registry row: {row:?}");
                skipped += 1;
            }
        }
    }

    Ok(LoadedRegistry { points, skipped })
}

/// Loads the track archive from a CSV file.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or the CSV structure is
/// unreadable. Individual malformed rows are skipped and counted, not
/// errors.
pub fn load_track_archive(
    path: &Path,
    progress: Option<&Arc<dyn ProgressCallback>>,
) -> Result<LoadedArchive, ArchiveError> {
    let file = std::fs::File::open(path)?;
    let archive = read_track_archive(file, progress)?;
    log::info!(
        "Loaded {} observations from {} ({} rows skipped)",
        archive.observations.len(),
        path.display(),
        archive.skipped
    );
    Ok(archive)
}

/// Loads the track archive from any CSV reader.
///
/// # Errors
///
/// Returns an error if the CSV structure is unreadable.
pub fn read_track_archive<R: Read>(
    reader: R,
    progress: Option<&Arc<dyn ProgressCallback>>,
) -> Result<LoadedArchive, ArchiveError> {
    let mut csv_reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

    let mut observations = Vec::new();
    let mut skipped = 0_u64;
    for result in csv_reader.deserialize::<RawObservation>() {
        let row = match result {
            Ok(row) => row,
            Err(err) => {
                log::debug!("Skipping unreadable track row: {err}");
                skipped += 1;
                continue;
            }
        };
        match row.validate() {
            Ok(obs) => observations.push(obs),
            Err(err) => {
                log::debug!("Skipping track row: {err}");
                skipped += 1;
            }
        }
        if let Some(progress) = progress {
            progress.inc(1);
        }
    }

    if skipped > 0 {
        log::warn!("Skipped {skipped} malformed track archive rows");
    }
    Ok(LoadedArchive {
        observations,
        skipped,
    })
}
