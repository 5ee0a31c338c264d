#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Tropical cyclone taxonomy types and observation records.
//!
//! This crate defines the canonical Saffir-Simpson category scale, the
//! ocean-basin region taxonomy used by the statistical radius model, and
//! the validated [`StormObservation`] record that the exposure engine
//! consumes. Raw archive rows enter through [`RawObservation`] and are
//! validated exactly once at the parse boundary; downstream code never
//! sees a missing position or timestamp.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use thiserror::Error;

/// Saffir-Simpson intensity category, from tropical storm to category 5.
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
pub enum StormCategory {
    /// Tropical storm strength (below hurricane force).
    Tropical = 0,
    /// Category 1 hurricane.
    Cat1 = 1,
    /// Category 2 hurricane.
    Cat2 = 2,
    /// Category 3 hurricane (major).
    Cat3 = 3,
    /// Category 4 hurricane (major).
    Cat4 = 4,
    /// Category 5 hurricane (major).
    Cat5 = 5,
}

impl StormCategory {
    /// Returns the numeric Saffir-Simpson code of this category (0-5).
    #[must_use]
    pub const fn code(self) -> i32 {
        self as i32
    }

    /// Creates a category from an explicit archive category code.
    ///
    /// # Errors
    ///
    /// Returns an error if the code is not in the range 0-5. Negative
    /// codes mean "not a tropical system" in the archive and are the
    /// caller's responsibility to filter before calling this.
    pub const fn from_code(code: i32) -> Result<Self, InvalidCategoryError> {
        match code {
            0 => Ok(Self::Tropical),
            1 => Ok(Self::Cat1),
            2 => Ok(Self::Cat2),
            3 => Ok(Self::Cat3),
            4 => Ok(Self::Cat4),
            5 => Ok(Self::Cat5),
            _ => Err(InvalidCategoryError { code }),
        }
    }

    /// Classifies an observation from its explicit category code or, when
    /// that is absent, from its maximum sustained wind speed.
    ///
    /// A present but negative code means "not a tropical system" and wins
    /// over any wind speed. With no code, winds below the lowest
    /// threshold classify as `None`.
    #[must_use]
    pub fn classify(
        explicit_code: Option<i32>,
        wind_kt: Option<f64>,
        thresholds: &CategoryThresholds,
    ) -> Option<Self> {
        match explicit_code {
            Some(code) if code >= 0 => Self::from_code(code).ok(),
            Some(_) => None,
            None => Self::from_wind_speed(wind_kt?, thresholds),
        }
    }

    /// Classifies a maximum sustained wind speed (knots) against the
    /// ordered category thresholds. Winds below the tropical-storm
    /// threshold return `None`.
    #[must_use]
    pub fn from_wind_speed(wind_kt: f64, thresholds: &CategoryThresholds) -> Option<Self> {
        let mut category = None;
        for (cat, threshold) in Self::all().iter().zip(thresholds.0) {
            if wind_kt >= threshold {
                category = Some(*cat);
            }
        }
        category
    }

    /// Returns all categories in ascending order of intensity.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Tropical,
            Self::Cat1,
            Self::Cat2,
            Self::Cat3,
            Self::Cat4,
            Self::Cat5,
        ]
    }
}

/// Error returned when attempting to create a [`StormCategory`] from an
/// out-of-range archive code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidCategoryError {
    /// The invalid category code that was provided.
    pub code: i32,
}

impl std::fmt::Display for InvalidCategoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid category code {}: expected 0-5", self.code)
    }
}

impl std::error::Error for InvalidCategoryError {}

/// Wind-speed breakpoints (knots) for the six categories, ascending.
///
/// `thresholds[i]` is the lowest sustained wind speed classified as
/// `StormCategory::all()[i]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryThresholds(pub [f64; 6]);

impl Default for CategoryThresholds {
    fn default() -> Self {
        Self([34.0, 64.0, 83.0, 96.0, 113.0, 137.0])
    }
}

/// Ocean-basin region used to select coefficients in the statistical
/// radius model.
///
/// The eight regions follow the Nederhoff et al. (2019) wind-radii study;
/// [`Basin::Global`] carries the all-region coefficients and is the
/// fallback for unknown archive basin codes.
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
pub enum Basin {
    /// North Atlantic (archive code "NA").
    NorthAtlantic,
    /// Eastern North Pacific (archive code "EP").
    EasternPacific,
    /// Western North Pacific (archive code "WP").
    WesternPacific,
    /// North Indian Ocean (archive code "NI").
    NorthIndian,
    /// South-West Indian Ocean ("SI" west of the "WA" sub-basin split).
    SouthWestIndian,
    /// South-East Indian Ocean ("SI" with the "WA" sub-basin).
    SouthEastIndian,
    /// South Pacific (archive code "SP").
    SouthPacific,
    /// All regions combined; fallback for unknown codes.
    Global,
}

impl Basin {
    /// Maps archive basin/sub-basin codes (IBTrACS convention) to a
    /// region. Unknown or missing codes fall back to [`Self::Global`].
    #[must_use]
    pub fn from_codes(basin: Option<&str>, subbasin: Option<&str>) -> Self {
        match basin.map(str::trim) {
            Some("NA") => Self::NorthAtlantic,
            Some("EP") => Self::EasternPacific,
            Some("WP") => Self::WesternPacific,
            Some("NI") => Self::NorthIndian,
            Some("SP") => Self::SouthPacific,
            Some("SI") => match subbasin.map(str::trim) {
                // "WA" marks the Western Australia sub-basin, which the
                // wind-radii study groups with the South-East Indian.
                Some("WA") => Self::SouthEastIndian,
                _ => Self::SouthWestIndian,
            },
            _ => Self::Global,
        }
    }

    /// Returns all regions.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::NorthAtlantic,
            Self::EasternPacific,
            Self::WesternPacific,
            Self::NorthIndian,
            Self::SouthWestIndian,
            Self::SouthEastIndian,
            Self::SouthPacific,
            Self::Global,
        ]
    }
}

/// A validated tropical-cyclone observation.
///
/// Position and timestamp are guaranteed present; intensity fields are
/// optional because the archive frequently omits them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StormObservation {
    /// Archive storm identifier; one storm passage shares one identifier.
    pub storm_id: String,
    /// Observation timestamp (UTC).
    pub time: DateTime<Utc>,
    /// Latitude in WGS84 degrees.
    pub lat: f64,
    /// Longitude in WGS84 degrees.
    pub lon: f64,
    /// Explicit Saffir-Simpson code if the archive carries one; negative
    /// values mean "not a tropical system".
    pub category_code: Option<i32>,
    /// Maximum sustained wind speed (knots, 10-minute average).
    pub wind_kt: Option<f64>,
    /// Maximum recorded wind gust (knots).
    pub gust_kt: Option<f64>,
    /// Minimum central pressure (hPa).
    pub pressure_hpa: Option<f64>,
    /// Significant wave height (meters).
    pub wave_height_m: Option<f64>,
    /// Ocean-basin region derived from the archive basin/sub-basin codes.
    pub basin: Basin,
}

/// A raw archive row before validation. All fields are optional strings
/// as delivered by the track archive; [`RawObservation::validate`] is the
/// single place missing or malformed fields are handled.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawObservation {
    /// Storm identifier.
    pub storm_id: Option<String>,
    /// Timestamp, ISO 8601 with or without a `T` separator.
    pub iso_time: Option<String>,
    /// Latitude, degrees.
    pub lat: Option<String>,
    /// Longitude, degrees.
    pub lon: Option<String>,
    /// Explicit Saffir-Simpson code (may be negative).
    pub category: Option<String>,
    /// Maximum sustained wind speed, knots.
    pub wind: Option<String>,
    /// Maximum wind gust, knots.
    pub gust: Option<String>,
    /// Minimum central pressure, hPa.
    pub pressure: Option<String>,
    /// Significant wave height, meters.
    pub wave_height: Option<String>,
    /// Basin code (e.g. "NA").
    pub basin: Option<String>,
    /// Sub-basin code (e.g. "GM", "WA").
    pub subbasin: Option<String>,
}

impl RawObservation {
    /// Validates this raw row into a [`StormObservation`].
    ///
    /// Optional meteorological fields that are empty or unparseable
    /// become `None`; only the identifying fields (storm id, timestamp,
    /// position) are required.
    ///
    /// # Errors
    ///
    /// Returns an [`ObservationParseError`] naming the first missing or
    /// malformed required field.
    #[allow(clippy::cast_possible_truncation)]
    pub fn validate(&self) -> Result<StormObservation, ObservationParseError> {
        let storm_id = self
            .storm_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(ObservationParseError::MissingStormId)?;

        let time_str = self
            .iso_time
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ObservationParseError::MissingTimestamp {
                storm_id: storm_id.to_string(),
            })?;
        let time =
            parse_iso_time(time_str).ok_or_else(|| ObservationParseError::InvalidTimestamp {
                storm_id: storm_id.to_string(),
                value: time_str.to_string(),
            })?;

        let (lat, lon) = parse_position(self.lat.as_deref(), self.lon.as_deref()).ok_or_else(
            || ObservationParseError::MissingPosition {
                storm_id: storm_id.to_string(),
            },
        )?;

        Ok(StormObservation {
            storm_id: storm_id.to_string(),
            time,
            lat,
            lon,
            category_code: parse_numeric_field(self.category.as_deref())
                .map(|v: f64| v.round() as i32),
            wind_kt: parse_numeric_field(self.wind.as_deref()),
            gust_kt: parse_numeric_field(self.gust.as_deref()),
            pressure_hpa: parse_numeric_field(self.pressure.as_deref()),
            wave_height_m: parse_numeric_field(self.wave_height.as_deref()),
            basin: Basin::from_codes(self.basin.as_deref(), self.subbasin.as_deref()),
        })
    }
}

/// Error describing why a raw archive row could not become a
/// [`StormObservation`]. Rows failing validation are skipped and counted,
/// never fatal to the batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ObservationParseError {
    /// The row has no storm identifier.
    #[error("observation is missing a storm identifier")]
    MissingStormId,

    /// The row has no timestamp.
    #[error("observation for storm {storm_id} is missing a timestamp")]
    MissingTimestamp {
        /// Storm the row belongs to.
        storm_id: String,
    },

    /// The timestamp could not be parsed.
    #[error("observation for storm {storm_id} has unparseable timestamp {value:?}")]
    InvalidTimestamp {
        /// Storm the row belongs to.
        storm_id: String,
        /// The offending timestamp text.
        value: String,
    },

    /// Latitude or longitude is missing or unparseable.
    #[error("observation for storm {storm_id} is missing a usable position")]
    MissingPosition {
        /// Storm the row belongs to.
        storm_id: String,
    },
}

/// Parses an archive timestamp, accepting `T` or space separated ISO 8601
/// with optional fractional seconds.
#[must_use]
pub fn parse_iso_time(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    None
}

/// Parses lat/lon from optional string fields. Returns `None` if either
/// is missing or unparseable.
#[must_use]
pub fn parse_position(lat: Option<&str>, lon: Option<&str>) -> Option<(f64, f64)> {
    let latitude = lat?.trim().parse::<f64>().ok()?;
    let longitude = lon?.trim().parse::<f64>().ok()?;
    if !(-90.0..=90.0).contains(&latitude) {
        return None;
    }
    Some((latitude, longitude))
}

/// Parses an optional numeric field; empty or unparseable text becomes
/// `None` rather than an error.
#[must_use]
pub fn parse_numeric_field(value: Option<&str>) -> Option<f64> {
    value?.trim().parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(storm_id: &str, time: &str, lat: &str, lon: &str) -> RawObservation {
        RawObservation {
            storm_id: Some(storm_id.to_string()),
            iso_time: Some(time.to_string()),
            lat: Some(lat.to_string()),
            lon: Some(lon.to_string()),
            ..RawObservation::default()
        }
    }

    #[test]
    fn classify_prefers_explicit_code() {
        let thresholds = CategoryThresholds::default();
        // Explicit C1 wins even though the wind says C4.
        assert_eq!(
            StormCategory::classify(Some(1), Some(120.0), &thresholds),
            Some(StormCategory::Cat1)
        );
    }

    #[test]
    fn classify_negative_code_is_not_a_hit() {
        let thresholds = CategoryThresholds::default();
        assert_eq!(
            StormCategory::classify(Some(-1), Some(120.0), &thresholds),
            None
        );
    }

    #[test]
    fn classify_falls_back_to_wind_thresholds() {
        let thresholds = CategoryThresholds::default();
        assert_eq!(
            StormCategory::classify(None, Some(30.0), &thresholds),
            None
        );
        assert_eq!(
            StormCategory::classify(None, Some(34.0), &thresholds),
            Some(StormCategory::Tropical)
        );
        assert_eq!(
            StormCategory::classify(None, Some(82.9), &thresholds),
            Some(StormCategory::Cat1)
        );
        assert_eq!(
            StormCategory::classify(None, Some(113.0), &thresholds),
            Some(StormCategory::Cat4)
        );
        assert_eq!(
            StormCategory::classify(None, Some(120.0), &thresholds),
            Some(StormCategory::Cat4)
        );
        assert_eq!(
            StormCategory::classify(None, Some(150.0), &thresholds),
            Some(StormCategory::Cat5)
        );
    }

    #[test]
    fn classify_without_code_or_wind_is_none() {
        assert_eq!(
            StormCategory::classify(None, None, &CategoryThresholds::default()),
            None
        );
    }

    #[test]
    fn category_code_roundtrip() {
        for cat in StormCategory::all() {
            assert_eq!(StormCategory::from_code(cat.code()), Ok(*cat));
        }
        assert!(StormCategory::from_code(-1).is_err());
        assert!(StormCategory::from_code(6).is_err());
    }

    #[test]
    fn basin_code_mapping() {
        assert_eq!(
            Basin::from_codes(Some("NA"), Some("GM")),
            Basin::NorthAtlantic
        );
        assert_eq!(
            Basin::from_codes(Some("SI"), Some("WA")),
            Basin::SouthEastIndian
        );
        assert_eq!(
            Basin::from_codes(Some("SI"), None),
            Basin::SouthWestIndian
        );
        assert_eq!(Basin::from_codes(Some("??"), None), Basin::Global);
        assert_eq!(Basin::from_codes(None, None), Basin::Global);
    }

    #[test]
    fn validate_accepts_full_row() {
        let mut row = raw("2005236N23285", "2005-08-28 12:00:00", "26.3", "-88.6");
        row.category = Some("5".to_string());
        row.wind = Some("145".to_string());
        row.pressure = Some("909".to_string());
        row.basin = Some("NA".to_string());

        let obs = row.validate().unwrap();
        assert_eq!(obs.storm_id, "2005236N23285");
        assert_eq!(obs.category_code, Some(5));
        assert_eq!(obs.wind_kt, Some(145.0));
        assert_eq!(obs.basin, Basin::NorthAtlantic);
    }

    #[test]
    fn validate_tolerates_missing_met_fields() {
        let obs = raw("X", "2005-08-28T12:00:00", "26.3", "-88.6")
            .validate()
            .unwrap();
        assert_eq!(obs.wind_kt, None);
        assert_eq!(obs.pressure_hpa, None);
        assert_eq!(obs.basin, Basin::Global);
    }

    #[test]
    fn validate_rejects_missing_required_fields() {
        let mut row = raw("X", "2005-08-28 12:00:00", "26.3", "-88.6");
        row.storm_id = None;
        assert_eq!(row.validate(), Err(ObservationParseError::MissingStormId));

        let mut row = raw("X", "not-a-time", "26.3", "-88.6");
        assert!(matches!(
            row.validate(),
            Err(ObservationParseError::InvalidTimestamp { .. })
        ));
        row.iso_time = None;
        assert!(matches!(
            row.validate(),
            Err(ObservationParseError::MissingTimestamp { .. })
        ));

        let row = raw("X", "2005-08-28 12:00:00", "", "-88.6");
        assert!(matches!(
            row.validate(),
            Err(ObservationParseError::MissingPosition { .. })
        ));
    }
}
