#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Fixed geographic point registry types.
//!
//! A [`FixedPoint`] is a stationary asset (platform, buoy, station) with
//! a WGS84 position and a service interval. Exposure statistics are only
//! meaningful while the point was in service, so the eligibility rule
//! lives here next to the dates it reads.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A fixed geographic point with a service lifespan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixedPoint {
    /// Stable registry identifier.
    pub id: String,
    /// Latitude in WGS84 degrees.
    pub lat: f64,
    /// Longitude in WGS84 degrees.
    pub lon: f64,
    /// Date the point entered service. `None` means the install date is
    /// unknown, which makes the point permanently ineligible: without it
    /// the exposure window is unanswerable.
    pub install_date: Option<NaiveDate>,
    /// Date the point left service. `None` means still in service.
    pub removal_date: Option<NaiveDate>,
}

impl FixedPoint {
    /// Returns whether a timestamped observation falls inside this
    /// point's service interval.
    ///
    /// Both interval endpoints are inclusive. A point without an install
    /// date is never eligible.
    #[must_use]
    pub fn is_eligible(&self, date: NaiveDate) -> bool {
        let Some(install) = self.install_date else {
            return false;
        };
        if date < install {
            return false;
        }
        match self.removal_date {
            Some(removal) => date <= removal,
            None => true,
        }
    }

    /// Returns whether this point can ever accumulate exposure (it has a
    /// known install date).
    #[must_use]
    pub const fn has_service_record(&self) -> bool {
        self.install_date.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(install: Option<&str>, removal: Option<&str>) -> FixedPoint {
        FixedPoint {
            id: "P-1".to_string(),
            lat: 28.0,
            lon: -90.0,
            install_date: install.map(|s| s.parse().unwrap()),
            removal_date: removal.map(|s| s.parse().unwrap()),
        }
    }

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn no_install_date_is_never_eligible() {
        let p = point(None, None);
        assert!(!p.is_eligible(date("2005-08-01")));
        assert!(!p.has_service_record());
    }

    #[test]
    fn open_ended_interval_is_eligible_from_install() {
        let p = point(Some("2000-01-01"), None);
        assert!(!p.is_eligible(date("1999-12-31")));
        assert!(p.is_eligible(date("2000-01-01")));
        assert!(p.is_eligible(date("2030-06-15")));
    }

    #[test]
    fn closed_interval_includes_both_endpoints() {
        let p = point(Some("2000-01-01"), Some("2010-12-31"));
        assert!(p.is_eligible(date("2000-01-01")));
        assert!(p.is_eligible(date("2010-12-31")));
        assert!(!p.is_eligible(date("2011-01-01")));
    }
}
