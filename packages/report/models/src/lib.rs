#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Geographic and case-report value types.
//!
//! This crate defines the shared vocabulary for the reporting pipeline:
//! geographic coordinates, report lifecycle status, the full persisted
//! case report, and the read-only projection the hotspot engine consumes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// A geographic coordinate pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoPoint {
    /// Latitude in decimal degrees, valid range [-90, 90].
    pub latitude: f64,
    /// Longitude in decimal degrees, valid range [-180, 180].
    pub longitude: f64,
}

impl GeoPoint {
    /// Creates a new point from raw decimal-degree coordinates.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Returns `true` if both coordinates are finite and within the valid
    /// WGS84 degree ranges.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Planar Euclidean distance to `other` in raw decimal degrees.
    ///
    /// This is deliberately NOT a great-circle (haversine) distance. The
    /// clustering threshold was tuned against degree-distance and the
    /// approximation only holds for points within a small geographic
    /// area; switching to a geodesic metric requires re-tuning the
    /// threshold, not a drop-in substitution.
    #[must_use]
    #[allow(clippy::imprecise_flops, clippy::suboptimal_flops)]
    pub fn distance_to(&self, other: &Self) -> f64 {
        let d_lat = self.latitude - other.latitude;
        let d_lng = self.longitude - other.longitude;
        (d_lat * d_lat + d_lng * d_lng).sqrt()
    }
}

/// Lifecycle status of a case report.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ReportStatus {
    /// Submitted by the public, awaiting review by a health worker.
    Pending,
    /// Confirmed by a health worker; feeds the hotspot engine.
    Validated,
    /// Dismissed by a health worker; never clustered.
    Rejected,
}

/// A full case report row as stored by the report store.
///
/// Owned entirely by the report store; the hotspot engine only ever sees
/// the [`ValidatedReport`] projection and never mutates these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseReport {
    /// Report UUID.
    pub id: String,
    /// Where the case was reported.
    pub location: GeoPoint,
    /// Reported symptoms.
    pub symptoms: Vec<String>,
    /// When the case was reported.
    pub report_date: DateTime<Utc>,
    /// Current lifecycle status.
    pub status: ReportStatus,
    /// Free-form notes from the reporter or reviewer.
    pub notes: Option<String>,
    /// When the row was created.
    pub created_at: DateTime<Utc>,
    /// When the row was last updated (e.g. on validation).
    pub updated_at: DateTime<Utc>,
}

/// Read-only projection of a validated report, consumed by the engine.
///
/// One recompute cycle works from a snapshot of these taken at cycle
/// start; reports validated mid-cycle are picked up by the next cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatedReport {
    /// Report UUID.
    pub id: String,
    /// Where the case was reported.
    pub location: GeoPoint,
    /// When the case was reported.
    pub report_date: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_coordinates_at_range_limits() {
        assert!(GeoPoint::new(90.0, 180.0).is_valid());
        assert!(GeoPoint::new(-90.0, -180.0).is_valid());
        assert!(GeoPoint::new(0.0, 0.0).is_valid());
    }

    #[test]
    fn rejects_out_of_range_coordinates() {
        assert!(!GeoPoint::new(90.1, 0.0).is_valid());
        assert!(!GeoPoint::new(0.0, -180.5).is_valid());
    }

    #[test]
    fn rejects_non_finite_coordinates() {
        assert!(!GeoPoint::new(f64::NAN, 0.0).is_valid());
        assert!(!GeoPoint::new(0.0, f64::INFINITY).is_valid());
    }

    #[test]
    fn distance_is_planar_euclidean_on_degrees() {
        let a = GeoPoint::new(10.0, 125.0);
        let b = GeoPoint::new(10.003, 125.004);
        assert!((a.distance_to(&b) - 0.005).abs() < 1e-12);
    }

    #[test]
    fn distance_is_symmetric() {
        let a = GeoPoint::new(14.5995, 120.9842);
        let b = GeoPoint::new(14.6091, 121.0223);
        assert!((a.distance_to(&b) - b.distance_to(&a)).abs() < f64::EPSILON);
    }

    #[test]
    fn status_round_trips_through_strings() {
        assert_eq!(ReportStatus::Validated.to_string(), "validated");
        assert_eq!(
            "pending".parse::<ReportStatus>().unwrap(),
            ReportStatus::Pending
        );
        assert!("unknown".parse::<ReportStatus>().is_err());
    }
}
