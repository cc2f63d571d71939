#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Hotspot types and the recompute-cycle summary.
//!
//! A hotspot is a weighted geographic cluster of validated case reports,
//! materialized for map rendering and risk signaling. Hotspots carry no
//! identity across recompute cycles: each cycle discards the prior set
//! and mints fresh ids, so merge/split tracking is never needed.

use chrono::{DateTime, Utc};
use outbreak_map_report_models::GeoPoint;
use serde::{Deserialize, Serialize};

/// A materialized disease hotspot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hotspot {
    /// Hotspot UUID, freshly generated each recompute cycle.
    pub id: String,
    /// Cluster centroid.
    pub location: GeoPoint,
    /// Risk intensity in [0, 1]; `min(1.0, report_count / 10.0)`.
    pub intensity: f64,
    /// Number of validated reports in the cluster, always >= 2.
    pub report_count: u32,
    /// Most recent report date among the cluster's members.
    pub last_report_date: DateTime<Utc>,
}

/// Successful outcome of one recompute cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecomputeSummary {
    /// Number of hotspots materialized this cycle.
    pub hotspot_count: usize,
    /// Human-readable description of what happened.
    pub message: String,
}

/// Dashboard color band for an intensity value.
///
/// The band boundaries are part of the consumer contract with the map
/// frontend: changing the scoring divisor or cap without moving these
/// boundaries is a breaking change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntensityBand {
    /// Intensity below 0.4.
    Low,
    /// Intensity from 0.4 to 0.7 inclusive.
    Medium,
    /// Intensity above 0.7.
    High,
}

impl IntensityBand {
    /// Maps an intensity value in [0, 1] to its color band.
    #[must_use]
    pub fn from_intensity(intensity: f64) -> Self {
        if intensity > 0.7 {
            Self::High
        } else if intensity >= 0.4 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}
