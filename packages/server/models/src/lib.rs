#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the outbreak map server.

use chrono::{DateTime, Utc};
use outbreak_map_report_models::ReportStatus;
use serde::{Deserialize, Serialize};

/// `GET /api/health` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the server considers itself healthy.
    pub healthy: bool,
    /// Server version.
    pub version: String,
}

/// `POST /api/reports` request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitReportRequest {
    /// Latitude in decimal degrees, must be within [-90, 90].
    pub latitude: f64,
    /// Longitude in decimal degrees, must be within [-180, 180].
    pub longitude: f64,
    /// Reported symptoms; at least one required.
    pub symptoms: Vec<String>,
    /// When the case occurred; defaults to submission time.
    pub report_date: Option<DateTime<Utc>>,
    /// Free-form notes.
    pub notes: Option<String>,
}

/// Query parameters for `GET /api/reports`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportQueryParams {
    /// Filter to a single lifecycle status.
    pub status: Option<ReportStatus>,
}

/// Review action on a pending report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewAction {
    /// Confirm the report; feeds the hotspot engine.
    Validate,
    /// Dismiss the report.
    Reject,
}

/// `PATCH /api/reports` request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewReportRequest {
    /// Report UUID.
    pub id: String,
    /// Whether to validate or reject.
    pub action: ReviewAction,
}

/// Hotspot recomputation status carried in review responses.
///
/// A failed recomputation never fails the review itself — the status
/// change stands and the map serves stale data until the next cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiRecomputeStatus {
    /// Whether a recompute was queued for this review.
    pub queued: bool,
    /// Human-readable detail.
    pub message: String,
}

/// `PATCH /api/reports` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewReportResponse {
    /// Report UUID.
    pub id: String,
    /// Status after the review.
    pub status: ReportStatus,
    /// Hotspot recomputation status for this review.
    pub hotspots: ApiRecomputeStatus,
}

/// Error payload returned with non-2xx responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Human-readable error description.
    pub error: String,
}
