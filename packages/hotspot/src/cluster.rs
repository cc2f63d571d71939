//! Incremental spatial clustering of validated reports.
//!
//! Single-linkage incremental assignment: each report joins the first
//! existing cluster whose current centroid is within the distance
//! threshold, or starts a new cluster. The pass is O(n·k) over n reports
//! and k clusters — fine at the hundreds-of-reports scale this system
//! operates at, so no spatial index is used.

use outbreak_map_report_models::{GeoPoint, ValidatedReport};

/// Maximum centroid distance, in raw decimal degrees, for a report to join
/// an existing cluster. Roughly 1 km at equatorial latitudes.
///
/// Tuned empirically against planar Euclidean degree-distance; must be
/// re-tuned if the distance metric ever changes.
pub const DISTANCE_THRESHOLD: f64 = 0.01;

/// A transient cluster of validated reports.
///
/// Exists only for the duration of one clustering pass; never persisted.
/// The centroid is the running arithmetic mean of the members' coordinates,
/// maintained incrementally as members are added.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    /// Running mean of the members' coordinates.
    pub centroid: GeoPoint,
    /// Members in assignment order.
    pub members: Vec<ValidatedReport>,
}

/// Groups reports into clusters by centroid proximity.
///
/// Deterministic with respect to input order. Assignment is first-fit in
/// cluster-creation order, not nearest-fit: when a report is within the
/// threshold of several centroids it joins the earliest-created one. This
/// matches the behavior the dashboard was calibrated against.
///
/// Reports with out-of-range or non-finite coordinates are skipped with a
/// warning rather than failing the pass — a corrupt centroid is worse than
/// a missing report. Coordinate range validation proper belongs to report
/// submission, upstream of this engine.
#[must_use]
pub fn cluster_reports(reports: &[ValidatedReport]) -> Vec<Cluster> {
    let mut clusters: Vec<Cluster> = Vec::new();

    for report in reports {
        if !report.location.is_valid() {
            log::warn!(
                "Skipping report {} with malformed coordinates ({}, {})",
                report.id,
                report.location.latitude,
                report.location.longitude
            );
            continue;
        }

        let candidate = clusters
            .iter_mut()
            .find(|c| report.location.distance_to(&c.centroid) <= DISTANCE_THRESHOLD);

        if let Some(cluster) = candidate {
            cluster.members.push(report.clone());

            // Incremental running mean with n = member count after adding.
            // Kept in exactly this form (not a full recompute) so rounding
            // matches the cumulative-mean behavior under member ordering.
            #[allow(clippy::cast_precision_loss)]
            let n = cluster.members.len() as f64;
            #[allow(clippy::suboptimal_flops)]
            let centroid = GeoPoint::new(
                (cluster.centroid.latitude * (n - 1.0) + report.location.latitude) / n,
                (cluster.centroid.longitude * (n - 1.0) + report.location.longitude) / n,
            );
            cluster.centroid = centroid;
        } else {
            clusters.push(Cluster {
                centroid: report.location,
                members: vec![report.clone()],
            });
        }
    }

    clusters
}
