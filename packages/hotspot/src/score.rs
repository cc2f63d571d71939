//! Hotspot scoring and materialization from cluster output.

use outbreak_map_hotspot_models::Hotspot;

use crate::cluster::Cluster;

/// Minimum members for a cluster to materialize as a hotspot. A single
/// report does not constitute a hotspot.
pub const MIN_CLUSTER_SIZE: usize = 2;

/// Report count at which intensity saturates at 1.0.
///
/// The linear ramp `count / 10` and its cap are load-bearing for the map
/// frontend's three-band color scale (<0.4 low, 0.4-0.7 medium, >0.7
/// high); neither can change without the banding moving with it.
pub const INTENSITY_SATURATION_COUNT: f64 = 10.0;

/// Converts clusters into the replacement hotspot set.
///
/// Singleton clusters are discarded. Each surviving cluster becomes one
/// hotspot at the cluster centroid, with a fresh UUID — hotspots carry no
/// identity across recompute cycles.
#[must_use]
pub fn score_clusters(clusters: &[Cluster]) -> Vec<Hotspot> {
    clusters
        .iter()
        .filter(|c| c.members.len() >= MIN_CLUSTER_SIZE)
        .filter_map(|c| {
            let last_report_date = c.members.iter().map(|m| m.report_date).max()?;

            #[allow(clippy::cast_possible_truncation)]
            let report_count = c.members.len() as u32;

            Some(Hotspot {
                id: uuid::Uuid::new_v4().to_string(),
                location: c.centroid,
                intensity: (f64::from(report_count) / INTENSITY_SATURATION_COUNT).min(1.0),
                report_count,
                last_report_date,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone as _, Utc};
    use outbreak_map_report_models::{GeoPoint, ValidatedReport};

    fn date(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, day, 12, 0, 0).unwrap()
    }

    fn cluster_of(count: usize) -> Cluster {
        let members = (0..count)
            .map(|i| ValidatedReport {
                id: format!("r{i}"),
                location: GeoPoint::new(10.0, 125.0),
                report_date: date(u32::try_from(i).unwrap() % 28 + 1),
            })
            .collect();
        Cluster {
            centroid: GeoPoint::new(10.0, 125.0),
            members,
        }
    }

    #[test]
    fn singleton_clusters_are_discarded() {
        let hotspots = score_clusters(&[cluster_of(1), cluster_of(2)]);
        assert_eq!(hotspots.len(), 1);
        assert_eq!(hotspots[0].report_count, 2);
    }

    #[test]
    fn intensity_is_linear_in_report_count() {
        let hotspots = score_clusters(&[cluster_of(2), cluster_of(5), cluster_of(7)]);
        assert!((hotspots[0].intensity - 0.2).abs() < f64::EPSILON);
        assert!((hotspots[1].intensity - 0.5).abs() < f64::EPSILON);
        assert!((hotspots[2].intensity - 0.7).abs() < f64::EPSILON);
    }

    #[test]
    fn intensity_caps_at_one() {
        let hotspots = score_clusters(&[cluster_of(12)]);
        assert_eq!(hotspots.len(), 1);
        assert_eq!(hotspots[0].report_count, 12);
        assert!((hotspots[0].intensity - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn last_report_date_is_the_member_maximum() {
        let mut cluster = cluster_of(3);
        cluster.members[0].report_date = date(3);
        cluster.members[1].report_date = date(27);
        cluster.members[2].report_date = date(9);

        let hotspots = score_clusters(&[cluster]);
        assert_eq!(hotspots[0].last_report_date, date(27));
    }

    #[test]
    fn hotspot_location_is_the_cluster_centroid() {
        let mut cluster = cluster_of(2);
        cluster.centroid = GeoPoint::new(14.6091, 121.0223);

        let hotspots = score_clusters(&[cluster]);
        assert_eq!(hotspots[0].location, GeoPoint::new(14.6091, 121.0223));
    }

    #[test]
    fn ids_are_unique_per_materialization() {
        let hotspots = score_clusters(&[cluster_of(2), cluster_of(3)]);
        assert_ne!(hotspots[0].id, hotspots[1].id);
    }
}
