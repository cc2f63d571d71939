//! The recomputation trigger: one full cluster-score-materialize cycle.

use std::sync::Arc;

use outbreak_map_hotspot_models::RecomputeSummary;

use crate::{HotspotError, HotspotNotifier, HotspotStore, ReportSource, cluster, score};

/// Orchestrates one hotspot recomputation cycle over the capability traits.
///
/// Invoked by the report-validation workflow whenever a report transitions
/// into `validated` status; the engine itself never polls or schedules.
/// Each call runs to completion before returning. Calls against an
/// unchanged validated set converge to the same hotspot tuple set, so
/// back-to-back invocations are harmless; callers that want to rule out
/// interleaved materialization should serialize calls through a
/// single-consumer queue (the server does exactly that).
pub struct HotspotEngine {
    source: Arc<dyn ReportSource>,
    store: Arc<dyn HotspotStore>,
    notifier: Arc<dyn HotspotNotifier>,
}

impl HotspotEngine {
    /// Creates an engine over the given capabilities.
    #[must_use]
    pub fn new(
        source: Arc<dyn ReportSource>,
        store: Arc<dyn HotspotStore>,
        notifier: Arc<dyn HotspotNotifier>,
    ) -> Self {
        Self {
            source,
            store,
            notifier,
        }
    }

    /// Recomputes the hotspot set from the current validated-report
    /// snapshot.
    ///
    /// With zero validated reports the cycle is skipped entirely and the
    /// existing hotspot set is left untouched — a stale map is a better
    /// failure mode than an empty one. Otherwise the prior set is fully
    /// replaced and the change notifier fires exactly once.
    ///
    /// # Errors
    ///
    /// Returns [`HotspotError::Fetch`] if the snapshot read fails (no
    /// mutation attempted) or [`HotspotError::Materialize`] if the
    /// replace fails. On failure the notifier is never called; the caller
    /// logs the error and must not let it fail the report validation
    /// itself.
    pub async fn recompute(&self) -> Result<RecomputeSummary, HotspotError> {
        let reports = self.source.fetch_validated_reports().await?;

        if reports.is_empty() {
            log::info!("No validated reports found, hotspot recomputation skipped");
            return Ok(RecomputeSummary {
                hotspot_count: 0,
                message: "no validated reports".to_string(),
            });
        }

        let clusters = cluster::cluster_reports(&reports);
        let hotspots = score::score_clusters(&clusters);

        self.store.replace_hotspots(&hotspots).await?;
        self.notifier.notify_hotspots_changed();

        log::info!(
            "Hotspot recomputation complete: {} hotspots from {} validated reports",
            hotspots.len(),
            reports.len()
        );

        Ok(RecomputeSummary {
            hotspot_count: hotspots.len(),
            message: "hotspot analysis completed successfully".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::{TimeZone as _, Utc};
    use outbreak_map_hotspot_models::Hotspot;
    use outbreak_map_report_models::{GeoPoint, ValidatedReport};

    use super::*;

    struct FakeSource {
        reports: Vec<ValidatedReport>,
        fail: bool,
    }

    #[async_trait]
    impl ReportSource for FakeSource {
        async fn fetch_validated_reports(&self) -> Result<Vec<ValidatedReport>, HotspotError> {
            if self.fail {
                return Err(HotspotError::Fetch {
                    message: "connection refused".to_string(),
                });
            }
            Ok(self.reports.clone())
        }
    }

    #[derive(Default)]
    struct RecordingStore {
        /// Hotspot set from each `replace_hotspots` call, in call order.
        replacements: Mutex<Vec<Vec<Hotspot>>>,
        fail: bool,
    }

    #[async_trait]
    impl HotspotStore for RecordingStore {
        async fn replace_hotspots(&self, hotspots: &[Hotspot]) -> Result<(), HotspotError> {
            if self.fail {
                return Err(HotspotError::Materialize {
                    message: "disk full".to_string(),
                });
            }
            self.replacements
                .lock()
                .unwrap()
                .push(hotspots.to_vec());
            Ok(())
        }
    }

    #[derive(Default)]
    struct CountingNotifier {
        count: AtomicUsize,
    }

    impl HotspotNotifier for CountingNotifier {
        fn notify_hotspots_changed(&self) {
            self.count.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn report(id: &str, lat: f64, lng: f64) -> ValidatedReport {
        ValidatedReport {
            id: id.to_string(),
            location: GeoPoint::new(lat, lng),
            report_date: Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
        }
    }

    fn engine_with(
        reports: Vec<ValidatedReport>,
        source_fails: bool,
        store_fails: bool,
    ) -> (HotspotEngine, Arc<RecordingStore>, Arc<CountingNotifier>) {
        let store = Arc::new(RecordingStore {
            replacements: Mutex::new(Vec::new()),
            fail: store_fails,
        });
        let notifier = Arc::new(CountingNotifier::default());
        let engine = HotspotEngine::new(
            Arc::new(FakeSource {
                reports,
                fail: source_fails,
            }),
            store.clone(),
            notifier.clone(),
        );
        (engine, store, notifier)
    }

    #[tokio::test]
    async fn materializes_one_hotspot_and_notifies_once() {
        let reports = vec![
            report("a", 10.0, 125.0),
            report("b", 10.0001, 125.0001),
            report("c", 10.0, 126.0),
        ];
        let (engine, store, notifier) = engine_with(reports, false, false);

        let summary = engine.recompute().await.unwrap();
        assert_eq!(summary.hotspot_count, 1);

        let replacements = store.replacements.lock().unwrap();
        assert_eq!(replacements.len(), 1);
        assert_eq!(replacements[0].len(), 1);
        assert_eq!(replacements[0][0].report_count, 2);
        assert!((replacements[0][0].intensity - 0.2).abs() < f64::EPSILON);
        assert_eq!(notifier.count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn empty_snapshot_skips_without_touching_the_store() {
        let (engine, store, notifier) = engine_with(Vec::new(), false, false);

        let summary = engine.recompute().await.unwrap();
        assert_eq!(summary.hotspot_count, 0);
        assert_eq!(summary.message, "no validated reports");

        assert!(store.replacements.lock().unwrap().is_empty());
        assert_eq!(notifier.count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn fetch_failure_neither_mutates_nor_notifies() {
        let (engine, store, notifier) = engine_with(Vec::new(), true, false);

        let err = engine.recompute().await.unwrap_err();
        assert!(matches!(err, HotspotError::Fetch { .. }));

        assert!(store.replacements.lock().unwrap().is_empty());
        assert_eq!(notifier.count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn materialization_failure_does_not_notify() {
        let reports = vec![report("a", 10.0, 125.0), report("b", 10.0001, 125.0001)];
        let (engine, _store, notifier) = engine_with(reports, false, true);

        let err = engine.recompute().await.unwrap_err();
        assert!(matches!(err, HotspotError::Materialize { .. }));
        assert_eq!(notifier.count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn recompute_is_idempotent_over_an_unchanged_snapshot() {
        let reports = vec![
            report("a", 10.0, 125.0),
            report("b", 10.0001, 125.0001),
            report("c", 10.005, 125.005),
            report("d", 11.0, 125.0),
        ];
        let (engine, store, _notifier) = engine_with(reports, false, false);

        engine.recompute().await.unwrap();
        engine.recompute().await.unwrap();

        let replacements = store.replacements.lock().unwrap();
        assert_eq!(replacements.len(), 2);

        let tuples = |set: &[Hotspot]| {
            set.iter()
                .map(|h| (h.location, h.report_count, h.intensity))
                .collect::<Vec<_>>()
        };
        // Ids differ per cycle; the (location, count, intensity) tuples
        // must not.
        assert_eq!(tuples(&replacements[0]), tuples(&replacements[1]));
    }

    #[tokio::test]
    async fn twelve_dense_reports_cap_intensity() {
        let reports: Vec<_> = (0..12)
            .map(|i| {
                let offset = f64::from(i) * 0.0001;
                report(&format!("r{i}"), 10.0 + offset, 125.0 + offset)
            })
            .collect();
        let (engine, store, _notifier) = engine_with(reports, false, false);

        let summary = engine.recompute().await.unwrap();
        assert_eq!(summary.hotspot_count, 1);

        let replacements = store.replacements.lock().unwrap();
        assert_eq!(replacements[0][0].report_count, 12);
        assert!((replacements[0][0].intensity - 1.0).abs() < f64::EPSILON);
    }
}
