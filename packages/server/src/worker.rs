//! Single-consumer recompute worker.

use outbreak_map_hotspot::recompute::HotspotEngine;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Spawns the task that drains the recompute queue.
///
/// Exactly one job is sent per report transition into `validated`, and
/// this single consumer runs the cycles strictly one at a time — the
/// serialization discipline that makes the delete-then-insert
/// materialization safe against overlapping review requests. The worker
/// exits when every sender handle is dropped.
///
/// A failed cycle is logged and surfaced nowhere else: the report's
/// validated status must stand regardless, and the map serving stale
/// hotspots until the next cycle is an accepted degraded mode.
pub fn spawn_recompute_worker(
    engine: HotspotEngine,
    mut rx: mpsc::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while rx.recv().await.is_some() {
            match engine.recompute().await {
                Ok(summary) => {
                    log::info!(
                        "Recompute cycle finished: {} ({} hotspots)",
                        summary.message,
                        summary.hotspot_count
                    );
                }
                Err(e) => {
                    log::error!("Recompute cycle failed: {e}");
                }
            }
        }
        log::info!("Recompute worker shutting down");
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use chrono::{TimeZone as _, Utc};
    use outbreak_map_hotspot::{HotspotError, HotspotNotifier, HotspotStore, ReportSource};
    use outbreak_map_hotspot_models::Hotspot;
    use outbreak_map_report_models::{GeoPoint, ValidatedReport};

    use super::*;

    struct StaticSource;

    #[async_trait]
    impl ReportSource for StaticSource {
        async fn fetch_validated_reports(&self) -> Result<Vec<ValidatedReport>, HotspotError> {
            let date = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
            Ok(vec![
                ValidatedReport {
                    id: "a".to_string(),
                    location: GeoPoint::new(10.0, 125.0),
                    report_date: date,
                },
                ValidatedReport {
                    id: "b".to_string(),
                    location: GeoPoint::new(10.0001, 125.0001),
                    report_date: date,
                },
            ])
        }
    }

    /// Store that asserts replace calls never overlap.
    #[derive(Default)]
    struct OverlapDetectingStore {
        in_flight: AtomicBool,
        overlapped: AtomicBool,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl HotspotStore for OverlapDetectingStore {
        async fn replace_hotspots(&self, _hotspots: &[Hotspot]) -> Result<(), HotspotError> {
            if self.in_flight.swap(true, Ordering::SeqCst) {
                self.overlapped.store(true, Ordering::SeqCst);
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
            self.in_flight.store(false, Ordering::SeqCst);
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct NoopNotifier;

    impl HotspotNotifier for NoopNotifier {
        fn notify_hotspots_changed(&self) {}
    }

    #[tokio::test]
    async fn queued_jobs_run_sequentially_never_interleaved() {
        let store = Arc::new(OverlapDetectingStore::default());
        let engine = HotspotEngine::new(
            Arc::new(StaticSource),
            store.clone(),
            Arc::new(NoopNotifier),
        );

        let (tx, rx) = mpsc::channel(8);
        let handle = spawn_recompute_worker(engine, rx);

        for _ in 0..4 {
            tx.send(()).await.unwrap();
        }
        drop(tx);
        handle.await.unwrap();

        assert_eq!(store.calls.load(Ordering::SeqCst), 4);
        assert!(!store.overlapped.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn worker_survives_failed_cycles() {
        struct FailingStore {
            calls: AtomicUsize,
        }

        #[async_trait]
        impl HotspotStore for FailingStore {
            async fn replace_hotspots(&self, _hotspots: &[Hotspot]) -> Result<(), HotspotError> {
                self.calls.fetch_add(1, Ordering::SeqCst);
                Err(HotspotError::Materialize {
                    message: "disk full".to_string(),
                })
            }
        }

        let store = Arc::new(FailingStore {
            calls: AtomicUsize::new(0),
        });
        let engine = HotspotEngine::new(
            Arc::new(StaticSource),
            store.clone(),
            Arc::new(NoopNotifier),
        );

        let (tx, rx) = mpsc::channel(8);
        let handle = spawn_recompute_worker(engine, rx);

        tx.send(()).await.unwrap();
        tx.send(()).await.unwrap();
        drop(tx);
        handle.await.unwrap();

        // Both jobs attempted despite the first failing.
        assert_eq!(store.calls.load(Ordering::SeqCst), 2);
    }
}
