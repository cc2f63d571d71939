//! Store-side implementations of the hotspot engine's capability traits.

use std::sync::Arc;

use async_trait::async_trait;
use outbreak_map_hotspot::{HotspotError, HotspotStore, ReportSource};
use outbreak_map_hotspot_models::Hotspot;
use outbreak_map_report_models::ValidatedReport;
use switchy_database::Database;

use crate::queries;

/// [`ReportSource`] backed by the reports table.
pub struct DbReportSource {
    db: Arc<dyn Database>,
}

impl DbReportSource {
    /// Wraps a database handle as a report source.
    #[must_use]
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ReportSource for DbReportSource {
    async fn fetch_validated_reports(&self) -> Result<Vec<ValidatedReport>, HotspotError> {
        queries::fetch_validated_reports(self.db.as_ref())
            .await
            .map_err(|e| HotspotError::Fetch {
                message: e.to_string(),
            })
    }
}

/// [`HotspotStore`] backed by the hotspots table.
pub struct DbHotspotStore {
    db: Arc<dyn Database>,
}

impl DbHotspotStore {
    /// Wraps a database handle as a hotspot store.
    #[must_use]
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl HotspotStore for DbHotspotStore {
    async fn replace_hotspots(&self, hotspots: &[Hotspot]) -> Result<(), HotspotError> {
        queries::replace_hotspots(self.db.as_ref(), hotspots)
            .await
            .map_err(|e| HotspotError::Materialize {
                message: e.to_string(),
            })
    }
}
