#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Spatial clustering and hotspot recomputation engine.
//!
//! Turns the set of geolocated, validated case reports into weighted
//! geographic clusters ("hotspots") that drive map visualization and risk
//! signaling. The engine is pure with respect to its inputs: given the
//! same validated-report snapshot it always materializes the same hotspot
//! set (ids aside). Persistence and notification are reached only through
//! the capability traits defined here, so the engine itself never touches
//! a database or a socket.

pub mod cluster;
pub mod recompute;
pub mod score;

use async_trait::async_trait;
use outbreak_map_hotspot_models::Hotspot;
use outbreak_map_report_models::ValidatedReport;
use thiserror::Error;

/// Errors that can occur during a recompute cycle.
#[derive(Debug, Error)]
pub enum HotspotError {
    /// The validated-report snapshot read failed. No hotspot mutation was
    /// attempted.
    #[error("Failed to fetch validated reports: {message}")]
    Fetch {
        /// Description of what went wrong.
        message: String,
    },

    /// The delete/insert materialization step failed, partially or fully.
    /// The persisted hotspot state is store-dependent; the cycle is not
    /// retried automatically.
    #[error("Failed to materialize hotspots: {message}")]
    Materialize {
        /// Description of what went wrong.
        message: String,
    },
}

/// Read capability over the report store.
///
/// Must return every report currently in `validated` status, as a whole-set
/// snapshot (no pagination — report volumes are hundreds, not millions),
/// in a stable order so clustering stays deterministic across calls.
#[async_trait]
pub trait ReportSource: Send + Sync {
    /// Fetches the current full snapshot of validated reports.
    ///
    /// # Errors
    ///
    /// Returns [`HotspotError::Fetch`] if the snapshot read fails.
    async fn fetch_validated_reports(&self) -> Result<Vec<ValidatedReport>, HotspotError>;
}

/// Write capability over the persisted hotspot set.
///
/// The engine is the sole writer of this set. Implementations must delete
/// all existing hotspots and insert the new set, as a single transaction
/// when the backing store supports one.
#[async_trait]
pub trait HotspotStore: Send + Sync {
    /// Replaces the entire persisted hotspot set with `hotspots`.
    ///
    /// # Errors
    ///
    /// Returns [`HotspotError::Materialize`] if the delete or any insert
    /// fails.
    async fn replace_hotspots(&self, hotspots: &[Hotspot]) -> Result<(), HotspotError>;
}

/// Fire-and-forget signal that the hotspot set changed.
///
/// Delivery, ordering, and retry are the sink's responsibility; the engine
/// only promises to call this exactly once per successful recomputation
/// that actually replaced the set.
pub trait HotspotNotifier: Send + Sync {
    /// Signals connected viewers that the hotspot set was replaced.
    fn notify_hotspots_changed(&self);
}
