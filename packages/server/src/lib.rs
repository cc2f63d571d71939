#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the outbreak map application.
//!
//! Serves the report submission/review REST API and the hotspot read
//! endpoint for the map frontend, plus an SSE stream that tells connected
//! viewers to refresh when the hotspot set changes.
//!
//! Hotspot recomputation is decoupled from the review request path: a
//! review that validates a report enqueues one job on a bounded channel,
//! and a single worker task drains the queue sequentially. One consumer
//! means materialization runs are never interleaved, so map readers only
//! ever see a consistent prior or current hotspot set.

mod handlers;
mod worker;

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use outbreak_map_database::{DEFAULT_DB_PATH, DbHotspotStore, DbReportSource, open_db};
use outbreak_map_hotspot::HotspotNotifier;
use outbreak_map_hotspot::recompute::HotspotEngine;
use std::path::Path;
use switchy_database::Database;
use tokio::sync::{broadcast, mpsc};

pub use worker::spawn_recompute_worker;

/// Capacity of the recompute job queue. Jobs are coalescing in effect
/// (each runs against the full current snapshot), so a small backlog
/// bound is plenty.
const RECOMPUTE_QUEUE_CAPACITY: usize = 32;

/// Capacity of the SSE event fan-out. Lagging subscribers drop old
/// events and resync on the next one.
const EVENT_CHANNEL_CAPACITY: usize = 16;

/// [`HotspotNotifier`] that fans out to SSE subscribers via a broadcast
/// channel. Fire-and-forget: with no subscribers the send result is
/// ignored.
pub struct BroadcastNotifier {
    tx: broadcast::Sender<()>,
}

impl BroadcastNotifier {
    /// Wraps a broadcast sender as a notifier.
    #[must_use]
    pub const fn new(tx: broadcast::Sender<()>) -> Self {
        Self { tx }
    }
}

impl HotspotNotifier for BroadcastNotifier {
    fn notify_hotspots_changed(&self) {
        // Err just means no connected subscribers right now.
        let _ = self.tx.send(());
    }
}

/// Shared application state.
pub struct AppState {
    /// Database connection.
    pub db: Arc<dyn Database>,
    /// Sender side of the single-consumer recompute queue.
    pub recompute_tx: mpsc::Sender<()>,
    /// Hotspots-changed fan-out for the SSE endpoint.
    pub events: broadcast::Sender<()>,
}

/// Starts the outbreak map API server.
///
/// Opens the `SQLite` database (path from `OUTBREAK_DB_PATH`, defaulting
/// to `data/outbreak.db`), spawns the recompute worker, and binds the
/// HTTP server on `BIND_ADDR`/`PORT`. This is a regular async function —
/// the caller provides the async runtime (e.g. via `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an `std::io::Result` error if the HTTP server fails to bind or
/// encounters a runtime error.
///
/// # Panics
///
/// Panics if the database cannot be opened or its schema cannot be
/// created.
#[allow(clippy::future_not_send)]
pub async fn run_server() -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let db_path = std::env::var("OUTBREAK_DB_PATH").unwrap_or_else(|_| DEFAULT_DB_PATH.to_string());
    log::info!("Opening database at {db_path}...");
    let db: Arc<dyn Database> = Arc::from(
        open_db(Path::new(&db_path))
            .await
            .expect("Failed to open outbreak database"),
    );

    let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
    let (recompute_tx, recompute_rx) = mpsc::channel(RECOMPUTE_QUEUE_CAPACITY);

    let engine = HotspotEngine::new(
        Arc::new(DbReportSource::new(db.clone())),
        Arc::new(DbHotspotStore::new(db.clone())),
        Arc::new(BroadcastNotifier::new(events.clone())),
    );
    let _worker = spawn_recompute_worker(engine, recompute_rx);

    let state = web::Data::new(AppState {
        db,
        recompute_tx,
        events,
    });

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .service(
                web::scope("/api")
                    .route("/health", web::get().to(handlers::health))
                    .route("/reports", web::get().to(handlers::list_reports))
                    .route("/reports", web::post().to(handlers::submit_report))
                    .route("/reports", web::patch().to(handlers::review_report))
                    .route("/hotspots", web::get().to(handlers::hotspots))
                    .route("/events", web::get().to(handlers::events)),
            )
    })
    .bind((bind_addr, port))?
    .run()
    .await
}
