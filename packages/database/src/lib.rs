#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! `SQLite` persistence for case reports and the materialized hotspot set.
//!
//! Uses `switchy_database` for all database operations. The schema is
//! created idempotently at open time; timestamps are stored as RFC 3339
//! text. The hotspot replace runs delete-then-insert inside a single
//! transaction so map readers only ever observe the prior or the new set,
//! never a half-written one.

pub mod queries;
pub mod stores;

use std::path::Path;

use switchy_database::Database;
use switchy_database_connection::init_sqlite_rusqlite;

pub use stores::{DbHotspotStore, DbReportSource};

/// Default path for the outbreak database.
pub const DEFAULT_DB_PATH: &str = "data/outbreak.db";

/// Errors that can occur during database operations.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// Database query error.
    #[error("Database error: {0}")]
    Database(#[from] switchy_database::DatabaseError),

    /// Failed to open or create the database file.
    #[error("Failed to initialize database: {0}")]
    Init(String),

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Data conversion error.
    #[error("Data conversion error: {message}")]
    Conversion {
        /// Description of what went wrong.
        message: String,
    },
}

/// Opens (or creates) the outbreak `SQLite` database and ensures the
/// schema exists.
///
/// # Errors
///
/// Returns [`DbError`] if the database cannot be opened or schema
/// creation fails.
pub async fn open_db(path: &Path) -> Result<Box<dyn Database>, DbError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db = init_sqlite_rusqlite(Some(path)).map_err(|e| DbError::Init(e.to_string()))?;

    ensure_schema(db.as_ref()).await?;

    Ok(db)
}

/// Opens an in-memory database with the schema applied. Test helper.
///
/// # Errors
///
/// Returns [`DbError`] if schema creation fails.
pub async fn open_in_memory() -> Result<Box<dyn Database>, DbError> {
    let db = init_sqlite_rusqlite(None).map_err(|e| DbError::Init(e.to_string()))?;
    ensure_schema(db.as_ref()).await?;
    Ok(db)
}

/// Creates all tables and indexes if they don't already exist.
async fn ensure_schema(db: &dyn Database) -> Result<(), DbError> {
    db.exec_raw(
        "CREATE TABLE IF NOT EXISTS reports (
            id          TEXT PRIMARY KEY,
            latitude    REAL NOT NULL,
            longitude   REAL NOT NULL,
            symptoms    TEXT NOT NULL,
            report_date TEXT NOT NULL,
            status      TEXT NOT NULL DEFAULT 'pending',
            notes       TEXT,
            created_at  TEXT NOT NULL,
            updated_at  TEXT NOT NULL
        )",
    )
    .await?;

    db.exec_raw("CREATE INDEX IF NOT EXISTS idx_reports_status ON reports (status)")
        .await?;

    db.exec_raw("CREATE INDEX IF NOT EXISTS idx_reports_date ON reports (report_date)")
        .await?;

    db.exec_raw(
        "CREATE TABLE IF NOT EXISTS hotspots (
            id               TEXT PRIMARY KEY,
            latitude         REAL NOT NULL,
            longitude        REAL NOT NULL,
            intensity        REAL NOT NULL,
            report_count     INTEGER NOT NULL,
            last_report_date TEXT NOT NULL,
            created_at       TEXT NOT NULL
        )",
    )
    .await?;

    Ok(())
}
