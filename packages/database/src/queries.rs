//! Database query functions for case reports and hotspots.
//!
//! All timestamps are stored as RFC 3339 text. Queries that feed the
//! clustering engine order by `(report_date, id)` so the engine always
//! sees an identical snapshot ordering for an unchanged report set —
//! clustering is order-sensitive, and a stable order is what makes
//! back-to-back recomputes converge.

use chrono::{DateTime, Utc};
use moosicbox_json_utils::database::ToValue as _;
use outbreak_map_hotspot_models::Hotspot;
use outbreak_map_report_models::{CaseReport, GeoPoint, ReportStatus, ValidatedReport};
use switchy_database::{Database, DatabaseValue};

use crate::DbError;

fn parse_date(column: &str, raw: &str) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DbError::Conversion {
            message: format!("Invalid {column} timestamp '{raw}': {e}"),
        })
}

/// Inserts a newly submitted case report in `pending` status.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn insert_report(db: &dyn Database, report: &CaseReport) -> Result<(), DbError> {
    let symptoms_json = serde_json::to_string(&report.symptoms)?;

    db.exec_raw_params(
        "INSERT INTO reports
            (id, latitude, longitude, symptoms, report_date, status, notes,
             created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        &[
            DatabaseValue::String(report.id.clone()),
            DatabaseValue::Real64(report.location.latitude),
            DatabaseValue::Real64(report.location.longitude),
            DatabaseValue::String(symptoms_json),
            DatabaseValue::String(report.report_date.to_rfc3339()),
            DatabaseValue::String(report.status.to_string()),
            report
                .notes
                .clone()
                .map_or(DatabaseValue::Null, DatabaseValue::String),
            DatabaseValue::String(report.created_at.to_rfc3339()),
            DatabaseValue::String(report.updated_at.to_rfc3339()),
        ],
    )
    .await?;

    Ok(())
}

/// Loads a single report by id.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails or a row cannot be
/// decoded.
pub async fn get_report(db: &dyn Database, id: &str) -> Result<Option<CaseReport>, DbError> {
    let rows = db
        .query_raw_params(
            "SELECT id, latitude, longitude, symptoms, report_date, status,
                    notes, created_at, updated_at
             FROM reports WHERE id = $1",
            &[DatabaseValue::String(id.to_string())],
        )
        .await?;

    rows.first().map(row_to_report).transpose()
}

/// Lists reports, optionally filtered by status, newest first.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails or a row cannot be
/// decoded.
pub async fn list_reports(
    db: &dyn Database,
    status: Option<ReportStatus>,
) -> Result<Vec<CaseReport>, DbError> {
    let rows = if let Some(status) = status {
        db.query_raw_params(
            "SELECT id, latitude, longitude, symptoms, report_date, status,
                    notes, created_at, updated_at
             FROM reports WHERE status = $1
             ORDER BY report_date DESC, id",
            &[DatabaseValue::String(status.to_string())],
        )
        .await?
    } else {
        db.query_raw_params(
            "SELECT id, latitude, longitude, symptoms, report_date, status,
                    notes, created_at, updated_at
             FROM reports
             ORDER BY report_date DESC, id",
            &[],
        )
        .await?
    };

    rows.iter().map(row_to_report).collect()
}

/// Updates a report's status, bumping `updated_at`.
///
/// Returns `false` if no report with `id` exists.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn set_report_status(
    db: &dyn Database,
    id: &str,
    status: ReportStatus,
) -> Result<bool, DbError> {
    // SQLite has no UPDATE ... RETURNING through this driver, so existence
    // is checked first; the two statements don't race against anything —
    // status transitions all go through the single validation workflow.
    if get_report(db, id).await?.is_none() {
        return Ok(false);
    }

    db.exec_raw_params(
        "UPDATE reports SET status = $1, updated_at = $2 WHERE id = $3",
        &[
            DatabaseValue::String(status.to_string()),
            DatabaseValue::String(Utc::now().to_rfc3339()),
            DatabaseValue::String(id.to_string()),
        ],
    )
    .await?;

    Ok(true)
}

/// Fetches the full snapshot of validated reports as the clustering
/// projection, in stable `(report_date, id)` order.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails or a row cannot be
/// decoded.
pub async fn fetch_validated_reports(db: &dyn Database) -> Result<Vec<ValidatedReport>, DbError> {
    let rows = db
        .query_raw_params(
            "SELECT id, latitude, longitude, report_date
             FROM reports WHERE status = $1
             ORDER BY report_date, id",
            &[DatabaseValue::String(ReportStatus::Validated.to_string())],
        )
        .await?;

    let mut reports = Vec::with_capacity(rows.len());
    for row in &rows {
        let id: String = row.to_value("id").map_err(|e| DbError::Conversion {
            message: format!("Failed to parse report id: {e}"),
        })?;
        let latitude: f64 = row.to_value("latitude").map_err(|e| DbError::Conversion {
            message: format!("Failed to parse latitude: {e}"),
        })?;
        let longitude: f64 = row.to_value("longitude").map_err(|e| DbError::Conversion {
            message: format!("Failed to parse longitude: {e}"),
        })?;
        let report_date: String = row.to_value("report_date").map_err(|e| DbError::Conversion {
            message: format!("Failed to parse report_date: {e}"),
        })?;

        reports.push(ValidatedReport {
            id,
            location: GeoPoint::new(latitude, longitude),
            report_date: parse_date("report_date", &report_date)?,
        });
    }

    Ok(reports)
}

/// Replaces the entire hotspot set: delete all rows, insert the new set.
///
/// Runs inside a single transaction so readers observe either the prior
/// set or the new one, never an empty or partial window in between.
///
/// # Errors
///
/// Returns [`DbError`] if the transaction cannot be started or committed,
/// or if any delete/insert fails (the transaction is rolled back on drop).
pub async fn replace_hotspots(db: &dyn Database, hotspots: &[Hotspot]) -> Result<(), DbError> {
    let now = Utc::now().to_rfc3339();

    let txn = db.begin_transaction().await?;

    txn.exec_raw("DELETE FROM hotspots").await?;

    for hotspot in hotspots {
        txn.exec_raw_params(
            "INSERT INTO hotspots
                (id, latitude, longitude, intensity, report_count,
                 last_report_date, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
            &[
                DatabaseValue::String(hotspot.id.clone()),
                DatabaseValue::Real64(hotspot.location.latitude),
                DatabaseValue::Real64(hotspot.location.longitude),
                DatabaseValue::Real64(hotspot.intensity),
                DatabaseValue::Int64(i64::from(hotspot.report_count)),
                DatabaseValue::String(hotspot.last_report_date.to_rfc3339()),
                DatabaseValue::String(now.clone()),
            ],
        )
        .await?;
    }

    txn.commit().await?;

    log::debug!("Replaced hotspot set with {} hotspots", hotspots.len());

    Ok(())
}

/// Lists the current materialized hotspot set, strongest first.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails or a row cannot be
/// decoded.
pub async fn list_hotspots(db: &dyn Database) -> Result<Vec<Hotspot>, DbError> {
    let rows = db
        .query_raw_params(
            "SELECT id, latitude, longitude, intensity, report_count, last_report_date
             FROM hotspots
             ORDER BY intensity DESC, report_count DESC, id",
            &[],
        )
        .await?;

    let mut hotspots = Vec::with_capacity(rows.len());
    for row in &rows {
        let id: String = row.to_value("id").map_err(|e| DbError::Conversion {
            message: format!("Failed to parse hotspot id: {e}"),
        })?;
        let latitude: f64 = row.to_value("latitude").map_err(|e| DbError::Conversion {
            message: format!("Failed to parse latitude: {e}"),
        })?;
        let longitude: f64 = row.to_value("longitude").map_err(|e| DbError::Conversion {
            message: format!("Failed to parse longitude: {e}"),
        })?;
        let intensity: f64 = row.to_value("intensity").map_err(|e| DbError::Conversion {
            message: format!("Failed to parse intensity: {e}"),
        })?;
        let report_count: i64 = row
            .to_value("report_count")
            .map_err(|e| DbError::Conversion {
                message: format!("Failed to parse report_count: {e}"),
            })?;
        let last_report_date: String =
            row.to_value("last_report_date")
                .map_err(|e| DbError::Conversion {
                    message: format!("Failed to parse last_report_date: {e}"),
                })?;

        hotspots.push(Hotspot {
            id,
            location: GeoPoint::new(latitude, longitude),
            intensity,
            report_count: u32::try_from(report_count).map_err(|e| DbError::Conversion {
                message: format!("Invalid report_count {report_count}: {e}"),
            })?,
            last_report_date: parse_date("last_report_date", &last_report_date)?,
        });
    }

    Ok(hotspots)
}

fn row_to_report(row: &switchy_database::Row) -> Result<CaseReport, DbError> {
    let id: String = row.to_value("id").map_err(|e| DbError::Conversion {
        message: format!("Failed to parse report id: {e}"),
    })?;
    let latitude: f64 = row.to_value("latitude").map_err(|e| DbError::Conversion {
        message: format!("Failed to parse latitude: {e}"),
    })?;
    let longitude: f64 = row.to_value("longitude").map_err(|e| DbError::Conversion {
        message: format!("Failed to parse longitude: {e}"),
    })?;
    let symptoms_json: String = row.to_value("symptoms").map_err(|e| DbError::Conversion {
        message: format!("Failed to parse symptoms: {e}"),
    })?;
    let report_date: String = row.to_value("report_date").map_err(|e| DbError::Conversion {
        message: format!("Failed to parse report_date: {e}"),
    })?;
    let status_raw: String = row.to_value("status").map_err(|e| DbError::Conversion {
        message: format!("Failed to parse status: {e}"),
    })?;
    let notes: Option<String> = row.to_value("notes").unwrap_or(None);
    let created_at: String = row.to_value("created_at").map_err(|e| DbError::Conversion {
        message: format!("Failed to parse created_at: {e}"),
    })?;
    let updated_at: String = row.to_value("updated_at").map_err(|e| DbError::Conversion {
        message: format!("Failed to parse updated_at: {e}"),
    })?;

    Ok(CaseReport {
        id,
        location: GeoPoint::new(latitude, longitude),
        symptoms: serde_json::from_str(&symptoms_json)?,
        report_date: parse_date("report_date", &report_date)?,
        status: status_raw.parse().map_err(|e| DbError::Conversion {
            message: format!("Unknown report status '{status_raw}': {e}"),
        })?,
        notes,
        created_at: parse_date("created_at", &created_at)?,
        updated_at: parse_date("updated_at", &updated_at)?,
    })
}
