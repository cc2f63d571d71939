//! HTTP handler functions for the outbreak map API.

use actix_web::{HttpResponse, web};
use chrono::Utc;
use outbreak_map_database::queries;
use outbreak_map_report_models::{CaseReport, GeoPoint, ReportStatus};
use outbreak_map_server_models::{
    ApiError, ApiHealth, ApiRecomputeStatus, ReportQueryParams, ReviewAction, ReviewReportRequest,
    ReviewReportResponse, SubmitReportRequest,
};
use tokio::sync::broadcast;

use crate::AppState;

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api/reports`
///
/// Lists reports, optionally filtered by `?status=`.
pub async fn list_reports(
    state: web::Data<AppState>,
    params: web::Query<ReportQueryParams>,
) -> HttpResponse {
    match queries::list_reports(state.db.as_ref(), params.status).await {
        Ok(reports) => HttpResponse::Ok().json(reports),
        Err(e) => {
            log::error!("Failed to list reports: {e}");
            HttpResponse::InternalServerError().json(ApiError {
                error: "Failed to list reports".to_string(),
            })
        }
    }
}

/// `POST /api/reports`
///
/// Submits a new case report in `pending` status. Coordinate range
/// validation happens here, upstream of the clustering engine — the
/// engine only ever defends against rows that slip past it.
pub async fn submit_report(
    state: web::Data<AppState>,
    body: web::Json<SubmitReportRequest>,
) -> HttpResponse {
    let location = GeoPoint::new(body.latitude, body.longitude);
    if !location.is_valid() {
        return HttpResponse::BadRequest().json(ApiError {
            error: format!(
                "Coordinates ({}, {}) out of range",
                body.latitude, body.longitude
            ),
        });
    }
    if body.symptoms.is_empty() {
        return HttpResponse::BadRequest().json(ApiError {
            error: "At least one symptom must be provided".to_string(),
        });
    }

    let now = Utc::now();
    let report = CaseReport {
        id: uuid::Uuid::new_v4().to_string(),
        location,
        symptoms: body.symptoms.clone(),
        report_date: body.report_date.unwrap_or(now),
        status: ReportStatus::Pending,
        notes: body.notes.clone(),
        created_at: now,
        updated_at: now,
    };

    match queries::insert_report(state.db.as_ref(), &report).await {
        Ok(()) => HttpResponse::Created().json(report),
        Err(e) => {
            log::error!("Failed to insert report: {e}");
            HttpResponse::InternalServerError().json(ApiError {
                error: "Failed to submit report".to_string(),
            })
        }
    }
}

/// `PATCH /api/reports`
///
/// Validates or rejects a report. A transition into `validated` enqueues
/// exactly one hotspot recompute job; the review response never waits on
/// (or fails because of) the recomputation itself.
pub async fn review_report(
    state: web::Data<AppState>,
    body: web::Json<ReviewReportRequest>,
) -> HttpResponse {
    let new_status = match body.action {
        ReviewAction::Validate => ReportStatus::Validated,
        ReviewAction::Reject => ReportStatus::Rejected,
    };

    let existing = match queries::get_report(state.db.as_ref(), &body.id).await {
        Ok(Some(report)) => report,
        Ok(None) => {
            return HttpResponse::NotFound().json(ApiError {
                error: format!("Report not found: {}", body.id),
            });
        }
        Err(e) => {
            log::error!("Failed to load report {}: {e}", body.id);
            return HttpResponse::InternalServerError().json(ApiError {
                error: "Failed to load report".to_string(),
            });
        }
    };

    if let Err(e) = queries::set_report_status(state.db.as_ref(), &body.id, new_status).await {
        log::error!("Failed to update report {} status: {e}", body.id);
        return HttpResponse::InternalServerError().json(ApiError {
            error: "Failed to update report status".to_string(),
        });
    }

    let hotspots = if new_status == ReportStatus::Validated
        && existing.status != ReportStatus::Validated
    {
        log::info!(
            "Report {} validated, queueing hotspot recomputation",
            body.id
        );
        match state.recompute_tx.send(()).await {
            Ok(()) => ApiRecomputeStatus {
                queued: true,
                message: "hotspot recomputation queued".to_string(),
            },
            Err(e) => {
                // Worker gone; the validation still stands.
                log::error!("Failed to queue hotspot recomputation: {e}");
                ApiRecomputeStatus {
                    queued: false,
                    message: "hotspot recomputation unavailable".to_string(),
                }
            }
        }
    } else {
        ApiRecomputeStatus {
            queued: false,
            message: "no recomputation required".to_string(),
        }
    };

    HttpResponse::Ok().json(ReviewReportResponse {
        id: body.id.clone(),
        status: new_status,
        hotspots,
    })
}

/// `GET /api/hotspots`
///
/// Returns the current materialized hotspot set. Intensity is in [0, 1];
/// consumers map it to the three-band color scale.
pub async fn hotspots(state: web::Data<AppState>) -> HttpResponse {
    match queries::list_hotspots(state.db.as_ref()).await {
        Ok(hotspots) => HttpResponse::Ok().json(hotspots),
        Err(e) => {
            log::error!("Failed to list hotspots: {e}");
            HttpResponse::InternalServerError().json(ApiError {
                error: "Failed to list hotspots".to_string(),
            })
        }
    }
}

/// `GET /api/events`
///
/// SSE stream of `hotspots-updated` events. Lagged subscribers skip
/// missed events and pick up from the next one — each event only means
/// "refetch the hotspot set", so missing one is harmless once a newer
/// one arrives.
pub async fn events(state: web::Data<AppState>) -> HttpResponse {
    let mut rx = state.events.subscribe();

    let stream = async_stream::stream! {
        yield Ok::<_, actix_web::Error>(web::Bytes::from_static(
            b"event: connected\ndata: {}\n\n",
        ));

        loop {
            match rx.recv().await {
                Ok(()) => {
                    yield Ok(web::Bytes::from_static(
                        b"event: hotspots-updated\ndata: {}\n\n",
                    ));
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    log::debug!("SSE subscriber lagged, skipped {skipped} events");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    };

    HttpResponse::Ok()
        .insert_header(("Content-Type", "text/event-stream"))
        .insert_header(("Cache-Control", "no-cache"))
        .streaming(stream)
}
