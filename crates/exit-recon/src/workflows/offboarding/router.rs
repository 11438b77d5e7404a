use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde_json::json;
use tracing::{error, info, warn};

use super::delivery::ReportDelivery;
use super::resolver::SingleEmployeeQuery;
use super::roster::{RosterError, RosterProvider};
use super::service::{BatchError, BatchOutcome, ExitStatusService};

/// Router exposing batch generation, background scheduling, and single-employee lookup.
pub fn exit_router<R, D>(service: Arc<ExitStatusService<R, D>>) -> Router
where
    R: RosterProvider + 'static,
    D: ReportDelivery + 'static,
{
    Router::new()
        .route(
            "/employee-exit/generate-report",
            get(generate_report_handler::<R, D>),
        )
        .route(
            "/employee-exit/schedule-report",
            get(schedule_report_handler::<R, D>),
        )
        .route(
            "/employee-exit/process-exit",
            post(process_exit_handler::<R, D>),
        )
        .with_state(service)
}

pub(crate) async fn generate_report_handler<R, D>(
    State(service): State<Arc<ExitStatusService<R, D>>>,
) -> Response
where
    R: RosterProvider + 'static,
    D: ReportDelivery + 'static,
{
    match service.run_batch().await {
        Ok(BatchOutcome::NothingToDo) => {
            let payload = json!({
                "message": "No exiting employees found",
                "employees": 0,
                "failedSystems": [],
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Ok(BatchOutcome::Delivered(summary)) => {
            let message = if summary.delivered {
                "Report generated and sent successfully!"
            } else {
                "Report generated; no recipients configured"
            };
            let payload = json!({
                "message": message,
                "employees": summary.employees,
                "delivered": summary.delivered,
                "reportPath": summary.artifact_retained.then(|| summary.report_path.display().to_string()),
                "failedSystems": summary.failed_systems,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(err) => batch_error_response(&err),
    }
}

pub(crate) async fn schedule_report_handler<R, D>(
    State(service): State<Arc<ExitStatusService<R, D>>>,
) -> Response
where
    R: RosterProvider + 'static,
    D: ReportDelivery + 'static,
{
    tokio::spawn(async move {
        match service.run_batch().await {
            Ok(BatchOutcome::NothingToDo) => info!("scheduled batch found no exiting employees"),
            Ok(BatchOutcome::Delivered(summary)) => {
                info!(employees = summary.employees, "scheduled batch delivered")
            }
            Err(BatchError::AlreadyRunning) => warn!("scheduled batch skipped, one is already running"),
            Err(err) => error!(error = %err, "scheduled batch failed"),
        }
    });

    let payload = json!({ "message": "Report scheduled!" });
    (StatusCode::ACCEPTED, axum::Json(payload)).into_response()
}

pub(crate) async fn process_exit_handler<R, D>(
    State(service): State<Arc<ExitStatusService<R, D>>>,
    axum::Json(query): axum::Json<SingleEmployeeQuery>,
) -> Response
where
    R: RosterProvider + 'static,
    D: ReportDelivery + 'static,
{
    match service.lookup(&query).await {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(err) => batch_error_response(&err),
    }
}

/// Status code and reason phrase reported for a failed batch or lookup.
pub fn batch_error_status(err: &BatchError) -> (StatusCode, &'static str) {
    match err {
        BatchError::AlreadyRunning => (StatusCode::CONFLICT, "Conflict"),
        BatchError::Roster(RosterError::Upstream(_)) => (StatusCode::BAD_GATEWAY, "API error"),
        BatchError::Roster(RosterError::Validation(_)) | BatchError::Validation(_) => {
            (StatusCode::BAD_REQUEST, "Bad Request")
        }
        BatchError::Report(_) | BatchError::Delivery(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
        }
    }
}

/// `{timestamp, status, error, message}` error body.
pub fn batch_error_response(err: &BatchError) -> Response {
    let (status, reason) = batch_error_status(err);
    if status.is_server_error() {
        error!(error = %err, "employee exit request failed");
    }
    let payload = json!({
        "timestamp": Utc::now().to_rfc3339(),
        "status": status.as_u16(),
        "error": reason,
        "message": err.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}
