use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::error::OrderError;
use crate::models::print_job::PrintJobListResponse;
use crate::services::print_queue;
use crate::AppState;

/// GET /api/staff/print-jobs
pub async fn list_print_jobs(
    State(state): State<AppState>,
) -> Result<Json<PrintJobListResponse>, OrderError> {
    let jobs = print_queue::list_queued_jobs(&state.db).await?;
    Ok(Json(PrintJobListResponse { jobs }))
}

/// POST /api/staff/print-jobs/{id}/printed
pub async fn mark_printed(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, OrderError> {
    print_queue::mark_printed(&state.db, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
