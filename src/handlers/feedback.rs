use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::error::OrderError;
use crate::models::feedback::{FeedbackListResponse, FeedbackRequest, FeedbackResponse};
use crate::services::feedback;
use crate::AppState;

/// POST /api/feedback
pub async fn submit_feedback(
    State(state): State<AppState>,
    Json(payload): Json<FeedbackRequest>,
) -> Result<(StatusCode, Json<FeedbackResponse>), OrderError> {
    let entry = feedback::submit_feedback(&state.db, &payload, state.clock.now()).await?;
    Ok((StatusCode::CREATED, Json(FeedbackResponse::from(entry))))
}

/// GET /api/staff/feedback
pub async fn list_feedback(
    State(state): State<AppState>,
) -> Result<Json<FeedbackListResponse>, OrderError> {
    let entries = feedback::list_feedback(&state.db).await?;
    Ok(Json(FeedbackListResponse {
        feedback: entries.into_iter().map(FeedbackResponse::from).collect(),
    }))
}

/// DELETE /api/staff/feedback/{id}
pub async fn delete_feedback(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, OrderError> {
    feedback::delete_feedback(&state.db, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
