use axum::{extract::State, Json};

use crate::error::OrderError;
use crate::models::settings::{PublicSettingsResponse, SettingsResponse, UpdateSettingsRequest};
use crate::services::settings_admin;
use crate::AppState;

/// GET /api/settings/public
pub async fn get_public_settings(
    State(state): State<AppState>,
) -> Result<Json<PublicSettingsResponse>, OrderError> {
    let settings = settings_admin::get_settings(&state.db).await?;
    Ok(Json(PublicSettingsResponse::from(settings)))
}

/// GET /api/staff/settings
pub async fn get_settings(
    State(state): State<AppState>,
) -> Result<Json<SettingsResponse>, OrderError> {
    let settings = settings_admin::get_settings(&state.db).await?;
    Ok(Json(SettingsResponse::from(settings)))
}

/// PUT /api/staff/settings
pub async fn update_settings(
    State(state): State<AppState>,
    Json(payload): Json<UpdateSettingsRequest>,
) -> Result<Json<SettingsResponse>, OrderError> {
    let settings = settings_admin::update_settings(&state.db, &payload).await?;
    Ok(Json(SettingsResponse::from(settings)))
}

/// POST /api/staff/settings/reset-lifetime-revenue
pub async fn reset_lifetime_revenue(
    State(state): State<AppState>,
) -> Result<Json<SettingsResponse>, OrderError> {
    let settings = settings_admin::reset_lifetime_revenue(&state.db).await?;
    Ok(Json(SettingsResponse::from(settings)))
}

/// POST /api/staff/settings/reset-period-revenue
pub async fn reset_period_revenue(
    State(state): State<AppState>,
) -> Result<Json<SettingsResponse>, OrderError> {
    let settings = settings_admin::reset_period_revenue(&state.db).await?;
    Ok(Json(SettingsResponse::from(settings)))
}
