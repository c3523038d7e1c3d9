//! Menu and product administration

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::error::OrderError;
use crate::models::product::{
    AvailabilityRequest, MenuResponse, ProductListResponse, ProductRequest, ProductResponse,
};
use crate::services::catalog;
use crate::AppState;

/// GET /api/menu
pub async fn get_menu(State(state): State<AppState>) -> Result<Json<MenuResponse>, OrderError> {
    let categories = catalog::list_menu(&state.db).await?;
    Ok(Json(MenuResponse { categories }))
}

/// GET /api/staff/products
pub async fn list_products(
    State(state): State<AppState>,
) -> Result<Json<ProductListResponse>, OrderError> {
    let products = catalog::list_products(&state.db).await?;
    Ok(Json(ProductListResponse {
        products: products.into_iter().map(ProductResponse::from).collect(),
    }))
}

/// POST /api/staff/products
pub async fn create_product(
    State(state): State<AppState>,
    Json(payload): Json<ProductRequest>,
) -> Result<(StatusCode, Json<ProductResponse>), OrderError> {
    let product = catalog::create_product(&state.db, &payload, state.clock.now()).await?;
    Ok((StatusCode::CREATED, Json(ProductResponse::from(product))))
}

/// PUT /api/staff/products/{id}
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<ProductRequest>,
) -> Result<Json<ProductResponse>, OrderError> {
    let product = catalog::update_product(&state.db, &id, &payload).await?;
    Ok(Json(ProductResponse::from(product)))
}

/// POST /api/staff/products/{id}/availability
pub async fn set_availability(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<AvailabilityRequest>,
) -> Result<Json<ProductResponse>, OrderError> {
    let product = catalog::set_availability(&state.db, &id, payload.is_available).await?;
    Ok(Json(ProductResponse::from(product)))
}

/// DELETE /api/staff/products/{id}
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, OrderError> {
    catalog::delete_product(&state.db, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
