//! Staff dashboard, kitchen display and counter endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use tracing::info;

use crate::error::OrderError;
use crate::models::order::{
    BulkTransitionRequest, BulkTransitionResponse, DashboardResponse, DeleteOrdersResponse,
    OrderListResponse, OrderView, StaffOrdersQuery, TransitionRequest,
};
use crate::services::{order_lifecycle, order_repository, staff_orders};
use crate::AppState;

/// GET /api/staff/orders?status=&code=
pub async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<StaffOrdersQuery>,
) -> Result<Json<DashboardResponse>, OrderError> {
    let filter = query.status_filter().map_err(OrderError::InvalidRequest)?;
    let dashboard = staff_orders::list_orders(&state.db, filter, query.code.as_deref()).await?;

    Ok(Json(DashboardResponse {
        orders: dashboard.orders.into_iter().map(OrderView::from).collect(),
        lifetime_revenue_cents: dashboard.settings.lifetime_revenue_cents,
        period_revenue_cents: dashboard.settings.period_revenue_cents,
    }))
}

/// GET /api/staff/orders/active
pub async fn list_active_orders(
    State(state): State<AppState>,
) -> Result<Json<OrderListResponse>, OrderError> {
    let orders = staff_orders::list_active_orders(&state.db).await?;
    Ok(Json(OrderListResponse {
        orders: orders.into_iter().map(OrderView::from).collect(),
    }))
}

/// GET /api/staff/orders/by-code/{code}
pub async fn find_order_by_code(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<OrderView>, OrderError> {
    let order = staff_orders::find_todays_order_by_code(&state.db, state.clock.as_ref(), &code)
        .await?
        .ok_or_else(|| OrderError::OrderNotFound(format!("pickup code {}", code)))?;

    Ok(Json(OrderView::from(order)))
}

/// POST /api/staff/orders/{id}/status
pub async fn update_order_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<TransitionRequest>,
) -> Result<Json<OrderView>, OrderError> {
    order_lifecycle::transition(&state.db, state.clock.as_ref(), &id, payload.status).await?;

    let order = order_repository::find_order_by_id(&state.db, &id)
        .await?
        .ok_or(OrderError::OrderNotFound(id))?;
    Ok(Json(OrderView::from(order)))
}

/// POST /api/staff/orders/bulk-status
pub async fn bulk_update_status(
    State(state): State<AppState>,
    Json(payload): Json<BulkTransitionRequest>,
) -> Result<Json<BulkTransitionResponse>, OrderError> {
    let updated =
        order_lifecycle::bulk_transition(&state.db, state.clock.as_ref(), payload.from, payload.to)
            .await?;

    Ok(Json(BulkTransitionResponse {
        from: payload.from,
        to: payload.to,
        updated,
    }))
}

/// DELETE /api/staff/orders/{id}
pub async fn delete_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, OrderError> {
    order_lifecycle::delete_order(&state.db, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/staff/orders
pub async fn purge_orders(
    State(state): State<AppState>,
) -> Result<Json<DeleteOrdersResponse>, OrderError> {
    let deleted = order_lifecycle::purge_orders(&state.db).await?;
    info!(deleted, "Staff purged orders");
    Ok(Json(DeleteOrdersResponse { deleted }))
}
