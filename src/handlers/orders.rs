//! Customer-facing order endpoints
//!
//! Customers have no accounts: the client keeps the ids returned at
//! creation and looks them up again with `GET /api/orders?ids=`.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use sea_orm::EntityTrait;
use tracing::{info, warn};

use crate::entities::prelude::Orders;
use crate::error::OrderError;
use crate::models::order::{
    CreateOrderResponse, OrderDraft, OrderListResponse, OrderLookupQuery, OrderStatusResponse,
    OrderView,
};
use crate::services::{checkout, order_repository};
use crate::AppState;

/// POST /api/orders
pub async fn create_order(
    State(state): State<AppState>,
    Json(draft): Json<OrderDraft>,
) -> Result<(StatusCode, Json<CreateOrderResponse>), OrderError> {
    info!(
        customer_class = %draft.customer_class,
        lines = draft.lines.len(),
        "Received order"
    );

    let placed = checkout::place_order(
        &state.db,
        state.clock.as_ref(),
        state.payments.as_deref(),
        &draft,
    )
    .await
    .map_err(|e| {
        warn!(error = %e, code = e.code(), "Order rejected");
        e
    })?;

    Ok((
        StatusCode::CREATED,
        Json(CreateOrderResponse {
            order: OrderView::from(placed.order),
            checkout_url: placed.checkout_url,
        }),
    ))
}

/// GET /api/orders?ids=a,b,c
pub async fn get_orders_by_ids(
    State(state): State<AppState>,
    Query(query): Query<OrderLookupQuery>,
) -> Result<Json<OrderListResponse>, OrderError> {
    let ids = query.parse_ids().map_err(OrderError::InvalidRequest)?;
    let orders = order_repository::find_orders_by_ids(&state.db, &ids).await?;

    Ok(Json(OrderListResponse {
        orders: orders.into_iter().map(OrderView::from).collect(),
    }))
}

/// GET /api/orders/{id}
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<OrderView>, OrderError> {
    let order = order_repository::find_order_by_id(&state.db, &id)
        .await?
        .ok_or(OrderError::OrderNotFound(id))?;

    Ok(Json(OrderView::from(order)))
}

/// GET /api/orders/{id}/status, polled by the confirmation page
pub async fn get_order_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<OrderStatusResponse>, OrderError> {
    let order = Orders::find_by_id(id.as_str())
        .one(&state.db)
        .await?
        .ok_or(OrderError::OrderNotFound(id))?;

    Ok(Json(OrderStatusResponse {
        id: order.id,
        status: order.status,
        pickup_code: order.pickup_code,
    }))
}
