//! Staff-driven order lifecycle: status transitions and deletion
//!
//! Every write re-reads the order inside its own transaction and guards the
//! update with the status it observed, so a concurrent finalize or a second
//! staff member cannot slip an order past the transition graph.

use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QuerySelect, TransactionTrait,
};
use tracing::{info, warn};

use crate::entities::{order_items, orders, print_jobs, prelude::*};
use crate::error::{OrderError, OrderResult};
use crate::models::order::OrderStatus;
use crate::services::clock::Clock;
use crate::services::order_repository;

/// Move one order to `to`. Returns the status it left.
pub async fn transition(
    db: &DatabaseConnection,
    clock: &dyn Clock,
    order_id: &str,
    to: OrderStatus,
) -> OrderResult<OrderStatus> {
    let txn = db.begin().await?;

    let Some(order) = order_repository::lock_order(&txn, order_id).await? else {
        txn.rollback().await?;
        return Err(OrderError::OrderNotFound(order_id.to_string()));
    };

    let from = order_repository::order_status(&order)?;
    if !from.can_staff_transition_to(to) {
        txn.rollback().await?;
        warn!(order_id = %order_id, %from, %to, "Rejected status transition");
        return Err(OrderError::InvalidTransition { from, to });
    }

    let moved = order_repository::update_status(&txn, order_id, from, to, clock.now()).await?;
    if !moved {
        // Lost a race with another writer between read and update
        txn.rollback().await?;
        let current = match order_repository::find_order_by_id(db, order_id).await? {
            Some(current) => order_repository::order_status(&current.order)?,
            None => return Err(OrderError::OrderNotFound(order_id.to_string())),
        };
        return Err(OrderError::InvalidTransition { from: current, to });
    }

    txn.commit().await?;

    info!(order_id = %order_id, %from, %to, "Order status updated");
    Ok(from)
}

/// Move every order currently in `from` to `to` in one transaction
pub async fn bulk_transition(
    db: &DatabaseConnection,
    clock: &dyn Clock,
    from: OrderStatus,
    to: OrderStatus,
) -> OrderResult<u64> {
    if !from.can_staff_transition_to(to) {
        return Err(OrderError::InvalidTransition { from, to });
    }

    let txn = db.begin().await?;
    let updated = order_repository::update_all_statuses(&txn, from, to, clock.now()).await?;
    txn.commit().await?;

    info!(%from, %to, updated, "Bulk status update");
    Ok(updated)
}

/// Delete one order with its items and print job. Only orders that hold no
/// accounted, undelivered money may go.
pub async fn delete_order(db: &DatabaseConnection, order_id: &str) -> OrderResult<()> {
    let txn = db.begin().await?;

    let Some(order) = order_repository::lock_order(&txn, order_id).await? else {
        txn.rollback().await?;
        return Err(OrderError::OrderNotFound(order_id.to_string()));
    };

    let status = order_repository::order_status(&order)?;
    if !status.is_deletable() {
        txn.rollback().await?;
        warn!(order_id = %order_id, %status, "Rejected order deletion");
        return Err(OrderError::DeletionNotAllowed(status));
    }

    order_repository::delete_order(&txn, order_id).await?;
    txn.commit().await?;

    info!(order_id = %order_id, %status, pickup_code = %order.pickup_code, "Order deleted");
    Ok(())
}

/// Delete every deletable order at once. Orders in other states are kept.
pub async fn purge_orders(db: &DatabaseConnection) -> OrderResult<u64> {
    let deletable: Vec<&'static str> = OrderStatus::deletable()
        .iter()
        .map(OrderStatus::as_str)
        .collect();

    let txn = db.begin().await?;

    let ids: Vec<String> = Orders::find()
        .filter(orders::Column::Status.is_in(deletable))
        .lock_exclusive()
        .all(&txn)
        .await?
        .into_iter()
        .map(|order| order.id)
        .collect();

    if ids.is_empty() {
        txn.rollback().await?;
        return Ok(0);
    }

    OrderItems::delete_many()
        .filter(order_items::Column::OrderId.is_in(ids.clone()))
        .exec(&txn)
        .await?;
    PrintJobs::delete_many()
        .filter(print_jobs::Column::OrderId.is_in(ids.clone()))
        .exec(&txn)
        .await?;
    let result = Orders::delete_many()
        .filter(orders::Column::Id.is_in(ids))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    info!(deleted = result.rows_affected, "Purged orders");
    Ok(result.rows_affected)
}
