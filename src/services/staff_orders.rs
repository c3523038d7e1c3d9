//! Read side of the staff dashboard and kitchen display

use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};

use crate::entities::{orders, prelude::Orders, settings};
use crate::error::OrderResult;
use crate::models::order::{OrderStatus, OrderWithItems, StatusFilter};
use crate::services::clock::Clock;
use crate::services::order_repository;

/// Dashboard rows plus the revenue counters shown alongside them
#[derive(Debug, Clone)]
pub struct Dashboard {
    pub orders: Vec<OrderWithItems>,
    pub settings: settings::Model,
}

/// Orders for the dashboard, newest first
pub async fn list_orders(
    db: &DatabaseConnection,
    filter: StatusFilter,
    code: Option<&str>,
) -> OrderResult<Dashboard> {
    let mut query = Orders::find();

    query = match filter {
        StatusFilter::Default => {
            query.filter(orders::Column::Status.ne(OrderStatus::PendingPayment.as_str()))
        }
        StatusFilter::All => query,
        StatusFilter::Only(status) => query.filter(orders::Column::Status.eq(status.as_str())),
    };

    if let Some(code) = code.map(str::trim).filter(|c| !c.is_empty()) {
        query = query.filter(orders::Column::PickupCode.eq(code));
    }

    let rows = query
        .order_by_desc(orders::Column::CreatedAt)
        .all(db)
        .await?;

    Ok(Dashboard {
        orders: order_repository::attach_items(db, rows).await?,
        settings: order_repository::get_settings(db).await?,
    })
}

/// Orders the kitchen still has to work on, oldest first
pub async fn list_active_orders(db: &DatabaseConnection) -> OrderResult<Vec<OrderWithItems>> {
    let rows = Orders::find()
        .filter(
            orders::Column::Status.is_in([
                OrderStatus::Paid.as_str(),
                OrderStatus::InPreparation.as_str(),
            ]),
        )
        .order_by_asc(orders::Column::CreatedAt)
        .all(db)
        .await?;

    order_repository::attach_items(db, rows).await
}

/// Counter lookup: today's live order holding `code`
pub async fn find_todays_order_by_code(
    db: &DatabaseConnection,
    clock: &dyn Clock,
    code: &str,
) -> OrderResult<Option<OrderWithItems>> {
    let Some(order) =
        order_repository::find_todays_order_by_code(db, clock, code.trim(), true).await?
    else {
        return Ok(None);
    };

    let items = order_repository::load_items(db, &order.id).await?;
    Ok(Some(OrderWithItems { order, items }))
}
