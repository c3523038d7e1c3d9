//! Order repository
//!
//! Data access for the order aggregate (order, line items, print job) and
//! the settings singleton. Functions are generic over `ConnectionTrait` so
//! callers can run several of them inside one transaction; the ones that
//! own a transaction take the `DatabaseConnection` itself.

use std::collections::HashMap;

use chrono::{DateTime, FixedOffset, NaiveDate};
use sea_orm::{
    sea_query::{Expr, OnConflict},
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, SqlErr, TransactionTrait,
};
use tracing::debug;

use crate::entities::{
    order_items, orders, print_jobs,
    prelude::{OrderItems, Orders, PrintJobs, Settings},
    settings,
};
use crate::error::{OrderError, OrderResult};
use crate::models::order::{OrderStatus, OrderWithItems};
use crate::models::print_job::PrintJobStatus;
use crate::services::clock::Clock;

/// Primary key of the settings singleton
pub const SETTINGS_ID: i32 = 1;

/// A fully priced order ready to be inserted
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub id: String,
    pub customer_name: String,
    pub customer_class: String,
    pub note: Option<String>,
    pub pickup_time: Option<String>,
    pub total_cents: i64,
    pub pickup_code: String,
    pub status: OrderStatus,
    pub order_day: NaiveDate,
    pub created_at: DateTime<FixedOffset>,
    pub lines: Vec<NewOrderLine>,
}

/// Snapshot of one product line at order time
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrderLine {
    pub product_id: String,
    pub name: String,
    pub unit_price_cents: i64,
    pub qty: i32,
    pub topic: Option<String>,
    pub selected_options: Option<String>,
}

/// Parse the stored status column
pub fn order_status(order: &orders::Model) -> OrderResult<OrderStatus> {
    order
        .status
        .parse()
        .map_err(|e: String| OrderError::StoreUnavailable(DbErr::Type(e)))
}

/// Insert an order and its line items in one transaction.
///
/// The pickup code is checked again inside the transaction, and a unique
/// index violation on insert is reported the same way, as
/// `PickupCodeConflict`, so the caller can allocate a fresh code.
pub async fn create_pending_order(
    db: &DatabaseConnection,
    record: NewOrder,
) -> OrderResult<OrderWithItems> {
    let conflict = || OrderError::PickupCodeConflict {
        code: record.pickup_code.clone(),
        day: record.order_day,
    };

    let txn = db.begin().await?;

    if find_order_by_code_on(&txn, record.order_day, &record.pickup_code, true)
        .await?
        .is_some()
    {
        txn.rollback().await?;
        return Err(conflict());
    }

    let order = orders::ActiveModel {
        id: Set(record.id.clone()),
        customer_name: Set(record.customer_name.clone()),
        customer_class: Set(record.customer_class.clone()),
        note: Set(record.note.clone()),
        pickup_time: Set(record.pickup_time.clone()),
        total_cents: Set(record.total_cents),
        pickup_code: Set(record.pickup_code.clone()),
        status: Set(record.status.as_str().to_string()),
        order_day: Set(record.order_day),
        created_at: Set(record.created_at),
        updated_at: Set(record.created_at),
    }
    .insert(&txn)
    .await
    .map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => conflict(),
        _ => OrderError::from(e),
    })?;

    let mut items = Vec::with_capacity(record.lines.len());
    for (position, line) in record.lines.iter().enumerate() {
        let item = order_items::ActiveModel {
            order_id: Set(order.id.clone()),
            position: Set(position as i32),
            product_id: Set(Some(line.product_id.clone())),
            name_snapshot: Set(line.name.clone()),
            price_cents_snapshot: Set(line.unit_price_cents),
            qty: Set(line.qty),
            topic_snapshot: Set(line.topic.clone()),
            selected_options: Set(line.selected_options.clone()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        items.push(item);
    }

    txn.commit().await?;

    debug!(order_id = %order.id, items = items.len(), "Order inserted");
    Ok(OrderWithItems { order, items })
}

pub async fn find_order_by_id<C: ConnectionTrait>(
    db: &C,
    id: &str,
) -> OrderResult<Option<OrderWithItems>> {
    let Some(order) = Orders::find_by_id(id).one(db).await? else {
        return Ok(None);
    };
    let items = load_items(db, &order.id).await?;
    Ok(Some(OrderWithItems { order, items }))
}

/// Orders for a caller-held list of ids, newest first. Unknown ids are skipped.
pub async fn find_orders_by_ids<C: ConnectionTrait>(
    db: &C,
    ids: &[String],
) -> OrderResult<Vec<OrderWithItems>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let orders = Orders::find()
        .filter(orders::Column::Id.is_in(ids.iter().cloned()))
        .order_by_desc(orders::Column::CreatedAt)
        .all(db)
        .await?;

    attach_items(db, orders).await
}

/// Load line items for a batch of orders, preserving the order of `orders`
pub async fn attach_items<C: ConnectionTrait>(
    db: &C,
    orders: Vec<orders::Model>,
) -> OrderResult<Vec<OrderWithItems>> {
    if orders.is_empty() {
        return Ok(Vec::new());
    }

    let order_ids: Vec<String> = orders.iter().map(|o| o.id.clone()).collect();
    let items = OrderItems::find()
        .filter(order_items::Column::OrderId.is_in(order_ids))
        .order_by_asc(order_items::Column::OrderId)
        .order_by_asc(order_items::Column::Position)
        .all(db)
        .await?;

    let mut by_order: HashMap<String, Vec<order_items::Model>> = HashMap::new();
    for item in items {
        by_order.entry(item.order_id.clone()).or_default().push(item);
    }

    Ok(orders
        .into_iter()
        .map(|order| {
            let items = by_order.remove(&order.id).unwrap_or_default();
            OrderWithItems { order, items }
        })
        .collect())
}

pub async fn load_items<C: ConnectionTrait>(
    db: &C,
    order_id: &str,
) -> OrderResult<Vec<order_items::Model>> {
    Ok(OrderItems::find()
        .filter(order_items::Column::OrderId.eq(order_id))
        .order_by_asc(order_items::Column::Position)
        .all(db)
        .await?)
}

/// Order holding `code` on `day`, optionally ignoring cancelled orders
pub async fn find_order_by_code_on<C: ConnectionTrait>(
    db: &C,
    day: NaiveDate,
    code: &str,
    exclude_cancelled: bool,
) -> OrderResult<Option<orders::Model>> {
    let mut query = Orders::find()
        .filter(orders::Column::OrderDay.eq(day))
        .filter(orders::Column::PickupCode.eq(code));

    if exclude_cancelled {
        query = query.filter(orders::Column::Status.ne(OrderStatus::Cancelled.as_str()));
    }

    Ok(query.order_by_desc(orders::Column::CreatedAt).one(db).await?)
}

pub async fn find_todays_order_by_code<C: ConnectionTrait>(
    db: &C,
    clock: &dyn Clock,
    code: &str,
    exclude_cancelled: bool,
) -> OrderResult<Option<orders::Model>> {
    find_order_by_code_on(db, clock.now().date_naive(), code, exclude_cancelled).await
}

/// Load an order row holding a write lock until the surrounding transaction
/// ends. Engines without row locks (SQLite) ignore the lock clause.
pub async fn lock_order<C: ConnectionTrait>(
    db: &C,
    id: &str,
) -> OrderResult<Option<orders::Model>> {
    Ok(Orders::find_by_id(id).lock_exclusive().one(db).await?)
}

/// Compare-and-set status change. Returns false when the order was not in
/// `from`, so a concurrent writer that got there first is detected.
pub async fn update_status<C: ConnectionTrait>(
    db: &C,
    id: &str,
    from: OrderStatus,
    to: OrderStatus,
    now: DateTime<FixedOffset>,
) -> OrderResult<bool> {
    let result = Orders::update_many()
        .col_expr(orders::Column::Status, Expr::value(to.as_str()))
        .col_expr(orders::Column::UpdatedAt, Expr::value(now))
        .filter(orders::Column::Id.eq(id))
        .filter(orders::Column::Status.eq(from.as_str()))
        .exec(db)
        .await?;

    Ok(result.rows_affected == 1)
}

/// Move every order in `from` to `to`
pub async fn update_all_statuses<C: ConnectionTrait>(
    db: &C,
    from: OrderStatus,
    to: OrderStatus,
    now: DateTime<FixedOffset>,
) -> OrderResult<u64> {
    let result = Orders::update_many()
        .col_expr(orders::Column::Status, Expr::value(to.as_str()))
        .col_expr(orders::Column::UpdatedAt, Expr::value(now))
        .filter(orders::Column::Status.eq(from.as_str()))
        .exec(db)
        .await?;

    Ok(result.rows_affected)
}

/// Delete line items, print job and the order row. Run inside the caller's
/// transaction together with the status guard.
pub async fn delete_order<C: ConnectionTrait>(db: &C, id: &str) -> OrderResult<bool> {
    OrderItems::delete_many()
        .filter(order_items::Column::OrderId.eq(id))
        .exec(db)
        .await?;
    PrintJobs::delete_many()
        .filter(print_jobs::Column::OrderId.eq(id))
        .exec(db)
        .await?;
    let result = Orders::delete_by_id(id).exec(db).await?;

    Ok(result.rows_affected == 1)
}

pub async fn find_fulfilment_job<C: ConnectionTrait>(
    db: &C,
    order_id: &str,
) -> OrderResult<Option<print_jobs::Model>> {
    Ok(PrintJobs::find()
        .filter(print_jobs::Column::OrderId.eq(order_id))
        .one(db)
        .await?)
}

/// Queue the fulfilment job for an order. Returns false when the order
/// already had one (the unique index on `order_id` absorbs the insert).
pub async fn create_fulfilment_job<C: ConnectionTrait>(
    db: &C,
    order_id: &str,
    payload: String,
    now: DateTime<FixedOffset>,
) -> OrderResult<bool> {
    let job = print_jobs::ActiveModel {
        id: Set(uuid::Uuid::new_v4().to_string()),
        order_id: Set(order_id.to_string()),
        payload_text: Set(payload),
        status: Set(PrintJobStatus::Queued.as_str().to_string()),
        created_at: Set(now),
    };

    let inserted = PrintJobs::insert(job)
        .on_conflict(
            OnConflict::column(print_jobs::Column::OrderId)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;

    Ok(inserted > 0)
}

/// Credit an order total to both lifetime and current-period revenue
pub async fn credit_revenue<C: ConnectionTrait>(db: &C, amount: i64) -> OrderResult<()> {
    let result = Settings::update_many()
        .col_expr(
            settings::Column::LifetimeRevenueCents,
            Expr::col(settings::Column::LifetimeRevenueCents).add(amount),
        )
        .col_expr(
            settings::Column::PeriodRevenueCents,
            Expr::col(settings::Column::PeriodRevenueCents).add(amount),
        )
        .filter(settings::Column::Id.eq(SETTINGS_ID))
        .exec(db)
        .await?;

    if result.rows_affected != 1 {
        return Err(missing_settings());
    }
    Ok(())
}

pub async fn get_settings<C: ConnectionTrait>(db: &C) -> OrderResult<settings::Model> {
    Settings::find_by_id(SETTINGS_ID)
        .one(db)
        .await?
        .ok_or_else(missing_settings)
}

fn missing_settings() -> OrderError {
    OrderError::StoreUnavailable(DbErr::RecordNotFound(
        "settings singleton is not provisioned".to_string(),
    ))
}
