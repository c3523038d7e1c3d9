//! Order creation workflow
//!
//! Fail-fast checks in order: draft shape, ordering enabled, order window,
//! pickup window, product lookup. Prices always come from the catalog,
//! never from the request. The order is then inserted as
//! `pending_payment` under a freshly allocated pickup code.

use sea_orm::{DatabaseConnection, EntityTrait};
use tracing::{debug, info, warn};

use crate::entities::prelude::Products;
use crate::error::{OrderError, OrderResult};
use crate::models::order::{non_blank, OrderDraft, OrderStatus, OrderWithItems};
use crate::models::settings::{parse_time_of_day, TimeWindow};
use crate::services::clock::Clock;
use crate::services::code_allocator::{CodeSource, RandomCodes};
use crate::services::order_repository::{self, NewOrder, NewOrderLine};

/// Fresh allocations tried when the insert loses a pickup-code race
pub const INSERT_ATTEMPTS: usize = 3;

/// Validate, price and insert a draft as a `pending_payment` order
pub async fn create_order(
    db: &DatabaseConnection,
    clock: &dyn Clock,
    draft: &OrderDraft,
) -> OrderResult<OrderWithItems> {
    create_order_with(db, clock, draft, &mut RandomCodes::new()).await
}

/// [`create_order`] drawing pickup codes from `codes`
pub async fn create_order_with(
    db: &DatabaseConnection,
    clock: &dyn Clock,
    draft: &OrderDraft,
    codes: &mut dyn CodeSource,
) -> OrderResult<OrderWithItems> {
    draft.validate().map_err(OrderError::InvalidRequest)?;

    // Read once per invocation so window checks never use stale settings
    let settings = order_repository::get_settings(db).await?;
    if !settings.ordering_enabled {
        return Err(OrderError::OrderingClosed);
    }

    let now = clock.now();
    let order_window = stored_window(&settings.order_start_time, &settings.order_end_time)?;
    if !order_window.contains(now.time()) {
        return Err(OrderError::OutsideOrderWindow {
            start: settings.order_start_time,
            end: settings.order_end_time,
        });
    }

    let pickup_time = non_blank(draft.pickup_time.as_deref());
    match &pickup_time {
        Some(requested) => {
            let time = parse_time_of_day(requested).map_err(OrderError::InvalidRequest)?;
            let pickup_window =
                stored_window(&settings.pickup_start_time, &settings.pickup_end_time)?;
            if !pickup_window.contains(time) {
                return Err(OrderError::OutsidePickupWindow {
                    start: settings.pickup_start_time,
                    end: settings.pickup_end_time,
                });
            }
        }
        None if settings.pickup_time_required => {
            return Err(OrderError::InvalidRequest("pickup_time is required".to_string()));
        }
        None => {}
    }

    let lines = price_lines(db, draft).await?;
    let total_cents = lines.iter().try_fold(0i64, |total, line| {
        line.unit_price_cents
            .checked_mul(i64::from(line.qty))
            .and_then(|line_total| total.checked_add(line_total))
            .ok_or_else(|| OrderError::InvalidRequest("order total overflows".to_string()))
    })?;

    let order_day = now.date_naive();
    let mut record = NewOrder {
        id: uuid::Uuid::new_v4().to_string(),
        customer_name: draft.customer_name.trim().to_string(),
        customer_class: draft.customer_class.trim().to_string(),
        note: non_blank(draft.note.as_deref()),
        pickup_time,
        total_cents,
        pickup_code: String::new(),
        status: OrderStatus::PendingPayment,
        order_day,
        created_at: now,
        lines,
    };

    for attempt in 1..=INSERT_ATTEMPTS {
        record.pickup_code = codes.next_code(db, order_day).await?;

        match order_repository::create_pending_order(db, record.clone()).await {
            Ok(created) => {
                info!(
                    order_id = %created.order.id,
                    pickup_code = %created.order.pickup_code,
                    total_cents = created.order.total_cents,
                    items = created.items.len(),
                    "Order created"
                );
                return Ok(created);
            }
            Err(OrderError::PickupCodeConflict { code, .. }) => {
                warn!(code = %code, attempt, "Pickup code taken at insert time, reallocating");
            }
            Err(e) => return Err(e),
        }
    }

    Err(OrderError::CodeAllocationExhausted)
}

/// Snapshot name, price and topic of each requested product
async fn price_lines(db: &DatabaseConnection, draft: &OrderDraft) -> OrderResult<Vec<NewOrderLine>> {
    let mut lines = Vec::with_capacity(draft.lines.len());

    for line in &draft.lines {
        let product = Products::find_by_id(line.product_id.as_str())
            .one(db)
            .await?
            .ok_or_else(|| OrderError::ProductNotFound(line.product_id.clone()))?;

        if !product.is_available {
            return Err(OrderError::ProductUnavailable(product.name));
        }

        debug!(
            product_id = %product.id,
            unit_price_cents = product.price_cents,
            qty = line.qty,
            "Line priced"
        );

        lines.push(NewOrderLine {
            product_id: product.id,
            name: product.name,
            unit_price_cents: product.price_cents,
            qty: line.qty,
            topic: product.topic,
            selected_options: non_blank(line.selected_options.as_deref()),
        });
    }

    Ok(lines)
}

/// Windows are validated on update, so a bad stored value is a data fault
fn stored_window(start: &str, end: &str) -> OrderResult<TimeWindow> {
    TimeWindow::parse(start, end)
        .map_err(|e| OrderError::StoreUnavailable(sea_orm::DbErr::Type(e)))
}
