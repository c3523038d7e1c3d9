//! Order finalization
//!
//! Marks an order paid and queues its kitchen ticket. Both the checkout
//! success redirect and the payment webhook call [`finalize`], possibly at
//! the same time and possibly more than once, so the procedure is
//! idempotent: it looks at what is still missing and does only that.
//!
//! - status still `pending_payment` -> move to `paid` and credit revenue
//! - no print job yet -> render the ticket and queue it
//!
//! A retry after a partial failure therefore completes only the missing
//! half. Revenue is credited only when the compare-and-set status update
//! actually moved the row, so it is counted at most once per order even
//! on engines without row locks.

use chrono::{DateTime, FixedOffset};
use sea_orm::{ConnectionTrait, DatabaseConnection, TransactionTrait};
use std::fmt::Write as _;
use tracing::{debug, info, warn};

use crate::entities::{order_items, orders};
use crate::error::{OrderError, OrderResult};
use crate::models::order::{format_minor_units, OrderStatus};
use crate::services::clock::Clock;
use crate::services::order_repository;

/// What a finalize call changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FinalizeOutcome {
    pub status_updated: bool,
    pub job_created: bool,
    /// Payment confirmed for a cancelled order; nothing was changed
    pub reconciliation_needed: bool,
}

impl FinalizeOutcome {
    pub fn is_noop(&self) -> bool {
        !self.status_updated && !self.job_created
    }
}

/// Which entry point asked for finalization, for logs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    SuccessRedirect,
    Webhook,
    Simulated,
}

impl std::fmt::Display for Trigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Trigger::SuccessRedirect => write!(f, "success_redirect"),
            Trigger::Webhook => write!(f, "webhook"),
            Trigger::Simulated => write!(f, "simulated"),
        }
    }
}

/// The order as read at the start of finalize, with what it still lacks
#[derive(Debug, Clone)]
pub struct PendingWork {
    pub order: orders::Model,
    pub needs_status_update: bool,
    pub needs_fulfilment_job: bool,
}

#[derive(Debug, Clone)]
pub enum FinalizePlan {
    Done,
    Cancelled,
    Apply(PendingWork),
}

/// Ensure `order_id` is paid and has its fulfilment job
pub async fn finalize(
    db: &DatabaseConnection,
    clock: &dyn Clock,
    order_id: &str,
) -> OrderResult<FinalizeOutcome> {
    let txn = db.begin().await?;

    let work = match plan(&txn, order_id).await? {
        FinalizePlan::Apply(work) => work,
        FinalizePlan::Done => {
            txn.rollback().await?;
            debug!(order_id = %order_id, "Order already finalized");
            return Ok(FinalizeOutcome::default());
        }
        FinalizePlan::Cancelled => {
            txn.rollback().await?;
            return Ok(FinalizeOutcome {
                reconciliation_needed: true,
                ..Default::default()
            });
        }
    };

    let outcome = apply(&txn, &work, clock.now()).await?;
    txn.commit().await?;

    info!(
        order_id = %order_id,
        pickup_code = %work.order.pickup_code,
        status_updated = outcome.status_updated,
        job_created = outcome.job_created,
        "Order finalized"
    );

    Ok(outcome)
}

/// Lock the order and work out what is missing
pub async fn plan<C: ConnectionTrait>(db: &C, order_id: &str) -> OrderResult<FinalizePlan> {
    let Some(order) = order_repository::lock_order(db, order_id).await? else {
        warn!(order_id = %order_id, "Finalize requested for unknown order");
        return Err(OrderError::OrderNotFound(order_id.to_string()));
    };

    let status = order_repository::order_status(&order)?;
    if status == OrderStatus::Cancelled {
        warn!(
            order_id = %order_id,
            total_cents = order.total_cents,
            "Payment confirmed for cancelled order, needs manual reconciliation"
        );
        return Ok(FinalizePlan::Cancelled);
    }

    let needs_status_update = status == OrderStatus::PendingPayment;
    let needs_fulfilment_job = order_repository::find_fulfilment_job(db, order_id)
        .await?
        .is_none();

    if !needs_status_update && !needs_fulfilment_job {
        return Ok(FinalizePlan::Done);
    }

    Ok(FinalizePlan::Apply(PendingWork {
        order,
        needs_status_update,
        needs_fulfilment_job,
    }))
}

/// Do the missing work. The plan may be stale by now: the status update
/// is a compare-and-set and the job insert absorbs a duplicate, so a
/// caller that lost the race changes nothing and credits nothing.
pub async fn apply<C: ConnectionTrait>(
    db: &C,
    work: &PendingWork,
    now: DateTime<FixedOffset>,
) -> OrderResult<FinalizeOutcome> {
    let order = &work.order;
    let mut outcome = FinalizeOutcome::default();

    if work.needs_status_update {
        outcome.status_updated = order_repository::update_status(
            db,
            &order.id,
            OrderStatus::PendingPayment,
            OrderStatus::Paid,
            now,
        )
        .await?;

        if outcome.status_updated {
            order_repository::credit_revenue(db, order.total_cents).await?;
        } else {
            debug!(order_id = %order.id, "Status already moved by a concurrent finalize");
        }
    }

    if work.needs_fulfilment_job {
        let items = order_repository::load_items(db, &order.id).await?;
        let payload = render_ticket(order, &items);
        outcome.job_created =
            order_repository::create_fulfilment_job(db, &order.id, payload, now).await?;

        if !outcome.job_created {
            debug!(order_id = %order.id, "Fulfilment job already queued by a concurrent finalize");
        }
    }

    Ok(outcome)
}

/// Render the kitchen ticket for an order
pub fn render_ticket(order: &orders::Model, items: &[order_items::Model]) -> String {
    let mut text = String::new();
    let _ = writeln!(text, "CANTEEN ORDER");
    let _ = writeln!(text, "{}", format_ticket_time(&order.created_at));
    let _ = writeln!(text);
    let _ = writeln!(text, "PICKUP CODE: {}", order.pickup_code);
    if let Some(pickup_time) = &order.pickup_time {
        let _ = writeln!(text, "PICKUP AT: {}", pickup_time);
    }
    let _ = writeln!(text);
    let _ = writeln!(text, "{} ({})", order.customer_name, order.customer_class);

    for item in items {
        let mut line = format!("{} x {}", item.qty, item.name_snapshot);
        if let Some(topic) = &item.topic_snapshot {
            let _ = write!(line, " [{}]", topic);
        }
        if let Some(options) = &item.selected_options {
            let _ = write!(line, " ({})", options);
        }
        let _ = writeln!(text, "{}", line);
    }

    if let Some(note) = &order.note {
        let _ = writeln!(text, "NOTE: {}", note);
    }
    let _ = writeln!(text);
    let _ = writeln!(text, "TOTAL: {}", format_minor_units(order.total_cents));
    let _ = writeln!(text);
    let _ = writeln!(text, "--------------------------------");
    text
}

fn format_ticket_time(created_at: &DateTime<FixedOffset>) -> String {
    created_at.format("%d/%m/%Y %H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn order() -> orders::Model {
        let created_at = DateTime::parse_from_rfc3339("2026-10-19T09:05:00+02:00").unwrap();
        orders::Model {
            id: "o1".to_string(),
            customer_name: "Marco".to_string(),
            customer_class: "5A".to_string(),
            note: Some("No onions".to_string()),
            pickup_time: Some("12:30".to_string()),
            total_cents: 600,
            pickup_code: "4821".to_string(),
            status: "pending_payment".to_string(),
            order_day: NaiveDate::from_ymd_opt(2026, 10, 19).unwrap(),
            created_at,
            updated_at: created_at,
        }
    }

    fn item(position: i32, name: &str, price: i64, qty: i32) -> order_items::Model {
        order_items::Model {
            id: position + 1,
            order_id: "o1".to_string(),
            position,
            product_id: Some(format!("p{}", position)),
            name_snapshot: name.to_string(),
            price_cents_snapshot: price,
            qty,
            topic_snapshot: None,
            selected_options: None,
        }
    }

    #[test]
    fn test_ticket_layout() {
        let mut first = item(0, "Ham sandwich", 150, 2);
        first.topic_snapshot = Some("Cold".to_string());
        let mut second = item(1, "Cutlet menu", 300, 1);
        second.selected_options = Some("Drink: Water".to_string());

        let ticket = render_ticket(&order(), &[first, second]);
        let lines: Vec<&str> = ticket.lines().collect();

        assert_eq!(lines[0], "CANTEEN ORDER");
        assert_eq!(lines[1], "19/10/2026 09:05");
        assert!(lines.contains(&"PICKUP CODE: 4821"));
        assert!(lines.contains(&"PICKUP AT: 12:30"));
        assert!(lines.contains(&"Marco (5A)"));
        assert!(lines.contains(&"2 x Ham sandwich [Cold]"));
        assert!(lines.contains(&"1 x Cutlet menu (Drink: Water)"));
        assert!(lines.contains(&"NOTE: No onions"));
        assert!(lines.contains(&"TOTAL: 6.00"));
    }

    #[test]
    fn test_ticket_omits_absent_fields() {
        let mut order = order();
        order.note = None;
        order.pickup_time = None;

        let ticket = render_ticket(&order, &[item(0, "Hot dog", 200, 1)]);
        assert!(!ticket.contains("NOTE:"));
        assert!(!ticket.contains("PICKUP AT:"));
        assert!(ticket.contains("1 x Hot dog\n"));
    }

    #[test]
    fn test_outcome_noop() {
        assert!(FinalizeOutcome::default().is_noop());
        assert!(!FinalizeOutcome { status_updated: true, ..Default::default() }.is_noop());
        assert!(FinalizeOutcome { reconciliation_needed: true, ..Default::default() }.is_noop());
    }
}
