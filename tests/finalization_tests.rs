mod common;

use canteen_backend::entities::{
    prelude::{Orders, PrintJobs},
    print_jobs,
};
use canteen_backend::error::OrderError;
use canteen_backend::models::order::{OrderStatus, OrderWithItems};
use canteen_backend::services::finalization::FinalizePlan;
use canteen_backend::services::{finalization, order_creation, order_lifecycle, order_repository};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter};

use crate::common::*;

/// Pending order totalling 600
async fn pending_order(db: &DatabaseConnection) -> OrderWithItems {
    seed_menu(db).await;
    order_creation::create_order(db, &clock_at("09:00"), &draft(&[("prod-a", 2), ("prod-b", 1)]))
        .await
        .unwrap()
}

async fn job_count(db: &DatabaseConnection, order_id: &str) -> u64 {
    PrintJobs::find()
        .filter(print_jobs::Column::OrderId.eq(order_id))
        .count(db)
        .await
        .unwrap()
}

async fn status_of(db: &DatabaseConnection, order_id: &str) -> String {
    Orders::find_by_id(order_id).one(db).await.unwrap().unwrap().status
}

#[tokio::test]
async fn test_finalize_marks_paid_credits_revenue_and_queues_job() {
    let db = setup_test_db().await.unwrap();
    let order = pending_order(&db).await;
    let clock = clock_at("09:01");

    let outcome = finalization::finalize(&db, &clock, &order.order.id).await.unwrap();
    assert!(outcome.status_updated);
    assert!(outcome.job_created);

    assert_eq!(status_of(&db, &order.order.id).await, "paid");
    let settings = get_settings(&db).await;
    assert_eq!(settings.lifetime_revenue_cents, 600);
    assert_eq!(settings.period_revenue_cents, 600);

    let job = PrintJobs::find()
        .filter(print_jobs::Column::OrderId.eq(order.order.id.as_str()))
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(job.status, "queued");
    assert!(job.payload_text.contains(&format!("PICKUP CODE: {}", order.order.pickup_code)));
    assert!(job.payload_text.contains("2 x Ham sandwich"));
    assert!(job.payload_text.contains("TOTAL: 6.00"));
}

#[tokio::test]
async fn test_second_finalize_is_a_noop() {
    let db = setup_test_db().await.unwrap();
    let order = pending_order(&db).await;
    let clock = clock_at("09:01");

    finalization::finalize(&db, &clock, &order.order.id).await.unwrap();
    let second = finalization::finalize(&db, &clock, &order.order.id).await.unwrap();

    assert!(second.is_noop());
    assert_eq!(status_of(&db, &order.order.id).await, "paid");
    assert_eq!(get_settings(&db).await.lifetime_revenue_cents, 600);
    assert_eq!(job_count(&db, &order.order.id).await, 1);
}

#[tokio::test]
async fn test_both_triggers_at_once_credit_once() {
    let db = setup_test_db().await.unwrap();
    let order = pending_order(&db).await;
    let clock = clock_at("09:01");
    let id = order.order.id.as_str();

    let (first, second) = tokio::join!(
        finalization::finalize(&db, &clock, id),
        finalization::finalize(&db, &clock, id),
    );
    let first = first.unwrap();
    let second = second.unwrap();

    assert!(first.status_updated ^ second.status_updated);
    assert!(first.job_created ^ second.job_created);
    assert_eq!(get_settings(&db).await.lifetime_revenue_cents, 600);
    assert_eq!(job_count(&db, id).await, 1);
}

#[tokio::test]
async fn test_interleaved_finalize_credits_once() {
    let db = setup_test_db().await.unwrap();
    let order = pending_order(&db).await;
    let id = order.order.id.as_str();
    let now = now_at("09:01");

    // Both triggers read the order before either one writes
    let FinalizePlan::Apply(first) = finalization::plan(&db, id).await.unwrap() else {
        panic!("expected pending work");
    };
    let FinalizePlan::Apply(second) = finalization::plan(&db, id).await.unwrap() else {
        panic!("expected pending work");
    };
    assert!(second.needs_status_update);
    assert!(second.needs_fulfilment_job);

    let won = finalization::apply(&db, &first, now).await.unwrap();
    let lost = finalization::apply(&db, &second, now).await.unwrap();

    assert!(won.status_updated);
    assert!(won.job_created);
    assert!(lost.is_noop());

    assert_eq!(status_of(&db, id).await, "paid");
    let settings = get_settings(&db).await;
    assert_eq!(settings.lifetime_revenue_cents, 600);
    assert_eq!(settings.period_revenue_cents, 600);
    assert_eq!(job_count(&db, id).await, 1);

    assert!(matches!(
        finalization::plan(&db, id).await.unwrap(),
        FinalizePlan::Done
    ));
}

#[tokio::test]
async fn test_status_cas_and_job_insert_detect_a_lost_race() {
    let db = setup_test_db().await.unwrap();
    let order = pending_order(&db).await;
    let id = order.order.id.as_str();
    let now = now_at("09:01");

    let moved = order_repository::update_status(
        &db,
        id,
        OrderStatus::PendingPayment,
        OrderStatus::Paid,
        now,
    )
    .await
    .unwrap();
    let moved_again = order_repository::update_status(
        &db,
        id,
        OrderStatus::PendingPayment,
        OrderStatus::Paid,
        now,
    )
    .await
    .unwrap();
    assert!(moved);
    assert!(!moved_again);

    let created = order_repository::create_fulfilment_job(&db, id, "ticket".to_string(), now)
        .await
        .unwrap();
    let created_again =
        order_repository::create_fulfilment_job(&db, id, "ticket".to_string(), now)
            .await
            .unwrap();
    assert!(created);
    assert!(!created_again);
    assert_eq!(job_count(&db, id).await, 1);
}

#[tokio::test]
async fn test_retry_completes_only_the_missing_job() {
    let db = setup_test_db().await.unwrap();
    let order = pending_order(&db).await;
    let clock = clock_at("09:01");

    finalization::finalize(&db, &clock, &order.order.id).await.unwrap();
    // Simulate a crash between status update and job creation
    PrintJobs::delete_many()
        .filter(print_jobs::Column::OrderId.eq(order.order.id.as_str()))
        .exec(&db)
        .await
        .unwrap();

    let outcome = finalization::finalize(&db, &clock, &order.order.id).await.unwrap();
    assert!(!outcome.status_updated);
    assert!(outcome.job_created);
    assert_eq!(get_settings(&db).await.lifetime_revenue_cents, 600);
    assert_eq!(job_count(&db, &order.order.id).await, 1);
}

#[tokio::test]
async fn test_finalize_after_kitchen_started_keeps_status() {
    let db = setup_test_db().await.unwrap();
    let order = pending_order(&db).await;
    let clock = clock_at("09:01");
    let id = order.order.id.as_str();

    finalization::finalize(&db, &clock, id).await.unwrap();
    order_lifecycle::transition(&db, &clock, id, OrderStatus::InPreparation)
        .await
        .unwrap();

    let outcome = finalization::finalize(&db, &clock, id).await.unwrap();
    assert!(outcome.is_noop());
    assert_eq!(status_of(&db, id).await, "in_preparation");
}

#[tokio::test]
async fn test_finalize_cancelled_order_needs_reconciliation() {
    let db = setup_test_db().await.unwrap();
    let order = pending_order(&db).await;
    let clock = clock_at("09:01");
    let id = order.order.id.as_str();

    order_lifecycle::transition(&db, &clock, id, OrderStatus::Cancelled)
        .await
        .unwrap();

    let outcome = finalization::finalize(&db, &clock, id).await.unwrap();
    assert!(outcome.is_noop());
    assert!(outcome.reconciliation_needed);
    assert_eq!(status_of(&db, id).await, "cancelled");
    assert_eq!(get_settings(&db).await.lifetime_revenue_cents, 0);
    assert_eq!(job_count(&db, id).await, 0);
}

#[tokio::test]
async fn test_finalize_unknown_order() {
    let db = setup_test_db().await.unwrap();
    let result = finalization::finalize(&db, &clock_at("09:01"), "missing").await;
    assert!(matches!(result, Err(OrderError::OrderNotFound(_))));
}
