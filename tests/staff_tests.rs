mod common;

use canteen_backend::entities::prelude::OrderItems;
use canteen_backend::error::OrderError;
use canteen_backend::models::order::{OrderStatus, StatusFilter};
use canteen_backend::models::feedback::FeedbackRequest;
use canteen_backend::models::product::{ProductOptionRequest, ProductRequest};
use canteen_backend::models::settings::UpdateSettingsRequest;
use canteen_backend::services::{
    catalog, feedback, finalization, order_creation, order_lifecycle, print_queue,
    settings_admin, staff_orders,
};
use sea_orm::{DatabaseConnection, EntityTrait};

use crate::common::*;

async fn create_at(db: &DatabaseConnection, hh_mm: &str) -> String {
    order_creation::create_order(db, &clock_at(hh_mm), &draft(&[("prod-a", 1)]))
        .await
        .unwrap()
        .order
        .id
}

async fn create_paid_at(db: &DatabaseConnection, hh_mm: &str) -> String {
    let id = create_at(db, hh_mm).await;
    finalization::finalize(db, &clock_at(hh_mm), &id).await.unwrap();
    id
}

fn ids(orders: &[canteen_backend::models::order::OrderWithItems]) -> Vec<&str> {
    orders.iter().map(|o| o.order.id.as_str()).collect()
}

#[tokio::test]
async fn test_dashboard_hides_unpaid_orders_by_default() {
    let db = setup_test_db().await.unwrap();
    seed_menu(&db).await;

    let pending = create_at(&db, "08:00").await;
    let older = create_paid_at(&db, "08:10").await;
    let newer = create_paid_at(&db, "08:20").await;

    let dashboard = staff_orders::list_orders(&db, StatusFilter::Default, None)
        .await
        .unwrap();
    assert_eq!(ids(&dashboard.orders), vec![newer.as_str(), older.as_str()]);
    assert_eq!(dashboard.settings.lifetime_revenue_cents, 300);

    let all = staff_orders::list_orders(&db, StatusFilter::All, None).await.unwrap();
    assert_eq!(all.orders.len(), 3);

    let only_pending =
        staff_orders::list_orders(&db, StatusFilter::Only(OrderStatus::PendingPayment), None)
            .await
            .unwrap();
    assert_eq!(ids(&only_pending.orders), vec![pending.as_str()]);
}

#[tokio::test]
async fn test_dashboard_code_search() {
    let db = setup_test_db().await.unwrap();
    seed_menu(&db).await;

    let target = create_paid_at(&db, "08:00").await;
    create_paid_at(&db, "08:05").await;

    let all = staff_orders::list_orders(&db, StatusFilter::All, None).await.unwrap();
    let code = all
        .orders
        .iter()
        .find(|o| o.order.id == target)
        .unwrap()
        .order
        .pickup_code
        .clone();

    let found = staff_orders::list_orders(&db, StatusFilter::Default, Some(&code))
        .await
        .unwrap();
    assert_eq!(ids(&found.orders), vec![target.as_str()]);
    assert_eq!(found.orders[0].items.len(), 1);
}

#[tokio::test]
async fn test_active_orders_oldest_first() {
    let db = setup_test_db().await.unwrap();
    seed_menu(&db).await;
    let clock = clock_at("09:30");

    let first = create_paid_at(&db, "08:00").await;
    let second = create_paid_at(&db, "08:30").await;
    let ready = create_paid_at(&db, "08:45").await;
    create_at(&db, "08:50").await;

    order_lifecycle::transition(&db, &clock, &second, OrderStatus::InPreparation)
        .await
        .unwrap();
    order_lifecycle::transition(&db, &clock, &ready, OrderStatus::Ready)
        .await
        .unwrap();

    let active = staff_orders::list_active_orders(&db).await.unwrap();
    assert_eq!(ids(&active), vec![first.as_str(), second.as_str()]);
}

#[tokio::test]
async fn test_counter_lookup_by_code() {
    let db = setup_test_db().await.unwrap();
    seed_menu(&db).await;

    let created = order_creation::create_order(&db, &clock_at("08:00"), &draft(&[("prod-b", 2)]))
        .await
        .unwrap();
    let code = created.order.pickup_code.clone();

    let found = staff_orders::find_todays_order_by_code(&db, &clock_at("12:00"), &code)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.order.id, created.order.id);
    assert_eq!(found.items[0].qty, 2);

    // Next day the code no longer resolves
    let tomorrow = canteen_backend::services::clock::FixedClock::parse("2026-10-20T12:00:00+02:00")
        .unwrap();
    assert!(staff_orders::find_todays_order_by_code(&db, &tomorrow, &code)
        .await
        .unwrap()
        .is_none());

    // Cancelled orders do not hold their code
    order_lifecycle::transition(&db, &clock_at("12:00"), &created.order.id, OrderStatus::Cancelled)
        .await
        .unwrap();
    assert!(staff_orders::find_todays_order_by_code(&db, &clock_at("12:00"), &code)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_print_queue_lists_and_acknowledges_jobs() {
    let db = setup_test_db().await.unwrap();
    seed_menu(&db).await;

    let first = create_paid_at(&db, "08:00").await;
    let second = create_paid_at(&db, "08:10").await;

    let jobs = print_queue::list_queued_jobs(&db).await.unwrap();
    assert_eq!(jobs.len(), 2);
    assert_eq!(jobs[0].order_id, first);
    assert_eq!(jobs[1].order_id, second);
    assert_eq!(jobs[0].pickup_code.len(), 4);
    assert_eq!(jobs[0].status, "queued");

    print_queue::mark_printed(&db, &jobs[0].id).await.unwrap();
    print_queue::mark_printed(&db, &jobs[0].id).await.unwrap();

    let remaining = print_queue::list_queued_jobs(&db).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].order_id, second);

    let result = print_queue::mark_printed(&db, "missing-job").await;
    assert!(matches!(result, Err(OrderError::JobNotFound(_))));
}

#[tokio::test]
async fn test_settings_update_validates_and_keeps_revenue() {
    let db = setup_test_db().await.unwrap();
    seed_menu(&db).await;
    create_paid_at(&db, "08:00").await;

    let mut request = UpdateSettingsRequest {
        order_start_time: "07:00".to_string(),
        order_end_time: "09:30".to_string(),
        pickup_start_time: "12:00".to_string(),
        pickup_end_time: "13:30".to_string(),
        ordering_enabled: true,
        pickup_time_required: true,
    };
    let updated = settings_admin::update_settings(&db, &request).await.unwrap();
    assert_eq!(updated.order_end_time, "09:30");
    assert!(updated.pickup_time_required);
    assert_eq!(updated.lifetime_revenue_cents, 150);

    request.order_end_time = "25:00".to_string();
    let result = settings_admin::update_settings(&db, &request).await;
    assert!(matches!(result, Err(OrderError::InvalidRequest(_))));
    assert_eq!(get_settings(&db).await.order_end_time, "09:30");
}

#[tokio::test]
async fn test_revenue_resets_are_independent() {
    let db = setup_test_db().await.unwrap();
    seed_menu(&db).await;
    create_paid_at(&db, "08:00").await;
    create_paid_at(&db, "08:05").await;

    let after_period = settings_admin::reset_period_revenue(&db).await.unwrap();
    assert_eq!(after_period.period_revenue_cents, 0);
    assert_eq!(after_period.lifetime_revenue_cents, 300);

    create_paid_at(&db, "08:10").await;
    let settings = get_settings(&db).await;
    assert_eq!(settings.period_revenue_cents, 150);
    assert_eq!(settings.lifetime_revenue_cents, 450);

    let after_lifetime = settings_admin::reset_lifetime_revenue(&db).await.unwrap();
    assert_eq!(after_lifetime.lifetime_revenue_cents, 0);
    assert_eq!(after_lifetime.period_revenue_cents, 150);
}

#[tokio::test]
async fn test_menu_groups_available_products() {
    let db = setup_test_db().await.unwrap();
    seed_menu(&db).await;
    seed_product(&db, "prod-c", "Cheese sandwich", "Sandwiches", 140, true).await;
    seed_product(&db, "prod-off", "Lasagne", "Hot meals", 450, false).await;

    let menu = catalog::list_menu(&db).await.unwrap();
    let names: Vec<&str> = menu.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Hot meals", "Sandwiches"]);

    assert_eq!(menu[0].products.len(), 1);
    let sandwiches: Vec<&str> = menu[1].products.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(sandwiches, vec!["Cheese sandwich", "Ham sandwich"]);
    assert_eq!(menu[1].products[1].price, "1.50");

    assert_eq!(catalog::list_products(&db).await.unwrap().len(), 4);
}

#[tokio::test]
async fn test_product_lifecycle_keeps_order_snapshots() {
    let db = setup_test_db().await.unwrap();
    seed_menu(&db).await;

    let request = ProductRequest {
        name: " Hot dog ".to_string(),
        category: "Other".to_string(),
        topic: Some("  ".to_string()),
        price_cents: 200,
        description: None,
        allergens: Some("Gluten".to_string()),
        is_available: true,
        options: Vec::new(),
    };
    let product = catalog::create_product(&db, &request, now_at("07:00"))
        .await
        .unwrap()
        .product;
    assert_eq!(product.name, "Hot dog");
    assert_eq!(product.topic, None);

    let order = order_creation::create_order(&db, &clock_at("08:00"), &draft(&[(product.id.as_str(), 2)]))
        .await
        .unwrap();

    let hidden = catalog::set_availability(&db, &product.id, false).await.unwrap();
    assert!(!hidden.product.is_available);

    catalog::delete_product(&db, &product.id).await.unwrap();
    let result = catalog::delete_product(&db, &product.id).await;
    assert!(matches!(result, Err(OrderError::ProductNotFound(_))));

    let items = OrderItems::find().all(&db).await.unwrap();
    let line = items
        .iter()
        .find(|i| i.order_id == order.order.id)
        .unwrap();
    assert_eq!(line.name_snapshot, "Hot dog");
    assert_eq!(line.price_cents_snapshot, 200);
}

#[tokio::test]
async fn test_product_validation() {
    let db = setup_test_db().await.unwrap();
    seed_menu(&db).await;

    let request = ProductRequest {
        name: "Ham sandwich".to_string(),
        category: "Sandwiches".to_string(),
        topic: None,
        price_cents: -5,
        description: None,
        allergens: None,
        is_available: true,
        options: Vec::new(),
    };
    let result = catalog::update_product(&db, "prod-a", &request).await;
    assert!(matches!(result, Err(OrderError::InvalidRequest(_))));

    let result = catalog::set_availability(&db, "missing", true).await;
    assert!(matches!(result, Err(OrderError::ProductNotFound(_))));
}

fn menu_request(options: Vec<ProductOptionRequest>) -> ProductRequest {
    ProductRequest {
        name: "Pasta menu".to_string(),
        category: "Menu".to_string(),
        topic: None,
        price_cents: 500,
        description: None,
        allergens: None,
        is_available: true,
        options,
    }
}

fn sauce_option() -> ProductOptionRequest {
    ProductOptionRequest {
        name: "Sauce".to_string(),
        choices: vec!["Tomato".to_string(), "Pesto".to_string()],
        allow_multi: false,
    }
}

#[tokio::test]
async fn test_menu_products_get_drink_choice() {
    let db = setup_test_db().await.unwrap();
    seed_product(&db, "drink-water", "Water", "Bevande", 100, true).await;
    seed_product(&db, "drink-cola", "Cola", "Bevande", 150, true).await;
    seed_product(&db, "drink-tea", "Iced tea", "Bevande", 150, false).await;

    let created = catalog::create_product(&db, &menu_request(vec![sauce_option()]), now_at("07:00"))
        .await
        .unwrap();

    let names: Vec<&str> = created.options.iter().map(|o| o.name.as_str()).collect();
    assert_eq!(names, vec!["Sauce", "Bevanda"]);
    assert_eq!(created.options[1].choices, "Cola, Water");
    assert!(!created.options[1].allow_multi);

    let menu = catalog::list_menu(&db).await.unwrap();
    let pasta = menu
        .iter()
        .find(|c| c.name == "Menu")
        .unwrap()
        .products
        .first()
        .unwrap();
    assert_eq!(pasta.options.len(), 2);
    assert_eq!(pasta.options[0].choices, vec!["Tomato", "Pesto"]);
    assert_eq!(pasta.options[1].choices, vec!["Cola", "Water"]);
}

#[tokio::test]
async fn test_update_replaces_option_groups() {
    let db = setup_test_db().await.unwrap();
    seed_product(&db, "drink-water", "Water", "Bevande", 100, true).await;

    let created = catalog::create_product(&db, &menu_request(vec![sauce_option()]), now_at("07:00"))
        .await
        .unwrap();
    let id = created.product.id.clone();

    // A drink group sent back by the client is rebuilt, not duplicated
    seed_product(&db, "drink-juice", "Juice", "Bevande", 120, true).await;
    let mut request = menu_request(vec![ProductOptionRequest {
        name: "Bevanda".to_string(),
        choices: vec!["Water".to_string()],
        allow_multi: false,
    }]);
    let updated = catalog::update_product(&db, &id, &request).await.unwrap();
    assert_eq!(updated.options.len(), 1);
    assert_eq!(updated.options[0].choices, "Juice, Water");

    // Outside the menu category only the requested groups remain
    request.category = "Pasta".to_string();
    request.options = vec![sauce_option()];
    let updated = catalog::update_product(&db, &id, &request).await.unwrap();
    let names: Vec<&str> = updated.options.iter().map(|o| o.name.as_str()).collect();
    assert_eq!(names, vec!["Sauce"]);

    let reloaded = catalog::get_product(&db, &id).await.unwrap();
    assert_eq!(reloaded.options, updated.options);

    catalog::delete_product(&db, &id).await.unwrap();
    assert!(catalog::list_products(&db)
        .await
        .unwrap()
        .iter()
        .all(|p| p.product.id != id));
}

#[tokio::test]
async fn test_feedback_lifecycle() {
    let db = setup_test_db().await.unwrap();

    let blank = FeedbackRequest {
        text: "   ".to_string(),
    };
    let result = feedback::submit_feedback(&db, &blank, now_at("08:00")).await;
    assert!(matches!(result, Err(OrderError::InvalidRequest(_))));

    let older = feedback::submit_feedback(
        &db,
        &FeedbackRequest {
            text: " More vegetarian options please ".to_string(),
        },
        now_at("08:00"),
    )
    .await
    .unwrap();
    let newer = feedback::submit_feedback(
        &db,
        &FeedbackRequest {
            text: "Lasagne was great".to_string(),
        },
        now_at("09:00"),
    )
    .await
    .unwrap();
    assert_eq!(older.text, "More vegetarian options please");

    let listed = feedback::list_feedback(&db).await.unwrap();
    let ids: Vec<&str> = listed.iter().map(|f| f.id.as_str()).collect();
    assert_eq!(ids, vec![newer.id.as_str(), older.id.as_str()]);

    feedback::delete_feedback(&db, &older.id).await.unwrap();
    let result = feedback::delete_feedback(&db, &older.id).await;
    assert!(matches!(result, Err(OrderError::FeedbackNotFound(_))));
    assert_eq!(feedback::list_feedback(&db).await.unwrap().len(), 1);
}
