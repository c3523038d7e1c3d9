// src/lib.rs

use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use sea_orm::DatabaseConnection;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use config::AppConfig;
use handlers::rate_limit::RateLimiter;
use services::{clock::Clock, payments::PaymentProvider};

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Arc<AppConfig>,
    pub clock: Arc<dyn Clock>,
    /// `None` runs checkout in simulated mode
    pub payments: Option<Arc<dyn PaymentProvider>>,
    pub rate_limiter: RateLimiter,
}

pub mod entities {
    pub mod prelude;
    pub mod feedback;
    pub mod order_items;
    pub mod orders;
    pub mod print_jobs;
    pub mod product_options;
    pub mod products;
    pub mod settings;
}

pub mod services {
    pub mod catalog;
    pub mod checkout;
    pub mod clock;
    pub mod code_allocator;
    pub mod feedback;
    pub mod finalization;
    pub mod order_creation;
    pub mod order_lifecycle;
    pub mod order_repository;
    pub mod payments;
    pub mod print_queue;
    pub mod settings_admin;
    pub mod staff_orders;
}

pub mod config;
pub mod error;
pub mod handlers;
pub mod models;

/// Full HTTP surface: public routes, the payment webhook and the
/// key-protected staff API
pub fn app_router(state: AppState) -> Router {
    let public = Router::new()
        .route("/api/menu", get(handlers::products::get_menu))
        .route("/api/settings/public", get(handlers::settings::get_public_settings))
        .route(
            "/api/orders",
            post(handlers::orders::create_order).get(handlers::orders::get_orders_by_ids),
        )
        .route("/api/orders/{id}", get(handlers::orders::get_order))
        .route("/api/orders/{id}/status", get(handlers::orders::get_order_status))
        .route("/api/checkout/success", get(handlers::checkout::checkout_success))
        .route("/api/feedback", post(handlers::feedback::submit_feedback))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            handlers::rate_limit::limit_by_ip,
        ));

    // Provider callbacks and health checks are not rate limited
    let unlimited = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/api/webhooks/payment", post(handlers::checkout::payment_webhook));

    let staff = Router::new()
        .route(
            "/api/staff/orders",
            get(handlers::staff_orders::list_orders).delete(handlers::staff_orders::purge_orders),
        )
        .route("/api/staff/orders/active", get(handlers::staff_orders::list_active_orders))
        .route(
            "/api/staff/orders/by-code/{code}",
            get(handlers::staff_orders::find_order_by_code),
        )
        .route(
            "/api/staff/orders/bulk-status",
            post(handlers::staff_orders::bulk_update_status),
        )
        .route("/api/staff/orders/{id}", delete(handlers::staff_orders::delete_order))
        .route(
            "/api/staff/orders/{id}/status",
            post(handlers::staff_orders::update_order_status),
        )
        .route(
            "/api/staff/settings",
            get(handlers::settings::get_settings).put(handlers::settings::update_settings),
        )
        .route(
            "/api/staff/settings/reset-lifetime-revenue",
            post(handlers::settings::reset_lifetime_revenue),
        )
        .route(
            "/api/staff/settings/reset-period-revenue",
            post(handlers::settings::reset_period_revenue),
        )
        .route(
            "/api/staff/products",
            get(handlers::products::list_products).post(handlers::products::create_product),
        )
        .route(
            "/api/staff/products/{id}",
            put(handlers::products::update_product).delete(handlers::products::delete_product),
        )
        .route(
            "/api/staff/products/{id}/availability",
            post(handlers::products::set_availability),
        )
        .route("/api/staff/print-jobs", get(handlers::print_jobs::list_print_jobs))
        .route(
            "/api/staff/print-jobs/{id}/printed",
            post(handlers::print_jobs::mark_printed),
        )
        .route("/api/staff/feedback", get(handlers::feedback::list_feedback))
        .route("/api/staff/feedback/{id}", delete(handlers::feedback::delete_feedback))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            handlers::auth::require_staff_key,
        ));

    Router::new()
        .merge(public)
        .merge(unlimited)
        .merge(staff)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
