#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::{
    ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, DbErr, EntityTrait, Set,
};
use sea_orm_migration::MigratorTrait;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use canteen_backend::{
    app_router,
    config::{AppConfig, PaymentMode},
    entities::{prelude::Settings, products, settings},
    handlers::rate_limit::RateLimiter,
    models::order::{DraftLine, OrderDraft},
    services::{
        clock::{Clock, FixedClock},
        order_repository::SETTINGS_ID,
        payments::{
            parse_event, verify_webhook_signature, CheckoutSession, PaymentError, PaymentEvent,
            PaymentProvider, SessionState, SessionStatus,
        },
    },
    AppState,
};
use canteen_backend::models::order::OrderWithItems;

pub const ADMIN_KEY: &str = "test-admin-key";
pub const WEBHOOK_SECRET: &str = "whsec_test_secret";

/// Fresh in-memory database with the real migrations applied.
/// One pooled connection keeps the in-memory database alive.
pub async fn setup_test_db() -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);

    let db = Database::connect(options).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

/// A fixed clock on 2026-10-19 at `hh:mm` local (+02:00)
pub fn clock_at(hh_mm: &str) -> FixedClock {
    FixedClock::parse(&format!("2026-10-19T{}:00+02:00", hh_mm)).unwrap()
}

pub fn now_at(hh_mm: &str) -> DateTime<FixedOffset> {
    clock_at(hh_mm).now()
}

pub async fn seed_product(
    db: &DatabaseConnection,
    id: &str,
    name: &str,
    category: &str,
    price_cents: i64,
    is_available: bool,
) -> products::Model {
    products::ActiveModel {
        id: Set(id.to_string()),
        name: Set(name.to_string()),
        category: Set(category.to_string()),
        topic: Set(None),
        price_cents: Set(price_cents),
        description: Set(None),
        allergens: Set(None),
        is_available: Set(is_available),
        created_at: Set(now_at("07:00")),
    }
    .insert(db)
    .await
    .unwrap()
}

/// Product A (150) and product B (300), both available
pub async fn seed_menu(db: &DatabaseConnection) {
    seed_product(db, "prod-a", "Ham sandwich", "Sandwiches", 150, true).await;
    seed_product(db, "prod-b", "Cutlet menu", "Hot meals", 300, true).await;
}

pub fn draft(lines: &[(&str, i32)]) -> OrderDraft {
    OrderDraft {
        customer_name: "Giulia Rossi".to_string(),
        customer_class: "4B".to_string(),
        note: None,
        pickup_time: None,
        lines: lines
            .iter()
            .map(|(product_id, qty)| DraftLine {
                product_id: product_id.to_string(),
                qty: *qty,
                selected_options: None,
            })
            .collect(),
    }
}

pub async fn get_settings(db: &DatabaseConnection) -> settings::Model {
    Settings::find_by_id(SETTINGS_ID).one(db).await.unwrap().unwrap()
}

pub async fn update_settings_row<F>(db: &DatabaseConnection, change: F)
where
    F: FnOnce(&mut settings::ActiveModel),
{
    let mut model: settings::ActiveModel = get_settings(db).await.into();
    change(&mut model);
    model.update(db).await.unwrap();
}

/// Hosted checkout stand-in. Sessions start open; tests complete them.
pub struct MockPaymentProvider {
    sessions: Mutex<HashMap<String, SessionStatus>>,
}

impl MockPaymentProvider {
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn session_for(order_id: &str) -> String {
        format!("cs_test_{}", order_id.replace('-', ""))
    }

    pub fn set_state(&self, session_id: &str, state: SessionState) {
        let mut sessions = self.sessions.lock().unwrap();
        if let Some(session) = sessions.get_mut(session_id) {
            session.state = state;
        }
    }
}

#[async_trait]
impl PaymentProvider for MockPaymentProvider {
    async fn create_checkout(&self, order: &OrderWithItems) -> Result<CheckoutSession, PaymentError> {
        let session_id = Self::session_for(&order.order.id);
        self.sessions.lock().unwrap().insert(
            session_id.clone(),
            SessionStatus {
                state: SessionState::Open,
                order_id: Some(order.order.id.clone()),
            },
        );
        Ok(CheckoutSession {
            url: format!("https://pay.test/{}", session_id),
            session_id,
        })
    }

    async fn retrieve_session(&self, session_id: &str) -> Result<SessionStatus, PaymentError> {
        self.sessions
            .lock()
            .unwrap()
            .get(session_id)
            .cloned()
            .ok_or_else(|| PaymentError::Rejected(format!("No such session: {}", session_id)))
    }

    fn parse_webhook(&self, payload: &[u8], signature: &str) -> Result<PaymentEvent, PaymentError> {
        verify_webhook_signature(payload, signature, WEBHOOK_SECRET, Utc::now().timestamp())?;
        parse_event(payload)
    }
}

pub fn test_config() -> AppConfig {
    AppConfig {
        database_url: "sqlite::memory:".to_string(),
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        admin_api_key: ADMIN_KEY.to_string(),
        payment_mode: PaymentMode::Simulated,
        public_base_url: "http://localhost:3000".to_string(),
        currency: "eur".to_string(),
        rate_limit_max: 60,
        rate_limit_window_secs: 60,
    }
}

pub fn test_state(
    db: DatabaseConnection,
    clock: FixedClock,
    payments: Option<Arc<MockPaymentProvider>>,
) -> AppState {
    let config = test_config();
    AppState {
        db,
        clock: Arc::new(clock),
        payments: payments.map(|p| p as Arc<dyn PaymentProvider>),
        rate_limiter: RateLimiter::new(
            config.rate_limit_max,
            Duration::from_secs(config.rate_limit_window_secs),
        ),
        config: Arc::new(config),
    }
}

pub fn test_router(state: AppState) -> Router {
    app_router(state)
}

/// Send one request through the router and decode the JSON body (Null when empty)
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, json)
}

pub fn json_request(method: &str, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn staff_request(method: &str, uri: &str, body: Option<&Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("x-api-key", ADMIN_KEY);
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}
